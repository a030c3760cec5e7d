/// Prosim Engine - Inventory and Orders
///
/// Every movement of stock goes through `InventoryLedger`, which updates
/// the company's counters and records the flow for the report and the
/// conservation check in one place.

use crate::arithmetic::{checked_deposit, checked_withdraw};
use crate::config::LogisticsConfig;
use crate::decisions::Decisions;
use crate::domain::{Inventory, OrderBook, OrderKind, PendingOrder, PerLine, Pool, ProductLine};
use crate::error::SimResult;
use crate::report::{InventoryReport, PendingOrderLine, PoolFlow};

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryLedger {
    flows: Vec<PoolFlow>,
}

impl InventoryLedger {
    /// Open the week with the current balances.
    pub fn open(inventory: &Inventory) -> Self {
        Self {
            flows: Pool::ALL
                .iter()
                .map(|&pool| PoolFlow::opening(pool, inventory.get(pool)))
                .collect(),
        }
    }

    fn flow_mut(&mut self, pool: Pool) -> &mut PoolFlow {
        &mut self.flows[pool.index()]
    }

    pub fn flow(&self, pool: Pool) -> Option<&PoolFlow> {
        self.flows.get(pool.index())
    }

    pub fn receive(&mut self, inventory: &mut Inventory, pool: Pool, quantity: f64) -> SimResult<()> {
        let slot = inventory.get_mut(pool);
        *slot = checked_deposit(*slot, quantity, pool.label())?;
        let flow = self.flow_mut(pool);
        flow.received += quantity;
        flow.ending = *slot;
        Ok(())
    }

    pub fn produce(&mut self, inventory: &mut Inventory, pool: Pool, quantity: f64) -> SimResult<()> {
        let slot = inventory.get_mut(pool);
        *slot = checked_deposit(*slot, quantity, pool.label())?;
        let flow = self.flow_mut(pool);
        flow.produced += quantity;
        flow.ending = *slot;
        Ok(())
    }

    pub fn consume(&mut self, inventory: &mut Inventory, pool: Pool, quantity: f64) -> SimResult<()> {
        let slot = inventory.get_mut(pool);
        *slot = checked_withdraw(*slot, quantity, pool.label())?;
        let flow = self.flow_mut(pool);
        flow.consumed += quantity;
        flow.ending = *slot;
        Ok(())
    }

    pub fn ship(&mut self, inventory: &mut Inventory, line: ProductLine, quantity: f64) -> SimResult<()> {
        let pool = Pool::Product(line);
        let slot = inventory.get_mut(pool);
        *slot = checked_withdraw(*slot, quantity, pool.label())?;
        let flow = self.flow_mut(pool);
        flow.shipped += quantity;
        flow.ending = *slot;
        Ok(())
    }

    /// Close the week against the final balances.
    pub fn close(mut self, inventory: &Inventory) -> InventoryReport {
        for flow in &mut self.flows {
            flow.ending = inventory.get(flow.pool);
        }
        InventoryReport { pools: self.flows }
    }
}

/// Stock on hand in `pool`.
pub fn available(inventory: &Inventory, pool: Pool) -> f64 {
    inventory.get(pool).max(0.0)
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// What arrived this week.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Receipts {
    pub raw_materials: f64,
    pub purchased_parts: PerLine,
}

/// Orders placed this week, for the ordering charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrdersPlaced {
    pub orders: u32,
    pub expedited: u32,
}

/// Land every order due in `week` and drop it from the book.
pub fn receive_due_orders(
    inventory: &mut Inventory,
    book: &mut OrderBook,
    ledger: &mut InventoryLedger,
    week: u32,
) -> SimResult<Receipts> {
    let mut receipts = Receipts::default();
    let (due, pending): (Vec<PendingOrder>, Vec<PendingOrder>) =
        book.orders.drain(..).partition(|o| o.due_week <= week);
    book.orders = pending;

    for order in due {
        ledger.receive(inventory, order.kind.destination(), order.quantity)?;
        match order.kind {
            OrderKind::RawMaterialsRegular | OrderKind::RawMaterialsExpedited => {
                receipts.raw_materials += order.quantity;
            }
            OrderKind::PurchasedPart(line) => receipts.purchased_parts.add(line, order.quantity),
        }
        log::debug!(
            "received {:.0} x {} (placed week {})",
            order.quantity,
            order.kind.description(),
            order.placed_week
        );
    }
    Ok(receipts)
}

/// Book the orders in `decisions`, due after their lead time.
pub fn place_orders(book: &mut OrderBook, decisions: &Decisions, week: u32, logistics: &LogisticsConfig) -> OrdersPlaced {
    let mut requested = vec![
        (OrderKind::RawMaterialsRegular, decisions.raw_materials_regular, logistics.raw_materials_regular),
        (OrderKind::RawMaterialsExpedited, decisions.raw_materials_expedited, logistics.raw_materials_expedited),
    ];
    for (line, qty) in decisions.part_orders.iter() {
        requested.push((OrderKind::PurchasedPart(line), qty, logistics.purchased_parts));
    }

    let mut placed = OrdersPlaced::default();
    for (kind, quantity, lead_time) in requested {
        if quantity <= 0.0 {
            continue;
        }
        book.orders.push(PendingOrder {
            kind,
            quantity,
            placed_week: week,
            due_week: week + lead_time,
        });
        placed.orders += 1;
        if kind == OrderKind::RawMaterialsExpedited {
            placed.expedited += 1;
        }
    }
    placed
}

/// Report rows for the open order book, soonest first.
pub fn pending_order_lines(book: &OrderBook) -> Vec<PendingOrderLine> {
    let mut lines: Vec<PendingOrderLine> = book
        .orders
        .iter()
        .map(|o| PendingOrderLine {
            description: o.kind.description().to_string(),
            kind: o.kind,
            due_week: o.due_week,
            quantity: o.quantity,
        })
        .collect();
    lines.sort_by(|a, b| a.due_week.cmp(&b.due_week).then(a.kind.cmp(&b.kind)));
    lines
}
