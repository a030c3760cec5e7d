/// Prosim Engine - Demand
///
/// Forecasts per product and shipping period. The actual demand for a
/// period is drawn once when the period opens; the displayed estimate is
/// redrawn around it every week with a spread that narrows as shipping
/// approaches, and equals the actual on the shipping week itself.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::{DemandConfig, GameConfig};
use crate::domain::{DemandForecast, DemandSchedule, PerLine, ProductLine};
use crate::error::{SimError, SimResult};
use crate::report::{DemandLine, ShipmentLine};

// ---------------------------------------------------------------------------
// Cadence
// ---------------------------------------------------------------------------

pub fn is_shipping_week(week: u32, shipping_frequency: u32) -> bool {
    shipping_frequency > 0 && week > 0 && week % shipping_frequency == 0
}

/// First shipping week at or after `week`.
pub fn next_shipping_week(week: u32, shipping_frequency: u32) -> u32 {
    let freq = shipping_frequency.max(1);
    let week = week.max(1);
    week.div_ceil(freq) * freq
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

fn sample_normal<R: Rng>(mean: f64, std_dev: f64, rng: &mut R) -> SimResult<f64> {
    if std_dev <= 0.0 {
        return Ok(mean);
    }
    let dist = Normal::new(mean, std_dev)
        .map_err(|e| SimError::configuration(format!("demand distribution: {}", e)))?;
    Ok(dist.sample(rng))
}

fn draw_estimate<R: Rng>(actual: f64, std_dev: f64, rng: &mut R) -> SimResult<f64> {
    Ok(sample_normal(actual, std_dev, rng)?.round().max(0.0))
}

/// Open a forecast for `product` shipping in `shipping_week`.
pub fn generate_forecast<R: Rng>(
    product: ProductLine,
    shipping_week: u32,
    weeks_until_shipping: u32,
    config: &DemandConfig,
    rng: &mut R,
) -> SimResult<DemandForecast> {
    let mean = config.base_demand.get(product);
    let std_dev = config.std_dev(weeks_until_shipping);
    let actual = sample_normal(mean, std_dev, rng)?.round().max(0.0);
    let revealed = weeks_until_shipping == 0;
    let estimate = if revealed {
        actual
    } else {
        draw_estimate(actual, std_dev, rng)?
    };
    Ok(DemandForecast {
        product,
        shipping_week,
        mean,
        std_dev,
        weeks_until_shipping,
        estimate,
        revealed,
        actual,
    })
}

// ---------------------------------------------------------------------------
// Schedule upkeep
// ---------------------------------------------------------------------------

fn open_period<R: Rng>(
    schedule: &mut DemandSchedule,
    shipping_week: u32,
    week: u32,
    config: &DemandConfig,
    rng: &mut R,
) -> SimResult<()> {
    for product in ProductLine::ALL {
        let forecast =
            generate_forecast(product, shipping_week, shipping_week.saturating_sub(week), config, rng)?;
        schedule.forecasts.push(forecast);
    }
    Ok(())
}

/// Open the first `forecast_periods_ahead` periods from `week` on.
/// A schedule that already has forecasts is left alone.
pub fn initialize_schedule<R: Rng>(
    schedule: &mut DemandSchedule,
    week: u32,
    game: &GameConfig,
    config: &DemandConfig,
    rng: &mut R,
) -> SimResult<()> {
    if schedule.is_initialized() {
        return Ok(());
    }
    let first = next_shipping_week(week, game.shipping_frequency);
    for period in 0..game.forecast_periods_ahead {
        open_period(schedule, first + period * game.shipping_frequency, week, config, rng)?;
    }
    log::debug!("demand schedule opened at week {}: {:?}", week, schedule.shipping_weeks());
    Ok(())
}

/// Re-derive spread and estimate for `week`. Periods due this week are
/// revealed.
pub fn refresh_forecasts<R: Rng>(
    schedule: &mut DemandSchedule,
    week: u32,
    config: &DemandConfig,
    rng: &mut R,
) -> SimResult<()> {
    for forecast in &mut schedule.forecasts {
        let weeks_out = forecast.shipping_week.saturating_sub(week);
        forecast.weeks_until_shipping = weeks_out;
        forecast.std_dev = config.std_dev(weeks_out);
        if weeks_out == 0 {
            forecast.estimate = forecast.actual;
            forecast.revealed = true;
        } else {
            forecast.estimate = draw_estimate(forecast.actual, forecast.std_dev, rng)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shipping
// ---------------------------------------------------------------------------

/// Result of filling demand on a shipping week.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingOutcome {
    pub week: u32,
    pub lines: Vec<ShipmentLine>,
}

impl ShippingOutcome {
    pub fn shipped(&self) -> PerLine {
        let mut out = PerLine::default();
        for line in &self.lines {
            out.add(line.product, line.shipped);
        }
        out
    }

    pub fn short(&self) -> PerLine {
        let mut out = PerLine::default();
        for line in &self.lines {
            out.add(line.product, line.short);
        }
        out
    }

    pub fn total_demand(&self) -> f64 {
        self.lines.iter().map(|l| l.total_demand).sum()
    }

    pub fn total_shipped(&self) -> f64 {
        self.lines.iter().map(|l| l.shipped).sum()
    }
}

/// Work out what ships from `available_products`. Nothing is changed;
/// the caller moves the stock and then calls [`apply_shipping_outcome`].
pub fn process_shipping_week(
    schedule: &DemandSchedule,
    week: u32,
    available_products: PerLine,
) -> SimResult<ShippingOutcome> {
    let mut lines = Vec::with_capacity(3);
    for product in ProductLine::ALL {
        let forecast = schedule.forecast(product, week).ok_or_else(|| {
            SimError::consistency(
                "demand_schedule",
                format!("no open {} forecast for shipping week {}", product.product_label(), week),
            )
        })?;
        let carryover_in = schedule.carryover.get(product);
        let total_demand = forecast.actual + carryover_in;
        let shipped = total_demand.min(available_products.get(product).max(0.0));
        lines.push(ShipmentLine {
            product,
            actual_demand: forecast.actual,
            carryover_in,
            total_demand,
            shipped,
            short: total_demand - shipped,
        });
    }
    Ok(ShippingOutcome { week, lines })
}

/// Carry the shortfall forward, close the shipped period, and open the
/// next one so the horizon stays the same length.
pub fn apply_shipping_outcome<R: Rng>(
    schedule: &mut DemandSchedule,
    outcome: &ShippingOutcome,
    game: &GameConfig,
    config: &DemandConfig,
    rng: &mut R,
) -> SimResult<()> {
    schedule.carryover = outcome.short();
    schedule.forecasts.retain(|f| f.shipping_week != outcome.week);

    let last = schedule
        .forecasts
        .iter()
        .map(|f| f.shipping_week)
        .max()
        .unwrap_or(outcome.week);
    open_period(schedule, last + game.shipping_frequency, outcome.week, config, rng)
}

/// Outlook for the nearest open period, one row per product.
pub fn demand_lines(schedule: &DemandSchedule) -> Vec<DemandLine> {
    let Some(&week) = schedule.shipping_weeks().first() else {
        return Vec::new();
    };
    ProductLine::ALL
        .iter()
        .filter_map(|&product| schedule.forecast(product, week))
        .map(|f| {
            let carryover = schedule.carryover.get(f.product);
            DemandLine {
                product: f.product,
                shipping_week: f.shipping_week,
                weeks_until_shipping: f.weeks_until_shipping,
                estimated_demand: f.visible_demand(),
                std_dev: f.std_dev,
                carryover,
                total_demand: f.visible_demand() + carryover,
            }
        })
        .collect()
}
