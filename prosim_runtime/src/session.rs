//! Session manager: one isolated game per session.
//!
//! Each session owns its company, a decision log and periodic snapshots.
//! Concurrency: a Mutex per session serializes weeks, no global mutable state.
//!
//! Apply-before-record order:
//!   1. engine.process_week on a clone of the company
//!   2. the decision log grows only if step 1 succeeded
//!   3. snapshot if the interval is reached

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use prosim_engine::engine::week_seed;
use prosim_engine::hashing::{canonical_company_hash, canonical_report_hash};
use prosim_engine::validation::ValidationReport;
use prosim_engine::{Company, Decisions, Simulation, SimulationConfig, WeeklyReport};

use crate::error::{RuntimeError, RuntimeResult};
use crate::replay::{self, WeekRecord};
use crate::snapshot::{self, SnapshotStore};

/// An isolated game session with its own decision log and snapshots.
#[derive(Debug, Clone)]
pub struct GameSession {
    session_id: String,
    simulation: Simulation,
    company: Company,
    base_seed: u64,
    history: Vec<WeekRecord>,
    snapshots: SnapshotStore,
}

impl GameSession {
    /// Start a fresh company. `snapshot_interval = 0` disables snapshots.
    pub fn new(
        session_id: &str,
        config: SimulationConfig,
        company_id: u32,
        base_seed: u64,
        snapshot_interval: u32,
    ) -> RuntimeResult<Self> {
        let simulation = Simulation::new(config)?;
        let company = simulation.create_company(company_id);
        log::info!("session {} opened for company {} (seed {})", session_id, company_id, base_seed);
        Ok(Self {
            session_id: session_id.to_string(),
            simulation,
            company,
            base_seed,
            history: Vec::new(),
            snapshots: SnapshotStore::new(snapshot_interval),
        })
    }

    /// Play one week. On any error the session is left exactly as it was.
    pub fn submit_week(&mut self, decisions: &Decisions) -> RuntimeResult<WeeklyReport> {
        let seed = week_seed(self.base_seed, decisions.week);
        let (report, next) = self
            .simulation
            .process_week(self.company.clone(), decisions, Some(seed))?;
        let report_hash = canonical_report_hash(&report)?;

        let snap = if self.snapshots.is_due(next.current_week()) {
            Some(snapshot::take_snapshot(&next)?)
        } else {
            None
        };

        self.history.push(WeekRecord {
            week: report.week,
            decisions: decisions.clone(),
            seed,
            report_hash,
        });
        self.company = next;
        if let Some(snap) = snap {
            log::debug!("session {} snapshot at week {}", self.session_id, snap.week);
            self.snapshots.insert(snap);
        }
        Ok(report)
    }

    /// Dry-run validation against the current company.
    pub fn preview(&self, decisions: &Decisions) -> ValidationReport {
        self.simulation.validate(&self.company, decisions)
    }

    /// Rebuild from the latest snapshot plus the decision log tail.
    /// Falls back to a full replay when no snapshot exists.
    pub fn restore(&self) -> RuntimeResult<Company> {
        match self.snapshots.latest() {
            Some(snap) => {
                let base = snapshot::restore_snapshot(snap)?;
                let tail: Vec<WeekRecord> = self
                    .history
                    .iter()
                    .filter(|r| r.week > snap.week)
                    .cloned()
                    .collect();
                replay::replay_from(&self.simulation, base, &tail)
            }
            None => replay::rebuild_company(self.simulation.config(), self.company.company_id, &self.history)
                .map(|(company, _)| company),
        }
    }

    /// Replay the whole log and check it lands on the live company.
    pub fn verify_replay(&self) -> RuntimeResult<String> {
        let live = self.current_hash()?;
        let (_, rebuilt) =
            replay::rebuild_company(self.simulation.config(), self.company.company_id, &self.history)?;
        if rebuilt != live {
            return Err(RuntimeError::Drift(format!(
                "session {}: replay hash {} != live hash {}",
                self.session_id, rebuilt, live
            )));
        }
        Ok(live)
    }

    pub fn current_hash(&self) -> RuntimeResult<String> {
        Ok(canonical_company_hash(&self.company)?)
    }

    pub fn current_week(&self) -> u32 {
        self.company.current_week()
    }

    pub fn is_game_over(&self) -> bool {
        self.simulation.is_game_over(&self.company)
    }

    pub fn company(&self) -> &Company {
        &self.company
    }

    pub fn history(&self) -> &[WeekRecord] {
        &self.history
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &SimulationConfig {
        self.simulation.config()
    }
}

/// Thread-safe wrapper around a GameSession.
#[derive(Debug)]
pub struct SharedSession {
    inner: Mutex<GameSession>,
}

impl SharedSession {
    pub fn new(session: GameSession) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    fn lock(&self) -> RuntimeResult<MutexGuard<'_, GameSession>> {
        self.inner.lock().map_err(|_| RuntimeError::Poisoned)
    }

    pub fn submit_week(&self, decisions: &Decisions) -> RuntimeResult<WeeklyReport> {
        self.lock()?.submit_week(decisions)
    }

    pub fn preview(&self, decisions: &Decisions) -> RuntimeResult<ValidationReport> {
        Ok(self.lock()?.preview(decisions))
    }

    pub fn current_hash(&self) -> RuntimeResult<String> {
        self.lock()?.current_hash()
    }

    pub fn current_week(&self) -> RuntimeResult<u32> {
        Ok(self.lock()?.current_week())
    }

    /// Clone of the company for read-only use.
    pub fn company(&self) -> RuntimeResult<Company> {
        Ok(self.lock()?.company().clone())
    }

    pub fn with_session<T>(&self, f: impl FnOnce(&GameSession) -> T) -> RuntimeResult<T> {
        Ok(f(&*self.lock()?))
    }
}

/// Sessions keyed by id, all sharing one configuration.
#[derive(Debug)]
pub struct SessionRegistry {
    config: SimulationConfig,
    snapshot_interval: u32,
    sessions: Mutex<BTreeMap<String, Arc<SharedSession>>>,
}

impl SessionRegistry {
    pub fn new(config: SimulationConfig, snapshot_interval: u32) -> RuntimeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            snapshot_interval,
            sessions: Mutex::new(BTreeMap::new()),
        })
    }

    /// Existing session, or a new one for `company_id` seeded with `base_seed`.
    pub fn get_or_create(&self, session_id: &str, company_id: u32, base_seed: u64) -> RuntimeResult<Arc<SharedSession>> {
        let mut sessions = self.sessions.lock().map_err(|_| RuntimeError::Poisoned)?;
        if let Some(existing) = sessions.get(session_id) {
            return Ok(Arc::clone(existing));
        }
        let session = GameSession::new(
            session_id,
            self.config.clone(),
            company_id,
            base_seed,
            self.snapshot_interval,
        )?;
        let shared = Arc::new(SharedSession::new(session));
        sessions.insert(session_id.to_string(), Arc::clone(&shared));
        Ok(shared)
    }

    pub fn get(&self, session_id: &str) -> RuntimeResult<Option<Arc<SharedSession>>> {
        let sessions = self.sessions.lock().map_err(|_| RuntimeError::Poisoned)?;
        Ok(sessions.get(session_id).cloned())
    }

    pub fn remove(&self, session_id: &str) -> RuntimeResult<Option<Arc<SharedSession>>> {
        let mut sessions = self.sessions.lock().map_err(|_| RuntimeError::Poisoned)?;
        Ok(sessions.remove(session_id))
    }

    pub fn session_ids(&self) -> RuntimeResult<Vec<String>> {
        let sessions = self.sessions.lock().map_err(|_| RuntimeError::Poisoned)?;
        Ok(sessions.keys().cloned().collect())
    }
}
