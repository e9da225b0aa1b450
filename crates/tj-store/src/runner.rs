//! Ordered application and reversal of migration steps.
//!
//! Every step runs in its own transaction together with its ledger row, so a
//! failed step leaves the database exactly at the previous version. There is
//! no transaction spanning several steps: re-running `migrate` resumes from
//! the last committed version.

use crate::connection::JournalDb;
use crate::error::{StoreError, StoreResult};
use crate::ledger::{self, LedgerEntry};
use crate::step::{MigrationRegistry, StepContext, StepInfo};
use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use std::time::Instant;

/// Source of `applied_at` timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub static SYSTEM_CLOCK: SystemClock = SystemClock;

/// Result of [`MigrationRunner::migrate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// The requested target was not above the current version.
    AlreadyCurrent { version: u32 },
    Migrated {
        from: u32,
        to: u32,
        applied: Vec<u32>,
        /// Versions in range with no registered step.
        skipped: Vec<u32>,
    },
}

impl MigrationOutcome {
    /// Version the database is at after the call.
    pub fn version(&self) -> u32 {
        match self {
            MigrationOutcome::AlreadyCurrent { version } => *version,
            MigrationOutcome::Migrated { to, .. } => *to,
        }
    }
}

/// Result of [`MigrationRunner::rollback`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RollbackOutcome {
    NothingToRollBack { version: u32 },
    RolledBack {
        from: u32,
        to: u32,
        /// Reverted versions, in the order they were undone.
        reverted: Vec<u32>,
    },
}

impl RollbackOutcome {
    pub fn version(&self) -> u32 {
        match self {
            RollbackOutcome::NothingToRollBack { version } => *version,
            RollbackOutcome::RolledBack { to, .. } => *to,
        }
    }
}

/// Snapshot of the ledger against the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationStatus {
    pub current_version: u32,
    pub latest_version: u32,
    pub needs_migration: bool,
    pub pending_steps: Vec<StepInfo>,
    pub applied_history: Vec<LedgerEntry>,
}

/// Applies registry steps to one database.
pub struct MigrationRunner<'a> {
    db: &'a JournalDb,
    registry: &'a MigrationRegistry,
    clock: &'a dyn Clock,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(db: &'a JournalDb, registry: &'a MigrationRegistry) -> Self {
        Self {
            db,
            registry,
            clock: &SYSTEM_CLOCK,
        }
    }

    /// Replace the clock used for `applied_at`.
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Apply pending steps up to `target`, or up to the latest registered
    /// step when `target` is `None`.
    ///
    /// Stops at the first failing step; versions applied before it stay
    /// committed.
    pub fn migrate(&self, target: Option<u32>) -> StoreResult<MigrationOutcome> {
        let conn = self.db.conn();
        ledger::ensure_exists(conn)?;
        let current = ledger::current_version(conn)?;
        let latest = self.registry.latest_version();

        if current > latest {
            log::warn!(
                "Database is at v{current:03}, newer than the latest known step v{latest:03}"
            );
        }

        let target = match target {
            Some(requested) if requested > latest => {
                log::warn!(
                    "Requested v{requested:03} is above the latest step v{latest:03}, migrating to v{latest:03}"
                );
                latest
            }
            Some(requested) => requested,
            None => latest,
        };

        if target <= current {
            log::info!("Schema is already at v{current:03}");
            return Ok(MigrationOutcome::AlreadyCurrent { version: current });
        }

        let mut previous = ledger::latest_applied_at(conn)?;
        let mut applied = Vec::new();
        let mut skipped = Vec::new();

        for version in current + 1..=target {
            let Some(step) = self.registry.get(version) else {
                log::warn!("No migration step registered for v{version:03}, skipping");
                skipped.push(version);
                continue;
            };

            log::info!("Applying migration v{version:03}: {}", step.description());
            let applied_at = self.db.transaction(|conn| {
                let started = Instant::now();
                step.apply(&StepContext::new(conn))
                    .map_err(|e| StoreError::in_step(version, e))?;
                let elapsed = started.elapsed();
                let applied_at = self.stamp(previous);
                ledger::record(conn, version, step.description(), applied_at, elapsed)?;
                log::debug!("v{version:03} took {:.3}s", elapsed.as_secs_f64());
                Ok(applied_at)
            })?;

            previous = Some(applied_at);
            applied.push(version);
        }

        let to = ledger::current_version(conn)?;
        log::info!("Migrated schema from v{current:03} to v{to:03}");
        Ok(MigrationOutcome::Migrated {
            from: current,
            to,
            applied,
            skipped,
        })
    }

    /// Revert applied steps above `target`, newest first.
    ///
    /// A `target` at or above the current version is a successful no-op.
    pub fn rollback(&self, target: u32) -> StoreResult<RollbackOutcome> {
        let conn = self.db.conn();
        let current = ledger::current_version(conn)?;
        if target >= current {
            log::info!("Nothing to roll back: schema is at v{current:03}");
            return Ok(RollbackOutcome::NothingToRollBack { version: current });
        }

        let mut to_revert = ledger::applied_versions(conn)?;
        to_revert.retain(|&v| v > target);
        to_revert.reverse();

        let mut reverted = Vec::new();
        for version in to_revert {
            let step = self
                .registry
                .get(version)
                .ok_or(StoreError::Irreversible { version })?;

            log::info!("Reverting migration v{version:03}: {}", step.description());
            self.db.transaction(|conn| {
                step.revert(&StepContext::new(conn))
                    .map_err(|e| StoreError::in_step(version, e))?;
                ledger::forget(conn, version)
            })?;
            reverted.push(version);
        }

        let to = ledger::current_version(conn)?;
        log::info!("Rolled schema back from v{current:03} to v{to:03}");
        Ok(RollbackOutcome::RolledBack {
            from: current,
            to,
            reverted,
        })
    }

    /// Read-only view of where the database stands. Creates nothing.
    pub fn status(&self) -> StoreResult<MigrationStatus> {
        let conn = self.db.conn();
        let current_version = ledger::current_version(conn)?;
        let pending_steps = self.registry.pending_after(current_version);
        Ok(MigrationStatus {
            current_version,
            latest_version: self.registry.latest_version(),
            needs_migration: !pending_steps.is_empty(),
            pending_steps,
            applied_history: ledger::history(conn)?,
        })
    }

    /// Current time at ledger precision, forced past `previous` so that
    /// `applied_at` strictly increases even when the clock stalls or steps
    /// backwards.
    fn stamp(&self, previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let now = self.clock.now().trunc_subsecs(6);
        match previous {
            Some(prev) if now <= prev => prev + chrono::Duration::microseconds(1),
            _ => now,
        }
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
