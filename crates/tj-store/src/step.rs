//! Migration step abstraction and the step registry.

use crate::error::{StoreError, StoreResult};
use crate::introspect;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

/// Handle a step receives while its transaction is open.
///
/// Steps reach the database only through this context, so every schema
/// decision goes through the same introspection queries.
pub struct StepContext<'c> {
    conn: &'c Connection,
}

impl<'c> StepContext<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Column names of `table`, empty if it does not exist.
    pub fn list_columns(&self, table: &str) -> StoreResult<Vec<String>> {
        introspect::list_columns(self.conn, table)
    }

    pub fn table_exists(&self, table: &str) -> StoreResult<bool> {
        introspect::table_exists(self.conn, table)
    }

    pub fn row_count(&self, table: &str) -> StoreResult<i64> {
        introspect::table_row_count(self.conn, table)
    }

    /// Run one or more DDL/DML statements.
    pub fn execute_batch(&self, sql: &str) -> StoreResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| StoreError::QueryError(format!("{e} while executing: {}", first_line(sql))))
    }
}

fn first_line(sql: &str) -> &str {
    sql.trim().lines().next().unwrap_or_default()
}

/// A column a step renamed. Rows exported before the step still carry the
/// old name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRename {
    pub table: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

/// A numbered, described schema transformation.
///
/// Once a step has shipped its `apply` must never change; schema changes go
/// into a new step with the next version number.
pub trait MigrationStep: Send + Sync {
    /// Positive version number, unique within a registry.
    fn version(&self) -> u32;

    fn description(&self) -> &'static str;

    /// Upgrade from `version() - 1` to `version()`.
    fn apply(&self, ctx: &StepContext<'_>) -> StoreResult<()>;

    /// Best-effort downgrade. Values in dropped columns or tables are lost.
    fn revert(&self, _ctx: &StepContext<'_>) -> StoreResult<()> {
        Err(StoreError::Irreversible {
            version: self.version(),
        })
    }

    /// Columns this step renames.
    fn column_renames(&self) -> &'static [ColumnRename] {
        &[]
    }
}

/// Version and description of a registered step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepInfo {
    pub version: u32,
    pub description: String,
}

impl StepInfo {
    fn of(step: &dyn MigrationStep) -> Self {
        Self {
            version: step.version(),
            description: step.description().to_string(),
        }
    }
}

/// Immutable map from version to step, built once at process start.
pub struct MigrationRegistry {
    steps: BTreeMap<u32, Box<dyn MigrationStep>>,
}

impl MigrationRegistry {
    /// Build a registry, rejecting version 0 and duplicate versions.
    ///
    /// Gaps in the numbering are accepted but logged: the runner skips the
    /// missing versions with a warning.
    pub fn new(steps: Vec<Box<dyn MigrationStep>>) -> StoreResult<Self> {
        let mut map: BTreeMap<u32, Box<dyn MigrationStep>> = BTreeMap::new();
        for step in steps {
            let version = step.version();
            if version == 0 {
                return Err(StoreError::RegistryError(format!(
                    "step '{}' uses reserved version 0",
                    step.description()
                )));
            }
            if let Some(existing) = map.get(&version) {
                return Err(StoreError::RegistryError(format!(
                    "v{version:03} registered twice ('{}' and '{}')",
                    existing.description(),
                    step.description()
                )));
            }
            map.insert(version, step);
        }

        let registry = Self { steps: map };
        let gaps = registry.gaps();
        if !gaps.is_empty() {
            log::warn!("Migration registry has gaps at versions {gaps:?}");
        }
        Ok(registry)
    }

    /// The journal's built-in steps.
    pub fn builtin() -> StoreResult<Self> {
        Self::new(crate::steps::builtin_steps())
    }

    pub fn get(&self, version: u32) -> Option<&dyn MigrationStep> {
        self.steps.get(&version).map(|s| s.as_ref())
    }

    /// Highest registered version, 0 when empty.
    pub fn latest_version(&self) -> u32 {
        self.steps.keys().next_back().copied().unwrap_or(0)
    }

    /// Registered steps with a version above `version`, ascending.
    pub fn pending_after(&self, version: u32) -> Vec<StepInfo> {
        self.steps
            .range(version.saturating_add(1)..)
            .map(|(_, step)| StepInfo::of(step.as_ref()))
            .collect()
    }

    /// Versions between 1 and the latest that have no step.
    pub fn gaps(&self) -> Vec<u32> {
        (1..=self.latest_version())
            .filter(|v| !self.steps.contains_key(v))
            .collect()
    }

    /// Renames made by steps above `version`, in step order.
    pub fn renames_after(&self, version: u32) -> Vec<ColumnRename> {
        self.steps
            .range(version.saturating_add(1)..)
            .flat_map(|(_, step)| step.column_renames().iter().copied())
            .collect()
    }
}

#[cfg(test)]
#[path = "step_test.rs"]
mod tests;
