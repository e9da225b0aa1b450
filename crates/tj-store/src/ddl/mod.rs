//! Column manifests for every journal table.
//!
//! Migration steps and the bootstrap initializer both render their DDL from
//! these definitions, so a fresh database and an upgraded one end up with the
//! same columns in the same order. A table whose shape changes gets a new
//! column segment plus a new step, never an in-place edit of a released
//! segment.

mod tables;

pub use tables::*;

/// A single column: its name and the rest of its declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub decl: &'static str,
}

/// Shorthand constructor used by the manifest tables.
pub(crate) const fn col(name: &'static str, decl: &'static str) -> ColumnDef {
    ColumnDef { name, decl }
}

/// A table definition built from ordered column segments.
///
/// Segments let a step reference exactly the columns it introduced while the
/// full shape stays the concatenation of all segments.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub segments: &'static [&'static [ColumnDef]],
    pub constraints: &'static [&'static str],
}

impl TableDef {
    /// All columns in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &'static ColumnDef> {
        self.segments.iter().flat_map(|segment| segment.iter())
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().map(|c| c.name).collect()
    }

    /// `CREATE TABLE IF NOT EXISTS` under the canonical name.
    pub fn create_if_absent_sql(&self) -> String {
        self.render(self.name, true)
    }

    /// `CREATE TABLE` under another name, for rebuild scratch tables.
    pub fn create_as_sql(&self, name: &str) -> String {
        self.render(name, false)
    }

    fn render(&self, name: &str, if_not_exists: bool) -> String {
        let body: Vec<String> = self
            .columns()
            .map(|c| format!("    {} {}", c.name, c.decl))
            .chain(self.constraints.iter().map(|c| format!("    {c}")))
            .collect();
        format!(
            "CREATE TABLE {}{name} (\n{}\n)",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            body.join(",\n")
        )
    }
}
