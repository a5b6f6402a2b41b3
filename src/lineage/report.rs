use std::fmt::Display;

use crate::lineage::{Table, TableRegistry};

/// Plain-text rendering of a registry, one block per table with link
/// targets resolved to names.
pub struct LineageReport<'a> {
    registry: &'a TableRegistry,
}

impl<'a> LineageReport<'a> {
    pub fn new(registry: &'a TableRegistry) -> Self {
        Self { registry }
    }

    fn target_names(&self, table: &Table) -> Vec<&'a str> {
        table
            .linked_to_tables_id()
            .iter()
            .filter_map(|id| self.registry.find_by_id(*id))
            .map(|target| target.name())
            .collect()
    }
}

impl Display for LineageReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, table) in self.registry.tables().iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}] {}", table.id(), table.name())?;

            if !table.aliases().is_empty() {
                let aliases: Vec<&str> = table.aliases().iter().map(String::as_str).collect();
                writeln!(f, "  aliases: {}", aliases.join(", "))?;
            }
            if !table.comment().is_empty() {
                writeln!(f, "  comment: {}", table.comment())?;
            }
            if !table.attributes().is_empty() {
                writeln!(f, "  attributes:")?;
                for attribute in table.attributes() {
                    writeln!(f, "    - {attribute}")?;
                }
            }

            let targets = self.target_names(table);
            if !targets.is_empty() {
                writeln!(f, "  reads from: {}", targets.join(", "))?;
            }
            if !table.source_sql().is_empty() {
                let sql: Vec<&str> = table.source_sql().split_whitespace().collect();
                writeln!(f, "  sql: {}", sql.join(" "))?;
            }
        }
        Ok(())
    }
}
