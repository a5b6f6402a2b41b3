use indexmap::IndexSet;
use serde::Serialize;

use crate::lineage::Attribute;

pub type TableId = usize;

/// A table-like node of the lineage graph: a base table, a CTE, a sub-select
/// or a synthetic join result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    id: TableId,
    name: String,
    aliases: IndexSet<String>,
    attributes: Vec<Attribute>,
    comment: String,
    source_sql: String,
    linked_to_tables_id: Vec<TableId>,
}

impl Table {
    pub fn new(id: TableId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            aliases: IndexSet::new(),
            attributes: vec![],
            comment: String::new(),
            source_sql: String::new(),
            linked_to_tables_id: vec![],
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &IndexSet<String> {
        &self.aliases
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn source_sql(&self) -> &str {
        &self.source_sql
    }

    /// Ids of the tables this one reads from.
    pub fn linked_to_tables_id(&self) -> &[TableId] {
        &self.linked_to_tables_id
    }

    pub fn is_known_as(&self, text: &str) -> bool {
        self.name == text || self.aliases.contains(text)
    }

    /// Returns `false` when the alias is the table's own name or is already known.
    pub fn add_alias(&mut self, alias: &str) -> bool {
        if alias.is_empty() || alias == self.name {
            return false;
        }
        self.aliases.insert(alias.to_string())
    }

    /// Returns `false` when the edge already exists.
    pub fn link_to_table_id(&mut self, id: TableId) -> bool {
        if self.linked_to_tables_id.contains(&id) {
            return false;
        }
        self.linked_to_tables_id.push(id);
        true
    }

    /// Merges attributes: a match (see [`Attribute::is_same_as`]) takes the
    /// incoming condition, anything else is appended.
    pub fn update_attributes(&mut self, attributes: Vec<Attribute>) {
        for attribute in attributes {
            match self.attributes.iter_mut().find(|existing| existing.is_same_as(&attribute)) {
                Some(existing) => existing.condition = attribute.condition,
                None => self.attributes.push(attribute),
            }
        }
    }

    /// Appends only the attributes no existing one matches. Existing
    /// conditions are left alone.
    pub(crate) fn merge_attributes(&mut self, attributes: Vec<Attribute>) {
        for attribute in attributes {
            if !self.attributes.iter().any(|existing| existing.is_same_as(&attribute)) {
                self.attributes.push(attribute);
            }
        }
    }

    pub(crate) fn append_attributes(&mut self, attributes: Vec<Attribute>) {
        self.attributes.extend(attributes);
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Vec<Attribute> {
        &mut self.attributes
    }

    pub(crate) fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    pub(crate) fn set_source_sql(&mut self, source_sql: impl Into<String>) {
        self.source_sql = source_sql.into();
    }
}

#[cfg(test)]
mod tests {
    use crate::lineage::{Attribute, Table};

    #[test]
    pub fn test_add_alias_is_idempotent() {
        let mut table = Table::new(0, "orders");

        assert!(table.add_alias("o"));
        assert!(!table.add_alias("o"));
        assert_eq!(table.aliases().len(), 1);
        assert!(table.is_known_as("o"));
        assert!(table.is_known_as("orders"));
    }

    #[test]
    pub fn test_alias_never_equals_name() {
        let mut table = Table::new(0, "orders");

        assert!(!table.add_alias("orders"));
        assert!(table.aliases().is_empty());
    }

    #[test]
    pub fn test_duplicate_link_is_rejected() {
        let mut table = Table::new(0, "select-1");

        assert!(table.link_to_table_id(3));
        assert!(!table.link_to_table_id(3));
        assert!(table.link_to_table_id(1));
        assert_eq!(table.linked_to_tables_id(), &[3, 1]);
    }

    #[test]
    pub fn test_update_attributes_merges_condition() {
        let mut table = Table::new(0, "select-1");
        table.append_attributes(vec![Attribute::aliased("x", Some("y".to_string()))]);

        table.update_attributes(vec![Attribute::with_condition("y", "=", "1")]);

        assert_eq!(table.attributes().len(), 1);
        assert_eq!(table.attributes()[0].name, "x");
        assert_eq!(table.attributes()[0].alias.as_deref(), Some("y"));
        assert_eq!(table.attributes()[0].condition.as_deref(), Some("= 1"));
    }

    #[test]
    pub fn test_merge_attributes_keeps_existing() {
        let mut table = Table::new(0, "select-1");
        table.append_attributes(vec![Attribute::with_condition("a", "=", "1")]);

        table.merge_attributes(vec![Attribute::new("a"), Attribute::new("b")]);

        assert_eq!(table.attributes().len(), 2);
        assert_eq!(table.attributes()[0].condition.as_deref(), Some("= 1"));
        assert_eq!(table.attributes()[1].name, "b");
    }

    #[test]
    pub fn test_update_attributes_appends_unknown() {
        let mut table = Table::new(0, "select-1");
        table.append_attributes(vec![Attribute::new("a")]);

        table.update_attributes(vec![
            Attribute::with_condition("b", ">", "2"),
            Attribute::with_condition("a", "<", "5"),
        ]);

        assert_eq!(table.attributes().len(), 2);
        assert_eq!(table.attributes()[0].condition.as_deref(), Some("< 5"));
        assert_eq!(table.attributes()[1].name, "b");
    }
}
