use std::fmt::Display;

use tracing::debug;

use crate::lineage::{Attribute, Table, TableId};

/// Prefix of generated table names, each with its own counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTemplate {
    Select,
    Join,
    Table,
}

impl Display for NameTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameTemplate::Select => f.write_str("select"),
            NameTemplate::Join => f.write_str("join"),
            NameTemplate::Table => f.write_str("table"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TableName {
    Named(String),
    Templated(NameTemplate),
}

/// Everything needed to register a table.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTable {
    name: TableName,
    alias: Option<String>,
    attributes: Vec<Attribute>,
    comment: String,
    source_sql: String,
}

impl NewTable {
    fn from_name(name: TableName) -> Self {
        Self {
            name,
            alias: None,
            attributes: vec![],
            comment: String::new(),
            source_sql: String::new(),
        }
    }

    pub fn named(name: &str) -> Self {
        Self::from_name(TableName::Named(name.to_string()))
    }

    pub fn templated(template: NameTemplate) -> Self {
        Self::from_name(TableName::Templated(template))
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    pub fn with_source_sql(mut self, source_sql: &str) -> Self {
        self.source_sql = source_sql.to_string();
        self
    }
}

/// Append-only arena of every table discovered during one run.
///
/// Ids are positions in the arena, so they run `0..len()` in creation order
/// and are never reused. Each name template keeps its own counter starting
/// at 1 (`select-1`, `join-1`, `table-1`).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TableRegistry {
    tables: Vec<Table>,
    select_counter: usize,
    join_counter: usize,
    table_counter: usize,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, new_table: NewTable) -> TableId {
        let id = self.tables.len();
        let name = match new_table.name {
            TableName::Named(name) => name,
            TableName::Templated(template) => {
                let counter = self.next_counter(template);
                format!("{template}-{counter}")
            },
        };

        let mut table = Table::new(id, name);
        if let Some(alias) = &new_table.alias {
            table.add_alias(alias);
        }
        table.append_attributes(new_table.attributes);
        table.set_comment(new_table.comment);
        table.set_source_sql(new_table.source_sql);

        debug!(id, name = table.name(), "table created");
        self.tables.push(table);
        id
    }

    fn next_counter(&mut self, template: NameTemplate) -> usize {
        let counter = match template {
            NameTemplate::Select => &mut self.select_counter,
            NameTemplate::Join => &mut self.join_counter,
            NameTemplate::Table => &mut self.table_counter,
        };
        *counter += 1;
        *counter
    }

    pub fn find_by_id(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id)
    }

    pub fn find_by_id_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.get_mut(id)
    }

    /// First table whose name or one of whose aliases equals `text`.
    pub fn find_by_name_or_alias(&self, text: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.is_known_as(text))
    }

    /// Adds the edge `from -> to`. Returns `false` when either table is
    /// unknown or the edge already exists.
    pub fn link(&mut self, from: TableId, to: TableId) -> bool {
        if self.find_by_id(to).is_none() {
            return false;
        }
        let Some(table) = self.find_by_id_mut(from) else {
            return false;
        };

        let linked = table.link_to_table_id(to);
        if linked {
            debug!(from, to, "tables linked");
        }
        linked
    }

    pub fn add_alias(&mut self, id: TableId, alias: &str) -> bool {
        let Some(table) = self.find_by_id_mut(id) else {
            return false;
        };

        let added = table.add_alias(alias);
        if added {
            debug!(id, alias, "alias attached");
        }
        added
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.tables)
    }
}
