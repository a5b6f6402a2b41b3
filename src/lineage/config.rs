#[derive(Debug, Clone, PartialEq)]
pub struct LineageConfig {
    /// Drop comments before grouping. Only `comment` fields are affected.
    pub strip_comments: bool,
    /// Record the SQL each table was built from.
    pub capture_source_sql: bool,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            strip_comments: false,
            capture_source_sql: true,
        }
    }
}

impl LineageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(strip_comments: bool, capture_source_sql: bool) -> Self {
        Self {
            strip_comments,
            capture_source_sql,
        }
    }

    pub fn without_comments() -> Self {
        Self {
            strip_comments: true,
            ..Self::default()
        }
    }

    pub fn graph_only() -> Self {
        Self {
            strip_comments: true,
            capture_source_sql: false,
        }
    }
}
