use std::fmt::Display;

use serde::Serialize;

/// Name given to attributes declared through a CTE column list until the
/// CTE's SELECT tells what they hold.
pub const PENDING_ATTRIBUTE_NAME: &str = "?";

/// A column (or expression) produced by a table, with an optional filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub alias: Option<String>,
    /// Rendered as `"<OPERATOR> <value>"`, operator upper-cased.
    pub condition: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn aliased(name: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            name: name.into(),
            alias,
            condition: None,
        }
    }

    pub fn with_condition(name: impl Into<String>, operator: &str, value: &str) -> Self {
        let operator = operator.to_uppercase();
        let condition = if value.is_empty() {
            operator
        } else {
            format!("{operator} {value}")
        };

        Self {
            name: name.into(),
            alias: None,
            condition: Some(condition),
        }
    }

    pub fn placeholder(alias: impl Into<String>) -> Self {
        Self::aliased(PENDING_ATTRIBUTE_NAME, Some(alias.into()))
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == PENDING_ATTRIBUTE_NAME
    }

    /// Two attributes describe the same column when a name or alias of one
    /// matches a name or alias of the other.
    pub fn is_same_as(&self, other: &Attribute) -> bool {
        self.name == other.name
            || other.alias.as_deref() == Some(self.name.as_str())
            || self.alias.as_deref() == Some(other.name.as_str())
            || (self.alias.is_some() && self.alias == other.alias)
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {alias}")?;
        }
        if let Some(condition) = &self.condition {
            write!(f, " {condition}")?;
        }
        Ok(())
    }
}
