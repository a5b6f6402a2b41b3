pub mod attribute;
pub use attribute::*;

pub mod table;
pub use table::*;

pub mod table_registry;
pub use table_registry::*;

pub mod lineage_error;
pub use lineage_error::*;

pub mod config;
pub use config::*;

pub mod clause_context;
pub use clause_context::*;

pub mod extractors;
pub use extractors::*;

pub mod with_element;
pub use with_element::*;

pub mod dispatcher;
pub use dispatcher::*;

pub mod interpreter;
pub use interpreter::*;

pub mod report;
pub use report::*;


/// Builds the lineage graph of every statement in `sql`.
pub fn analyze(sql: &str) -> Result<TableRegistry> {
    analyze_with_config(sql, LineageConfig::default())
}

pub fn analyze_with_config(sql: &str, config: LineageConfig) -> Result<TableRegistry> {
    let mut interpreter = StatementInterpreter::new(config);
    interpreter.process_sql(sql)?;
    Ok(interpreter.into_registry())
}
