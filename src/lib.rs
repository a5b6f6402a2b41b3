pub mod parser;
pub use parser::{ParseError, SqlParser, Token, TokenKind};

pub mod lineage;
pub use lineage::{
    analyze, analyze_with_config, Attribute, LineageConfig, LineageError, LineageReport,
    StatementInterpreter, Table, TableId, TableRegistry,
};
