pub mod parse_error;
pub use parse_error::*;

pub mod keywords;
pub use keywords::*;

pub mod token;
pub use token::*;

pub mod token_cursor;
pub use token_cursor::*;

pub mod lexer;
pub use lexer::*;

pub mod grouping;
pub use grouping::*;

pub mod sql_parser;
pub use sql_parser::*;
