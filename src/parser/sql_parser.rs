use crate::parser::{Grouper, Lexer, ParseError, Token, TokenKind};

/// Produces one `Statement` token tree per SQL statement in the input.
pub struct SqlParser;

impl SqlParser {
    pub fn parse(sql: &str) -> Result<Vec<Token>, ParseError> {
        Self::parse_with(sql, false)
    }

    pub fn parse_with(sql: &str, strip_comments: bool) -> Result<Vec<Token>, ParseError> {
        let tokens = Lexer::tokenize(sql)?;
        let mut tokens = Grouper::group_parenthesis(tokens, sql)?;

        if strip_comments {
            tokens = Grouper::strip_comments(tokens);
        }

        Ok(Grouper::split_statements(tokens)
            .into_iter()
            .map(|statement| Token::group(TokenKind::Statement, Grouper::group(statement)))
            .collect())
    }
}
