use thiserror::Error;

use crate::parser::{ParseError, Token};

/// Failures that abort a lineage run.
#[derive(Debug, Error)]
pub enum LineageError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Malformed input: {message}\n  near '{text}'")]
    MalformedInput { message: String, text: String },

    #[error("Table '{table}' declares {declared} column aliases but its query produces {produced}")]
    AliasCountMismatch {
        table: String,
        declared: usize,
        produced: usize,
    },
}

impl LineageError {
    pub fn malformed(message: &str, token: &Token) -> Self {
        Self::MalformedInput {
            message: message.to_string(),
            text: token.value.trim().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LineageError>;

#[cfg(test)]
mod tests {
    use crate::lineage::LineageError;
    use crate::parser::{ParseError, Token, TokenKind};

    #[test]
    pub fn test_parse_error_is_wrapped() {
        let error: LineageError = ParseError::new("Unexpected character", 2, 3, "a @ b").into();

        assert!(matches!(error, LineageError::Parse(_)));
        assert!(error.to_string().starts_with("ParseError: Unexpected character"));
    }

    #[test]
    pub fn test_malformed_keeps_token_text() {
        let token = Token::leaf(TokenKind::Name, " t1.k ");

        let error = LineageError::malformed("Comparison without operator", &token);

        match error {
            LineageError::MalformedInput { message, text } => {
                assert_eq!(message, "Comparison without operator");
                assert_eq!(text, "t1.k");
            },
            _ => panic!(),
        }
    }

    #[test]
    pub fn test_alias_count_message() {
        let error = LineageError::AliasCountMismatch {
            table: "cte".to_string(),
            declared: 2,
            produced: 1,
        };

        assert_eq!(
            error.to_string(),
            "Table 'cte' declares 2 column aliases but its query produces 1"
        );
    }
}
