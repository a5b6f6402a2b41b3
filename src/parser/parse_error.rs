use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl ParseError {
    /// `start` and `end` are byte offsets into `sql`.
    pub fn new(message: &str, start: usize, end: usize, sql: &str) -> Self {
        let end = end.min(sql.len());
        let start = start.min(end);
        Self {
            message: message.to_string(),
            text: sql.get(start..end).unwrap_or_default().to_string(),
            start,
            end,
        }
    }

    pub fn err<T>(self) -> Result<T, ParseError> {
        Err(self)
    }
}

impl Display for ParseError  {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(
                f,
                "ParseError: {}\n  at [{}:{}] -> '{}'",
                self.message,
                self.start,
                self.end,
                self.text
            )
    }
}

impl std::error::Error for ParseError {}
