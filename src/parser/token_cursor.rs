use crate::parser::Token;

/// Forward cursor over a slice of sibling tokens.
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pub position: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, position: 0 }
    }

    pub fn eof(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    pub fn peek(&self, ahead: usize) -> Option<&'a Token> {
        self.tokens.get(self.position + ahead)
    }

    /// Moves past ignorable tokens and returns the next significant one,
    /// leaving the cursor right after it.
    pub fn advance(&mut self, skip_whitespace: bool, skip_comments: bool) -> Option<&'a Token> {
        self.skip_ignorable(skip_whitespace, skip_comments);
        let token = self.current()?;
        self.position += 1;
        Some(token)
    }

    /// Next significant token without moving the cursor.
    pub fn peek_significant(&self, skip_whitespace: bool, skip_comments: bool) -> Option<&'a Token> {
        self.tokens[self.position.min(self.tokens.len())..]
            .iter()
            .find(|token| !token.is_skippable(skip_whitespace, skip_comments))
    }

    pub fn skip_ignorable(&mut self, skip_whitespace: bool, skip_comments: bool) {
        while let Some(token) = self.current() {
            if !token.is_skippable(skip_whitespace, skip_comments) {
                break;
            }
            self.position += 1;
        }
    }

    pub fn remaining(&self) -> &'a [Token] {
        &self.tokens[self.position.min(self.tokens.len())..]
    }
}

impl<'a> Iterator for TokenCursor<'a> {
    type Item = &'a Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.current()?;
        self.position += 1;
        Some(token)
    }
}
