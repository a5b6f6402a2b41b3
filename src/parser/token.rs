use std::fmt::Display;

use crate::parser::TokenCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
    Dml,
    Cte,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // leaves
    Whitespace,
    Comment,
    Punctuation,
    Keyword(KeywordKind),
    Name,
    Wildcard,
    Literal,
    Operator,
    ComparisonOperator,

    // groups
    Statement,
    Identifier,
    IdentifierList,
    Parenthesis,
    Where,
    Comparison,
    Function,
    Operation,
    Case,
}

impl TokenKind {
    pub fn is_group(&self) -> bool {
        matches!(
            self,
            TokenKind::Statement
                | TokenKind::Identifier
                | TokenKind::IdentifierList
                | TokenKind::Parenthesis
                | TokenKind::Where
                | TokenKind::Comparison
                | TokenKind::Function
                | TokenKind::Operation
                | TokenKind::Case
        )
    }

    /// Kinds that can stand on either side of an operator, a comparison or an alias.
    pub fn is_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Name
                | TokenKind::Identifier
                | TokenKind::Literal
                | TokenKind::Function
                | TokenKind::Parenthesis
                | TokenKind::Operation
                | TokenKind::Case
        )
    }
}

/// A node of the SQL token tree.
///
/// Leaves carry the literal text they were lexed from. Groups carry the
/// concatenated text of their children, so `value` always reproduces the
/// original SQL fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub children: Vec<Token>,
}

impl Token {
    pub fn leaf(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            children: vec![],
        }
    }

    pub fn group(kind: TokenKind, children: Vec<Token>) -> Self {
        Self {
            kind,
            value: children.iter().map(|child| child.value.as_str()).collect(),
            children,
        }
    }

    pub fn is_group(&self) -> bool {
        self.kind.is_group()
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    pub fn is_punctuation(&self) -> bool {
        self.kind == TokenKind::Punctuation
    }

    pub fn is_punctuation_of(&self, value: &str) -> bool {
        self.is_punctuation() && self.value == value
    }

    pub fn is_keyword(&self) -> bool {
        matches!(self.kind, TokenKind::Keyword(_))
    }

    pub fn is_dml(&self) -> bool {
        self.kind == TokenKind::Keyword(KeywordKind::Dml)
    }

    pub fn is_cte(&self) -> bool {
        self.kind == TokenKind::Keyword(KeywordKind::Cte)
    }

    /// Keyword whose normalized text equals `word` (expected upper-cased).
    pub fn is_keyword_of(&self, word: &str) -> bool {
        self.is_keyword() && self.normalized() == word
    }

    /// Upper-cased text with inner whitespace runs collapsed for keywords and
    /// operators, the raw text otherwise.
    pub fn normalized(&self) -> String {
        match self.kind {
            TokenKind::Keyword(_) | TokenKind::ComparisonOperator => self
                .value
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_uppercase(),
            _ => self.value.clone(),
        }
    }

    pub fn is_skippable(&self, skip_whitespace: bool, skip_comments: bool) -> bool {
        (skip_whitespace && self.is_whitespace()) || (skip_comments && self.is_comment())
    }

    /// Next child after index `after` (or the first child when `after` is `None`),
    /// optionally stepping over whitespace and comments.
    pub fn next_child(
        &self,
        after: Option<usize>,
        skip_whitespace: bool,
        skip_comments: bool,
    ) -> Option<(usize, &Token)> {
        let start = after.map_or(0, |index| index + 1);
        self.children
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, child)| !child.is_skippable(skip_whitespace, skip_comments))
    }

    pub fn first_child(&self, skip_whitespace: bool, skip_comments: bool) -> Option<(usize, &Token)> {
        self.next_child(None, skip_whitespace, skip_comments)
    }

    pub fn cursor(&self) -> TokenCursor<'_> {
        TokenCursor::new(&self.children)
    }

    /// True when a data-manipulation keyword (e.g. `SELECT`) sits directly
    /// inside this group, which is how sub-selects are told apart from
    /// plain parenthesized expressions.
    pub fn has_dml(&self) -> bool {
        self.children.iter().any(Token::is_dml)
    }

    pub fn is_subselect(&self) -> bool {
        self.kind == TokenKind::Parenthesis && self.has_dml()
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}
