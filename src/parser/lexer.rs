use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::{is_literal_word, keyword_kind, KeywordKind, ParseError, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq)]
enum LexRule {
    Comment,
    Whitespace,
    Literal,
    QuotedName,
    Keyword,
    ComparisonOperator,
    Operator,
    Wildcard,
    Punctuation,
    Word,
}

// First match wins, so multi-word keywords must precede plain words and
// comments must precede the `-` and `/` operators.
static LEX_RULES: Lazy<Vec<(Regex, LexRule)>> = Lazy::new(|| {
    [
        (r"^(?:--|#)[^\r\n]*(?:\r\n|\r|\n)?", LexRule::Comment),
        (r"^/\*[\s\S]*?\*/", LexRule::Comment),
        (r"^\s+", LexRule::Whitespace),
        (r"^'(?:''|\\[\s\S]|[^'\\])*'", LexRule::Literal),
        (r#"^"(?:""|[^"])*""#, LexRule::QuotedName),
        (r"^`[^`]*`", LexRule::QuotedName),
        (r"^(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?", LexRule::Literal),
        (
            r"(?i)^(?:GROUP\s+BY|ORDER\s+BY|PARTITION\s+BY|UNION\s+ALL|NOT\s+NULL|(?:NATURAL\s+)?(?:(?:LEFT|RIGHT|FULL)(?:\s+OUTER)?\s+|INNER\s+|CROSS\s+)?JOIN)\b",
            LexRule::Keyword,
        ),
        (r"(?i)^(?:NOT\s+)?I?LIKE\b", LexRule::ComparisonOperator),
        (r"^(?:<>|!=|<=|>=|==|=|<|>)", LexRule::ComparisonOperator),
        (r"^(?:\|\||::|[+\-/%])", LexRule::Operator),
        (r"^(?:\?|\$\d+|:[A-Za-z_]\w*)", LexRule::Literal),
        (r"^\*", LexRule::Wildcard),
        (r"^[(),;.]", LexRule::Punctuation),
        (r"^[\p{L}_][\w$]*", LexRule::Word),
    ]
    .into_iter()
    .map(|(pattern, rule)| (Regex::new(pattern).expect("lexer pattern must compile"), rule))
    .collect()
});

pub struct Lexer;

impl Lexer {
    /// Splits `sql` into a flat list of leaf tokens.
    pub fn tokenize(sql: &str) -> Result<Vec<Token>, ParseError> {
        let mut tokens = vec![];
        let mut position = 0;

        while position < sql.len() {
            let rest = &sql[position..];

            if rest.starts_with("/*") && !rest[2..].contains("*/") {
                return ParseError::new("Unterminated comment", position, sql.len(), sql).err();
            }

            let matched = LEX_RULES
                .iter()
                .find_map(|(regex, rule)| regex.find(rest).map(|found| (*rule, found.end())));

            let Some((rule, length)) = matched else {
                let current = rest.chars().next().unwrap_or_default();
                let message = match current {
                    '\'' => "Unterminated string literal",
                    '"' | '`' => "Unterminated quoted identifier",
                    _ => "Unexpected character",
                };
                return ParseError::new(message, position, position + current.len_utf8(), sql).err();
            };

            let text = &rest[..length];
            let follows_dot = rest[length..].starts_with('.');
            tokens.push(Self::classify(rule, text, follows_dot));
            position += length;
        }

        Ok(tokens)
    }

    fn classify(rule: LexRule, text: &str, follows_dot: bool) -> Token {
        let kind = match rule {
            LexRule::Comment => TokenKind::Comment,
            LexRule::Whitespace => TokenKind::Whitespace,
            LexRule::Literal => TokenKind::Literal,
            LexRule::QuotedName => TokenKind::Name,
            LexRule::Keyword => TokenKind::Keyword(KeywordKind::Generic),
            LexRule::ComparisonOperator => TokenKind::ComparisonOperator,
            LexRule::Operator => TokenKind::Operator,
            LexRule::Wildcard => TokenKind::Wildcard,
            LexRule::Punctuation => TokenKind::Punctuation,
            LexRule::Word if follows_dot => TokenKind::Name,
            LexRule::Word if is_literal_word(text) => TokenKind::Literal,
            LexRule::Word => keyword_kind(text).map_or(TokenKind::Name, TokenKind::Keyword),
        };

        Token::leaf(kind, text)
    }
}
