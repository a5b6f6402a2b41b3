use crate::lineage::{Attribute, AttributeExtractor, LineageError, NewTable, Result, StatementInterpreter, TableId};
use crate::parser::{Token, TokenKind};

/// One entry of a WITH clause: `name [(col, ...)] [AS] (subquery) [comment]`.
#[derive(Debug, Clone, PartialEq)]
pub struct WithElement<'a> {
    pub name: String,
    pub column_aliases: Vec<String>,
    pub body: &'a Token,
    pub comment: Option<String>,
}

impl<'a> WithElement<'a> {
    pub fn parse(node: &'a Token) -> Result<Self> {
        let mut cursor = node.cursor();
        let Some(head) = cursor.advance(true, true) else {
            return Err(LineageError::malformed("Empty WITH entry", node));
        };

        let (name, column_aliases, mut body) = match head.kind {
            TokenKind::Function => Self::parse_function_head(head),
            _ => (AttributeExtractor::parse_name_and_alias(head).0, vec![], None),
        };

        if body.is_none() {
            body = cursor.find(|token| token.kind == TokenKind::Parenthesis);
        }
        let Some(body) = body else {
            return Err(LineageError::malformed("WITH entry without a parenthesized query", node));
        };

        let comment = node
            .children
            .iter()
            .rev()
            .find(|child| child.is_comment())
            .map(|child| child.value.trim().to_string());

        Ok(Self {
            name,
            column_aliases,
            body,
            comment,
        })
    }

    /// `cte(a, b)` declares column aliases, `cte(SELECT ...)` is a body
    /// written without `AS`.
    fn parse_function_head(head: &'a Token) -> (String, Vec<String>, Option<&'a Token>) {
        let mut name = String::new();
        let mut parenthesis = None;
        for child in &head.children {
            match child.kind {
                TokenKind::Parenthesis => {
                    parenthesis = Some(child);
                    break;
                },
                TokenKind::Whitespace | TokenKind::Comment => {},
                _ => name.push_str(&child.value),
            }
        }

        match parenthesis {
            Some(parenthesis) if parenthesis.is_subselect() => (name, vec![], Some(parenthesis)),
            Some(parenthesis) => (name, Self::column_aliases(parenthesis), None),
            None => (name, vec![], None),
        }
    }

    fn column_aliases(parenthesis: &Token) -> Vec<String> {
        parenthesis
            .children
            .iter()
            .filter(|child| !child.is_skippable(true, true) && !child.is_punctuation())
            .flat_map(|child| match child.kind {
                TokenKind::IdentifierList => child
                    .children
                    .iter()
                    .filter(|item| !item.is_skippable(true, true) && !item.is_punctuation())
                    .collect::<Vec<_>>(),
                _ => vec![child],
            })
            .map(|alias| alias.value.trim().to_string())
            .collect()
    }

    /// Registers the CTE table and reads its query into it.
    pub fn process(
        interpreter: &mut StatementInterpreter,
        node: &Token,
        pending_comment: &str,
    ) -> Result<TableId> {
        let element = WithElement::parse(node)?;

        let attributes = element
            .column_aliases
            .iter()
            .map(|alias| Attribute::placeholder(alias.as_str()))
            .collect::<Vec<_>>();
        let aliases_known = !attributes.is_empty();
        let comment = element.comment.as_deref().unwrap_or(pending_comment);
        let source_sql = if interpreter.config().capture_source_sql {
            node.value.trim()
        } else {
            ""
        };

        let id = interpreter.registry_mut().create(
            NewTable::named(&element.name)
                .with_attributes(attributes)
                .with_comment(comment)
                .with_source_sql(source_sql),
        );

        interpreter.interpret(element.body, Some(id), aliases_known)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::lineage::{LineageError, WithElement};
    use crate::parser::{SqlParser, Token, TokenKind};

    fn with_entry(sql: &str) -> Token {
        let statement = SqlParser::parse(sql)
            .expect("Failed to parse")
            .into_iter()
            .next()
            .expect("Failed to find statement");
        statement
            .children
            .into_iter()
            .find(|child| child.kind == TokenKind::Identifier)
            .expect("Failed to find WITH entry")
    }

    #[test]
    pub fn test_parse_with_column_aliases() {
        let entry = with_entry("WITH cte(a, b) AS (SELECT col1, col2 FROM t) SELECT * FROM cte");

        let element = WithElement::parse(&entry).expect("Failed to parse WITH entry");

        assert_eq!(element.name, "cte");
        assert_eq!(element.column_aliases, vec!["a".to_string(), "b".to_string()]);
        assert!(element.body.is_subselect());
        assert!(element.comment.is_none());
    }

    #[test]
    pub fn test_parse_plain_entry_with_comment() {
        let entry = with_entry("WITH recent AS (SELECT id FROM orders) -- last week\nSELECT * FROM recent");

        let element = WithElement::parse(&entry).expect("Failed to parse WITH entry");

        assert_eq!(element.name, "recent");
        assert!(element.column_aliases.is_empty());
        assert_eq!(element.comment.as_deref(), Some("-- last week"));
    }

    #[test]
    pub fn test_parse_entry_without_body() {
        let entry = Token::group(TokenKind::Identifier, vec![Token::leaf(TokenKind::Name, "cte")]);

        match WithElement::parse(&entry) {
            Ok(_) => panic!(),
            Err(LineageError::MalformedInput { message, .. }) => {
                assert_eq!(message, "WITH entry without a parenthesized query");
            },
            Err(_) => panic!(),
        }
    }
}
