use crate::lineage::{Attribute, LineageError, Result};
use crate::parser::{Token, TokenKind, AND, AS, BETWEEN, OR};

/// Pure readers turning token subtrees into attributes.
pub struct AttributeExtractor;

impl AttributeExtractor {
    /// `name [AS] alias`. Only identifiers are split; any other node is a
    /// name made of its whole text.
    pub fn parse_name_and_alias(token: &Token) -> (String, Option<String>) {
        if token.kind != TokenKind::Identifier {
            return (token.value.trim().to_string(), None);
        }

        let mut cursor = token.cursor();
        let mut name = String::new();
        while let Some(child) = cursor.current() {
            if child.is_whitespace() || (child.is_comment() && !name.is_empty()) {
                break;
            }
            if !child.is_comment() {
                name.push_str(&child.value);
            }
            cursor.position += 1;
        }

        cursor.skip_ignorable(true, true);
        if cursor.current().is_some_and(|child| child.is_keyword_of(AS)) {
            cursor.position += 1;
            cursor.skip_ignorable(true, true);
        }

        let mut alias = String::new();
        while let Some(child) = cursor.current() {
            if child.is_whitespace() || child.is_comment() || child.is_keyword() {
                break;
            }
            alias.push_str(&child.value);
            cursor.position += 1;
        }

        let alias = (!alias.is_empty()).then_some(alias);
        (name, alias)
    }

    /// `left <op> right` into `Attribute { name: left, condition: "<OP> right" }`.
    pub fn parse_comparison(token: &Token) -> Result<Attribute> {
        let Some(operator) = token
            .children
            .iter()
            .position(|child| child.kind == TokenKind::ComparisonOperator)
        else {
            return Err(LineageError::malformed("Comparison without an operator", token));
        };

        let text = |tokens: &[Token]| -> String {
            tokens.iter().map(|child| child.value.as_str()).collect::<String>().trim().to_string()
        };

        let name = text(&token.children[..operator]);
        let value = text(&token.children[operator + 1..]);
        if name.is_empty() {
            return Err(LineageError::malformed("Comparison without a left operand", token));
        }

        Ok(Attribute::with_condition(
            name,
            &token.children[operator].normalized(),
            &value,
        ))
    }

    /// Flat list of the conditions found in a WHERE clause, a parenthesized
    /// group or a single comparison. AND/OR are not modelled.
    pub fn parse_condition_list(token: &Token) -> Result<Vec<Attribute>> {
        match token.kind {
            TokenKind::Comparison => Ok(vec![Self::parse_comparison(token)?]),
            TokenKind::Where | TokenKind::Parenthesis if !token.is_subselect() => {
                Self::parse_children(&token.children)
            },
            _ => Ok(vec![]),
        }
    }

    fn parse_children(children: &[Token]) -> Result<Vec<Attribute>> {
        let mut conditions = vec![];
        let mut index = 0;

        while index < children.len() {
            let child = &children[index];
            index += 1;

            match child.kind {
                TokenKind::Comparison => conditions.push(Self::parse_comparison(child)?),
                TokenKind::Parenthesis if !child.is_subselect() => {
                    conditions.extend(Self::parse_children(&child.children)?);
                },
                TokenKind::Identifier | TokenKind::Name => {
                    let (condition, consumed) = Self::parse_keyword_condition(child, &children[index..]);
                    if let Some(condition) = condition {
                        conditions.push(condition);
                        index += consumed;
                    }
                },
                _ => {},
            }
        }

        Ok(conditions)
    }

    /// `x IS NULL`, `x IN (...)`, `x BETWEEN 1 AND 2`: an operand followed by a
    /// keyword and a run of keywords and values. Returns the condition and the
    /// number of sibling tokens it used.
    pub fn parse_keyword_condition(operand: &Token, rest: &[Token]) -> (Option<Attribute>, usize) {
        let starts_with_operator = rest
            .iter()
            .find(|token| !token.is_skippable(true, true))
            .is_some_and(|token| token.is_keyword() && !Self::is_connective(token));
        if !starts_with_operator {
            return (None, 0);
        }

        let mut parts: Vec<String> = vec![];
        let mut consumed = 0;
        let mut between_open = false;

        for (index, token) in rest.iter().enumerate() {
            if token.is_skippable(true, true) {
                continue;
            }

            let part = match token.kind {
                TokenKind::Keyword(_) if token.is_keyword_of(AND) && between_open => {
                    between_open = false;
                    token.normalized()
                },
                TokenKind::Keyword(_) if Self::is_connective(token) => break,
                TokenKind::Keyword(_) => {
                    between_open |= token.is_keyword_of(BETWEEN);
                    token.normalized()
                },
                TokenKind::Literal
                | TokenKind::Parenthesis
                | TokenKind::Operation
                | TokenKind::Identifier
                | TokenKind::Name
                | TokenKind::Function => token.value.trim().to_string(),
                _ => break,
            };

            parts.push(part);
            consumed = index + 1;
        }

        let (operator, value) = match parts.split_first() {
            Some((operator, value)) => (operator.clone(), value.join(" ")),
            None => return (None, 0),
        };

        let name = operand.value.trim().to_string();
        (Some(Attribute::with_condition(name, &operator, &value)), consumed)
    }

    fn is_connective(token: &Token) -> bool {
        token.is_keyword_of(AND) || token.is_keyword_of(OR)
    }
}

#[cfg(test)]
mod tests {
    use crate::lineage::{AttributeExtractor, LineageError};
    use crate::parser::{SqlParser, Token, TokenKind};

    fn statement(sql: &str) -> Token {
        SqlParser::parse(sql)
            .expect("Failed to parse")
            .into_iter()
            .next()
            .expect("Failed to find statement")
    }

    fn first_of_kind(token: &Token, kind: TokenKind) -> Token {
        token
            .children
            .iter()
            .find(|child| child.kind == kind)
            .cloned()
            .expect("Failed to find token")
    }

    #[test]
    pub fn test_name_and_alias_with_as() {
        let stmt = statement("SELECT o.amount AS total");
        let identifier = first_of_kind(&stmt, TokenKind::Identifier);

        let (name, alias) = AttributeExtractor::parse_name_and_alias(&identifier);

        assert_eq!(name, "o.amount");
        assert_eq!(alias.as_deref(), Some("total"));
    }

    #[test]
    pub fn test_name_and_alias_without_as() {
        let stmt = statement("SELECT * FROM orders o");
        let identifier = first_of_kind(&stmt, TokenKind::Identifier);

        let (name, alias) = AttributeExtractor::parse_name_and_alias(&identifier);

        assert_eq!(name, "orders");
        assert_eq!(alias.as_deref(), Some("o"));
    }

    #[test]
    pub fn test_name_without_alias() {
        let stmt = statement("SELECT * FROM sales.orders");
        let identifier = first_of_kind(&stmt, TokenKind::Identifier);

        let (name, alias) = AttributeExtractor::parse_name_and_alias(&identifier);

        assert_eq!(name, "sales.orders");
        assert!(alias.is_none());
    }

    #[test]
    pub fn test_function_alias() {
        let stmt = statement("SELECT count(*) AS n");
        let identifier = first_of_kind(&stmt, TokenKind::Identifier);

        let (name, alias) = AttributeExtractor::parse_name_and_alias(&identifier);

        assert_eq!(name, "count(*)");
        assert_eq!(alias.as_deref(), Some("n"));
    }

    #[test]
    pub fn test_leaf_is_its_own_name() {
        let (name, alias) = AttributeExtractor::parse_name_and_alias(&Token::leaf(TokenKind::Literal, "1"));

        assert_eq!(name, "1");
        assert!(alias.is_none());
    }

    #[test]
    pub fn test_parse_comparison() {
        let stmt = statement("SELECT * FROM a JOIN b ON a.k like b.k");
        let comparison = first_of_kind(&stmt, TokenKind::Comparison);

        let attribute = AttributeExtractor::parse_comparison(&comparison).expect("Failed to parse comparison");

        assert_eq!(attribute.name, "a.k");
        assert_eq!(attribute.condition.as_deref(), Some("LIKE b.k"));
    }

    #[test]
    pub fn test_parse_comparison_without_operator() {
        let broken = Token::group(TokenKind::Comparison, vec![Token::leaf(TokenKind::Name, "a")]);

        match AttributeExtractor::parse_comparison(&broken) {
            Ok(_) => panic!(),
            Err(LineageError::MalformedInput { text, .. }) => assert_eq!(text, "a"),
            Err(_) => panic!(),
        }
    }

    #[test]
    pub fn test_parse_where_conditions() {
        let stmt = statement(
            "SELECT * FROM t WHERE a = 1 AND b IS NOT NULL OR c IN (1, 2) AND d BETWEEN 3 AND 4 ORDER BY a",
        );
        let where_clause = first_of_kind(&stmt, TokenKind::Where);

        let conditions = AttributeExtractor::parse_condition_list(&where_clause).expect("Failed to parse conditions");

        let rendered: Vec<_> = conditions
            .iter()
            .map(|attribute| (attribute.name.as_str(), attribute.condition.as_deref().unwrap_or_default()))
            .collect();
        assert_eq!(rendered, vec![
            ("a", "= 1"),
            ("b", "IS NOT NULL"),
            ("c", "IN (1, 2)"),
            ("d", "BETWEEN 3 AND 4"),
        ]);
    }

    #[test]
    pub fn test_nested_groups_are_flattened() {
        let stmt = statement("SELECT * FROM t WHERE (a = 1 OR (b <> 2))");
        let where_clause = first_of_kind(&stmt, TokenKind::Where);

        let conditions = AttributeExtractor::parse_condition_list(&where_clause).expect("Failed to parse conditions");

        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[1].name, "b");
        assert_eq!(conditions[1].condition.as_deref(), Some("<> 2"));
    }

    #[test]
    pub fn test_keyword_condition_reports_used_siblings() {
        let stmt = statement("SELECT * FROM a JOIN b ON b.x NOT IN (1, 2) AND a.y = 1");
        let position = stmt
            .children
            .iter()
            .position(|child| child.value == "b.x")
            .expect("Failed to find operand");

        let (condition, consumed) = AttributeExtractor::parse_keyword_condition(
            &stmt.children[position],
            &stmt.children[position + 1..],
        );

        let condition = condition.expect("Failed to read condition");
        assert_eq!(condition.name, "b.x");
        assert_eq!(condition.condition.as_deref(), Some("NOT IN (1, 2)"));
        assert_eq!(consumed, 6);
        assert!(stmt.children[position + consumed + 2].is_keyword_of("AND"));
    }

    #[test]
    pub fn test_other_nodes_yield_nothing() {
        let conditions = AttributeExtractor::parse_condition_list(&Token::leaf(TokenKind::Name, "a"))
            .expect("Failed to parse conditions");

        assert!(conditions.is_empty());
    }
}
