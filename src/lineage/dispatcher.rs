use tracing::trace;

use crate::lineage::{
    Attribute, AttributeExtractor, ClauseContext, NameTemplate, NewTable, Result,
    StatementInterpreter, TableId, WithElement,
};
use crate::parser::{Token, TokenKind};

/// What a token turned into, given the clause it was read in.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    AttributeList(Vec<Attribute>),
    SourceRef { name: String, alias: Option<String> },
    NestedTable(TableId),
    ConditionList(Vec<Attribute>),
    None,
}

pub struct TokenDispatcher;

impl TokenDispatcher {
    /// Identifier lists are expanded element-wise. A SELECT list always comes
    /// back as a single `AttributeList` and ON conditions as a single
    /// `ConditionList`; FROM/JOIN yield one result per source.
    pub fn dispatch(
        interpreter: &mut StatementInterpreter,
        token: &Token,
        context: ClauseContext,
        last_comment: &str,
    ) -> Result<Vec<Dispatched>> {
        trace!(%context, kind = ?token.kind, text = token.value.trim(), "dispatching token");
        let items = Self::expand(token);

        match context {
            ClauseContext::Select => {
                let attributes = items.into_iter().map(Self::select_attribute).collect();
                Ok(vec![Dispatched::AttributeList(attributes)])
            },
            ClauseContext::From | ClauseContext::Join => items
                .into_iter()
                .map(|item| Self::source(interpreter, item))
                .collect(),
            ClauseContext::With => {
                for item in items {
                    WithElement::process(interpreter, item, last_comment)?;
                }
                Ok(vec![Dispatched::None])
            },
            ClauseContext::On => {
                let mut conditions = vec![];
                for item in items {
                    conditions.extend(AttributeExtractor::parse_condition_list(item)?);
                }
                Ok(vec![Dispatched::ConditionList(conditions)])
            },
            ClauseContext::None => Ok(vec![Dispatched::None]),
        }
    }

    /// An ON operand read together with the siblings that follow it
    /// (`a.k IS NULL`, `b.x IN (1, 2)`). Also returns how many siblings the
    /// condition used.
    pub fn dispatch_on_operand(token: &Token, following: &[Token]) -> (Dispatched, usize) {
        trace!(kind = ?token.kind, text = token.value.trim(), "dispatching ON operand");
        let (condition, consumed) = AttributeExtractor::parse_keyword_condition(token, following);
        (Dispatched::ConditionList(condition.into_iter().collect()), consumed)
    }

    fn expand(token: &Token) -> Vec<&Token> {
        match token.kind {
            TokenKind::IdentifierList => token
                .children
                .iter()
                .filter(|child| !child.is_skippable(true, true) && !child.is_punctuation())
                .collect(),
            _ => vec![token],
        }
    }

    fn select_attribute(item: &Token) -> Attribute {
        if item.kind == TokenKind::Wildcard {
            return Attribute::new("*");
        }
        let (name, alias) = AttributeExtractor::parse_name_and_alias(item);
        Attribute::aliased(name, alias)
    }

    fn source(interpreter: &mut StatementInterpreter, item: &Token) -> Result<Dispatched> {
        let (name, alias) = AttributeExtractor::parse_name_and_alias(item);

        let Some(subselect) = Self::subselect(item) else {
            return Ok(Dispatched::SourceRef { name, alias });
        };

        let id = interpreter
            .registry_mut()
            .create(NewTable::templated(NameTemplate::Select).with_alias(alias));
        interpreter.interpret(subselect, Some(id), false)?;
        Ok(Dispatched::NestedTable(id))
    }

    /// `(SELECT ...)`, bare or aliased.
    fn subselect(item: &Token) -> Option<&Token> {
        if item.is_subselect() {
            return Some(item);
        }
        if item.kind != TokenKind::Identifier {
            return None;
        }
        item.first_child(true, true)
            .map(|(_, child)| child)
            .filter(|child| child.is_subselect())
    }
}

#[cfg(test)]
mod tests {
    use crate::lineage::{Attribute, ClauseContext, Dispatched, StatementInterpreter, TokenDispatcher};
    use crate::parser::{KeywordKind, SqlParser, Token, TokenKind};

    fn significant(sql: &str) -> Vec<Token> {
        let statement = SqlParser::parse(sql)
            .expect("Failed to parse")
            .into_iter()
            .next()
            .expect("Failed to find statement");
        statement
            .children
            .into_iter()
            .filter(|child| !child.is_whitespace() && !child.is_punctuation())
            .collect()
    }

    #[test]
    pub fn test_dispatch_select_list() {
        let tokens = significant("SELECT a, b AS c, *");
        let mut interpreter = StatementInterpreter::default();

        let result = TokenDispatcher::dispatch(&mut interpreter, &tokens[1], ClauseContext::Select, "")
            .expect("Failed to dispatch");

        assert_eq!(result, vec![Dispatched::AttributeList(vec![
            Attribute::new("a"),
            Attribute::aliased("b", Some("c".to_string())),
            Attribute::new("*"),
        ])]);
    }

    #[test]
    pub fn test_dispatch_from_list() {
        let tokens = significant("SELECT * FROM a x, b");
        let mut interpreter = StatementInterpreter::default();

        let result = TokenDispatcher::dispatch(&mut interpreter, &tokens[3], ClauseContext::From, "")
            .expect("Failed to dispatch");

        assert_eq!(result, vec![
            Dispatched::SourceRef { name: "a".to_string(), alias: Some("x".to_string()) },
            Dispatched::SourceRef { name: "b".to_string(), alias: None },
        ]);
        assert!(interpreter.registry().is_empty());
    }

    #[test]
    pub fn test_dispatch_nested_select() {
        let tokens = significant("SELECT * FROM (SELECT id FROM t) AS s");
        let mut interpreter = StatementInterpreter::default();

        let result = TokenDispatcher::dispatch(&mut interpreter, &tokens[3], ClauseContext::From, "")
            .expect("Failed to dispatch");

        assert_eq!(result, vec![Dispatched::NestedTable(0)]);
        let nested = interpreter.registry().find_by_id(0).expect("Failed to find table");
        assert_eq!(nested.name(), "select-1");
        assert!(nested.aliases().contains("s"));
        assert_eq!(nested.attributes(), &[Attribute::new("id")]);
        assert_eq!(nested.linked_to_tables_id(), &[1]);
    }

    #[test]
    pub fn test_dispatch_on_condition() {
        let tokens = significant("SELECT * FROM a JOIN b ON a.id = b.id");
        let mut interpreter = StatementInterpreter::default();

        let result = TokenDispatcher::dispatch(&mut interpreter, &tokens[7], ClauseContext::On, "")
            .expect("Failed to dispatch");

        assert_eq!(result, vec![Dispatched::ConditionList(vec![
            Attribute::with_condition("a.id", "=", "b.id"),
        ])]);
    }

    #[test]
    pub fn test_dispatch_on_operand() {
        let tokens = significant("SELECT * FROM a JOIN b ON a.k IS NULL");

        let (result, consumed) = TokenDispatcher::dispatch_on_operand(&tokens[7], &[
            Token::leaf(TokenKind::Whitespace, " "),
            Token::leaf(TokenKind::Keyword(KeywordKind::Generic), "IS"),
            Token::leaf(TokenKind::Whitespace, " "),
            Token::leaf(TokenKind::Literal, "NULL"),
        ]);

        assert_eq!(result, Dispatched::ConditionList(vec![
            Attribute::with_condition("a.k", "IS", "NULL"),
        ]));
        assert_eq!(consumed, 4);
    }

    #[test]
    pub fn test_dispatch_without_context() {
        let token = Token::leaf(TokenKind::Literal, "10");
        let mut interpreter = StatementInterpreter::default();

        let result = TokenDispatcher::dispatch(&mut interpreter, &token, ClauseContext::None, "")
            .expect("Failed to dispatch");

        assert_eq!(result, vec![Dispatched::None]);
    }
}
