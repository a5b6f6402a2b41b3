use tracing::{debug, warn};

use crate::lineage::{
    Attribute, AttributeExtractor, ClauseContext, Dispatched, LineageConfig, LineageError, NameTemplate, NewTable,
    Result, TableId, TableRegistry, TokenDispatcher,
};
use crate::parser::{
    SqlParser, Token, TokenKind, AND, FROM, GROUP_BY, JOIN, ON, OR, ORDER_BY, SELECT,
};

/// Walks statements left to right and records what they read into a
/// [`TableRegistry`]. One interpreter is one run: feed it as many SQL texts
/// as needed, then take the registry out.
#[derive(Debug, Default)]
pub struct StatementInterpreter {
    registry: TableRegistry,
    config: LineageConfig,
}

/// State local to one statement (or one parenthesized sub-statement).
#[derive(Debug, Default)]
struct StatementState {
    context: ClauseContext,
    enclosing: Option<TableId>,
    table: Option<TableId>,
    aliases_known: bool,
    last_comment: String,
    source_text: String,
    select_list_read: bool,
    last_join: Option<TableId>,
    join_anchor: Option<TableId>,
    on_pending: bool,
    on_matched: bool,
}

impl StatementState {
    fn new(enclosing: Option<TableId>, aliases_known: bool) -> Self {
        Self {
            enclosing,
            table: enclosing,
            aliases_known,
            ..Default::default()
        }
    }
}

impl StatementInterpreter {
    pub fn new(config: LineageConfig) -> Self {
        Self {
            registry: TableRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &LineageConfig {
        &self.config
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut TableRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> TableRegistry {
        self.registry
    }

    /// Parses `sql` and interprets every statement in it. The first failure
    /// stops the run; tables registered before it are kept.
    pub fn process_sql(&mut self, sql: &str) -> Result<()> {
        let statements = SqlParser::parse_with(sql, self.config.strip_comments)?;
        debug!(statements = statements.len(), "sql parsed");

        for statement in &statements {
            self.interpret(statement, None, false)?;
        }
        Ok(())
    }

    /// Interprets the children of `node` (a statement or a parenthesized
    /// sub-statement). `enclosing` receives the attributes and links found;
    /// without it every SELECT registers its own `select-N` table.
    /// `aliases_known` means `enclosing` already holds positional column
    /// aliases that the SELECT list must fill in.
    pub fn interpret(
        &mut self,
        node: &Token,
        enclosing: Option<TableId>,
        aliases_known: bool,
    ) -> Result<()> {
        let mut state = StatementState::new(enclosing, aliases_known);
        let mut cursor = node.cursor();

        while let Some(token) = cursor.next() {
            if token.is_keyword_of(SELECT) || Self::is_join(token) {
                state.source_text.clear();
            }
            state.source_text.push_str(&token.value);

            if token.is_whitespace() || token.is_punctuation() {
                continue;
            }

            if token.is_comment() {
                state.last_comment = token.value.trim().to_string();
                continue;
            }

            if token.is_keyword_of(GROUP_BY) || token.is_keyword_of(ORDER_BY) {
                state.on_matched = false;
                for skipped in cursor.by_ref() {
                    state.source_text.push_str(&skipped.value);
                    if !skipped.is_whitespace() {
                        break;
                    }
                }
                continue;
            }

            if token.kind == TokenKind::Where {
                self.merge_where(&mut state, token)?;
                continue;
            }

            if token.is_keyword() {
                self.transition(&mut state, token)?;
                continue;
            }

            let context = state.context;
            let dispatched = if context == ClauseContext::On
                && matches!(token.kind, TokenKind::Identifier | TokenKind::Name)
            {
                let following = cursor.remaining();
                let (dispatched, consumed) = TokenDispatcher::dispatch_on_operand(token, following);
                for used in &following[..consumed] {
                    state.source_text.push_str(&used.value);
                }
                cursor.position += consumed;
                vec![dispatched]
            } else {
                TokenDispatcher::dispatch(self, token, context, &state.last_comment)?
            };
            for dispatched in dispatched {
                self.wire(&mut state, dispatched, context)?;
            }

            state.on_matched = context == ClauseContext::On;
            if state.on_matched {
                state.on_pending = false;
            }
            state.context = ClauseContext::None;
        }

        if state.on_pending {
            return Err(LineageError::malformed("ON without a join condition", node));
        }

        self.finish_source_sql(&state);
        Ok(())
    }

    fn is_join(token: &Token) -> bool {
        token.is_keyword() && token.normalized().contains(JOIN)
    }

    fn transition(&mut self, state: &mut StatementState, token: &Token) -> Result<()> {
        if state.on_matched && (token.is_keyword_of(AND) || token.is_keyword_of(OR)) {
            state.context = ClauseContext::On;
            return Ok(());
        }
        state.on_matched = false;

        let next = if token.is_cte() {
            ClauseContext::With
        } else if token.is_keyword_of(SELECT) {
            ClauseContext::Select
        } else if token.is_keyword_of(FROM) {
            ClauseContext::From
        } else if Self::is_join(token) {
            ClauseContext::Join
        } else if token.is_keyword_of(ON) {
            ClauseContext::On
        } else {
            return Ok(());
        };

        Self::reject_open_on(state, token)?;
        match next {
            ClauseContext::Select => {
                if state.enclosing.is_none() {
                    state.table = Some(self.registry.create(NewTable::templated(NameTemplate::Select)));
                    state.select_list_read = false;
                }
                state.last_join = None;
                state.join_anchor = None;
            },
            ClauseContext::On => state.on_pending = true,
            _ => {},
        }

        state.context = next;
        debug!(context = %next, "clause");
        Ok(())
    }

    fn reject_open_on(state: &StatementState, token: &Token) -> Result<()> {
        if state.on_pending {
            return Err(LineageError::malformed("ON without a join condition", token));
        }
        Ok(())
    }

    fn merge_where(&mut self, state: &mut StatementState, token: &Token) -> Result<()> {
        Self::reject_open_on(state, token)?;
        state.on_matched = false;

        let conditions = AttributeExtractor::parse_condition_list(token)?;
        if conditions.is_empty() {
            return Ok(());
        }

        let table = self.ensure_table(state);
        if let Some(table) = self.registry.find_by_id_mut(table) {
            table.update_attributes(conditions);
        }
        Ok(())
    }

    fn wire(&mut self, state: &mut StatementState, dispatched: Dispatched, context: ClauseContext) -> Result<()> {
        match dispatched {
            Dispatched::AttributeList(attributes) => {
                let table = self.ensure_table(state);
                let first_list = !state.select_list_read;
                state.select_list_read = true;

                if state.aliases_known {
                    state.aliases_known = false;
                    return self.reconcile(table, attributes);
                }
                if let Some(table) = self.registry.find_by_id_mut(table) {
                    // later UNION branches describe the same columns
                    if first_list {
                        table.append_attributes(attributes);
                    } else {
                        table.merge_attributes(attributes);
                    }
                }
                Ok(())
            },
            Dispatched::ConditionList(conditions) => {
                let Some(join) = state.last_join.and_then(|join| self.registry.find_by_id_mut(join)) else {
                    warn!(conditions = conditions.len(), "ON conditions without a join to receive them");
                    return Ok(());
                };
                join.update_attributes(conditions);
                if self.config.capture_source_sql {
                    join.set_source_sql(state.source_text.trim());
                }
                Ok(())
            },
            Dispatched::SourceRef { name, alias } => {
                let source = match self.registry.find_by_name_or_alias(&name) {
                    Some(table) => table.id(),
                    None => self.registry.create(NewTable::named(&name)),
                };
                if let Some(alias) = alias {
                    self.registry.add_alias(source, &alias);
                }
                self.link_source(state, source, context);
                Ok(())
            },
            Dispatched::NestedTable(source) => {
                self.link_source(state, source, context);
                Ok(())
            },
            Dispatched::None => Ok(()),
        }
    }

    /// FROM links the current table to its source. JOIN puts a synthetic
    /// `join-N` table between the previous source and the joined one; later
    /// joins chain from that join table.
    fn link_source(&mut self, state: &mut StatementState, source: TableId, context: ClauseContext) {
        if context == ClauseContext::Join {
            let anchor = match state.join_anchor {
                Some(anchor) => anchor,
                None => self.ensure_table(state),
            };
            let join = self.registry.create(NewTable::templated(NameTemplate::Join));
            self.registry.link(anchor, join);
            self.registry.link(join, source);
            state.last_join = Some(join);
            state.join_anchor = Some(join);
            return;
        }

        let table = self.ensure_table(state);
        self.registry.link(table, source);
        state.join_anchor = Some(source);
    }

    /// Fills the placeholder attributes declared by a CTE column list, in order.
    fn reconcile(&mut self, table: TableId, produced: Vec<Attribute>) -> Result<()> {
        let Some(table) = self.registry.find_by_id_mut(table) else {
            return Ok(());
        };

        let declared = table.attributes().iter().filter(|attribute| attribute.is_placeholder()).count();
        if produced.len() < declared {
            return Err(LineageError::AliasCountMismatch {
                table: table.name().to_string(),
                declared,
                produced: produced.len(),
            });
        }

        let mut produced = produced.into_iter();
        let placeholders = table.attributes_mut().iter_mut().filter(|attribute| attribute.is_placeholder());
        for (existing, attribute) in placeholders.zip(produced.by_ref()) {
            existing.name = attribute.name;
            existing.condition = attribute.condition;
        }
        table.append_attributes(produced.collect());
        Ok(())
    }

    /// Statements without a SELECT (`DELETE FROM t WHERE ...`) get an
    /// anonymous `table-N` to hold their sources and conditions.
    fn ensure_table(&mut self, state: &mut StatementState) -> TableId {
        if let Some(table) = state.table {
            return table;
        }
        let table = self.registry.create(NewTable::templated(NameTemplate::Table));
        state.table = Some(table);
        table
    }

    fn finish_source_sql(&mut self, state: &StatementState) {
        if !self.config.capture_source_sql {
            return;
        }
        let Some(source_sql) = Self::select_source(&state.source_text) else {
            return;
        };
        if let Some(table) = state.table.and_then(|table| self.registry.find_by_id_mut(table)) {
            table.set_source_sql(source_sql);
        }
    }

    /// The accumulated text when it is a SELECT, without the statement
    /// terminator or the `)` closing a sub-select.
    fn select_source(text: &str) -> Option<String> {
        let text = text.trim();
        if !text.get(..SELECT.len()).is_some_and(|head| head.eq_ignore_ascii_case(SELECT)) {
            return None;
        }

        let mut text = text.strip_suffix(';').unwrap_or(text).trim_end();
        if text.matches(')').count() > text.matches('(').count() {
            text = text.strip_suffix(')').unwrap_or(text).trim_end();
        }
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::lineage::{LineageConfig, LineageError, StatementInterpreter};

    #[test]
    pub fn test_select_source_strips_terminators() {
        assert_eq!(
            StatementInterpreter::select_source("SELECT id FROM t;\n").as_deref(),
            Some("SELECT id FROM t")
        );
        assert_eq!(
            StatementInterpreter::select_source("select count(x) FROM t)").as_deref(),
            Some("select count(x) FROM t")
        );
        assert_eq!(
            StatementInterpreter::select_source("SELECT count(x) FROM t").as_deref(),
            Some("SELECT count(x) FROM t")
        );
        assert!(StatementInterpreter::select_source("JOIN b ON a.k = b.k").is_none());
        assert!(StatementInterpreter::select_source("").is_none());
    }

    #[test]
    pub fn test_process_sql_keeps_one_registry() {
        let mut interpreter = StatementInterpreter::new(LineageConfig::default());

        interpreter.process_sql("SELECT a FROM t").expect("Failed to process first text");
        interpreter.process_sql("SELECT b FROM t").expect("Failed to process second text");

        let registry = interpreter.into_registry();
        let names: Vec<_> = registry.tables().iter().map(|table| table.name()).collect();
        assert_eq!(names, vec!["select-1", "t", "select-2"]);
        assert_eq!(registry.tables()[2].linked_to_tables_id(), &[1]);
    }

    #[test]
    pub fn test_source_sql_can_be_disabled() {
        let mut interpreter = StatementInterpreter::new(LineageConfig::graph_only());

        interpreter.process_sql("SELECT a FROM t").expect("Failed to process");

        assert_eq!(interpreter.registry().tables()[0].source_sql(), "");
    }

    #[test]
    pub fn test_on_without_condition_is_fatal() {
        let mut interpreter = StatementInterpreter::default();

        let result = interpreter.process_sql("SELECT * FROM a JOIN b ON WHERE a.x = 1");

        match result {
            Ok(_) => panic!(),
            Err(LineageError::MalformedInput { message, text }) => {
                assert_eq!(message, "ON without a join condition");
                assert_eq!(text, "WHERE a.x = 1");
            },
            Err(_) => panic!(),
        }
    }

    #[test]
    pub fn test_on_at_end_is_fatal() {
        let mut interpreter = StatementInterpreter::default();

        let result = interpreter.process_sql("SELECT * FROM a JOIN b ON");

        assert!(matches!(result, Err(LineageError::MalformedInput { .. })));
    }

    #[test]
    pub fn test_parse_failure_is_reported() {
        let mut interpreter = StatementInterpreter::default();

        let result = interpreter.process_sql("SELECT (a FROM t");

        assert!(matches!(result, Err(LineageError::Parse(_))));
    }
}
