use crate::parser::{
    ParseError, Token, TokenKind, AS, ASC, CASE, DESC, END, OVER, WHERE, WHERE_TERMINATORS,
};

/// Turns the flat lexer output into the token tree.
///
/// Every pass works on one sibling list; parenthesized groups, WHERE spans and
/// CASE blocks are grouped from the inside out before their parent level.
pub struct Grouper;

impl Grouper {
    pub fn group_parenthesis(tokens: Vec<Token>, sql: &str) -> Result<Vec<Token>, ParseError> {
        let mut current: Vec<Token> = vec![];
        let mut outer: Vec<(Vec<Token>, usize)> = vec![];
        let mut offset = 0;

        for token in tokens {
            let start = offset;
            offset += token.value.len();

            if token.is_punctuation_of("(") {
                outer.push((std::mem::take(&mut current), start));
                current.push(token);
                continue;
            }

            if token.is_punctuation_of(")") {
                if let Some((parent, _)) = outer.pop() {
                    current.push(token);
                    let inner = std::mem::replace(&mut current, parent);
                    current.push(Token::group(TokenKind::Parenthesis, inner));
                    continue;
                }
            }

            current.push(token);
        }

        if let Some((_, start)) = outer.pop() {
            return ParseError::new("Unclosed parenthesis", start, start + 1, sql).err();
        }

        Ok(current)
    }

    pub fn strip_comments(tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .map(|token| match token.kind {
                TokenKind::Comment => {
                    let filler = if token.value.contains('\n') { "\n" } else { " " };
                    Token::leaf(TokenKind::Whitespace, filler)
                },
                TokenKind::Parenthesis => {
                    Token::group(TokenKind::Parenthesis, Self::strip_comments(token.children))
                },
                _ => token,
            })
            .collect()
    }

    /// Splits on top-level `;`, keeping the terminator with its statement and
    /// dropping statements made only of whitespace and comments.
    pub fn split_statements(tokens: Vec<Token>) -> Vec<Vec<Token>> {
        let mut statements = vec![];
        let mut current = vec![];

        for token in tokens {
            let closes = token.is_punctuation_of(";");
            current.push(token);
            if closes {
                statements.push(std::mem::take(&mut current));
            }
        }
        statements.push(current);

        statements
            .into_iter()
            .filter(|statement| {
                statement.iter().any(|token| {
                    !token.is_whitespace() && !token.is_comment() && !token.is_punctuation_of(";")
                })
            })
            .collect()
    }

    pub fn group(tokens: Vec<Token>) -> Vec<Token> {
        let tokens: Vec<Token> = tokens.into_iter().map(Self::group_nested).collect();
        let tokens = Self::group_where(tokens);
        Self::group_level(tokens)
    }

    fn group_nested(token: Token) -> Token {
        if token.kind != TokenKind::Parenthesis || token.children.len() < 2 {
            return token;
        }

        let mut children = token.children;
        let close = children.split_off(children.len() - 1);
        let inner = children.split_off(1);
        children.extend(Self::group(inner));
        children.extend(close);

        Token::group(TokenKind::Parenthesis, children)
    }

    fn group_level(tokens: Vec<Token>) -> Vec<Token> {
        let tokens = Self::group_case(tokens);
        let tokens = Self::group_functions(tokens);
        let tokens = Self::group_identifiers(tokens);
        let tokens = Self::group_operations(tokens);
        let tokens = Self::group_comparisons(tokens);
        let tokens = Self::group_as(tokens);
        let tokens = Self::group_aliased(tokens);
        let tokens = Self::group_order(tokens);
        let tokens = Self::align_comments(tokens);
        Self::group_identifier_lists(tokens)
    }

    fn group_where(mut tokens: Vec<Token>) -> Vec<Token> {
        let Some(start) = tokens.iter().position(|token| token.is_keyword_of(WHERE)) else {
            return tokens;
        };

        let end = tokens[start + 1..]
            .iter()
            .position(Self::closes_where)
            .map_or(tokens.len(), |offset| start + 1 + offset);

        let tail = tokens.split_off(end);
        let inner = tokens.split_off(start + 1);
        let mut children = tokens.split_off(start);
        children.extend(Self::group_level(inner));

        tokens.push(Token::group(TokenKind::Where, children));
        tokens.extend(Self::group_where(tail));
        tokens
    }

    fn closes_where(token: &Token) -> bool {
        token.is_punctuation_of(";")
            || (token.is_keyword() && WHERE_TERMINATORS.contains(&token.normalized().as_str()))
    }

    fn group_case(mut tokens: Vec<Token>) -> Vec<Token> {
        let mut index = 0;
        while index < tokens.len() {
            if tokens[index].is_keyword_of(CASE) {
                if let Some(end) = Self::matching_end(&tokens, index) {
                    let mut block: Vec<Token> = tokens.drain(index..=end).collect();
                    let end_keyword = block.pop();
                    let inner = block.split_off(1);

                    block.extend(Self::group_level(inner));
                    block.extend(end_keyword);
                    tokens.insert(index, Token::group(TokenKind::Case, block));
                }
            }
            index += 1;
        }
        tokens
    }

    fn matching_end(tokens: &[Token], start: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (index, token) in tokens.iter().enumerate().skip(start) {
            if token.is_keyword_of(CASE) {
                depth += 1;
            } else if token.is_keyword_of(END) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index);
                }
            }
        }
        None
    }

    /// `name(...)`, optionally followed by `OVER (...)` or `OVER window_name`.
    fn group_functions(mut tokens: Vec<Token>) -> Vec<Token> {
        let mut index = 0;
        while index < tokens.len() {
            if tokens[index].kind == TokenKind::Name {
                let arguments = Self::next_non_whitespace(&tokens, index + 1)
                    .filter(|&next| tokens[next].kind == TokenKind::Parenthesis);

                if let Some(mut end) = arguments {
                    let over = Self::next_non_whitespace(&tokens, end + 1)
                        .filter(|&next| tokens[next].is_keyword_of(OVER));
                    if let Some(over) = over {
                        let window = Self::next_non_whitespace(&tokens, over + 1).filter(|&next| {
                            matches!(tokens[next].kind, TokenKind::Parenthesis | TokenKind::Name)
                        });
                        if let Some(window) = window {
                            end = window;
                        }
                    }
                    Self::merge(&mut tokens, index, end, TokenKind::Function);
                }
            }
            index += 1;
        }
        tokens
    }

    /// Plain and dotted names: `t`, `s.t.col`, `t.*`, `s.fn(x)`.
    fn group_identifiers(mut tokens: Vec<Token>) -> Vec<Token> {
        let mut index = 0;
        while index < tokens.len() {
            if matches!(tokens[index].kind, TokenKind::Name | TokenKind::Function) {
                let mut end = index;
                while Self::continues_dotted(&tokens, end) {
                    end += 2;
                }

                if tokens[index].kind == TokenKind::Name || end > index {
                    Self::merge(&mut tokens, index, end, TokenKind::Identifier);
                }
            }
            index += 1;
        }
        tokens
    }

    fn continues_dotted(tokens: &[Token], end: usize) -> bool {
        let dot = tokens.get(end + 1).is_some_and(|token| token.is_punctuation_of("."));
        let part = tokens.get(end + 2).is_some_and(|token| {
            matches!(
                token.kind,
                TokenKind::Name | TokenKind::Function | TokenKind::Wildcard | TokenKind::Keyword(_)
            )
        });
        dot && part
    }

    fn group_operations(mut tokens: Vec<Token>) -> Vec<Token> {
        // unary sign: `-1` where no operand precedes the sign
        let mut index = 0;
        while index + 1 < tokens.len() {
            let sign = tokens[index].kind == TokenKind::Operator
                && (tokens[index].value == "-" || tokens[index].value == "+");
            let operand = tokens[index + 1].kind.is_operand();
            let preceded_by_operand = Self::previous_non_whitespace(&tokens, index)
                .is_some_and(|previous| tokens[previous].kind.is_operand());

            if sign && operand && !preceded_by_operand {
                Self::merge(&mut tokens, index, index + 1, TokenKind::Operation);
            }
            index += 1;
        }

        let mut index = 0;
        while index < tokens.len() {
            if tokens[index].kind.is_operand() {
                let operator = Self::next_non_whitespace(&tokens, index + 1).filter(|&next| {
                    matches!(tokens[next].kind, TokenKind::Operator | TokenKind::Wildcard)
                });
                let right = operator.and_then(|operator| {
                    Self::next_non_whitespace(&tokens, operator + 1)
                        .filter(|&next| tokens[next].kind.is_operand())
                });

                if let Some(right) = right {
                    Self::merge(&mut tokens, index, right, TokenKind::Operation);
                    continue;
                }
            }
            index += 1;
        }
        tokens
    }

    fn group_comparisons(mut tokens: Vec<Token>) -> Vec<Token> {
        let mut index = 0;
        while index < tokens.len() {
            if tokens[index].kind.is_operand() {
                let operator = Self::next_non_whitespace(&tokens, index + 1)
                    .filter(|&next| tokens[next].kind == TokenKind::ComparisonOperator);
                let right = operator.and_then(|operator| {
                    Self::next_non_whitespace(&tokens, operator + 1)
                        .filter(|&next| tokens[next].kind.is_operand())
                });

                if let Some(right) = right {
                    Self::merge(&mut tokens, index, right, TokenKind::Comparison);
                }
            }
            index += 1;
        }
        tokens
    }

    /// `expr AS alias`, including `cte AS (subquery)`.
    fn group_as(mut tokens: Vec<Token>) -> Vec<Token> {
        let mut index = 0;
        while index < tokens.len() {
            if tokens[index].is_keyword_of(AS) {
                let left = Self::previous_non_whitespace(&tokens, index).filter(|&previous| {
                    tokens[previous].kind.is_operand() || tokens[previous].kind == TokenKind::Comparison
                });
                let right = Self::next_non_whitespace(&tokens, index + 1).filter(|&next| {
                    matches!(
                        tokens[next].kind,
                        TokenKind::Identifier | TokenKind::Name | TokenKind::Parenthesis | TokenKind::Literal
                    )
                });

                if let (Some(left), Some(right)) = (left, right) {
                    Self::merge(&mut tokens, left, right, TokenKind::Identifier);
                    index = left + 1;
                    continue;
                }
            }
            index += 1;
        }
        tokens
    }

    /// `expr alias` without the `AS` keyword.
    fn group_aliased(mut tokens: Vec<Token>) -> Vec<Token> {
        let mut index = 0;
        while index < tokens.len() {
            if Self::can_take_alias(&tokens[index]) {
                let alias = Self::next_non_whitespace(&tokens, index + 1)
                    .filter(|&next| next > index + 1 && Self::is_bare_identifier(&tokens[next]));

                if let Some(alias) = alias {
                    Self::merge(&mut tokens, index, alias, TokenKind::Identifier);
                }
            }
            index += 1;
        }
        tokens
    }

    fn can_take_alias(token: &Token) -> bool {
        match token.kind {
            TokenKind::Identifier => !token.children.iter().any(Token::is_whitespace),
            TokenKind::Parenthesis
            | TokenKind::Function
            | TokenKind::Literal
            | TokenKind::Operation
            | TokenKind::Case => true,
            _ => false,
        }
    }

    fn is_bare_identifier(token: &Token) -> bool {
        token.kind == TokenKind::Identifier
            && token.children.len() == 1
            && token.children[0].kind == TokenKind::Name
    }

    /// Folds a trailing `ASC`/`DESC` into the expression it orders.
    fn group_order(mut tokens: Vec<Token>) -> Vec<Token> {
        let mut index = 0;
        while index < tokens.len() {
            if tokens[index].kind.is_operand() {
                let direction = Self::next_non_whitespace(&tokens, index + 1).filter(|&next| {
                    tokens[next].is_keyword_of(ASC) || tokens[next].is_keyword_of(DESC)
                });

                if let Some(direction) = direction {
                    Self::extend_identifier(&mut tokens, index, direction);
                }
            }
            index += 1;
        }
        tokens
    }

    /// A comment right after an identifier belongs to that identifier.
    fn align_comments(mut tokens: Vec<Token>) -> Vec<Token> {
        let mut index = 0;
        while index < tokens.len() {
            if tokens[index].is_comment() {
                let owner = Self::previous_non_whitespace(&tokens, index)
                    .filter(|&previous| tokens[previous].kind == TokenKind::Identifier);

                if let Some(owner) = owner {
                    Self::extend_identifier(&mut tokens, owner, index);
                    index = owner + 1;
                    continue;
                }
            }
            index += 1;
        }
        tokens
    }

    fn group_identifier_lists(mut tokens: Vec<Token>) -> Vec<Token> {
        let mut index = 0;
        while index < tokens.len() {
            if Self::is_list_item(&tokens[index]) {
                let mut end = index;
                loop {
                    let comma = Self::next_significant(&tokens, end + 1)
                        .filter(|&next| tokens[next].is_punctuation_of(","));
                    let item = comma.and_then(|comma| {
                        Self::next_significant(&tokens, comma + 1)
                            .filter(|&next| Self::is_list_item(&tokens[next]))
                    });

                    match item {
                        Some(item) => end = item,
                        None => break,
                    }
                }

                if end > index {
                    Self::merge(&mut tokens, index, end, TokenKind::IdentifierList);
                }
            }
            index += 1;
        }
        tokens
    }

    fn is_list_item(token: &Token) -> bool {
        token.kind.is_operand() || matches!(token.kind, TokenKind::Wildcard | TokenKind::Comparison)
    }

    /// Appends `tokens[owner + 1..=end]` to the identifier at `owner`, wrapping
    /// the owner first when it is not an identifier yet.
    fn extend_identifier(tokens: &mut Vec<Token>, owner: usize, end: usize) {
        if tokens[owner].kind != TokenKind::Identifier {
            Self::merge(tokens, owner, end, TokenKind::Identifier);
            return;
        }

        let tail: Vec<Token> = tokens.drain(owner + 1..=end).collect();
        let mut children = std::mem::take(&mut tokens[owner].children);
        children.extend(tail);
        tokens[owner] = Token::group(TokenKind::Identifier, children);
    }

    fn merge(tokens: &mut Vec<Token>, start: usize, end: usize, kind: TokenKind) {
        let children: Vec<Token> = tokens.drain(start..=end).collect();
        tokens.insert(start, Token::group(kind, children));
    }

    fn next_non_whitespace(tokens: &[Token], from: usize) -> Option<usize> {
        (from..tokens.len()).find(|&index| !tokens[index].is_whitespace())
    }

    fn next_significant(tokens: &[Token], from: usize) -> Option<usize> {
        (from..tokens.len()).find(|&index| !tokens[index].is_skippable(true, true))
    }

    fn previous_non_whitespace(tokens: &[Token], before: usize) -> Option<usize> {
        (0..before).rev().find(|&index| !tokens[index].is_whitespace())
    }
}
