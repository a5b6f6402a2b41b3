use crate::parser::KeywordKind;

pub const SELECT: &str = "SELECT";
pub const FROM: &str = "FROM";
pub const WHERE: &str = "WHERE";
pub const ON: &str = "ON";
pub const AS: &str = "AS";
pub const AND: &str = "AND";
pub const OR: &str = "OR";
pub const BETWEEN: &str = "BETWEEN";
pub const GROUP_BY: &str = "GROUP BY";
pub const ORDER_BY: &str = "ORDER BY";
pub const CASE: &str = "CASE";
pub const END: &str = "END";
pub const OVER: &str = "OVER";
pub const ASC: &str = "ASC";
pub const DESC: &str = "DESC";
pub const JOIN: &str = "JOIN";

/// Keywords that close a WHERE clause.
pub const WHERE_TERMINATORS: [&str; 14] = [
    "GROUP BY", "ORDER BY", "HAVING", "LIMIT", "OFFSET", "UNION", "UNION ALL", "INTERSECT",
    "EXCEPT", "MINUS", "WINDOW", "QUALIFY", "RETURNING", "FETCH",
];

/// Words lexed as literals rather than keywords.
pub const LITERAL_WORDS: [&str; 3] = ["TRUE", "FALSE", "NULL"];

/// Classifies a bare word. Words that are not SQL keywords are names.
pub fn keyword_kind(word: &str) -> Option<KeywordKind> {
    let upper = word.to_uppercase();
    match upper.as_str() {
        "SELECT" | "INSERT" | "UPDATE" | "DELETE" | "MERGE" | "UPSERT" => Some(KeywordKind::Dml),
        "WITH" => Some(KeywordKind::Cte),
        "FROM" | "WHERE" | "AS" | "ON" | "AND" | "OR" | "NOT" | "IN" | "IS" | "BETWEEN"
        | "EXISTS" | "JOIN" | "HAVING" | "LIMIT" | "OFFSET" | "UNION" | "INTERSECT" | "EXCEPT"
        | "MINUS" | "ALL" | "ANY" | "SOME" | "DISTINCT" | "INTO" | "VALUES" | "SET" | "TABLE"
        | "VIEW" | "CREATE" | "DROP" | "ALTER" | "TRUNCATE" | "CASE" | "WHEN" | "THEN"
        | "ELSE" | "END" | "ASC" | "DESC" | "USING" | "RECURSIVE" | "OVER" | "WINDOW"
        | "QUALIFY" | "LATERAL" | "RETURNING" | "MATERIALIZED" | "ESCAPE" | "FETCH"
        | "TEMPORARY" | "TEMP" => Some(KeywordKind::Generic),
        _ => None,
    }
}

pub fn is_literal_word(word: &str) -> bool {
    LITERAL_WORDS.contains(&word.to_uppercase().as_str())
}

#[cfg(test)]
mod tests {
    use crate::parser::{keyword_kind, is_literal_word, KeywordKind};

    #[test]
    pub fn test_keyword_kind() {
        assert_eq!(keyword_kind("select"), Some(KeywordKind::Dml));
        assert_eq!(keyword_kind("With"), Some(KeywordKind::Cte));
        assert_eq!(keyword_kind("from"), Some(KeywordKind::Generic));
        assert_eq!(keyword_kind("customer_id"), None);
    }

    #[test]
    pub fn test_literal_words() {
        assert!(is_literal_word("null"));
        assert!(is_literal_word("TRUE"));
        assert!(!is_literal_word("NOT"));
    }
}
