//! Statement classification
//!
//! The cursor needs to know, before running a statement, whether it reads
//! rows, inserts, or updates/deletes a target table. For UPDATE and DELETE it
//! also needs the target and the WHERE predicate so it can locate the last
//! row the statement will touch. This module extracts exactly that with a
//! small scanner; it is not a SQL parser.

use crate::error::{DatabaseError, Result};
use crate::types::SqlValue;
use std::ops::Range;

/// What a statement does, as far as row identifier tracking is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// Produces a result set
    Query,
    /// INSERT or REPLACE
    Insert,
    Update(DmlTarget),
    Delete(DmlTarget),
    /// BEGIN, COMMIT, ROLLBACK and friends
    TransactionControl,
    /// Schema and everything else
    Other,
}

impl StatementKind {
    /// Whether the statement modifies table data and so joins a transaction
    pub fn modifies_data(&self) -> bool {
        matches!(self, Self::Insert | Self::Update(_) | Self::Delete(_))
    }
}

/// Target table and predicate of an UPDATE or DELETE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmlTarget {
    /// Table reference as written, including any alias or INDEXED BY
    pub table: String,
    /// WHERE predicate as written
    pub predicate: Option<String>,
    /// Positions of the statement's parameters the predicate needs. With
    /// `?NNN` placeholders this is every position up to the highest one the
    /// predicate mentions.
    pub predicate_params: Range<usize>,
    /// Table name the statement targets, without schema or alias
    pub table_name: String,
    /// Columns an UPDATE assigns, unquoted
    pub assigned_columns: Vec<String>,
}

impl DmlTarget {
    /// Query returning the rowid of the last row the statement will touch
    pub fn locate_sql(&self) -> String {
        match &self.predicate {
            Some(predicate) => format!(
                "SELECT rowid FROM {} WHERE {} ORDER BY rowid DESC LIMIT 1",
                self.table, predicate
            ),
            None => format!(
                "SELECT rowid FROM {} ORDER BY rowid DESC LIMIT 1",
                self.table
            ),
        }
    }

    /// Parameters the locating query binds, taken from the statement's own
    pub fn locate_params<'a>(&self, params: &'a [SqlValue]) -> &'a [SqlValue] {
        if self.predicate.is_none() {
            return &[];
        }
        let end = self.predicate_params.end.min(params.len());
        let start = self.predicate_params.start.min(end);
        &params[start..end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    QuotedIdent,
    Literal,
    Placeholder(Placeholder),
    Punct(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    /// `?`
    Anonymous,
    /// `?NNN`
    Numbered,
    /// `:name`, `@name` or `$name`
    Named,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
    /// Parenthesis nesting level the token sits at
    depth: usize,
}

impl Token {
    fn is_keyword(&self, sql: &str, keyword: &str) -> bool {
        self.kind == TokenKind::Word && sql[self.start..self.end].eq_ignore_ascii_case(keyword)
    }

    fn is_top_level_keyword(&self, sql: &str, keywords: &[&str]) -> bool {
        self.depth == 0 && keywords.iter().any(|k| self.is_keyword(sql, k))
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Skip a quoted run starting at `start` (which holds the opening quote).
/// A doubled closing quote is an escaped quote.
fn skip_quoted(bytes: &[u8], start: usize, close: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == close {
            if close != b']' && bytes.get(i + 1) == Some(&close) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn tokenize(sql: &str) -> Vec<Token> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let start = i;
        let kind = match b {
            b if b.is_ascii_whitespace() => {
                i += 1;
                continue;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                continue;
            }
            b'\'' => {
                i = skip_quoted(bytes, i, b'\'');
                TokenKind::Literal
            }
            b'"' | b'`' => {
                i = skip_quoted(bytes, i, b);
                TokenKind::QuotedIdent
            }
            b'[' => {
                i = skip_quoted(bytes, i, b']');
                TokenKind::QuotedIdent
            }
            b'?' => {
                i += 1;
                let digits = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i > digits {
                    TokenKind::Placeholder(Placeholder::Numbered)
                } else {
                    TokenKind::Placeholder(Placeholder::Anonymous)
                }
            }
            b':' | b'@' | b'$' if bytes.get(i + 1).is_some_and(|n| is_word_byte(*n)) => {
                i += 1;
                while i < bytes.len() && is_word_byte(bytes[i]) {
                    i += 1;
                }
                TokenKind::Placeholder(Placeholder::Named)
            }
            b if is_word_byte(b) => {
                while i < bytes.len() && is_word_byte(bytes[i]) {
                    i += 1;
                }
                TokenKind::Word
            }
            _ => {
                let ch = sql[i..].chars().next().unwrap_or('\0');
                i += ch.len_utf8().max(1);
                TokenKind::Punct(ch)
            }
        };

        if kind == TokenKind::Punct(')') {
            depth = depth.saturating_sub(1);
        }
        tokens.push(Token {
            kind,
            start,
            end: i,
            depth,
        });
        if kind == TokenKind::Punct('(') {
            depth += 1;
        }
    }

    tokens
}

/// Classify a statement for the cursor
pub fn classify(sql: &str) -> Result<StatementKind> {
    let tokens = tokenize(sql);
    let Some(first) = tokens.iter().position(|t| t.kind == TokenKind::Word) else {
        return Err(DatabaseError::unsupported("empty statement"));
    };
    let leading = sql[tokens[first].start..tokens[first].end].to_ascii_lowercase();

    let kind = match leading.as_str() {
        "select" | "values" | "pragma" | "explain" => StatementKind::Query,
        "with" => {
            let has_dml = tokens[first + 1..]
                .iter()
                .any(|t| t.is_top_level_keyword(sql, &["insert", "replace", "update", "delete"]));
            if has_dml {
                return Err(DatabaseError::unsupported(
                    "data-modifying statements behind a WITH clause",
                ));
            }
            StatementKind::Query
        }
        "insert" | "replace" => StatementKind::Insert,
        "update" => StatementKind::Update(parse_update(sql, &tokens, first + 1)?),
        "delete" => StatementKind::Delete(parse_delete(sql, &tokens, first + 1)?),
        "begin" | "commit" | "end" | "rollback" | "savepoint" | "release" => {
            StatementKind::TransactionControl
        }
        _ => StatementKind::Other,
    };
    Ok(kind)
}

/// Clauses that may follow the WHERE predicate
const TRAILING_CLAUSES: [&str; 3] = ["returning", "order", "limit"];

fn find_top_level(sql: &str, tokens: &[Token], from: usize, keywords: &[&str]) -> Option<usize> {
    tokens[from..]
        .iter()
        .position(|t| t.is_top_level_keyword(sql, keywords))
        .map(|p| p + from)
}

/// Byte offset where the predicate region (or the table span) stops
fn clause_end(sql: &str, tokens: &[Token], from: usize) -> usize {
    tokens[from..]
        .iter()
        .find(|t| {
            t.is_top_level_keyword(sql, &TRAILING_CLAUSES)
                || (t.depth == 0 && t.kind == TokenKind::Punct(';'))
        })
        .map_or(sql.len(), |t| t.start)
}

fn anonymous_params<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> usize {
    tokens
        .into_iter()
        .filter(|t| t.kind == TokenKind::Placeholder(Placeholder::Anonymous))
        .count()
}

fn numbered_index(sql: &str, token: &Token) -> usize {
    sql[token.start + 1..token.end].parse().unwrap_or(0)
}

/// Identifier text without its quotes
fn unquote(sql: &str, token: &Token) -> String {
    let text = &sql[token.start..token.end];
    match token.kind {
        TokenKind::QuotedIdent if text.len() >= 2 => text[1..text.len() - 1].to_string(),
        _ => text.to_string(),
    }
}

fn has_placeholder(tokens: &[Token], kind: Placeholder) -> bool {
    tokens.iter().any(|t| t.kind == TokenKind::Placeholder(kind))
}

fn build_target(
    sql: &str,
    tokens: &[Token],
    table_idx: usize,
    table_end: usize,
    where_idx: Option<usize>,
    assigned_columns: Vec<String>,
) -> Result<DmlTarget> {
    let table = sql[tokens[table_idx].start..table_end].trim();
    if table.is_empty() {
        return Err(DatabaseError::unsupported("statement has no target table"));
    }

    // schema.table: the name is the last identifier of the dotted chain
    let mut name_idx = table_idx;
    while tokens.get(name_idx + 1).is_some_and(|t| t.kind == TokenKind::Punct('.'))
        && tokens.get(name_idx + 2).is_some()
    {
        name_idx += 2;
    }
    let table_name = sql[tokens[name_idx].start..tokens[name_idx].end].to_string();

    if has_placeholder(tokens, Placeholder::Named) {
        return Err(DatabaseError::unsupported(
            "named placeholders must be numbered before the statement is classified",
        ));
    }
    let numbered = has_placeholder(tokens, Placeholder::Numbered);
    if numbered && has_placeholder(tokens, Placeholder::Anonymous) {
        return Err(DatabaseError::unsupported(
            "statement mixes '?' with numbered placeholders",
        ));
    }

    let (predicate, predicate_params) = match where_idx {
        Some(w) => {
            let end = clause_end(sql, tokens, w + 1);
            let predicate = sql[tokens[w].end..end].trim().to_string();
            let inside = tokens[w + 1..].iter().take_while(|t| t.start < end);
            let params = if numbered {
                let highest = inside
                    .filter(|t| t.kind == TokenKind::Placeholder(Placeholder::Numbered))
                    .map(|t| numbered_index(sql, t))
                    .max()
                    .unwrap_or(0);
                0..highest
            } else {
                let before = anonymous_params(&tokens[..w]);
                before..before + anonymous_params(inside)
            };
            (Some(predicate), params)
        }
        None => (None, 0..0),
    };

    if predicate.as_deref() == Some("") {
        return Err(DatabaseError::unsupported("WHERE clause without a predicate"));
    }

    Ok(DmlTarget {
        table: table.to_string(),
        predicate,
        predicate_params,
        table_name,
        assigned_columns,
    })
}

/// Names that always address the rowid itself
const ROWID_NAMES: [&str; 3] = ["rowid", "oid", "_rowid_"];

/// Columns on the left-hand side of each `col = expr` or `(a, b) = (...)`
/// assignment of a SET clause
fn assigned_columns(sql: &str, tokens: &[Token]) -> Vec<String> {
    let mut columns = Vec::new();
    let mut in_target = true;
    for token in tokens {
        match token.kind {
            TokenKind::Punct(',') if token.depth == 0 => in_target = true,
            TokenKind::Punct('=') if token.depth == 0 => in_target = false,
            TokenKind::Word | TokenKind::QuotedIdent if in_target => {
                columns.push(unquote(sql, token));
            }
            _ => {}
        }
    }
    columns
}

fn parse_update(sql: &str, tokens: &[Token], mut idx: usize) -> Result<DmlTarget> {
    // UPDATE OR <conflict-resolution>
    if tokens.get(idx).is_some_and(|t| t.is_keyword(sql, "or")) {
        idx += 2;
    }
    if idx >= tokens.len() {
        return Err(DatabaseError::unsupported("UPDATE without a target table"));
    }
    let Some(set_idx) = find_top_level(sql, tokens, idx, &["set"]) else {
        return Err(DatabaseError::unsupported("UPDATE without a SET clause"));
    };

    let where_idx = find_top_level(sql, tokens, set_idx + 1, &["where"]);
    let from_idx = find_top_level(sql, tokens, set_idx + 1, &["from"]);
    if let Some(from) = from_idx {
        if where_idx.map_or(true, |w| from < w) {
            return Err(DatabaseError::unsupported(
                "UPDATE ... FROM cannot report a row identifier",
            ));
        }
    }

    let set_end = match where_idx {
        Some(w) => w,
        None => {
            let end = clause_end(sql, tokens, set_idx + 1);
            set_idx + 1 + tokens[set_idx + 1..].iter().take_while(|t| t.start < end).count()
        }
    };
    let columns = assigned_columns(sql, &tokens[set_idx + 1..set_end]);
    if let Some(column) = columns
        .iter()
        .find(|c| ROWID_NAMES.iter().any(|r| c.eq_ignore_ascii_case(r)))
    {
        return Err(DatabaseError::unsupported(format!(
            "UPDATE assigning '{column}' moves the row it would report"
        )));
    }

    build_target(sql, tokens, idx, tokens[set_idx].start, where_idx, columns)
}

fn parse_delete(sql: &str, tokens: &[Token], idx: usize) -> Result<DmlTarget> {
    if !tokens.get(idx).is_some_and(|t| t.is_keyword(sql, "from")) {
        return Err(DatabaseError::unsupported("DELETE without FROM"));
    }
    if idx + 1 >= tokens.len() {
        return Err(DatabaseError::unsupported("DELETE without a target table"));
    }

    let where_idx = find_top_level(sql, tokens, idx + 1, &["where"]);
    let table_end = match where_idx {
        Some(w) => tokens[w].start,
        None => clause_end(sql, tokens, idx + 1),
    };

    build_target(sql, tokens, idx + 1, table_end, where_idx, Vec::new())
}

/// A statement whose placeholders have all been rewritten as `?NNN`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedStatement {
    pub sql: String,
    /// Placeholder text bound at each position (`:name`, `@name`, `$name`),
    /// `None` where the position belongs to a `?` or `?NNN` placeholder
    pub names: Vec<Option<String>>,
}

impl NumberedStatement {
    /// Number of positional values the statement binds
    pub fn param_count(&self) -> usize {
        self.names.len()
    }
}

/// Number every placeholder of `sql` the way SQLite assigns parameter
/// positions: `?NNN` keeps its number, a name reuses the position of its
/// first occurrence, and everything else takes the next free position.
///
/// The text is only rewritten when it contains `?NNN` or named placeholders;
/// statements that use `?` alone come back unchanged.
pub fn number_placeholders(sql: &str) -> NumberedStatement {
    let tokens = tokenize(sql);
    let rewrite = has_placeholder(&tokens, Placeholder::Named)
        || has_placeholder(&tokens, Placeholder::Numbered);

    let mut names: Vec<Option<String>> = Vec::new();
    let mut numbered = String::with_capacity(sql.len());
    let mut copied = 0;

    for token in &tokens {
        let TokenKind::Placeholder(kind) = token.kind else {
            continue;
        };
        let position = match kind {
            Placeholder::Anonymous => {
                names.push(None);
                names.len()
            }
            Placeholder::Numbered => {
                let index = numbered_index(sql, token);
                if names.len() < index {
                    names.resize(index, None);
                }
                index
            }
            Placeholder::Named => {
                let name = &sql[token.start..token.end];
                match names.iter().position(|n| n.as_deref() == Some(name)) {
                    Some(existing) => existing + 1,
                    None => {
                        names.push(Some(name.to_string()));
                        names.len()
                    }
                }
            }
        };
        numbered.push_str(&sql[copied..token.start]);
        numbered.push('?');
        numbered.push_str(&position.to_string());
        copied = token.end;
    }
    numbered.push_str(&sql[copied..]);

    NumberedStatement {
        sql: if rewrite { numbered } else { sql.to_string() },
        names,
    }
}
