//! In-memory evaluation of the CQL subset used for acquisition units.
//!
//! Supported grammar:
//!
//! ```text
//! query    := expr [sortBy ...]
//! expr     := term { ("and" | "or" | "not") term }
//! term     := "(" expr ")" | index relation value
//! relation := "==" | "=" | "<>"
//! value    := "*" | "[]" | term-value | "(" term-value { "or" term-value } ")"
//! ```
//!
//! Boolean operators share one precedence level and apply left to right.
//! `cql.allRecords=1` matches every record.

use std::iter::Peekable;
use std::str::CharIndices;

use acq_units_sdk::{AcquisitionUnit, AcquisitionUnitMembership, cql};

const ALL_RECORDS_INDEX: &str = "cql.allRecords";

/// Query text the matcher cannot parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("unexpected end of query")]
    UnexpectedEnd,

    #[error("unexpected token `{token}` at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
}

/// A record field as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

/// Records a [`CqlQuery`] can be evaluated against.
///
/// `field` returns `None` for fields the record does not carry; every
/// relation on a missing field is false.
pub trait CqlRecord {
    fn field(&self, index: &str) -> Option<FieldValue>;
}

impl CqlRecord for AcquisitionUnit {
    fn field(&self, index: &str) -> Option<FieldValue> {
        let value = match index {
            cql::ID => self.id.to_string(),
            "name" => self.name.clone(),
            cql::IS_DELETED => self.is_deleted.to_string(),
            "protectCreate" => self.protect_create.to_string(),
            cql::PROTECT_READ => self.protect_read.to_string(),
            "protectUpdate" => self.protect_update.to_string(),
            "protectDelete" => self.protect_delete.to_string(),
            _ => return None,
        };
        Some(FieldValue::Scalar(value))
    }
}

impl CqlRecord for AcquisitionUnitMembership {
    fn field(&self, index: &str) -> Option<FieldValue> {
        let value = match index {
            cql::ID => self.id,
            cql::ACQUISITIONS_UNIT_ID => self.acquisitions_unit_id,
            cql::USER_ID => self.user_id,
            _ => return None,
        };
        Some(FieldValue::Scalar(value.to_string()))
    }
}

/// Arbitrary JSON records, e.g. organizations carrying `acqUnitIds`.
///
/// Dotted indexes walk nested objects. Arrays become lists; `null` is missing.
impl CqlRecord for serde_json::Value {
    fn field(&self, index: &str) -> Option<FieldValue> {
        let value = index
            .split('.')
            .try_fold(self, |node, key| node.get(key))?;
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Array(items) => Some(FieldValue::List(
                items.iter().filter_map(json_scalar).collect(),
            )),
            other => json_scalar(other).map(FieldValue::Scalar),
        }
    }
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse `query` and test it against `record`.
///
/// # Errors
///
/// Returns [`QueryError`] if `query` is not valid in the supported subset.
pub fn matches<R: CqlRecord + ?Sized>(query: &str, record: &R) -> Result<bool, QueryError> {
    Ok(CqlQuery::parse(query)?.matches(record))
}

/// A parsed filter, reusable across records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqlQuery {
    root: Option<Node>,
}

impl CqlQuery {
    /// Parse a query. A blank filter (or a bare `sortBy`) matches everything.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] on syntax outside the supported subset.
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let (filter, _sorting) = cql::split_sort_by(query);
        let filter = strip_leading_sort_by(filter);
        let tokens = tokenize(filter)?;
        if tokens.is_empty() {
            return Ok(Self { root: None });
        }

        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.expr()?;
        if let Some(extra) = parser.peek() {
            return Err(extra.unexpected());
        }
        Ok(Self { root: Some(root) })
    }

    #[must_use]
    pub fn matches<R: CqlRecord + ?Sized>(&self, record: &R) -> bool {
        self.root.as_ref().is_none_or(|node| node.eval(record))
    }
}

/// `sortBy name` with no filter in front is not caught by the trailing split.
fn strip_leading_sort_by(filter: &str) -> &str {
    let trimmed = filter.trim_start();
    let sort_only = trimmed
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("sortBy"))
        && trimmed
            .get(6..)
            .is_some_and(|rest| rest.starts_with(char::is_whitespace));
    if sort_only { "" } else { filter }
}

// ── AST ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoolOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Exact,
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Any,
    EmptyList,
    Terms(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    AllRecords,
    Clause {
        index: String,
        relation: Relation,
        value: Value,
    },
    Bool {
        op: BoolOp,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn eval<R: CqlRecord + ?Sized>(&self, record: &R) -> bool {
        match self {
            Self::AllRecords => true,
            Self::Bool { op, left, right } => {
                let left = left.eval(record);
                match op {
                    BoolOp::And => left && right.eval(record),
                    BoolOp::Or => left || right.eval(record),
                    BoolOp::Not => left && !right.eval(record),
                }
            }
            Self::Clause {
                index,
                relation,
                value,
            } => record
                .field(index)
                .is_some_and(|field| eval_clause(&field, *relation, value)),
        }
    }
}

fn eval_clause(field: &FieldValue, relation: Relation, value: &Value) -> bool {
    let positive = match (value, field) {
        (Value::Any, _) => return relation != Relation::NotEqual,
        (Value::EmptyList, FieldValue::List(items)) => items.is_empty(),
        (Value::EmptyList, FieldValue::Scalar(_)) => false,
        (Value::Terms(terms), FieldValue::Scalar(s)) => terms.iter().any(|t| term_matches(t, s)),
        (Value::Terms(terms), FieldValue::List(items)) => items
            .iter()
            .any(|item| terms.iter().any(|t| term_matches(t, item))),
    };
    match relation {
        Relation::Exact | Relation::Equal => positive,
        Relation::NotEqual => !positive,
    }
}

/// Case-insensitive comparison; a trailing `*` makes the term a prefix.
fn term_matches(term: &str, candidate: &str) -> bool {
    match term.strip_suffix('*') {
        Some(prefix) => candidate
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
        None => candidate.eq_ignore_ascii_case(term),
    }
}

// ── Lexer ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    LParen,
    RParen,
    Relation(Relation),
    Word(String),
    Quoted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

impl Token {
    fn text(&self) -> String {
        match &self.kind {
            TokenKind::LParen => "(".to_owned(),
            TokenKind::RParen => ")".to_owned(),
            TokenKind::Relation(Relation::Exact) => "==".to_owned(),
            TokenKind::Relation(Relation::Equal) => "=".to_owned(),
            TokenKind::Relation(Relation::NotEqual) => "<>".to_owned(),
            TokenKind::Word(w) => w.clone(),
            TokenKind::Quoted(q) => format!("\"{q}\""),
        }
    }

    fn unexpected(&self) -> QueryError {
        QueryError::UnexpectedToken {
            token: self.text(),
            offset: self.offset,
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

type Chars<'a> = Peekable<CharIndices<'a>>;

fn tokenize(input: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let kind = match c {
            '(' | ')' | '=' | '<' | '>' => lex_symbol(&mut chars, offset)?,
            '"' => TokenKind::Quoted(lex_quoted(&mut chars, offset)?),
            _ => TokenKind::Word(lex_word(&mut chars)),
        };
        tokens.push(Token { kind, offset });
    }
    Ok(tokens)
}

fn lex_symbol(chars: &mut Chars<'_>, offset: usize) -> Result<TokenKind, QueryError> {
    let unexpected = |token: &str| QueryError::UnexpectedToken {
        token: token.to_owned(),
        offset,
    };
    match chars.next().map(|(_, c)| c) {
        Some('(') => Ok(TokenKind::LParen),
        Some(')') => Ok(TokenKind::RParen),
        Some('=') if chars.next_if(|&(_, c)| c == '=').is_some() => {
            Ok(TokenKind::Relation(Relation::Exact))
        }
        Some('=') => Ok(TokenKind::Relation(Relation::Equal)),
        Some('<') if chars.next_if(|&(_, c)| c == '>').is_some() => {
            Ok(TokenKind::Relation(Relation::NotEqual))
        }
        Some(other) => Err(unexpected(&other.to_string())),
        None => Err(QueryError::UnexpectedEnd),
    }
}

/// Consume a `"..."` literal; `\x` yields `x`.
fn lex_quoted(chars: &mut Chars<'_>, offset: usize) -> Result<String, QueryError> {
    chars.next();
    let mut text = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    text.push(escaped);
                }
            }
            '"' => return Ok(text),
            other => text.push(other),
        }
    }
    Err(QueryError::UnterminatedString { offset })
}

fn lex_word(chars: &mut Chars<'_>) -> String {
    let mut word = String::new();
    while let Some((_, c)) =
        chars.next_if(|&(_, c)| !c.is_whitespace() && !"()=<>\"".contains(c))
    {
        word.push(c);
    }
    word
}

// ── Parser ───────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Result<Token, QueryError> {
        let token = self.tokens.get(self.pos).cloned().ok_or(QueryError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expr(&mut self) -> Result<Node, QueryError> {
        let mut left = self.term()?;
        while let Some(op) = self.peek().and_then(bool_op) {
            self.pos += 1;
            let right = self.term()?;
            left = Node::Bool {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Node, QueryError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            TokenKind::Word(index) => {
                let next = self.advance()?;
                let TokenKind::Relation(relation) = next.kind else {
                    return Err(next.unexpected());
                };
                let value = self.value()?;
                if index.eq_ignore_ascii_case(ALL_RECORDS_INDEX) {
                    return Ok(Node::AllRecords);
                }
                Ok(Node::Clause {
                    index,
                    relation,
                    value,
                })
            }
            _ => Err(token.unexpected()),
        }
    }

    fn value(&mut self) -> Result<Value, QueryError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Word(w) if w == "*" => Ok(Value::Any),
            TokenKind::Word(w) if w == "[]" => Ok(Value::EmptyList),
            TokenKind::Word(w) | TokenKind::Quoted(w) => Ok(Value::Terms(vec![w])),
            TokenKind::LParen => {
                let mut terms = Vec::new();
                loop {
                    let token = self.advance()?;
                    match token.kind {
                        TokenKind::RParen if terms.is_empty() => break,
                        TokenKind::Word(w) | TokenKind::Quoted(w) => terms.push(w),
                        _ => return Err(token.unexpected()),
                    }
                    if self.peek().is_some_and(|t| t.is_keyword("or")) {
                        self.pos += 1;
                    } else {
                        self.expect_rparen()?;
                        break;
                    }
                }
                Ok(Value::Terms(terms))
            }
            _ => Err(token.unexpected()),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), QueryError> {
        let token = self.advance()?;
        if token.kind == TokenKind::RParen {
            Ok(())
        } else {
            Err(token.unexpected())
        }
    }
}

fn bool_op(token: &Token) -> Option<BoolOp> {
    if token.is_keyword("and") {
        Some(BoolOp::And)
    } else if token.is_keyword("or") {
        Some(BoolOp::Or)
    } else if token.is_keyword("not") {
        Some(BoolOp::Not)
    } else {
        None
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use acq_units_sdk::ProtectedOperationType;
    use serde_json::json;
    use uuid::Uuid;

    const U1: &str = "11111111-1111-1111-1111-111111111111";
    const U2: &str = "22222222-2222-2222-2222-222222222222";
    const U3: &str = "33333333-3333-3333-3333-333333333333";

    fn unit(id: &str) -> AcquisitionUnit {
        AcquisitionUnit::new(Uuid::parse_str(id).unwrap())
    }

    fn check<R: CqlRecord + ?Sized>(query: &str, record: &R) -> bool {
        matches(query, record).unwrap()
    }

    #[test]
    fn strict_and_word_match_on_scalar() {
        let u = unit(U1).with_name("Main Library");
        assert!(check(&format!("id=={U1}"), &u));
        assert!(!check(&format!("id=={U2}"), &u));
        assert!(check("name=\"main library\"", &u));
        assert!(check("name==Main*", &u));
    }

    #[test]
    fn value_lists_match_any_member() {
        let u = unit(U2);
        assert!(check(&format!("id==({U1} or {U2})"), &u));
        assert!(!check(&format!("id==({U1} or {U3})"), &u));
        assert!(!check("id==()", &u));
    }

    #[test]
    fn star_matches_any_present_value() {
        let deleted = unit(U1).with_deleted(true);
        assert!(check("isDeleted=*", &deleted));
        assert!(check("isDeleted=*", &unit(U2)));
        assert!(!check("unknownField=*", &unit(U1)));
    }

    #[test]
    fn boolean_flags_compare_as_words() {
        let open = unit(U1).with_protection(ProtectedOperationType::Read, false);
        assert!(check("(isDeleted==false) and (protectRead==false)", &open));
        assert!(!check("isDeleted==true", &open));
        assert!(check("protectUpdate<>false", &open));
    }

    #[test]
    fn operators_apply_left_to_right() {
        let u = unit(U1);
        // (true or false) and false
        assert!(!check(&format!("id=={U1} or id=={U2} and id=={U3}"), &u));
        // (false and true) or true
        assert!(check(&format!("id=={U2} and id=={U1} or id=={U1}"), &u));
        assert!(check(&format!("(id=={U2}) or ((id=={U1}) and (isDeleted==false))"), &u));
    }

    #[test]
    fn sort_by_is_ignored() {
        let u = unit(U1);
        assert!(check(&format!("id=={U1} sortBy name/sort.ascending"), &u));
        assert!(check("sortBy name", &u));
        assert!(check("", &u));
    }

    #[test]
    fn unassigned_predicate_matches_missing_or_empty_unit_list() {
        let predicate = cql::NO_ACQ_UNIT_ASSIGNED_CQL;
        assert!(check(predicate, &json!({ "id": "org-1" })));
        assert!(check(predicate, &json!({ "acqUnitIds": [] })));
        assert!(check(predicate, &json!({ "acqUnitIds": null })));
        assert!(!check(predicate, &json!({ "acqUnitIds": [U1] })));
    }

    #[test]
    fn list_fields_match_if_any_element_matches() {
        let org = json!({ "acqUnitIds": [U1, U2] });
        assert!(check(&format!("acqUnitIds=({U3} or {U2})"), &org));
        assert!(!check(&format!("acqUnitIds=({U3})"), &org));
        assert!(check("acqUnitIds<>[]", &org));
    }

    #[test]
    fn json_records_support_nested_and_scalar_fields() {
        let record = json!({ "metadata": { "createdBy": "admin" }, "code": 42, "active": true });
        assert!(check("metadata.createdBy==admin", &record));
        assert!(check("code==42", &record));
        assert!(check("active==true", &record));
    }

    #[test]
    fn memberships_expose_storage_fields() {
        let unit_id = Uuid::parse_str(U1).unwrap();
        let user_id = Uuid::parse_str(U2).unwrap();
        let m = AcquisitionUnitMembership::new(unit_id, user_id);
        assert!(check(
            &acq_units_sdk::cql::user_memberships_query(user_id, [unit_id]),
            &m
        ));
        assert!(!check(&format!("userId=={U3}"), &m));
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert_eq!(CqlQuery::parse("id=="), Err(QueryError::UnexpectedEnd));
        assert_eq!(
            CqlQuery::parse("name==\"open"),
            Err(QueryError::UnterminatedString { offset: 6 })
        );
        assert!(matches!(
            CqlQuery::parse("id==1 )"),
            Err(QueryError::UnexpectedToken { offset: 6, .. })
        ));
        assert!(CqlQuery::parse("id < 3").is_err());
        assert!(CqlQuery::parse("id > 3").is_err());
        assert!(CqlQuery::parse("(id==1").is_err());
    }

    #[test]
    fn parsed_query_is_reusable() {
        let q = CqlQuery::parse(&format!("id==({U1} or {U2})")).unwrap();
        let hits = [unit(U1), unit(U2), unit(U3)]
            .iter()
            .filter(|u| q.matches(*u))
            .count();
        assert_eq!(hits, 2);
    }
}
