use std::borrow::Cow;
use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Segment {
    /// Object member, or array index when the segment is numeric.
    Key(String),
    /// Object member matched by a `*`/`?` pattern. The first matching member wins.
    Wildcard(Vec<Token>),
    /// Bracketed array index.
    Index(usize),
    /// `#`: array length, or a projection over the elements when followed by more segments.
    Count,
    /// `#(...)` or `#(...)#`: the first, or every, array element satisfying a condition.
    Query(Query),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Token {
    /// `*`
    Any,
    /// `?`
    One,
    Literal(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
}

const OPERATORS: &[(&str, Op)] = &[
    ("==", Op::Eq),
    ("!=", Op::Ne),
    ("<=", Op::Le),
    (">=", Op::Ge),
    ("!%", Op::NotLike),
    ("<", Op::Lt),
    (">", Op::Gt),
    ("=", Op::Eq),
    ("%", Op::Like),
];

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Query {
    /// Path of the compared value inside each element. Empty means the element itself.
    path: Vec<Segment>,
    /// Missing means the condition only checks that `path` exists.
    comparison: Option<(Op, Value)>,
    all: bool,
}

/// Splits a path into segments. Returns `None` for malformed paths.
pub(super) fn parse(path: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut key = KeyBuf::default();
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => key.push_escaped(chars.next()?),
            '.' => key.flush(&mut segments),
            '[' => {
                key.flush(&mut segments);
                let mut digits = String::new();
                loop {
                    match chars.next()? {
                        ']' => break,
                        d => digits.push(d),
                    }
                }
                segments.push(Segment::Index(digits.trim().parse().ok()?));
            }
            '#' if key.is_empty() && chars.peek() == Some(&'(') => {
                chars.next();
                let condition = take_condition(&mut chars)?;
                let all = chars.next_if_eq(&'#').is_some();
                if !matches!(chars.peek(), None | Some('.') | Some('[')) {
                    return None;
                }
                segments.push(Segment::Query(parse_query(&condition, all)?));
            }
            '*' => key.push_token(ch, Token::Any),
            '?' => key.push_token(ch, Token::One),
            _ => key.push(ch),
        }
    }
    key.flush(&mut segments);

    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

#[derive(Default)]
struct KeyBuf {
    key: String,
    tokens: Vec<Token>,
    escaped: bool,
    wildcard: bool,
}

impl KeyBuf {
    fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    fn push(&mut self, ch: char) {
        self.key.push(ch);
        self.tokens.push(Token::Literal(ch));
    }

    fn push_escaped(&mut self, ch: char) {
        self.push(ch);
        self.escaped = true;
    }

    fn push_token(&mut self, ch: char, token: Token) {
        self.key.push(ch);
        self.tokens.push(token);
        self.wildcard = true;
    }

    fn flush(&mut self, segments: &mut Vec<Segment>) {
        if self.key.is_empty() {
            return;
        }
        let KeyBuf {
            key,
            tokens,
            escaped,
            wildcard,
        } = std::mem::take(self);
        let segment = if wildcard {
            Segment::Wildcard(tokens)
        } else if key == "#" && !escaped {
            Segment::Count
        } else {
            Segment::Key(key)
        };
        segments.push(segment);
    }
}

/// Reads up to the `)` closing a query, skipping parentheses inside quoted strings.
fn take_condition(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut condition = String::new();
    let mut depth = 0usize;
    let mut quoted = false;
    loop {
        let ch = chars.next()?;
        match ch {
            '\\' if quoted => {
                condition.push(ch);
                condition.push(chars.next()?);
                continue;
            }
            '"' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted && depth == 0 => return Some(condition),
            ')' if !quoted => depth -= 1,
            _ => {}
        }
        condition.push(ch);
    }
}

fn parse_query(condition: &str, all: bool) -> Option<Query> {
    let Some((at, op, op_len)) = find_operator(condition) else {
        return Some(Query {
            path: parse(condition.trim())?,
            comparison: None,
            all,
        });
    };
    let lhs = condition[..at].trim();
    let rhs = condition[at + op_len..].trim();
    let path = if lhs.is_empty() { vec![] } else { parse(lhs)? };
    Some(Query {
        path,
        comparison: Some((op, parse_literal(rhs)?)),
        all,
    })
}

fn find_operator(condition: &str) -> Option<(usize, Op, usize)> {
    let mut quoted = false;
    let mut escaped = false;
    for (at, ch) in condition.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => quoted = !quoted,
            '=' | '!' | '<' | '>' | '%' if !quoted => {
                return OPERATORS
                    .iter()
                    .find(|(text, _)| condition[at..].starts_with(text))
                    .map(|(text, op)| (at, *op, text.len()));
            }
            _ => {}
        }
    }
    None
}

/// A JSON literal, or a bare word taken as a string.
fn parse_literal(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    if text.starts_with('"') {
        return serde_json::from_str::<String>(text).ok().map(Value::String);
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned())))
}

/// Turns a `%` operand into match tokens. `\` escapes the next character.
fn pattern_tokens(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        tokens.push(match ch {
            '*' => Token::Any,
            '?' => Token::One,
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            _ => Token::Literal(ch),
        });
    }
    tokens
}

pub(super) fn wildcard_match(tokens: &[Token], text: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(Token::Any) => {
                backtrack = Some((p, t));
                p += 1;
                continue;
            }
            Some(Token::One) => {
                p += 1;
                t += 1;
                continue;
            }
            Some(Token::Literal(c)) if *c == text[t] => {
                p += 1;
                t += 1;
                continue;
            }
            _ => {}
        }
        match backtrack {
            Some((star, from)) => {
                p = star + 1;
                t = from + 1;
                backtrack = Some((star, from + 1));
            }
            None => return false,
        }
    }
    tokens[p..].iter().all(|token| *token == Token::Any)
}

impl Query {
    fn matches(&self, item: &Value) -> bool {
        let Some(lhs) = lookup(item, &self.path) else {
            return false;
        };
        match &self.comparison {
            None => true,
            Some((op, rhs)) => compare(&lhs, *op, rhs),
        }
    }
}

fn compare(lhs: &Value, op: Op, rhs: &Value) -> bool {
    let ordering = match (lhs, rhs) {
        (Value::String(text), Value::String(pattern)) if matches!(op, Op::Like | Op::NotLike) => {
            return wildcard_match(&pattern_tokens(pattern), text) == (op == Op::Like);
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b)),
        _ => {
            return match op {
                Op::Eq => lhs == rhs,
                Op::Ne => lhs != rhs,
                _ => false,
            }
        }
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        Op::Eq => ordering == Ordering::Equal,
        Op::Ne => ordering != Ordering::Equal,
        Op::Lt => ordering == Ordering::Less,
        Op::Le => ordering != Ordering::Greater,
        Op::Gt => ordering == Ordering::Greater,
        Op::Ge => ordering != Ordering::Less,
        Op::Like | Op::NotLike => false,
    }
}

/// Resolves `segments` against `value`.
///
/// Values are borrowed from the document except for `#` results, which are built on the fly.
pub(super) fn lookup<'a>(value: &'a Value, segments: &[Segment]) -> Option<Cow<'a, Value>> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(Cow::Borrowed(value));
    };
    match (first, value) {
        (Segment::Key(key), Value::Object(members)) => lookup(members.get(key)?, rest),
        (Segment::Key(key), Value::Array(items)) => {
            lookup(items.get(key.parse::<usize>().ok()?)?, rest)
        }
        (Segment::Wildcard(tokens), Value::Object(members)) => {
            let (_, member) = members
                .iter()
                .find(|(name, _)| wildcard_match(tokens, name))?;
            lookup(member, rest)
        }
        (Segment::Index(index), Value::Array(items)) => lookup(items.get(*index)?, rest),
        (Segment::Count, Value::Array(items)) if rest.is_empty() => {
            Some(Cow::Owned(Value::from(items.len())))
        }
        (Segment::Count, Value::Array(items)) => Some(Cow::Owned(Value::Array(
            items
                .iter()
                .filter_map(|item| lookup(item, rest))
                .map(Cow::into_owned)
                .collect(),
        ))),
        (Segment::Query(query), Value::Array(items)) if query.all => {
            Some(Cow::Owned(Value::Array(
                items
                    .iter()
                    .filter(|item| query.matches(item))
                    .filter_map(|item| lookup(item, rest))
                    .map(Cow::into_owned)
                    .collect(),
            )))
        }
        (Segment::Query(query), Value::Array(items)) => {
            lookup(items.iter().find(|item| query.matches(item))?, rest)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn key(s: &str) -> Segment {
        Segment::Key(s.to_owned())
    }

    fn tokens(pattern: &str) -> Vec<Token> {
        pattern_tokens(pattern)
    }

    #[test]
    fn test_parse_dots_and_brackets() {
        assert_eq!(parse("a.b.c"), Some(vec![key("a"), key("b"), key("c")]));
        assert_eq!(
            parse("a[0][12].b"),
            Some(vec![key("a"), Segment::Index(0), Segment::Index(12), key("b")])
        );
        assert_eq!(parse("[3]"), Some(vec![Segment::Index(3)]));
        assert_eq!(parse("a.#.b"), Some(vec![key("a"), Segment::Count, key("b")]));
    }

    #[test]
    fn test_parse_escapes() {
        assert_eq!(parse(r"a\.b.c"), Some(vec![key("a.b"), key("c")]));
        assert_eq!(parse(r"\#"), Some(vec![key("#")]));
        assert_eq!(parse(r"a\*"), Some(vec![key("a*")]));
        assert_eq!(parse(r"a\"), None);
    }

    #[test]
    fn test_parse_skips_empty_segments() {
        assert_eq!(parse("a..b."), Some(vec![key("a"), key("b")]));
        assert_eq!(parse(""), None);
        assert_eq!(parse("..."), None);
    }

    #[test]
    fn test_parse_rejects_bad_index() {
        assert_eq!(parse("a[b]"), None);
        assert_eq!(parse("a[-1]"), None);
        assert_eq!(parse("a[1"), None);
    }

    #[test]
    fn test_parse_wildcards() {
        assert_eq!(
            parse("na*.f?rst"),
            Some(vec![
                Segment::Wildcard(tokens("na*")),
                Segment::Wildcard(tokens("f?rst")),
            ])
        );
    }

    #[test]
    fn test_parse_queries() {
        assert_eq!(
            parse(r#"friends.#(first=="Roger").age"#),
            Some(vec![
                key("friends"),
                Segment::Query(Query {
                    path: vec![key("first")],
                    comparison: Some((Op::Eq, json!("Roger"))),
                    all: false,
                }),
                key("age"),
            ])
        );
        assert_eq!(
            parse("#(age>=40)#"),
            Some(vec![Segment::Query(Query {
                path: vec![key("age")],
                comparison: Some((Op::Ge, json!(40))),
                all: true,
            })])
        );
        assert_eq!(
            parse("#(nets.#)"),
            Some(vec![Segment::Query(Query {
                path: vec![key("nets"), Segment::Count],
                comparison: None,
                all: false,
            })])
        );
        assert_eq!(
            parse(r#"#(name=="a)b")"#),
            Some(vec![Segment::Query(Query {
                path: vec![key("name")],
                comparison: Some((Op::Eq, json!("a)b"))),
                all: false,
            })])
        );
    }

    #[test]
    fn test_parse_rejects_bad_queries() {
        for path in ["#(a==1", "#(a==)", "#()", "#(a==1)x", r#"#(a=="x)"#] {
            assert_eq!(parse(path), None, "{path:?}");
        }
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match(&tokens("*"), ""));
        assert!(wildcard_match(&tokens("fir*"), "first"));
        assert!(wildcard_match(&tokens("*st"), "first"));
        assert!(wildcard_match(&tokens("f*r*t"), "fizzrbt"));
        assert!(wildcard_match(&tokens("f?rst"), "first"));
        assert!(wildcard_match(&tokens(r"a\*"), "a*"));
        assert!(!wildcard_match(&tokens(r"a\*"), "ab"));
        assert!(!wildcard_match(&tokens("f?rst"), "frst"));
        assert!(!wildcard_match(&tokens("fir*x"), "first"));
    }

    #[test]
    fn test_compare() {
        assert!(compare(&json!(44), Op::Lt, &json!(45.5)));
        assert!(compare(&json!("b"), Op::Gt, &json!("a")));
        assert!(compare(&json!("Dale"), Op::Like, &json!("D*")));
        assert!(compare(&json!("Roger"), Op::NotLike, &json!("D*")));
        assert!(compare(&json!(true), Op::Eq, &json!(true)));
        assert!(compare(&json!(null), Op::Ne, &json!(1)));
        assert!(!compare(&json!("1"), Op::Eq, &json!(1)));
        assert!(!compare(&json!(true), Op::Gt, &json!(false)));
    }
}
