//! Field addressing for structured-data stores
//!
//! A field is addressed by exactly one of:
//! - a bare top-level key (`version`)
//! - an RFC 6901 JSON Pointer (`/tool/version`)
//! - a path query (`$.tool.version`, `$['a.b'][0]`, `$..version`)

use serde_json::Value;
use std::fmt;

pub const DEFAULT_FIELD: &str = "version";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLocator {
    Key(String),
    Pointer(String),
    Query(PathQuery),
}

impl FieldLocator {
    /// Pick the addressing mode from the leading character.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("field cannot be empty".to_string());
        }
        if raw.starts_with('/') {
            validate_pointer(raw)?;
            return Ok(FieldLocator::Pointer(raw.to_string()));
        }
        if raw.starts_with('$') {
            return PathQuery::parse(raw).map(FieldLocator::Query);
        }
        Ok(FieldLocator::Key(raw.to_string()))
    }

    /// Concrete JSON Pointers of every existing location this locator selects.
    pub fn select(&self, doc: &Value) -> Vec<String> {
        match self {
            FieldLocator::Key(key) => match doc.as_object() {
                Some(map) if map.contains_key(key) => vec![format!("/{}", escape_token(key))],
                _ => Vec::new(),
            },
            FieldLocator::Pointer(pointer) => {
                if doc.pointer(pointer).is_some() {
                    vec![pointer.clone()]
                } else {
                    Vec::new()
                }
            }
            FieldLocator::Query(query) => query.select(doc),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            FieldLocator::Key(_) => "key",
            FieldLocator::Pointer(_) => "pointer",
            FieldLocator::Query(_) => "query",
        }
    }
}

impl Default for FieldLocator {
    fn default() -> Self {
        FieldLocator::Key(DEFAULT_FIELD.to_string())
    }
}

impl fmt::Display for FieldLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldLocator::Key(key) => f.write_str(key),
            FieldLocator::Pointer(pointer) => f.write_str(pointer),
            FieldLocator::Query(query) => f.write_str(&query.raw),
        }
    }
}

fn validate_pointer(pointer: &str) -> Result<(), String> {
    let mut chars = pointer.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' && !matches!(chars.next(), Some('0') | Some('1')) {
            return Err(format!(
                "invalid JSON Pointer '{}': '~' must be followed by '0' or '1'",
                pointer
            ));
        }
    }
    Ok(())
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Child(String),
    Index(usize),
    Wildcard,
    Descendant(String),
}

/// A path query over a JSON document.
///
/// Supports child names (`.a`, `['a']`), array indices (`[0]`), wildcards
/// (`.*`, `[*]`) and recursive descent to a name (`..a`). Filters and
/// slices are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    raw: String,
    segments: Vec<Segment>,
}

impl PathQuery {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let err = |msg: &str| format!("invalid path query '{}': {}", raw, msg);
        let chars: Vec<char> = raw.chars().collect();
        if chars.first() != Some(&'$') {
            return Err(err("must start with '$'"));
        }

        let mut segments = Vec::new();
        let mut i = 1;
        while i < chars.len() {
            match chars[i] {
                '.' => {
                    let descendant = chars.get(i + 1) == Some(&'.');
                    i += if descendant { 2 } else { 1 };
                    if !descendant && chars.get(i) == Some(&'*') {
                        segments.push(Segment::Wildcard);
                        i += 1;
                        continue;
                    }
                    let start = i;
                    while i < chars.len() && is_name_char(chars[i]) {
                        i += 1;
                    }
                    if start == i {
                        return Err(err("expected a member name after '.'"));
                    }
                    let name: String = chars[start..i].iter().collect();
                    segments.push(if descendant {
                        Segment::Descendant(name)
                    } else {
                        Segment::Child(name)
                    });
                }
                '[' => {
                    i += 1;
                    match chars.get(i) {
                        Some('*') => {
                            segments.push(Segment::Wildcard);
                            i += 1;
                        }
                        Some(&quote) if quote == '\'' || quote == '"' => {
                            i += 1;
                            let mut name = String::new();
                            loop {
                                match chars.get(i) {
                                    None => return Err(err("unterminated quoted name")),
                                    Some('\\') => {
                                        let escaped = chars
                                            .get(i + 1)
                                            .ok_or_else(|| err("dangling escape"))?;
                                        name.push(*escaped);
                                        i += 2;
                                    }
                                    Some(&c) if c == quote => {
                                        i += 1;
                                        break;
                                    }
                                    Some(&c) => {
                                        name.push(c);
                                        i += 1;
                                    }
                                }
                            }
                            segments.push(Segment::Child(name));
                        }
                        Some(c) if c.is_ascii_digit() => {
                            let start = i;
                            while i < chars.len() && chars[i].is_ascii_digit() {
                                i += 1;
                            }
                            let digits: String = chars[start..i].iter().collect();
                            let index = digits.parse::<usize>().map_err(|_| err("index out of range"))?;
                            segments.push(Segment::Index(index));
                        }
                        _ => return Err(err("expected a quoted name, index or '*' inside '[]'")),
                    }
                    if chars.get(i) != Some(&']') {
                        return Err(err("missing ']'"));
                    }
                    i += 1;
                }
                other => return Err(err(&format!("unexpected character '{}'", other))),
            }
        }

        if segments.is_empty() {
            return Err(err("must select a member, not the whole document"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// JSON Pointers of every node the query selects, in document order.
    pub fn select(&self, doc: &Value) -> Vec<String> {
        let mut current: Vec<(String, &Value)> = vec![(String::new(), doc)];
        for segment in &self.segments {
            let mut next = Vec::new();
            for (pointer, node) in current {
                step(segment, &pointer, node, &mut next);
            }
            current = next;
        }
        let mut pointers: Vec<String> = current.into_iter().map(|(pointer, _)| pointer).collect();
        pointers.dedup();
        pointers
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '-'
}

fn step<'a>(segment: &Segment, pointer: &str, node: &'a Value, out: &mut Vec<(String, &'a Value)>) {
    match segment {
        Segment::Child(name) => {
            if let Some(child) = node.as_object().and_then(|map| map.get(name)) {
                out.push((format!("{}/{}", pointer, escape_token(name)), child));
            }
        }
        Segment::Index(index) => {
            if let Some(child) = node.as_array().and_then(|items| items.get(*index)) {
                out.push((format!("{}/{}", pointer, index), child));
            }
        }
        Segment::Wildcard => match node {
            Value::Object(map) => {
                for (key, child) in map {
                    out.push((format!("{}/{}", pointer, escape_token(key)), child));
                }
            }
            Value::Array(items) => {
                for (idx, child) in items.iter().enumerate() {
                    out.push((format!("{}/{}", pointer, idx), child));
                }
            }
            _ => {}
        },
        Segment::Descendant(name) => descend(name, pointer, node, out),
    }
}

fn descend<'a>(name: &str, pointer: &str, node: &'a Value, out: &mut Vec<(String, &'a Value)>) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                let child_pointer = format!("{}/{}", pointer, escape_token(key));
                if key == name {
                    out.push((child_pointer.clone(), child));
                }
                descend(name, &child_pointer, child, out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                descend(name, &format!("{}/{}", pointer, idx), child, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn picks_addressing_mode() {
        assert_eq!(FieldLocator::parse("version").unwrap(), FieldLocator::Key("version".into()));
        assert!(matches!(FieldLocator::parse("/a/b").unwrap(), FieldLocator::Pointer(_)));
        assert!(matches!(FieldLocator::parse("$.a").unwrap(), FieldLocator::Query(_)));
        assert!(FieldLocator::parse("").is_err());
        assert!(FieldLocator::parse("/a~2").is_err());
        assert!(FieldLocator::parse("$.").is_err());
        assert!(FieldLocator::parse("$[0").is_err());
    }

    #[test]
    fn query_must_select_below_the_root() {
        let err = FieldLocator::parse("$").unwrap_err();
        assert!(err.contains("must select a member"), "{}", err);
        assert!(FieldLocator::parse("$.version").is_ok());
    }

    #[test]
    fn key_and_pointer_select_existing_fields_only() {
        let doc = json!({"version": "1.0.0", "a/b": {"x": 1}});
        assert_eq!(FieldLocator::parse("version").unwrap().select(&doc), vec!["/version"]);
        assert_eq!(FieldLocator::parse("a/b").unwrap().select(&doc), vec!["/a~1b"]);
        assert_eq!(FieldLocator::parse("/a~1b/x").unwrap().select(&doc), vec!["/a~1b/x"]);
        assert!(FieldLocator::parse("missing").unwrap().select(&doc).is_empty());
        assert!(FieldLocator::parse("/nope").unwrap().select(&doc).is_empty());
    }

    #[test]
    fn query_supports_children_indices_and_quotes() {
        let doc = json!({"tool": {"meta": [{"version": "1"}, {"version": "2"}]}, "a.b": 3});
        let q = PathQuery::parse("$.tool.meta[1].version").unwrap();
        assert_eq!(q.select(&doc), vec!["/tool/meta/1/version"]);
        let q = PathQuery::parse("$['a.b']").unwrap();
        assert_eq!(q.select(&doc), vec!["/a.b"]);
        let q = PathQuery::parse("$.tool.meta[*].version").unwrap();
        assert_eq!(q.select(&doc), vec!["/tool/meta/0/version", "/tool/meta/1/version"]);
    }

    #[test]
    fn query_recursive_descent() {
        let doc = json!({"version": "0", "nested": {"deep": {"version": "1"}}});
        let q = PathQuery::parse("$..version").unwrap();
        assert_eq!(q.select(&doc), vec!["/version", "/nested/deep/version"]);
    }
}
