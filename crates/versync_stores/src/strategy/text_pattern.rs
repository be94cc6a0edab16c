use super::FormatStrategy;
use crate::error::{Result, StoreError};
use crate::path::StorePath;
use crate::schema::{StoreKind, TextReplace, VERSION_TOKEN};
use crate::version::VersionString;
use regex::{Captures, Regex};

/// Find/replace on an arbitrary text file.
///
/// Without a matcher the whole file becomes the bare version string and any
/// replacement template is ignored.
///
/// Replacement templates use ECMAScript `String.prototype.replace`
/// conventions: `$1`..`$99`, `$<name>`, `$&`, `` $` ``, `$'` and `$$`.
#[derive(Debug, Clone)]
pub struct TextPatternStrategy {
    replace: TextReplace,
}

impl TextPatternStrategy {
    pub fn new(replace: TextReplace) -> Self {
        Self { replace }
    }

    fn template(&self, version: &VersionString) -> String {
        self.replace
            .replacement
            .as_deref()
            .unwrap_or(VERSION_TOKEN)
            .replace(VERSION_TOKEN, version.as_str())
    }
}

impl FormatStrategy for TextPatternStrategy {
    fn kind(&self) -> StoreKind {
        StoreKind::TextPattern
    }

    fn describe(&self) -> String {
        match &self.replace.matcher {
            Some(re) => format!("first match of /{}/", re.as_str()),
            None => "whole file".to_string(),
        }
    }

    fn apply(&self, store: &StorePath, current: &str, version: &VersionString) -> Result<String> {
        let matcher = match &self.replace.matcher {
            Some(re) => re,
            None => return Ok(version.to_string()),
        };
        let template = self.template(version);

        let caps = matcher.captures(current).ok_or_else(|| StoreError::PatternNotFound {
            path: store.to_string(),
            pattern: matcher.as_str().to_string(),
        })?;
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);

        let mut out = String::with_capacity(current.len() + template.len());
        out.push_str(&current[..whole.start]);
        expand_template(&template, matcher, &caps, current, &mut out);
        out.push_str(&current[whole.end..]);
        Ok(out)
    }
}

/// Expand an ECMAScript-style replacement template for one match.
fn expand_template(template: &str, matcher: &Regex, caps: &Captures<'_>, haystack: &str, out: &mut String) {
    let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
    let group_count = caps.len() - 1;
    let bytes = template.as_bytes();
    let mut i = 0;
    let mut literal_start = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' || i + 1 >= bytes.len() {
            i += 1;
            continue;
        }
        let next = bytes[i + 1];
        let (expansion, consumed): (Option<&str>, usize) = match next {
            b'$' => (Some("$"), 2),
            b'&' => (Some(&haystack[whole.clone()]), 2),
            b'`' => (Some(&haystack[..whole.start]), 2),
            b'\'' => (Some(&haystack[whole.end..]), 2),
            b'0'..=b'9' => match group_reference(&bytes[i + 1..], group_count) {
                Some((group, digits)) => (Some(caps.get(group).map_or("", |m| m.as_str())), 1 + digits),
                None => (None, 0),
            },
            b'<' => match template[i + 2..].find('>') {
                Some(end) => {
                    let name = &template[i + 2..i + 2 + end];
                    match caps.name(name) {
                        Some(m) => (Some(m.as_str()), 3 + end),
                        // Named but unmatched groups expand to nothing.
                        None if matcher.capture_names().any(|n| n == Some(name)) => (Some(""), 3 + end),
                        None => (None, 0),
                    }
                }
                None => (None, 0),
            },
            _ => (None, 0),
        };

        match expansion {
            Some(text) => {
                out.push_str(&template[literal_start..i]);
                out.push_str(text);
                i += consumed;
                literal_start = i;
            }
            None => i += 1,
        }
    }
    out.push_str(&template[literal_start..]);
}

/// Resolve `$n`/`$nn` the way ECMAScript does: prefer two digits when that
/// names an existing group, else one digit. `$0` is not a reference.
fn group_reference(digits: &[u8], group_count: usize) -> Option<(usize, usize)> {
    let first = (digits[0] - b'0') as usize;
    if let Some(&second) = digits.get(1).filter(|b| b.is_ascii_digit()) {
        let two = first * 10 + (second - b'0') as usize;
        if two >= 1 && two <= group_count {
            return Some((two, 2));
        }
    }
    if first >= 1 && first <= group_count {
        return Some((first, 1));
    }
    None
}
