use super::FormatStrategy;
use crate::error::{Result, StoreError};
use crate::path::StorePath;
use crate::schema::{FieldLocator, StoreKind};
use crate::version::VersionString;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

/// Flavour of JSON a structured store is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonDialect {
    Json,
    /// JSON with `//` and `/* */` comments and trailing commas.
    Jsonc,
    /// Read with the same relaxations as JSONC; other JSON5 syntax is a parse error.
    Json5,
}

impl JsonDialect {
    pub fn from_path(path: &StorePath) -> Self {
        match path.extension().as_deref() {
            Some("jsonc") => JsonDialect::Jsonc,
            Some("json5") => JsonDialect::Json5,
            _ => JsonDialect::Json,
        }
    }

    fn relaxed(&self) -> bool {
        !matches!(self, JsonDialect::Json)
    }
}

/// Sets one field of a JSON document to the version string.
///
/// Key order survives (`preserve_order`), as do the indentation unit, line
/// endings and trailing newline. Comments in JSONC/JSON5 files do not.
#[derive(Debug, Clone)]
pub struct StructuredFieldStrategy {
    locator: FieldLocator,
    dialect: JsonDialect,
}

impl StructuredFieldStrategy {
    pub fn new(locator: FieldLocator, dialect: JsonDialect) -> Self {
        Self { locator, dialect }
    }

    pub fn locator(&self) -> &FieldLocator {
        &self.locator
    }
}

impl FormatStrategy for StructuredFieldStrategy {
    fn kind(&self) -> StoreKind {
        StoreKind::StructuredField
    }

    fn describe(&self) -> String {
        format!("{} `{}`", self.locator.mode(), self.locator)
    }

    fn apply(&self, store: &StorePath, current: &str, version: &VersionString) -> Result<String> {
        let source = if self.dialect.relaxed() {
            strip_relaxed_syntax(current)
        } else {
            current.to_string()
        };
        let mut doc: Value = serde_json::from_str(&source).map_err(|err| StoreError::Parse {
            path: store.to_string(),
            message: err.to_string(),
        })?;

        let targets = self.locator.select(&doc);
        if targets.is_empty() {
            return Err(StoreError::FieldNotFound {
                path: store.to_string(),
                locator: self.locator.to_string(),
            });
        }
        for pointer in &targets {
            if let Some(slot) = doc.pointer_mut(pointer) {
                *slot = Value::String(version.to_string());
            }
        }

        render(&doc, &Layout::detect(current)).map_err(|message| StoreError::Parse {
            path: store.to_string(),
            message,
        })
    }
}

/// Whitespace conventions of the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout {
    /// `None` for single-line documents.
    indent: Option<String>,
    crlf: bool,
    trailing_newline: bool,
}

impl Layout {
    fn detect(content: &str) -> Self {
        let body = content.trim_end();
        let indent = if body.contains('\n') {
            let unit = body
                .lines()
                .skip(1)
                .map(|line| {
                    let trimmed = line.trim_start_matches([' ', '\t']);
                    &line[..line.len() - trimmed.len()]
                })
                .find(|lead| !lead.is_empty())
                .unwrap_or("  ");
            Some(unit.to_string())
        } else {
            None
        };
        Self {
            indent,
            crlf: content.contains("\r\n"),
            trailing_newline: content.ends_with('\n'),
        }
    }
}

fn render(doc: &Value, layout: &Layout) -> std::result::Result<String, String> {
    let mut out = match &layout.indent {
        Some(unit) => {
            let mut buf = Vec::new();
            {
                let formatter = PrettyFormatter::with_indent(unit.as_bytes());
                let mut ser = Serializer::with_formatter(&mut buf, formatter);
                doc.serialize(&mut ser).map_err(|e| e.to_string())?;
            }
            String::from_utf8(buf).map_err(|e| e.to_string())?
        }
        None => serde_json::to_string(doc).map_err(|e| e.to_string())?,
    };
    if layout.crlf {
        out = out.replace('\n', "\r\n");
    }
    if layout.trailing_newline {
        out.push_str(if layout.crlf { "\r\n" } else { "\n" });
    }
    Ok(out)
}

/// Blank out comments and trailing commas, keeping byte offsets and line
/// numbers intact so parse errors still point at the right place.
fn strip_relaxed_syntax(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = bytes.to_vec();
    let mut i = 0;
    let mut in_string = false;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            match b {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }
        match (b, bytes.get(i + 1)) {
            (b'"', _) => {
                in_string = true;
                i += 1;
            }
            (b'/', Some(b'/')) => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    out[i] = b' ';
                    i += 1;
                }
            }
            (b'/', Some(b'*')) => {
                let end = input[i + 2..].find("*/").map_or(bytes.len(), |pos| i + 2 + pos + 2);
                for slot in &mut out[i..end] {
                    if *slot != b'\n' && *slot != b'\r' {
                        *slot = b' ';
                    }
                }
                i = end;
            }
            _ => i += 1,
        }
    }

    // Trailing commas: a comma whose next significant byte closes a container.
    let mut i = 0;
    let mut in_string = false;
    while i < out.len() {
        let b = out[i];
        if in_string {
            match b {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
        } else if b == b'"' {
            in_string = true;
        } else if b == b',' {
            let next = out[i + 1..].iter().find(|c| !c.is_ascii_whitespace());
            if matches!(next, Some(b'}') | Some(b']')) {
                out[i] = b' ';
            }
        }
        i += 1;
    }

    // Comments are blanked whole, so no multi-byte character is left split.
    String::from_utf8(out).unwrap_or_else(|_| input.to_string())
}
