//! Store Schema
//!
//! Declarations arrive as untyped JSON from the project manifest. This
//! module checks them against the three accepted shapes and narrows them
//! into [`StoreDeclaration`] values.
//!
//! Validation never stops at the first problem: every violation found in
//! the reported candidate (and in every element of an array) is returned,
//! so a user can fix a configuration in one pass.
//!
//! # Shapes
//!
//! | Kind | Keys |
//! |---|---|
//! | `structured` | `path` (`.json`, `.jsonc`, `.json5`), `field`? |
//! | `module` | `path` (`.js`, `.cjs`, `.mjs`, `.ts`), `style`?, `exportName`? |
//! | `text` | `path`, `match`?, `replacement`? or `replace: { match?, with? }` |
//!
//! Without an explicit `kind` the shapes are tried in that order and the
//! first one that accepts the input wins.

mod json_schema;
mod locator;

pub use json_schema::{config_json_schema, json_schema};
pub use locator::{FieldLocator, PathQuery, DEFAULT_FIELD};

use crate::path::StorePath;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;

/// Token that a text-store replacement must contain.
pub const VERSION_TOKEN: &str = "{{version}}";

pub(crate) const STRUCTURED_EXTENSIONS: &[&str] = &["json", "jsonc", "json5"];
pub(crate) const MODULE_EXTENSIONS: &[&str] = &["js", "cjs", "mjs", "ts"];
pub(crate) const EXPORT_NAME_PATTERN: &str = "^[A-Za-z_$][A-Za-z0-9_$]*$";

const STRUCTURED_KEYS: &[&str] = &["kind", "path", "field"];
const MODULE_KEYS: &[&str] = &["kind", "path", "style", "exportName"];
const TEXT_KEYS: &[&str] = &["kind", "path", "match", "replacement", "replace"];
const REPLACE_KEYS: &[&str] = &["match", "with"];

/// Discriminant of a store declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    StructuredField,
    ModuleExport,
    TextPattern,
}

impl StoreKind {
    pub const ALL: [StoreKind; 3] = [
        StoreKind::StructuredField,
        StoreKind::ModuleExport,
        StoreKind::TextPattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::StructuredField => "structured",
            StoreKind::ModuleExport => "module",
            StoreKind::TextPattern => "text",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        StoreKind::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Module system a module-export store is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStyle {
    Esm,
    CommonJs,
}

impl ModuleStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStyle::Esm => "esm",
            ModuleStyle::CommonJs => "commonjs",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "esm" => Some(ModuleStyle::Esm),
            "commonjs" => Some(ModuleStyle::CommonJs),
            _ => None,
        }
    }
}

/// Find/replace settings of a text store. Both parts are optional.
#[derive(Debug, Clone, Default)]
pub struct TextReplace {
    /// Compiled once at validation time.
    pub matcher: Option<Regex>,
    pub replacement: Option<String>,
}

impl TextReplace {
    pub fn is_whole_file(&self) -> bool {
        self.matcher.is_none()
    }
}

/// A validated store declaration.
#[derive(Debug, Clone)]
pub enum StoreDeclaration {
    StructuredField {
        path: StorePath,
        field: Option<FieldLocator>,
    },
    ModuleExport {
        path: StorePath,
        style: Option<ModuleStyle>,
        export_name: Option<String>,
    },
    TextPattern {
        path: StorePath,
        replace: TextReplace,
    },
}

impl StoreDeclaration {
    pub fn kind(&self) -> StoreKind {
        match self {
            StoreDeclaration::StructuredField { .. } => StoreKind::StructuredField,
            StoreDeclaration::ModuleExport { .. } => StoreKind::ModuleExport,
            StoreDeclaration::TextPattern { .. } => StoreKind::TextPattern,
        }
    }

    pub fn path(&self) -> &StorePath {
        match self {
            StoreDeclaration::StructuredField { path, .. }
            | StoreDeclaration::ModuleExport { path, .. }
            | StoreDeclaration::TextPattern { path, .. } => path,
        }
    }

    /// Structured store on `path` addressing `field` (default `version`).
    pub fn structured(path: StorePath, field: Option<FieldLocator>) -> Self {
        StoreDeclaration::StructuredField { path, field }
    }
}

/// A configuration holds either one declaration or an array of them.
#[derive(Debug, Clone)]
pub enum StoreDeclarations {
    One(StoreDeclaration),
    Many(Vec<StoreDeclaration>),
}

impl StoreDeclarations {
    pub fn len(&self) -> usize {
        match self {
            StoreDeclarations::One(_) => 1,
            StoreDeclarations::Many(decls) => decls.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into declaration order.
    pub fn into_vec(self) -> Vec<StoreDeclaration> {
        match self {
            StoreDeclarations::One(decl) => vec![decl],
            StoreDeclarations::Many(decls) => decls,
        }
    }
}

/// One schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// JSON Pointer into the validated input (`/1/exportName`).
    pub instance_path: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = if self.instance_path.is_empty() {
            "(root)"
        } else {
            self.instance_path.as_str()
        };
        write!(f, "{}: expected {}, got {}", at, self.expected, self.actual)
    }
}

/// Every violation found while validating one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} store declaration violation(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  - {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a single declaration or an array of declarations.
pub fn validate(input: &Value) -> Result<StoreDeclarations, ValidationErrors> {
    validate_at(input, "")
}

/// Same as [`validate`], reporting instance paths below `base`.
pub(crate) fn validate_at(input: &Value, base: &str) -> Result<StoreDeclarations, ValidationErrors> {
    match input {
        Value::Array(items) => {
            let mut decls = Vec::with_capacity(items.len());
            let mut errors = Vec::new();
            for (idx, item) in items.iter().enumerate() {
                match validate_declaration(item, &format!("{}/{}", base, idx)) {
                    Ok(decl) => decls.push(decl),
                    Err(errs) => errors.extend(errs),
                }
            }
            if errors.is_empty() {
                Ok(StoreDeclarations::Many(decls))
            } else {
                Err(ValidationErrors(errors))
            }
        }
        Value::Object(_) => validate_declaration(input, base)
            .map(StoreDeclarations::One)
            .map_err(ValidationErrors),
        other => Err(ValidationErrors(vec![ValidationError {
            instance_path: base.to_string(),
            expected: "a store declaration or an array of store declarations".to_string(),
            actual: describe(other),
        }])),
    }
}

fn validate_declaration(value: &Value, base: &str) -> Result<StoreDeclaration, Vec<ValidationError>> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            return Err(vec![ValidationError {
                instance_path: base.to_string(),
                expected: "a store declaration object".to_string(),
                actual: describe(value),
            }])
        }
    };

    if let Some(tag) = obj.get("kind") {
        let kind = tag.as_str().and_then(StoreKind::from_tag);
        return match kind {
            Some(kind) => validate_variant(kind, obj, base),
            None => Err(vec![ValidationError {
                instance_path: format!("{}/kind", base),
                expected: "one of \"structured\", \"module\", \"text\"".to_string(),
                actual: describe(tag),
            }]),
        };
    }

    let mut best: Option<Vec<ValidationError>> = None;
    for kind in StoreKind::ALL {
        match validate_variant(kind, obj, base) {
            Ok(decl) => return Ok(decl),
            Err(errors) => {
                if best.as_ref().map_or(true, |b| errors.len() < b.len()) {
                    best = Some(errors);
                }
            }
        }
    }
    Err(best.unwrap_or_default())
}

fn validate_variant(
    kind: StoreKind,
    obj: &Map<String, Value>,
    base: &str,
) -> Result<StoreDeclaration, Vec<ValidationError>> {
    match kind {
        StoreKind::StructuredField => validate_structured(obj, base),
        StoreKind::ModuleExport => validate_module(obj, base),
        StoreKind::TextPattern => validate_text(obj, base),
    }
}

fn validate_structured(obj: &Map<String, Value>, base: &str) -> Result<StoreDeclaration, Vec<ValidationError>> {
    let mut check = ObjectCheck::new(obj, base);
    check.reject_unknown(STRUCTURED_KEYS);
    let path = check.store_path(Some(STRUCTURED_EXTENSIONS));
    let field = check.optional_str("field").and_then(|raw| match FieldLocator::parse(raw) {
        Ok(locator) => Some(locator),
        Err(reason) => {
            check.error("field", "a field name, JSON Pointer or path query", reason);
            None
        }
    });
    check.finish(path, |path| StoreDeclaration::StructuredField { path, field })
}

fn validate_module(obj: &Map<String, Value>, base: &str) -> Result<StoreDeclaration, Vec<ValidationError>> {
    let mut check = ObjectCheck::new(obj, base);
    check.reject_unknown(MODULE_KEYS);
    let path = check.store_path(Some(MODULE_EXTENSIONS));
    let style = check.optional_str("style").and_then(|raw| match ModuleStyle::parse(raw) {
        Some(style) => Some(style),
        None => {
            check.error("style", "one of \"esm\", \"commonjs\"", format!("\"{}\"", raw));
            None
        }
    });
    let export_name = check.optional_str("exportName").and_then(|raw| {
        if is_identifier(raw) {
            Some(raw.to_string())
        } else {
            check.error(
                "exportName",
                format!("an identifier matching {}", EXPORT_NAME_PATTERN),
                format!("\"{}\"", raw),
            );
            None
        }
    });
    check.finish(path, |path| StoreDeclaration::ModuleExport {
        path,
        style,
        export_name,
    })
}

fn validate_text(obj: &Map<String, Value>, base: &str) -> Result<StoreDeclaration, Vec<ValidationError>> {
    let mut check = ObjectCheck::new(obj, base);
    check.reject_unknown(TEXT_KEYS);
    let path = check.store_path(None);

    let flat = obj.contains_key("match") || obj.contains_key("replacement");
    let replace = match obj.get("replace") {
        Some(_) if flat => {
            check.error(
                "replace",
                "either `replace` or top-level `match`/`replacement`, not both",
                "both".to_string(),
            );
            TextReplace::default()
        }
        Some(Value::Object(nested)) => {
            let mut inner = ObjectCheck::new(nested, &format!("{}/replace", base));
            inner.reject_unknown(REPLACE_KEYS);
            let replace = text_replace(&mut inner, "match", "with");
            check.errors.append(&mut inner.errors);
            replace
        }
        Some(other) => {
            check.error("replace", "an object with `match` and `with`", describe(other));
            TextReplace::default()
        }
        None => text_replace(&mut check, "match", "replacement"),
    };

    check.finish(path, |path| StoreDeclaration::TextPattern { path, replace })
}

fn text_replace(check: &mut ObjectCheck<'_>, match_key: &str, with_key: &str) -> TextReplace {
    let matcher = check.optional_str(match_key).and_then(|raw| match Regex::new(raw) {
        Ok(re) => Some(re),
        Err(err) => {
            check.error(match_key, "a valid regular expression", err.to_string());
            None
        }
    });
    let replacement = check.optional_str(with_key).and_then(|raw| {
        if raw.contains(VERSION_TOKEN) {
            Some(raw.to_string())
        } else {
            check.error(
                with_key,
                format!("a string containing {}", VERSION_TOKEN),
                format!("\"{}\"", raw),
            );
            None
        }
    });
    TextReplace { matcher, replacement }
}

pub(crate) fn is_identifier(raw: &str) -> bool {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Accumulates violations while reading fields out of one JSON object.
struct ObjectCheck<'a> {
    obj: &'a Map<String, Value>,
    base: String,
    errors: Vec<ValidationError>,
}

impl<'a> ObjectCheck<'a> {
    fn new(obj: &'a Map<String, Value>, base: &str) -> Self {
        Self {
            obj,
            base: base.to_string(),
            errors: Vec::new(),
        }
    }

    fn error(&mut self, key: &str, expected: impl Into<String>, actual: impl Into<String>) {
        self.errors.push(ValidationError {
            instance_path: format!("{}/{}", self.base, key),
            expected: expected.into(),
            actual: actual.into(),
        });
    }

    fn reject_unknown(&mut self, allowed: &[&str]) {
        let obj = self.obj;
        for (key, value) in obj.iter().filter(|(key, _)| !allowed.contains(&key.as_str())) {
            self.error(key, "no such field (unknown fields are rejected)", describe(value));
        }
    }

    fn optional_str(&mut self, key: &str) -> Option<&'a str> {
        let obj = self.obj;
        match obj.get(key) {
            None => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                self.error(key, "a string", describe(other));
                None
            }
        }
    }

    fn store_path(&mut self, extensions: Option<&[&str]>) -> Option<StorePath> {
        if !self.obj.contains_key("path") {
            self.error("path", "a file path", "nothing");
            return None;
        }
        let raw = self.optional_str("path")?;
        let path = match StorePath::parse(raw) {
            Ok(path) => path,
            Err(reason) => {
                self.error("path", "a relative path inside the project root", reason);
                return None;
            }
        };
        if let Some(allowed) = extensions {
            let ext = path.extension().unwrap_or_default();
            if !allowed.contains(&ext.as_str()) {
                let wanted: Vec<String> = allowed.iter().map(|e| format!(".{}", e)).collect();
                self.error(
                    "path",
                    format!("a path ending in {}", wanted.join(", ")),
                    format!("\"{}\"", raw),
                );
                return None;
            }
        }
        Some(path)
    }

    fn finish(
        self,
        path: Option<StorePath>,
        build: impl FnOnce(StorePath) -> StoreDeclaration,
    ) -> Result<StoreDeclaration, Vec<ValidationError>> {
        match path {
            Some(path) if self.errors.is_empty() => Ok(build(path)),
            _ => Err(self.errors),
        }
    }
}

/// Short human description of a JSON value for error reports.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(items) => format!("an array of {} item(s)", items.len()),
        Value::Object(_) => "an object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one(input: Value) -> StoreDeclaration {
        match validate(&input).unwrap() {
            StoreDeclarations::One(decl) => decl,
            StoreDeclarations::Many(_) => panic!("expected a single declaration"),
        }
    }

    fn errors(input: Value) -> Vec<ValidationError> {
        validate(&input).unwrap_err().0
    }

    #[test]
    fn bare_json_path_is_structured() {
        let decl = one(json!({"path": "package.json"}));
        assert_eq!(decl.kind(), StoreKind::StructuredField);
        assert_eq!(decl.path().as_str(), "package.json");
    }

    #[test]
    fn module_path_is_module_export() {
        let decl = one(json!({"path": "src/version.cjs", "exportName": "v"}));
        match decl {
            StoreDeclaration::ModuleExport { style, export_name, .. } => {
                assert_eq!(style, None);
                assert_eq!(export_name.as_deref(), Some("v"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn other_paths_fall_back_to_text() {
        let decl = one(json!({"path": "VERSION"}));
        assert_eq!(decl.kind(), StoreKind::TextPattern);

        let decl = one(json!({"path": "src/v.ts", "match": "^v=.*$", "replacement": "v={{version}}"}));
        assert_eq!(decl.kind(), StoreKind::TextPattern);
    }

    #[test]
    fn nested_replace_form_is_accepted() {
        let decl = one(json!({"path": "README.md", "replace": {"match": "v\\d+", "with": "v{{version}}"}}));
        match decl {
            StoreDeclaration::TextPattern { replace, .. } => {
                assert_eq!(replace.matcher.unwrap().as_str(), "v\\d+");
                assert_eq!(replace.replacement.as_deref(), Some("v{{version}}"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn explicit_kind_restricts_variant() {
        let errs = errors(json!({"kind": "module", "path": "package.json"}));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].instance_path, "/path");
        assert!(errs[0].expected.contains(".mjs"));

        let errs = errors(json!({"kind": "yaml", "path": "a.yml"}));
        assert_eq!(errs[0].instance_path, "/kind");
    }

    #[test]
    fn reports_every_violation_of_a_declaration() {
        let errs = errors(json!({
            "kind": "module",
            "path": "v.js",
            "style": "amd",
            "exportName": "1abc",
            "extra": true
        }));
        let paths: Vec<&str> = errs.iter().map(|e| e.instance_path.as_str()).collect();
        assert_eq!(paths, vec!["/extra", "/style", "/exportName"]);
    }

    #[test]
    fn reports_errors_of_every_array_element() {
        let errs = errors(json!([
            {"path": "ok.json"},
            {"kind": "text", "path": "a.txt", "replacement": "no token"},
            {"kind": "text", "path": "b.txt", "match": "(unclosed"}
        ]));
        let paths: Vec<&str> = errs.iter().map(|e| e.instance_path.as_str()).collect();
        assert_eq!(paths, vec!["/1/replacement", "/2/match"]);
    }

    #[test]
    fn rejects_escaping_paths() {
        let errs = errors(json!({"kind": "text", "path": "../secret.txt"}));
        assert_eq!(errs[0].instance_path, "/path");
        assert!(errs[0].actual.contains("escapes"));
    }

    #[test]
    fn rejects_mixed_replace_forms() {
        let errs = errors(json!({
            "kind": "text",
            "path": "a.txt",
            "match": "x",
            "replace": {"with": "{{version}}"}
        }));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].instance_path, "/replace");
    }

    #[test]
    fn rejects_non_declarations() {
        assert_eq!(errors(json!("package.json")).len(), 1);
        let errs = errors(json!([42]));
        assert_eq!(errs[0].instance_path, "/0");
        assert_eq!(errors(json!({"field": "version"}))[0].instance_path, "/path");
    }

    #[test]
    fn root_query_is_not_a_field() {
        let errs = errors(json!({"path": "a.json", "field": "$"}));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].instance_path, "/field");
    }

    #[test]
    fn empty_array_is_valid() {
        let decls = validate(&json!([])).unwrap();
        assert!(decls.is_empty());
    }

    #[test]
    fn identifier_rule() {
        assert!(is_identifier("version"));
        assert!(is_identifier("$v_1"));
        assert!(!is_identifier("1v"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }
}
