//! JSON Schema rendering of the store declaration shapes.
//!
//! Editors use this to offer completion and inline errors for the
//! `versioning.stores` field. The rules here mirror the validator in the
//! parent module; keep them in step.

use super::{EXPORT_NAME_PATTERN, MODULE_EXTENSIONS, STRUCTURED_EXTENSIONS};
use serde_json::{json, Map, Value};

const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Case-insensitive extension alternation. JSON Schema patterns have no
/// `(?i)`, so each letter becomes a two-case class.
fn extension_pattern(extensions: &[&str]) -> String {
    let alternatives: Vec<String> = extensions
        .iter()
        .map(|ext| {
            ext.chars()
                .map(|c| {
                    if c.is_ascii_alphabetic() {
                        format!("[{}{}]", c.to_ascii_lowercase(), c.to_ascii_uppercase())
                    } else {
                        c.to_string()
                    }
                })
                .collect()
        })
        .collect();
    format!("\\.({})$", alternatives.join("|"))
}

/// One declaration or an array of them.
fn store_union() -> Value {
    json!([
        { "$ref": "#/definitions/versionStore" },
        { "type": "array", "items": { "$ref": "#/definitions/versionStore" } }
    ])
}

fn definitions() -> Value {
    json!({
        "versionStoreStructured": {
            "title": "Structured-data version store",
            "type": "object",
            "additionalProperties": false,
            "required": ["path"],
            "properties": {
                "kind": { "const": "structured" },
                "path": {
                    "type": "string",
                    "description": "Root-relative path to a JSON, JSONC or JSON5 document.",
                    "pattern": extension_pattern(STRUCTURED_EXTENSIONS)
                },
                "field": {
                    "type": "string",
                    "description": "Top-level key, JSON Pointer (/a/b) or path query ($.a.b) of the version field.",
                    "default": "version"
                }
            }
        },
        "versionStoreModule": {
            "title": "Module-export version store",
            "type": "object",
            "additionalProperties": false,
            "required": ["path"],
            "properties": {
                "kind": { "const": "module" },
                "path": {
                    "type": "string",
                    "description": "Root-relative path to a module whose only content is the version export. ESM unless the extension is .cjs.",
                    "pattern": extension_pattern(MODULE_EXTENSIONS)
                },
                "style": {
                    "type": "string",
                    "enum": ["esm", "commonjs"],
                    "default": "esm"
                },
                "exportName": {
                    "type": "string",
                    "description": "Named export to write; \"default\" writes a default export.",
                    "pattern": EXPORT_NAME_PATTERN,
                    "default": "default"
                }
            }
        },
        "versionStoreText": {
            "title": "Text version store",
            "type": "object",
            "additionalProperties": false,
            "required": ["path"],
            "properties": {
                "kind": { "const": "text" },
                "path": {
                    "type": "string",
                    "description": "Root-relative path to any file. Without a pattern the whole content becomes the version."
                },
                "match": {
                    "type": "string",
                    "format": "regex",
                    "description": "Pattern whose first match is replaced."
                },
                "replacement": {
                    "type": "string",
                    "pattern": "\\{\\{version\\}\\}",
                    "description": "Replacement for the match; {{version}} is substituted first, $1 refers to capture groups. Ignored without a pattern."
                },
                "replace": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "match": { "type": "string", "format": "regex" },
                        "with": { "type": "string", "pattern": "\\{\\{version\\}\\}" }
                    }
                }
            }
        },
        "versionStore": {
            "anyOf": [
                { "$ref": "#/definitions/versionStoreStructured" },
                { "$ref": "#/definitions/versionStoreModule" },
                { "$ref": "#/definitions/versionStoreText" }
            ]
        },
        "versioning": {
            "title": "Versioning settings",
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "stores": {
                    "description": "Files rewritten with the manifest version on every version bump.",
                    "anyOf": store_union()
                }
            }
        }
    })
}

/// Draft-07 schema accepting one store declaration or an array of them.
pub fn json_schema() -> Value {
    json!({
        "$schema": DRAFT_07,
        "title": "Version Stores",
        "description": "Files that are rewritten with the manifest version on every version bump.",
        "definitions": definitions(),
        "anyOf": store_union()
    })
}

/// Draft-07 schema of a project manifest, with the store union mounted at
/// `<namespace>.versioning.stores`.
///
/// Other manifest keys, and other keys of the namespace object, are left open.
pub fn config_json_schema(namespace: &str) -> Value {
    let mut properties = Map::new();
    properties.insert(
        "version".to_string(),
        json!({
            "type": "string",
            "description": "The project version; `versync sync` copies it into every store."
        }),
    );
    properties.insert(
        namespace.to_string(),
        json!({
            "type": "object",
            "description": "Settings read by versync.",
            "properties": {
                "versioning": { "$ref": "#/definitions/versioning" }
            }
        }),
    );

    json!({
        "$schema": DRAFT_07,
        "title": "Project manifest",
        "type": "object",
        "definitions": definitions(),
        "properties": properties
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::StorePath;
    use regex::Regex;

    #[test]
    fn schema_mirrors_validator_rules() {
        let schema = json_schema();
        let module_path = &schema["definitions"]["versionStoreModule"]["properties"]["path"]["pattern"];
        assert_eq!(module_path, "\\.([jJ][sS]|[cC][jJ][sS]|[mM][jJ][sS]|[tT][sS])$");
        let json_path = &schema["definitions"]["versionStoreStructured"]["properties"]["path"]["pattern"];
        assert_eq!(json_path, "\\.([jJ][sS][oO][nN]|[jJ][sS][oO][nN][cC]|[jJ][sS][oO][nN]5)$");
        assert_eq!(schema["anyOf"].as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn extension_patterns_agree_with_validator() {
        let pattern = Regex::new(&extension_pattern(STRUCTURED_EXTENSIONS)).unwrap();
        for raw in ["package.json", "A.JSON", "tsconfig.Jsonc", "x.json5", "a.txt", "json", "a.jsonx"] {
            let ext = StorePath::parse(raw).unwrap().extension().unwrap_or_default();
            let accepted = STRUCTURED_EXTENSIONS.contains(&ext.as_str());
            assert_eq!(pattern.is_match(raw), accepted, "{}", raw);
        }
    }

    #[test]
    fn config_schema_mounts_versioning_under_namespace() {
        let schema = config_json_schema("bscotch");
        let ns = &schema["properties"]["bscotch"];
        assert_eq!(ns["type"], "object");
        assert_eq!(ns["properties"]["versioning"]["$ref"], "#/definitions/versioning");
        assert!(schema["properties"].get("versync").is_none());

        let versioning = &schema["definitions"]["versioning"];
        assert_eq!(versioning["additionalProperties"], false);
        let stores = versioning["properties"]["stores"]["anyOf"].as_array().unwrap();
        assert_eq!(stores[0]["$ref"], "#/definitions/versionStore");
        assert_eq!(stores[1]["items"]["$ref"], "#/definitions/versionStore");
        assert!(schema["definitions"]["versionStore"].is_object());
    }
}
