//! Property tests for declaration validation and resolution.
//!
//! Any list of valid declarations resolves to one descriptor per
//! declaration, in the order written, with the kind its shape implies.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use versync_stores::{resolve, validate, StoreKind};

fn file_stem() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}(/[a-z][a-z0-9_]{0,7}){0,2}"
}

/// A valid declaration together with the kind it must resolve to.
fn declaration() -> impl Strategy<Value = (Value, StoreKind)> {
    prop_oneof![
        (file_stem(), prop::sample::select(vec!["json", "jsonc", "json5"]), prop::option::of("[a-z]{1,6}"))
            .prop_map(|(stem, ext, field)| {
                let mut decl = json!({"path": format!("{}.{}", stem, ext)});
                if let Some(field) = field {
                    decl["field"] = json!(field);
                }
                (decl, StoreKind::StructuredField)
            }),
        (file_stem(), prop::sample::select(vec!["js", "cjs", "mjs", "ts"]), prop::option::of("[A-Za-z_][A-Za-z0-9_]{0,6}"))
            .prop_map(|(stem, ext, name)| {
                let mut decl = json!({"path": format!("{}.{}", stem, ext)});
                if let Some(name) = name {
                    decl["exportName"] = json!(name);
                }
                (decl, StoreKind::ModuleExport)
            }),
        (file_stem(), prop::sample::select(vec!["md", "txt", "toml", "yaml"]), any::<bool>())
            .prop_map(|(stem, ext, with_pattern)| {
                let mut decl = json!({"path": format!("{}.{}", stem, ext)});
                if with_pattern {
                    decl["match"] = json!("version: \\S+");
                    decl["replacement"] = json!("version: {{version}}");
                }
                (decl, StoreKind::TextPattern)
            }),
    ]
}

proptest! {
    #[test]
    fn resolve_preserves_length_and_order(decls in prop::collection::vec(declaration(), 0..12)) {
        let input = Value::Array(decls.iter().map(|(decl, _)| decl.clone()).collect());
        let validated = validate(&input).expect("generated declarations are valid");
        prop_assert_eq!(validated.len(), decls.len());

        let set = resolve(validated, Path::new("/project"));
        prop_assert_eq!(set.len(), decls.len());

        for (descriptor, (decl, kind)) in set.iter().zip(&decls) {
            prop_assert_eq!(descriptor.kind(), *kind);
            prop_assert_eq!(descriptor.store_path().as_str(), decl["path"].as_str().unwrap());
            let expected_path = Path::new("/project").join(decl["path"].as_str().unwrap());
            prop_assert_eq!(
                descriptor.absolute_path(),
                expected_path.as_path()
            );
        }
    }

    #[test]
    fn every_invalid_element_is_reported(valid in 0usize..5, invalid in 1usize..5) {
        let mut items: Vec<Value> = (0..valid).map(|i| json!({"path": format!("ok{}.json", i)})).collect();
        items.extend((0..invalid).map(|i| json!({"path": format!("bad{}.ts", i), "exportName": "1nope"})));

        let errors = validate(&Value::Array(items)).unwrap_err();
        let reported: Vec<&str> = errors.iter().map(|e| e.instance_path.as_str()).collect();
        let expected: Vec<String> = (valid..valid + invalid).map(|i| format!("/{}/exportName", i)).collect();
        prop_assert_eq!(reported, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
