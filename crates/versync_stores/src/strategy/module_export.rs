use super::FormatStrategy;
use crate::error::{Result, StoreError};
use crate::path::StorePath;
use crate::schema::{ModuleStyle, StoreKind};
use crate::version::VersionString;

const DEFAULT_EXPORT: &str = "default";

/// Rewrites a source module whose only content is the version export.
///
/// The whole file is replaced with the canonical export statement; existing
/// content is not patched in place.
#[derive(Debug, Clone)]
pub struct ModuleExportStrategy {
    style: Option<ModuleStyle>,
    export_name: Option<String>,
}

impl ModuleExportStrategy {
    pub fn new(style: Option<ModuleStyle>, export_name: Option<String>) -> Self {
        Self { style, export_name }
    }

    /// Declared style, else inferred from the extension (`.cjs` is CommonJS).
    pub fn effective_style(&self, store: &StorePath) -> Result<ModuleStyle> {
        if let Some(style) = self.style {
            return Ok(style);
        }
        match store.extension().as_deref() {
            Some("cjs") => Ok(ModuleStyle::CommonJs),
            Some("js") | Some("mjs") | Some("ts") => Ok(ModuleStyle::Esm),
            other => Err(StoreError::UnsupportedFormat {
                path: store.to_string(),
                reason: match other {
                    Some(ext) => format!("extension .{} has no default module style", ext),
                    None => "no extension and no declared style".to_string(),
                },
            }),
        }
    }

    fn named_export(&self) -> Option<&str> {
        self.export_name
            .as_deref()
            .filter(|name| *name != DEFAULT_EXPORT)
    }
}

impl FormatStrategy for ModuleExportStrategy {
    fn kind(&self) -> StoreKind {
        StoreKind::ModuleExport
    }

    fn describe(&self) -> String {
        let style = self.style.map(|s| s.as_str()).unwrap_or("auto");
        match self.named_export() {
            Some(name) => format!("{} export `{}`", style, name),
            None => format!("{} default export", style),
        }
    }

    fn apply(&self, store: &StorePath, _current: &str, version: &VersionString) -> Result<String> {
        let style = self.effective_style(store)?;
        let literal = format!("'{}'", version);
        Ok(match (style, self.named_export()) {
            (ModuleStyle::Esm, None) => format!("export default {};", literal),
            (ModuleStyle::Esm, Some(name)) => format!("export const {} = {};", name, literal),
            (ModuleStyle::CommonJs, None) => format!("module.exports = {};", literal),
            (ModuleStyle::CommonJs, Some(name)) => format!("module.exports.{} = {};", name, literal),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(path: &str, style: Option<ModuleStyle>, name: Option<&str>) -> Result<String> {
        let strategy = ModuleExportStrategy::new(style, name.map(str::to_string));
        let version = VersionString::parse("1.0.1").unwrap();
        strategy.apply(&StorePath::parse(path).unwrap(), "", &version)
    }

    #[test]
    fn esm_default_export() {
        assert_eq!(run("src/version.js", None, None).unwrap(), "export default '1.0.1';");
        assert_eq!(run("src/version.ts", None, Some("default")).unwrap(), "export default '1.0.1';");
    }

    #[test]
    fn esm_named_export() {
        assert_eq!(
            run("src/version.mjs", None, Some("version")).unwrap(),
            "export const version = '1.0.1';"
        );
    }

    #[test]
    fn commonjs_from_extension_or_declaration() {
        assert_eq!(run("version.cjs", None, None).unwrap(), "module.exports = '1.0.1';");
        assert_eq!(
            run("version.js", Some(ModuleStyle::CommonJs), Some("v")).unwrap(),
            "module.exports.v = '1.0.1';"
        );
    }

    #[test]
    fn declared_style_overrides_extension() {
        assert_eq!(
            run("version.cjs", Some(ModuleStyle::Esm), None).unwrap(),
            "export default '1.0.1';"
        );
    }

    #[test]
    fn unknown_extension_without_style_is_unsupported() {
        let err = run("version.coffee", None, None).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedFormat { .. }));
        assert!(run("version.coffee", Some(ModuleStyle::Esm), None).is_ok());
    }

    #[test]
    fn existing_content_is_replaced() {
        let strategy = ModuleExportStrategy::new(None, None);
        let version = VersionString::parse("2.0.0").unwrap();
        let out = strategy
            .apply(
                &StorePath::parse("v.js").unwrap(),
                "// header\nexport default '1.0.0';\n",
                &version,
            )
            .unwrap();
        assert_eq!(out, "export default '2.0.0';");
    }
}
