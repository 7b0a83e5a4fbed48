use crate::errors::{MergeError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default config file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "gomergetypes.yml";

/// Configuration loaded from `gomergetypes.yml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    pub sources: Vec<SourceConfig>,
    pub output: OutputConfig,
}

/// One backend implementation to merge.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Concrete implementation type name inside the package
    #[serde(rename = "type")]
    pub type_name: String,
    /// Runtime selector key
    pub tag: String,
    pub package: PackageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackageConfig {
    pub import_path: String,
    /// Import alias; `<packageName>_<sourceIndex+1>` when unset
    #[serde(default)]
    pub alias: Option<String>,
    pub source_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(rename = "type")]
    pub type_name: String,
    pub package: String,
    pub file: PathBuf,
    #[serde(default)]
    pub default_tag: String,
    #[serde(default)]
    pub rewrite: Vec<RewriteRule>,
}

/// Regex-match/substitution rule applied to generated names.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteRule {
    #[serde(rename = "match")]
    pub pattern: String,
    pub transform: String,
}

impl MergeConfig {
    /// Load configuration from a file path.
    ///
    /// Source directories and the output file are resolved relative to the
    /// directory containing the config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            let message = format!("Could not read config file {}: {e}", path.display());
            MergeError::Config(message)
        })?;
        let mut config = Self::from_yaml(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        Ok(config)
    }

    /// Parse and validate configuration from YAML text without touching paths.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: MergeConfig = serde_yaml::from_str(content)
            .map_err(|e| MergeError::Config(format!("Invalid config file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Rebase relative paths onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for source in &mut self.sources {
            source.package.source_dir = relative_path(base, &source.package.source_dir);
        }
        self.output.file = relative_path(base, &self.output.file);
    }

    fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(MergeError::Config("at least one source is required".into()));
        }

        let mut tags = HashSet::new();
        for (i, source) in self.sources.iter().enumerate() {
            let missing = [
                ("type", source.type_name.is_empty()),
                ("tag", source.tag.is_empty()),
                ("package.importPath", source.package.import_path.is_empty()),
                (
                    "package.sourceDir",
                    source.package.source_dir.as_os_str().is_empty(),
                ),
            ];
            if let Some((key, _)) = missing.iter().find(|(_, empty)| *empty) {
                return Err(MergeError::Config(format!("sources[{i}].{key} must not be empty")));
            }
            if !tags.insert(source.tag.as_str()) {
                tracing::warn!(
                    "tag '{}' is used by more than one source; the first one wins at dispatch",
                    source.tag
                );
            }
        }

        let output = &self.output;
        if output.type_name.is_empty() {
            return Err(MergeError::Config("output.type must not be empty".into()));
        }
        if output.package.is_empty() {
            return Err(MergeError::Config("output.package must not be empty".into()));
        }
        if output.file.as_os_str().is_empty() {
            return Err(MergeError::Config("output.file must not be empty".into()));
        }
        if !output.default_tag.is_empty() && !tags.contains(output.default_tag.as_str()) {
            tracing::warn!(
                "output.defaultTag '{}' does not match any source tag",
                output.default_tag
            );
        }
        Ok(())
    }
}

/// Join `input` onto `base` unless it is already absolute.
pub fn relative_path(base: &Path, input: &Path) -> PathBuf {
    if input.is_absolute() {
        input.to_path_buf()
    } else {
        base.join(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
sources:
  - type: Impl1
    tag: v1
    package:
      importPath: github.com/example/pkg1
      sourceDir: ./pkg1
  - type: Impl2
    tag: v2
    package:
      importPath: github.com/example/pkg2
      alias: second
      sourceDir: ./pkg2
output:
  type: Merged
  package: merged
  file: ./merged/merged.go
  defaultTag: v1
  rewrite:
    - match: ^Get(.+)$
      transform: Fetch$
"#;

    #[test]
    fn parse_config_yaml() {
        let config = MergeConfig::from_yaml(EXAMPLE).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].type_name, "Impl1");
        assert_eq!(config.sources[0].package.alias, None);
        assert_eq!(config.sources[1].package.alias.as_deref(), Some("second"));
        assert_eq!(config.output.type_name, "Merged");
        assert_eq!(config.output.default_tag, "v1");
        assert_eq!(config.output.rewrite[0].pattern, "^Get(.+)$");
        assert_eq!(config.output.rewrite[0].transform, "Fetch$");
    }

    #[test]
    fn resolves_paths_against_config_dir() {
        let mut config = MergeConfig::from_yaml(EXAMPLE).unwrap();
        config.resolve_paths(Path::new("/work/project"));
        assert_eq!(
            config.sources[0].package.source_dir,
            PathBuf::from("/work/project/./pkg1")
        );
        assert_eq!(
            config.output.file,
            PathBuf::from("/work/project/./merged/merged.go")
        );
    }

    #[test]
    fn absolute_paths_are_kept() {
        assert_eq!(
            relative_path(Path::new("/a"), Path::new("/b/c")),
            PathBuf::from("/b/c")
        );
    }

    #[test]
    fn rejects_empty_sources() {
        let err = MergeConfig::from_yaml(
            "sources: []\noutput:\n  type: M\n  package: m\n  file: m.go\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least one source"));
    }

    #[test]
    fn rejects_missing_tag() {
        let yaml = r#"
sources:
  - type: Impl1
    tag: ""
    package:
      importPath: x/pkg1
      sourceDir: pkg1
output:
  type: M
  package: m
  file: m.go
"#;
        let err = MergeConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("sources[0].tag"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let yaml = r#"
sources:
  - type: Impl1
    tag: a
    flavor: spicy
    package:
      importPath: x/pkg1
      sourceDir: pkg1
output:
  type: M
  package: m
  file: m.go
"#;
        assert!(MergeConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = MergeConfig::load(Path::new("/nonexistent/gomergetypes.yml")).unwrap_err();
        assert!(matches!(err, MergeError::Config(_)));
    }
}
