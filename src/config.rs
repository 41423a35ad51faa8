//! Configuration for lostfield.
//!
//! A configuration is loaded once per run (YAML file, then command-line
//! overrides) and passed by reference into every check.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Config file names looked up in the working directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["lostfield.yaml", ".lostfield.yaml"];

/// Commented default configuration written by `lostfield init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("templates/lostfield.yaml");

/// How func, chan and unsafe.Pointer fields are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonSerializableHandling {
    /// Never report them.
    Ignore,
    /// Report only when both sides declare the field.
    #[default]
    Adaptive,
    /// Always report them.
    Strict,
}

impl FromStr for NonSerializableHandling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "adaptive" => Ok(Self::Adaptive),
            "strict" => Ok(Self::Strict),
            _ => Err(format!(
                "unknown non-serializable handling {:?}, must be 'ignore', 'adaptive', or 'strict'",
                s
            )),
        }
    }
}

impl fmt::Display for NonSerializableHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::Adaptive => write!(f, "adaptive"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `file:line:col: message` line per finding.
    #[default]
    Default,
    /// Colored output with a source excerpt and a field table.
    Pretty,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "invalid format {:?}, must be 'default', 'pretty', or 'json'",
                s
            )),
        }
    }
}

/// Policy knobs for one run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Check methods as well as plain functions.
    pub include_member_functions: bool,
    /// Accept `GetField()` calls on the source as handling `Field`.
    pub allow_getter_fallback: bool,
    /// Allow slice-to-struct converters.
    pub allow_aggregating_converters: bool,
    pub exclude_field_patterns: Vec<String>,
    pub exclude_converter_patterns: Vec<String>,
    pub exclude_file_patterns: Vec<String>,
    /// `0.0` keeps substring matching for type names and exact matching
    /// for field names.
    pub min_name_similarity: f64,
    /// Full tag entries (`lostfield:"ignore"`) or tag keys (`lostfield`).
    pub ignore_field_tags: Vec<String>,
    pub include_generated_files: bool,
    pub ignore_deprecated_fields: bool,
    pub include_private_fields: bool,
    pub non_serializable_fields: NonSerializableHandling,
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_member_functions: true,
            allow_getter_fallback: true,
            allow_aggregating_converters: false,
            exclude_field_patterns: Vec::new(),
            exclude_converter_patterns: Vec::new(),
            exclude_file_patterns: Vec::new(),
            min_name_similarity: 0.0,
            ignore_field_tags: Vec::new(),
            include_generated_files: false,
            ignore_deprecated_fields: false,
            include_private_fields: false,
            non_serializable_fields: NonSerializableHandling::Adaptive,
            output_format: OutputFormat::Default,
        }
    }
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a configuration from YAML text. An empty document yields the
    /// defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load the configuration for a run.
    ///
    /// An explicit path must exist. Otherwise the first config file found
    /// in `working_dir`, then in the user config directory, is used;
    /// with none found the defaults apply. Returns the file used, if any.
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => discover(working_dir),
        };

        match path {
            Some(p) => {
                let config = Self::parse_file(&p)
                    .map_err(|e| anyhow::anyhow!("parsing {}: {}", p.display(), e))?;
                tracing::debug!(path = %p.display(), "loaded config");
                Ok((config, Some(p)))
            }
            None => Ok((Self::default(), None)),
        }
    }
}

/// Find a config file in `working_dir`, then in the user config directory.
pub fn discover(working_dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| working_dir.join(name))
        .chain(user_config_path())
        .find(|p| p.is_file())
}

/// `<config dir>/lostfield/config.yaml` for the current user.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "lostfield").map(|dirs| dirs.config_dir().join("config.yaml"))
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&config.min_name_similarity) {
        anyhow::bail!(
            "min_name_similarity must be between 0.0 and 1.0, got {}",
            config.min_name_similarity
        );
    }

    let groups = [
        ("exclude_field_patterns", &config.exclude_field_patterns),
        ("exclude_converter_patterns", &config.exclude_converter_patterns),
        ("exclude_file_patterns", &config.exclude_file_patterns),
    ];
    for (key, patterns) in groups {
        for pattern in patterns {
            crate::detect::compile_pattern(pattern)
                .map_err(|e| anyhow::anyhow!("invalid {} pattern {:?}: {}", key, pattern, e))?;
        }
    }

    if config.ignore_field_tags.iter().any(|t| t.trim().is_empty()) {
        anyhow::bail!("ignore_field_tags must not contain empty entries");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.include_member_functions);
        assert!(config.allow_getter_fallback);
        assert!(!config.allow_aggregating_converters);
        assert!(!config.include_private_fields);
        assert_eq!(config.non_serializable_fields, NonSerializableHandling::Adaptive);
        assert_eq!(config.output_format, OutputFormat::Default);
        assert_eq!(config.min_name_similarity, 0.0);
    }

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
include_member_functions: false
exclude_field_patterns:
  - "CreatedAt"
  - "*ID"
non_serializable_fields: strict
output_format: pretty
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert!(!config.include_member_functions);
        assert!(config.allow_getter_fallback);
        assert_eq!(config.exclude_field_patterns, vec!["CreatedAt", "*ID"]);
        assert_eq!(config.non_serializable_fields, NonSerializableHandling::Strict);
        assert_eq!(config.output_format, OutputFormat::Pretty);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config = Config::parse_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, Config::default());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(Config::parse_str("\n").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        assert!(Config::parse_str("non_serializable_fields: sometimes\n").is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = Config {
            min_name_similarity: 1.5,
            ..Default::default()
        };
        assert!(validate(&config).is_err());

        config.min_name_similarity = 0.8;
        assert!(validate(&config).is_ok());

        config.exclude_field_patterns = vec!["[unclosed".into()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_load_discovers_working_dir_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".lostfield.yaml"), "include_private_fields: true\n").unwrap();

        let (config, path) = Config::load(None, temp.path()).unwrap();
        assert!(config.include_private_fields);
        assert_eq!(path, Some(temp.path().join(".lostfield.yaml")));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(Some(&temp.path().join("nope.yaml")), temp.path()).is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("sarif".parse::<OutputFormat>().is_err());
        assert_eq!(
            "ignore".parse::<NonSerializableHandling>(),
            Ok(NonSerializableHandling::Ignore)
        );
    }
}
