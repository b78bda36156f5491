use crate::error::PromdropError;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from promdrop.toml.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PromdropConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub rules: RulesConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Unused-metrics report produced by `mimirtool analyze prometheus`.
    pub file: PathBuf,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Combined relabel config file.
    pub file: PathBuf,
    /// Directory for per-job metric lists, summary.txt and split YAML.
    pub txt_dir: PathBuf,
    /// Also write one relabel config file per job.
    pub split_yaml: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    /// Upper bound on the length of each generated regex.
    pub max_regex_length: usize,
}

// --- Default implementations ---

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("prometheus-metrics.json"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("unused_relabel_configs.yaml"),
            txt_dir: PathBuf::from("unused"),
            split_yaml: false,
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_regex_length: 1000,
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub file: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub txt_output_dir: Option<PathBuf>,
    pub max_regex_length: Option<usize>,
    pub split_yaml: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub txt_output_dir: PathBuf,
    pub split_yaml: bool,
    pub max_regex_length: NonZeroUsize,
}

impl PromdropConfig {
    /// Load config from `path`. A missing file yields defaults; a file that
    /// exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self, PromdropError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(PromdropError::config(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        Self::from_toml(&contents)
            .map_err(|e| PromdropError::config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply CLI overrides and validate the result.
    pub fn resolve(self, overrides: Overrides) -> Result<Settings, PromdropError> {
        let max = overrides
            .max_regex_length
            .unwrap_or(self.rules.max_regex_length);
        let max_regex_length = NonZeroUsize::new(max)
            .ok_or_else(|| PromdropError::config("max regex length must be greater than 0"))?;

        let settings = Settings {
            input_file: overrides.file.unwrap_or(self.input.file),
            output_file: overrides.output.unwrap_or(self.output.file),
            txt_output_dir: overrides.txt_output_dir.unwrap_or(self.output.txt_dir),
            split_yaml: overrides.split_yaml || self.output.split_yaml,
            max_regex_length,
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Settings {
    /// Reject output paths that cannot be used as intended.
    pub fn validate(&self) -> Result<(), PromdropError> {
        if self.output_file.as_os_str().is_empty() {
            return Err(PromdropError::config("output file path is empty"));
        }
        if self.output_file.is_dir() {
            return Err(PromdropError::config(format!(
                "output file {} is a directory",
                self.output_file.display()
            )));
        }
        if self.txt_output_dir.as_os_str().is_empty() {
            return Err(PromdropError::config("txt output directory path is empty"));
        }
        if self.txt_output_dir.exists() && !self.txt_output_dir.is_dir() {
            return Err(PromdropError::config(format!(
                "txt output directory {} is not a directory",
                self.txt_output_dir.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let cfg = PromdropConfig::default();
        assert_eq!(cfg.input.file, PathBuf::from("prometheus-metrics.json"));
        assert_eq!(cfg.output.file, PathBuf::from("unused_relabel_configs.yaml"));
        assert_eq!(cfg.output.txt_dir, PathBuf::from("unused"));
        assert!(!cfg.output.split_yaml);
        assert_eq!(cfg.rules.max_regex_length, 1000);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let cfg = PromdropConfig::from_toml("[rules]\nmax_regex_length = 250\n").unwrap();
        assert_eq!(cfg.rules.max_regex_length, 250);
        assert_eq!(cfg.output, OutputConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(PromdropConfig::from_toml("[rules]\nmax_length = 5\n").is_err());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let cfg = PromdropConfig::load(&dir.path().join("promdrop.toml")).unwrap();
        assert_eq!(cfg, PromdropConfig::default());
    }

    #[test]
    fn test_load_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("promdrop.toml");
        std::fs::write(&path, "[rules\nmax_regex_length = ").unwrap();
        let err = PromdropConfig::load(&path).unwrap_err();
        assert!(matches!(err, PromdropError::Config { .. }));
    }

    #[test]
    fn test_load_unreadable_path_is_config_error() {
        let dir = tempdir().unwrap();
        let err = PromdropConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, PromdropError::Config { .. }));
        assert!(err.to_string().starts_with("invalid configuration: cannot read"));
    }

    #[test]
    fn test_overrides_win() {
        let dir = tempdir().unwrap();
        let cfg = PromdropConfig::from_toml(
            "[output]\ntxt_dir = \"from-config\"\n[rules]\nmax_regex_length = 50\n",
        )
        .unwrap();
        let settings = cfg
            .resolve(Overrides {
                file: Some(dir.path().join("in.json")),
                txt_output_dir: Some(dir.path().join("txt")),
                max_regex_length: Some(75),
                split_yaml: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(settings.input_file, dir.path().join("in.json"));
        assert_eq!(settings.txt_output_dir, dir.path().join("txt"));
        assert_eq!(settings.max_regex_length.get(), 75);
        assert_eq!(settings.output_file, PathBuf::from("unused_relabel_configs.yaml"));
        assert!(settings.split_yaml);
    }

    #[test]
    fn test_zero_max_length_rejected() {
        let err = PromdropConfig::default()
            .resolve(Overrides {
                max_regex_length: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, PromdropError::Config { .. }));
    }

    #[test]
    fn test_output_file_that_is_directory_rejected() {
        let dir = tempdir().unwrap();
        let err = PromdropConfig::default()
            .resolve(Overrides {
                output: Some(dir.path().to_path_buf()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, PromdropError::Config { .. }));
    }

    #[test]
    fn test_txt_dir_that_is_file_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        let err = PromdropConfig::default()
            .resolve(Overrides {
                txt_output_dir: Some(file),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, PromdropError::Config { .. }));
    }
}
