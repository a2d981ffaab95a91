use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::loader::Discovery;
use crate::publisher::PublishOptions;
use crate::types::normalize_path;

/// Name of the per-project config file, looked up in the discovery root.
pub const CONFIG_FILE: &str = ".codepub.toml";

/// Default output directory, relative to the discovery root.
const DEFAULT_OUTPUT_DIR: &str = "../ConvertedWebpages";

/// Default toggle script reference, relative to a published page.
const DEFAULT_SCRIPT: &str = "../script.js";

/// Project configuration loaded from `.codepub.toml`, with CLI overrides applied.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log filter settings.
    pub logging: LoggingConfig,
    /// Absolute, normalized output directory.
    pub output_dir: PathBuf,
    /// Shell-style file name patterns.
    pub patterns: Vec<String>,
    /// Walk subdirectories of the root.
    pub recurse: bool,
    /// Regexes a file name must fully match (any of), when non-empty.
    pub regexes: Vec<String>,
    /// Absolute, normalized discovery root.
    pub root: PathBuf,
    /// Toggle script reference emitted in each page head.
    pub script: String,
    /// Treat syntax errors as scope extraction failures.
    pub strict: bool,
}

/// Raw TOML structure for `.codepub.toml`.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct CodepubTomlConfig {
    #[serde(default)]
    logging: Option<LoggingConfig>,
    #[serde(default)]
    output_dir: Option<PathBuf>,
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    recurse: bool,
    #[serde(default)]
    regexes: Vec<String>,
    #[serde(default)]
    script: Option<String>,
    #[serde(default)]
    strict: Option<bool>,
}

/// `[logging]` table.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when neither `RUST_LOG` nor `-v` is given.
    #[serde(default = "default_log_level")]
    pub default: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        return Self {
            default: default_log_level(),
        };
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// Tolerate syntax errors instead of failing the file.
    pub lenient: bool,
    /// Output directory, relative to the working directory.
    pub output_dir: Option<PathBuf>,
    /// Replace the configured patterns when non-empty.
    pub patterns: Vec<String>,
    /// Force recursive discovery on.
    pub recurse: bool,
    /// Replace the configured regexes when non-empty.
    pub regexes: Vec<String>,
}

impl Config {
    /// Merge command-line overrides into the loaded config.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if a relative `--out` cannot be made absolute.
    pub fn apply(mut self, overrides: Overrides) -> Result<Self, Error> {
        if let Some(dir) = overrides.output_dir {
            self.output_dir = normalize_path(&std::path::absolute(dir)?);
        }
        if !overrides.patterns.is_empty() {
            self.patterns = overrides.patterns;
        }
        if !overrides.regexes.is_empty() {
            self.regexes = overrides.regexes;
        }
        self.recurse = self.recurse || overrides.recurse;
        self.strict = self.strict && !overrides.lenient;
        return Ok(self);
    }

    /// File selection settings for the loader. The output directory is never walked.
    pub fn discovery(&self) -> Discovery {
        return Discovery {
            exclude: vec![self.output_dir.clone()],
            patterns: self.patterns.clone(),
            recurse: self.recurse,
            regexes: self.regexes.clone(),
        };
    }

    /// Load config from `.codepub.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed. Never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let root = normalize_path(&std::path::absolute(root)?);
        let path = root.join(CONFIG_FILE);
        let raw: CodepubTomlConfig = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CodepubTomlConfig::default(),
            Err(e) => return Err(Error::Io(e)),
            Ok(content) => toml::from_str(&content)?,
        };

        let output_dir = raw.output_dir.unwrap_or_else(|| return PathBuf::from(DEFAULT_OUTPUT_DIR));
        return Ok(Self {
            logging: raw.logging.unwrap_or_default(),
            output_dir: normalize_path(&root.join(output_dir)),
            patterns: raw.patterns,
            recurse: raw.recurse,
            regexes: raw.regexes,
            root,
            script: raw.script.unwrap_or_else(|| return DEFAULT_SCRIPT.to_string()),
            strict: raw.strict.unwrap_or(true),
        });
    }

    /// Publisher settings derived from this config.
    pub fn publish_options(&self) -> PublishOptions {
        let mut options = PublishOptions::new(&self.output_dir);
        options.script_src.clone_from(&self.script);
        options.strict = self.strict;
        return options;
    }
}

/// Quiet by default: warnings and errors only.
fn default_log_level() -> String {
    return "warn".to_string();
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_sibling_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        std::fs::create_dir(&root).unwrap();

        let config = Config::load(&root).unwrap();
        let expected = normalize_path(&std::path::absolute(dir.path()).unwrap()).join("ConvertedWebpages");
        assert_eq!(config.output_dir, expected);
        assert!(config.strict);
        assert!(config.patterns.is_empty());
        assert_eq!(config.script, "../script.js");
        assert_eq!(config.logging.default, "warn");
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "output_dir = \"pages\"\npatterns = [\"*.h\", \"*.cpp\"]\nrecurse = true\nstrict = false\n\n[logging]\ndefault = \"info\"\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert!(config.output_dir.ends_with("pages"));
        assert_eq!(config.patterns, vec!["*.h", "*.cpp"]);
        assert!(config.recurse);
        assert!(!config.strict);
        assert_eq!(config.logging.default, "info");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "patterns = 3\n").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }

    #[test]
    fn overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "patterns = [\"*.h\"]\n").unwrap();
        let out = dir.path().join("elsewhere");

        let config = Config::load(dir.path())
            .unwrap()
            .apply(Overrides {
                lenient: true,
                output_dir: Some(out.clone()),
                patterns: vec!["*.cpp".to_string()],
                recurse: true,
                regexes: Vec::new(),
            })
            .unwrap();

        assert_eq!(config.patterns, vec!["*.cpp"]);
        assert!(config.recurse);
        assert!(!config.strict);
        assert_eq!(config.output_dir, normalize_path(&std::path::absolute(out).unwrap()));
        assert_eq!(config.discovery().exclude, vec![config.output_dir.clone()]);
    }
}
