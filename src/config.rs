//! Configuration loader for the `frontal` pipeline.
//!
//! `defaults/frontal.default.toml` is embedded into the binary. User files and single key
//! overrides are layered on top through [`Loader`] before deserializing into
//! [`FrontalConfig`].

use std::path::Path;

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use frontal_lexer::scanner::{ClassHeader, ScannerConfig};
use frontal_parser::Vocabulary;
use serde::Deserialize;

const DEFAULT_TOML: &str = include_str!("../defaults/frontal.default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct FrontalConfig {
    pub scanner: ScannerSection,
    /// Action names of the grammar: the defaults plus the aliases under `[actions]`.
    #[serde(default)]
    pub actions: Vocabulary,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerSection {
    pub classes: ClassHeader,
    pub error_prefix: String,
    pub identifier_tag: Option<String>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Reserved word. Identifiers spelled `lexeme` are re-tagged `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Keyword {
    pub lexeme: String,
    pub tag: String,
}

/// Message shown for lexical errors tagged `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub tag: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub snapshots: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Text,
    Json,
}

impl FrontalConfig {
    /// Lookup tables for the scanner.
    pub fn scanner_config(&self) -> ScannerConfig {
        let section = &self.scanner;
        let mut config = ScannerConfig {
            classes: section.classes,
            error_prefix: section.error_prefix.clone(),
            ..ScannerConfig::default()
        };
        if let Some(tag) = &section.identifier_tag {
            config = config.with_identifier_tag(tag);
        }
        for Keyword { lexeme, tag } in section.keywords.iter() {
            config = config.with_keyword(lexeme, tag);
        }
        for Message { tag, message } in section.messages.iter() {
            config = config.with_message(tag, message);
        }
        config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.actions
    }
}

/// Sources of a [`FrontalConfig`], from lowest to highest precedence: the embedded
/// `frontal.default.toml`, the `--config` files in the order given, then single keys set from
/// command-line flags.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
        }
    }

    /// Adds a TOML file. The file must exist when [`Loader::load`] runs.
    pub fn layer_file(mut self, path: impl AsRef<Path>) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml).required(true));
        self
    }

    /// Sets one dotted key, e.g. `output.snapshots`, above every file.
    pub fn override_key<V>(mut self, key: &str, value: V) -> Result<Self, ConfigError>
    where
        V: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn load(self) -> Result<FrontalConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrontalConfig {
    /// Configuration from the embedded defaults alone.
    pub fn defaults() -> Result<Self, ConfigError> {
        Loader::new().load()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use frontal_parser::ActionKind;

    use super::{FrontalConfig, Loader, OutputFormat};

    #[test]
    fn loads_default_config() {
        let config = FrontalConfig::defaults().expect("defaults to deserialize");
        let scanner = config.scanner_config();

        assert_eq!(scanner.error_prefix, "ERR_");
        assert_eq!(scanner.classes.other, 'O');
        assert_eq!(scanner.identifier_tag.as_deref(), Some("id"));
        assert!(scanner.keywords.is_empty());
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(
            config.vocabulary().resolve("parent"),
            Some(ActionKind::Parent)
        );
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .override_key("output.format", "json")
            .expect("override to apply")
            .override_key("scanner.error_prefix", "E_")
            .expect("override to apply")
            .load()
            .expect("config to build");

        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.scanner_config().error_prefix, "E_");
    }

    #[test]
    fn layers_user_files() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temporary file");
        write!(
            file,
            r#"
[scanner]
[[scanner.keywords]]
lexeme = "class"
tag = "class"

[[scanner.messages]]
tag = "ERR_CHAR"
message = "invalid character"

[actions]
pop_scope = "parent"
"#
        )
        .expect("write config");

        let config = Loader::new()
            .layer_file(file.path())
            .load()
            .expect("config to build");
        let scanner = config.scanner_config();

        assert_eq!(scanner.keywords.get("class").map(String::as_str), Some("class"));
        assert_eq!(
            scanner.messages.get("ERR_CHAR").map(String::as_str),
            Some("invalid character")
        );
        // untouched keys keep their defaults
        assert_eq!(scanner.classes.letter, 'L');
        assert_eq!(
            config.vocabulary().resolve("pop_scope"),
            Some(ActionKind::Parent)
        );
    }
}
