//! Per-language tag rules.
//!
//! Each supported grammar has one TOML document describing how syntax tree
//! nodes are turned into tags:
//!
//! ```toml
//! dont_recurse_inside = ["string"]
//!
//! [token_mapping]
//! integer = "Token.Literal.Number"
//!
//! [token_mapping.identifier]
//! "" = "Token.Name"
//! self = "Token.Name.Builtin.Pseudo"
//!
//! [queries]
//! function_definition = "(function_definition name: (identifier) @Token.Name.Function)"
//! ```
//!
//! Rule files ship inside this crate and can be overridden per user by
//! dropping a file with the same name into [`TagRuleConfig::rules_dir`].

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rule files compiled into the binary, keyed by language name.
pub const BUNDLED_LANGUAGES: &[(&str, &str)] = &[
    ("python", include_str!("../languages/python.toml")),
    ("markdown", include_str!("../languages/markdown.toml")),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read tag rules at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse tag rules at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid rules directory {dir}: {source}")]
    RulesDirError {
        dir: PathBuf,
        source: glob::PatternError,
    },

    #[error("No tag rules found for language {0:?}")]
    UnknownLanguage(String),
}

/// What a node type maps to in `token_mapping`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawTokenRule")]
pub enum TokenRule {
    /// Every node of the type gets this tag.
    Plain(String),
    /// Tag chosen by the exact source text of the node. `fallback` comes from
    /// the `""` key and is used when the text isn't listed.
    ByText {
        by_text: HashMap<String, String>,
        fallback: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTokenRule {
    Plain(String),
    ByText(HashMap<String, String>),
}

impl From<RawTokenRule> for TokenRule {
    fn from(raw: RawTokenRule) -> Self {
        match raw {
            RawTokenRule::Plain(tag) => TokenRule::Plain(tag),
            RawTokenRule::ByText(mut by_text) => {
                let fallback = by_text.remove("");
                TokenRule::ByText { by_text, fallback }
            }
        }
    }
}

impl TokenRule {
    /// Pick the tag for a node whose source text is `text`.
    ///
    /// `text` is `None` when the node's text could not be read, in which case
    /// a nested mapping can only produce its fallback. `default` is used when
    /// the nested mapping has nothing to offer.
    pub fn resolve<'a>(&'a self, text: Option<&str>, default: &'a str) -> &'a str {
        match self {
            TokenRule::Plain(tag) => tag,
            TokenRule::ByText { by_text, fallback } => {
                let fallback = fallback.as_deref().unwrap_or(default);
                text.and_then(|text| by_text.get(text))
                    .map(String::as_str)
                    .unwrap_or(fallback)
            }
        }
    }
}

/// Tag rules for one language. Loaded once and never modified afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct TagRuleConfig {
    pub token_mapping: HashMap<String, TokenRule>,
    /// Node types tagged as a whole even when they have children.
    #[serde(default)]
    pub dont_recurse_inside: HashSet<String>,
    /// Node type to query source. Sorted so that compile errors are reported
    /// in a stable order.
    #[serde(default)]
    pub queries: BTreeMap<String, String>,
}

impl TagRuleConfig {
    /// Parse a rule document. `origin` only shows up in error messages.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::ConfigParseError {
            config_path: origin.to_path_buf(),
            source,
        })
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        Self::from_toml_str(&content, config_path).map(Some)
    }

    /// The rule file shipped with treetag for `language`.
    pub fn bundled(language: &str) -> Result<Self, ConfigError> {
        let (_, content) = BUNDLED_LANGUAGES
            .iter()
            .find(|(name, _)| *name == language)
            .ok_or_else(|| ConfigError::UnknownLanguage(language.to_string()))?;
        Self::from_toml_str(content, &PathBuf::from(format!("<bundled>/{language}.toml")))
    }

    /// Load rules for `language`, preferring `<rules_dir>/<language>.toml`
    /// over the bundled file.
    pub fn load_for_language(language: &str, rules_dir: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(dir) = rules_dir
            && let Some(config) = Self::load_from_path(dir.join(format!("{language}.toml")))?
        {
            return Ok(config);
        }
        Self::bundled(language)
    }

    pub fn rules_dir() -> PathBuf {
        let rules_dir = shellexpand::tilde("~/.config/treetag/languages");
        PathBuf::from(rules_dir.as_ref())
    }

    /// Names of the languages that have a rule file in `dir`, sorted.
    pub fn available_languages(dir: &Path) -> Result<Vec<String>, ConfigError> {
        let pattern = dir.join("*.toml");
        let paths = glob::glob(&pattern.to_string_lossy()).map_err(|source| {
            ConfigError::RulesDirError {
                dir: dir.to_path_buf(),
                source,
            }
        })?;

        let mut languages: Vec<String> = paths
            .filter_map(Result::ok)
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        languages.sort();
        Ok(languages)
    }

    pub fn rule_for(&self, node_type: &str) -> Option<&TokenRule> {
        self.token_mapping.get(node_type)
    }

    /// True if nodes of this type must be tagged without looking at children.
    pub fn is_atomic(&self, node_type: &str) -> bool {
        self.dont_recurse_inside.contains(node_type)
    }
}
