use thiserror::Error;
use treetag_config::ConfigError;

/// Everything that can stop a highlighter session from being set up or
/// from updating its tree.
///
/// Syntax errors in the highlighted text are not in here: tree-sitter always
/// produces a tree, with `ERROR` nodes where it had to give up.
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No grammar available for language {0:?}")]
    UnknownLanguage(String),

    #[error("Incompatible tree-sitter grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("Invalid query for node type {node_type:?}: {source}")]
    Query {
        node_type: String,
        source: tree_sitter::QueryError,
    },

    #[error("Parsing was cancelled before a tree was produced")]
    ParseCancelled,
}
