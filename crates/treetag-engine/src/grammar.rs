//! Thin layer over tree-sitter: which grammars exist, how text becomes the
//! byte buffer that gets parsed, and full vs incremental parsing.

use tree_sitter::{Parser, Tree};

use crate::{EditDescriptor, HighlightError};

/// Grammars compiled into treetag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Markdown,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Python, Language::Markdown];

    /// Name used for rule files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Markdown => "markdown",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|language| language.name() == name)
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "py" | "pyi" | "pyw" => Some(Language::Python),
            "md" | "markdown" => Some(Language::Markdown),
            _ => None,
        }
    }

    pub fn ts_language(self) -> tree_sitter::Language {
        match self {
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::Markdown => tree_sitter_md::LANGUAGE.into(),
        }
    }
}

/// Turn the host's text into the buffer tree-sitter parses.
///
/// Hosts address text by character, tree-sitter by byte. Every character is
/// mapped to exactly one byte so both agree: ASCII is kept and everything else
/// becomes `?`. Non-ASCII text inside strings and comments highlights fine,
/// but grammars that care about non-ASCII identifiers will see `?` instead.
pub fn project_buffer(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

/// A tree-sitter parser bound to one grammar.
pub struct Grammar {
    language: Language,
    parser: Parser,
}

impl Grammar {
    pub fn new(language: Language) -> Result<Self, HighlightError> {
        let mut parser = Parser::new();
        parser.set_language(&language.ts_language())?;
        Ok(Self { language, parser })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse `buffer` from scratch. Invalid syntax still yields a tree.
    pub fn parse(&mut self, buffer: &[u8]) -> Result<Tree, HighlightError> {
        self.parser
            .parse(buffer, None)
            .ok_or(HighlightError::ParseCancelled)
    }

    /// Record `edit` in `previous` and parse `buffer` reusing the unchanged
    /// parts of it. `buffer` must already contain the edit.
    pub fn reparse(
        &mut self,
        buffer: &[u8],
        mut previous: Tree,
        edit: &EditDescriptor,
    ) -> Result<Tree, HighlightError> {
        previous.edit(&(*edit).into());
        self.parser
            .parse(buffer, Some(&previous))
            .ok_or(HighlightError::ParseCancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_project_buffer_keeps_one_byte_per_char() {
        let text = "örkki = \"日本\"\n";

        let buffer = project_buffer(text);

        assert_eq!(buffer, b"?rkki = \"??\"\n".to_vec());
        assert_eq!(buffer.len(), text.chars().count());
    }

    #[test]
    fn test_language_names_round_trip() {
        for language in Language::ALL {
            assert_eq!(Language::from_name(language.name()), Some(language));
        }
        assert_eq!(Language::from_name("cobol"), None);
    }

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("md"), Some(Language::Markdown));
        assert_eq!(Language::from_extension("rs"), None);
    }

    #[test]
    fn test_parse_is_error_tolerant() {
        let mut grammar = Grammar::new(Language::Python).unwrap();

        let tree = grammar.parse(b"def (:\n    x = = 1\n").unwrap();

        assert!(tree.root_node().has_error());
    }

    #[test]
    fn test_parse_markdown() {
        let mut grammar = Grammar::new(Language::Markdown).unwrap();

        let tree = grammar.parse(b"# Title\n\n- item\n").unwrap();

        assert_eq!(tree.root_node().kind(), "document");
        assert!(!tree.root_node().has_error());
    }
}
