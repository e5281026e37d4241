use log::warn;
use tree_sitter::Node;
use treetag_config::TagRuleConfig;

/// Node types made only of these characters are operators or punctuation.
pub const OPERATOR_CHARS: &str = "+-*/%~&|^!?<>=@.,:;()[]{}";
pub const OPERATOR_TAG: &str = "Token.Operator";
pub const TEXT_TAG: &str = "Token.Text";

/// Tag for a node type that has no entry in `token_mapping`.
pub fn structural_default(node_type: &str) -> &'static str {
    if node_type.chars().all(|c| OPERATOR_CHARS.contains(c)) {
        OPERATOR_TAG
    } else {
        TEXT_TAG
    }
}

/// Tag for a node that is tagged as a whole, without a query.
pub fn decide_tag<'a>(config: &'a TagRuleConfig, node: &Node<'_>, source: &[u8]) -> &'a str {
    let default = structural_default(node.kind());
    let Some(rule) = config.rule_for(node.kind()) else {
        return default;
    };

    let text = match node.utf8_text(source) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!("text of {} node at {:?} is not UTF-8: {err}", node.kind(), node.start_position());
            None
        }
    };
    rule.resolve(text, default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, Language};
    use rstest::rstest;
    use std::path::Path;

    #[rstest]
    #[case("=", OPERATOR_TAG)]
    #[case("+=", OPERATOR_TAG)]
    #[case("->", OPERATOR_TAG)]
    #[case("(", OPERATOR_TAG)]
    #[case("**=", OPERATOR_TAG)]
    #[case("integer", TEXT_TAG)]
    #[case("identifier", TEXT_TAG)]
    #[case("ERROR", TEXT_TAG)]
    #[case("\"", TEXT_TAG)]
    #[case("_", TEXT_TAG)]
    fn test_structural_default(#[case] node_type: &str, #[case] expected: &str) {
        assert_eq!(structural_default(node_type), expected);
    }

    /// Tag of the first leaf in `source` whose text is `text`.
    fn tag_of(rules: &str, source: &[u8], text: &str) -> String {
        let config = TagRuleConfig::from_toml_str(rules, Path::new("test.toml")).unwrap();
        let tree = Grammar::new(Language::Python).unwrap().parse(source).unwrap();

        let mut cursor = tree.walk();
        loop {
            let node = cursor.node();
            if node.child_count() == 0 && node.utf8_text(source).unwrap() == text {
                return decide_tag(&config, &node, source).to_string();
            }
            if cursor.goto_first_child() || cursor.goto_next_sibling() {
                continue;
            }
            loop {
                assert!(cursor.goto_parent(), "no leaf with text {text:?}");
                if cursor.goto_next_sibling() {
                    break;
                }
            }
        }
    }

    const RULES: &str = r#"
[token_mapping]
integer = "Token.Literal.Number"

[token_mapping.identifier]
"" = "Token.Name"
self = "Token.Name.Builtin.Pseudo"

[token_mapping.true]
True = "Token.Keyword.Constant"
"#;

    #[rstest]
    #[case::plain_mapping(b"x = 42", "42", "Token.Literal.Number")]
    #[case::by_text(b"self.x", "self", "Token.Name.Builtin.Pseudo")]
    #[case::by_text_fallback(b"other.x", "other", "Token.Name")]
    #[case::unmapped_operator(b"x = 42", "=", OPERATOR_TAG)]
    #[case::unmapped_word(b"x = 1.5", "1.5", TEXT_TAG)]
    #[case::unmapped_keyword(b"pass", "pass", TEXT_TAG)]
    #[case::by_text_known(b"x = True", "True", "Token.Keyword.Constant")]
    fn test_decide_tag(#[case] source: &[u8], #[case] text: &str, #[case] expected: &str) {
        assert_eq!(tag_of(RULES, source, text), expected);
    }

    #[test]
    fn test_by_text_without_fallback_uses_structural_default() {
        let rules = "[token_mapping.identifier]\nself = \"Token.Name.Builtin.Pseudo\"\n";

        assert_eq!(tag_of(rules, b"x = 1", "x"), TEXT_TAG);
    }
}
