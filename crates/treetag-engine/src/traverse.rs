//! Walking a syntax tree to find out which tags go where.
//!
//! Only the part of the tree that overlaps a given range is looked at, so the
//! cost of tagging depends on how much text is on screen rather than on the
//! size of the file.
//!
//! For every node that overlaps the range:
//!
//! 1. If a query is registered for the node type and it captures anything,
//!    the directly tagged captures come out first. Then each `@recurse`
//!    capture comes out as [`TagAction::Recurse`], immediately followed by
//!    everything its own walk produces.
//! 2. Otherwise, a node with no children, or one listed in
//!    `dont_recurse_inside`, comes out with the tag from [`decide_tag`].
//! 3. Otherwise its children are walked from left to right.

use tree_sitter::{Node, Tree};
use treetag_config::TagRuleConfig;

use crate::grammar::Language;
use crate::query::{Capture, QuerySet, TagAction};
use crate::tags::decide_tag;
use crate::{HighlightError, TextRange};

/// Tag rules of one language with their queries compiled.
pub struct TagRules {
    config: TagRuleConfig,
    queries: QuerySet,
}

impl TagRules {
    pub fn new(language: Language, config: TagRuleConfig) -> Result<Self, HighlightError> {
        let queries = QuerySet::compile(&language.ts_language(), &config)?;
        Ok(Self { config, queries })
    }

    pub fn config(&self) -> &TagRuleConfig {
        &self.config
    }

    pub fn queries(&self) -> &QuerySet {
        &self.queries
    }
}

enum Frame<'a> {
    Visit(Node<'a>),
    Emit(Node<'a>, TagAction<'a>),
}

/// Lazy `(node, action)` sequence for the part of a tree inside a range.
///
/// Uses its own stack rather than recursion, so deeply nested trees are fine.
pub struct Traversal<'a> {
    rules: &'a TagRules,
    source: &'a [u8],
    range: TextRange,
    stack: Vec<Frame<'a>>,
}

impl<'a> Traversal<'a> {
    pub fn new(root: Node<'a>, rules: &'a TagRules, source: &'a [u8], range: TextRange) -> Self {
        Self {
            rules,
            source,
            range,
            stack: vec![Frame::Visit(root)],
        }
    }

    /// Start at the root of `tree`. `source` must be the buffer the tree was
    /// parsed from.
    pub fn over_tree(tree: &'a Tree, rules: &'a TagRules, source: &'a [u8], range: TextRange) -> Self {
        Self::new(tree.root_node(), rules, source, range)
    }

    fn in_range(&self, node: &Node<'_>) -> bool {
        TextRange::of_node(node).overlaps(&self.range)
    }

    fn push_captures(&mut self, node: Node<'a>, captures: Vec<Capture<'a>>) {
        let (recurse, direct): (Vec<_>, Vec<_>) = captures
            .into_iter()
            .filter(|capture| self.in_range(&capture.node))
            .partition(|capture| capture.action == TagAction::Recurse);

        for capture in recurse.into_iter().rev() {
            // Visiting the node again would run the same query forever.
            if capture.node == node {
                self.push_children(node);
            } else {
                self.stack.push(Frame::Visit(capture.node));
            }
            self.stack.push(Frame::Emit(capture.node, TagAction::Recurse));
        }
        for capture in direct.into_iter().rev() {
            self.stack.push(Frame::Emit(capture.node, capture.action));
        }
    }

    fn push_children(&mut self, node: Node<'a>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'a>> = node.children(&mut cursor).collect();
        self.stack
            .extend(children.into_iter().rev().map(Frame::Visit));
    }
}

impl<'a> Iterator for Traversal<'a> {
    type Item = (Node<'a>, TagAction<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            let node = match frame {
                Frame::Emit(node, action) => return Some((node, action)),
                Frame::Visit(node) => node,
            };
            if !self.in_range(&node) {
                continue;
            }

            // A query that matches nothing doesn't apply to this node.
            if let Some(captures) = self.rules.queries.captures(node, self.source)
                && !captures.is_empty()
            {
                self.push_captures(node, captures);
                continue;
            }

            if self.rules.config.is_atomic(node.kind()) || node.child_count() == 0 {
                let tag = decide_tag(&self.rules.config, &node, self.source);
                return Some((node, TagAction::Tag(tag)));
            }
            self.push_children(node);
        }
        None
    }
}

/// One drawing instruction for the host widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight<'a> {
    pub range: TextRange,
    pub action: TagAction<'a>,
}

impl<'a> Highlight<'a> {
    pub fn new(node: &Node<'_>, action: TagAction<'a>) -> Self {
        Self {
            range: TextRange::of_node(node),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::tags::{OPERATOR_TAG, TEXT_TAG};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::path::Path;
    use tree_sitter::Point;

    fn rules(toml: &str) -> TagRules {
        let config = TagRuleConfig::from_toml_str(toml, Path::new("test.toml")).unwrap();
        TagRules::new(Language::Python, config).unwrap()
    }

    fn walk(rules: &TagRules, source: &str, range: TextRange) -> Vec<(String, String)> {
        let tree = Grammar::new(Language::Python)
            .unwrap()
            .parse(source.as_bytes())
            .unwrap();
        Traversal::over_tree(&tree, rules, source.as_bytes(), range)
            .map(|(node, action)| {
                (
                    node.utf8_text(source.as_bytes()).unwrap().to_string(),
                    action.as_str().to_string(),
                )
            })
            .collect()
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(text, tag)| (text.to_string(), tag.to_string()))
            .collect()
    }

    fn everything() -> TextRange {
        TextRange::new(Point::new(0, 0), Point::new(usize::MAX, 0))
    }

    #[test]
    fn test_leaves_get_mapping_or_default() {
        let rules = rules("[token_mapping]\nidentifier = \"Token.Name\"\n");

        let result = walk(&rules, "x = 1", everything());

        assert_eq!(
            result,
            pairs(&[("x", "Token.Name"), ("=", OPERATOR_TAG), ("1", TEXT_TAG)])
        );
    }

    #[test]
    fn test_dont_recurse_inside_tags_whole_node() {
        let rules = rules(
            "dont_recurse_inside = [\"string\"]\n[token_mapping]\nstring = \"Token.Literal.String\"\n",
        );

        let result = walk(&rules, "s = \"a b\"", everything());

        assert_eq!(
            result,
            pairs(&[
                ("s", TEXT_TAG),
                ("=", OPERATOR_TAG),
                ("\"a b\"", "Token.Literal.String"),
            ])
        );
    }

    #[test]
    fn test_direct_captures_before_recursion() {
        let rules = rules(
            r#"
[token_mapping]
identifier = "Token.Name"

[queries]
call = "(call function: (identifier) @Token.Name.Function arguments: (argument_list) @recurse)"
"#,
        );

        let result = walk(&rules, "f(a)", everything());

        assert_eq!(
            result,
            pairs(&[
                ("f", "Token.Name.Function"),
                ("(a)", "recurse"),
                ("(", OPERATOR_TAG),
                ("a", "Token.Name"),
                (")", OPERATOR_TAG),
            ])
        );
    }

    #[test]
    fn test_query_without_captures_falls_back_to_children() {
        let rules = rules(
            r#"
[token_mapping]
identifier = "Token.Name"

[queries]
call = "(call function: (identifier) @Token.Name.Function)"
"#,
        );

        let result = walk(&rules, "o.m()", everything());

        assert_eq!(
            result,
            pairs(&[
                ("o", "Token.Name"),
                (".", OPERATOR_TAG),
                ("m", "Token.Name"),
                ("(", OPERATOR_TAG),
                (")", OPERATOR_TAG),
            ])
        );
    }

    #[test]
    fn test_nodes_outside_range_are_pruned() {
        let rules = rules("[token_mapping]\nidentifier = \"Token.Name\"\n");
        let source = "a = 1\nb = 2\nc = 3\n";

        let result = walk(&rules, source, TextRange::rows(1, 1));

        assert_eq!(
            result,
            pairs(&[("b", "Token.Name"), ("=", OPERATOR_TAG), ("2", TEXT_TAG)])
        );
    }

    #[test]
    fn test_captures_outside_range_are_dropped() {
        let rules = rules(
            r#"
[token_mapping]

[queries]
function_definition = '''
(function_definition name: (identifier) @Token.Name.Function)
(function_definition body: (block) @recurse)
'''
"#,
        );
        let source = "def f():\n    x\n    y\n";

        let result = walk(&rules, source, TextRange::rows(2, 2));

        let tags: Vec<&str> = result.iter().map(|(_, tag)| tag.as_str()).collect();
        assert_eq!(tags, vec!["recurse", TEXT_TAG]);
        assert_eq!(result[1].0, "y");
    }

    #[test]
    fn test_partial_overlap_yields_whole_node() {
        let rules = rules("[token_mapping]\n");
        let source = "name = 1\n";
        let range = TextRange::new(Point::new(0, 2), Point::new(0, 3));

        let result = walk(&rules, source, range);

        assert_eq!(result, pairs(&[("name", TEXT_TAG)]));
    }

    #[test]
    fn test_recurse_on_queried_node_walks_its_children() {
        let rules = rules("[token_mapping]\n[queries]\ncall = '(call) @recurse'\n");

        let result = walk(&rules, "f(x)", everything());

        assert_eq!(
            result,
            pairs(&[
                ("f(x)", "recurse"),
                ("f", TEXT_TAG),
                ("(", OPERATOR_TAG),
                ("x", TEXT_TAG),
                (")", OPERATOR_TAG),
            ])
        );
    }

    #[rstest]
    #[case(4)]
    #[case(8)]
    #[case(16)]
    fn test_nested_calls_are_walked_once(#[case] depth: usize) {
        let rules = TagRules::new(Language::Python, TagRuleConfig::bundled("python").unwrap())
            .unwrap();
        let names: String = (0..depth).map(|i| format!("f{i}(")).collect();
        let source = format!("{names}x{}", ")".repeat(depth));

        let result = walk(&rules, &source, everything());

        // name, argument list, "(" and ")" per call, plus the innermost x
        assert_eq!(result.len(), 4 * depth + 1);
        for i in 0..depth {
            let name = format!("f{i}");
            let emitted: Vec<&str> = result
                .iter()
                .filter(|(text, _)| *text == name)
                .map(|(_, tag)| tag.as_str())
                .collect();
            assert_eq!(emitted, vec!["Token.Name.Function"]);
        }
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let rules = rules("[token_mapping]\n");
        let depth = 1_000;
        let source = format!("x = {}1{}", "(".repeat(depth), ")".repeat(depth));

        let count = {
            let tree = Grammar::new(Language::Python)
                .unwrap()
                .parse(source.as_bytes())
                .unwrap();
            Traversal::over_tree(&tree, &rules, source.as_bytes(), everything()).count()
        };

        assert_eq!(count, 2 * depth + 3);
    }
}
