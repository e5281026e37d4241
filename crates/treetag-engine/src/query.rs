//! Precompiled tree-sitter queries, one per node type.
//!
//! Capture names are tags, e.g. `@Token.Name.Function`, except for
//! `@recurse` which asks for the captured node to be walked like any other
//! node instead of being tagged as a whole.

use log::debug;
use std::collections::HashMap;
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator};
use treetag_config::TagRuleConfig;

use crate::{HighlightError, strip::strip_comments};

pub const RECURSE_CAPTURE: &str = "recurse";

/// What to do with a node the traversal hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagAction<'a> {
    Tag(&'a str),
    /// Clear the node's range, its descendants follow right after.
    Recurse,
}

impl<'a> TagAction<'a> {
    pub fn from_capture_name(name: &'a str) -> Self {
        if name == RECURSE_CAPTURE {
            TagAction::Recurse
        } else {
            TagAction::Tag(name)
        }
    }

    pub fn as_str(&self) -> &'a str {
        match self {
            TagAction::Tag(tag) => *tag,
            TagAction::Recurse => RECURSE_CAPTURE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Capture<'a> {
    pub node: Node<'a>,
    pub action: TagAction<'a>,
}

/// All queries of one language, compiled up front.
#[derive(Debug, Default)]
pub struct QuerySet {
    queries: HashMap<String, Query>,
}

impl QuerySet {
    /// Compile every query in `config`. The first one that doesn't compile
    /// fails the whole set.
    pub fn compile(
        language: &tree_sitter::Language,
        config: &TagRuleConfig,
    ) -> Result<Self, HighlightError> {
        let mut queries = HashMap::with_capacity(config.queries.len());
        for (node_type, source) in &config.queries {
            let query = Query::new(language, &strip_comments(source)).map_err(|source| {
                HighlightError::Query {
                    node_type: node_type.clone(),
                    source,
                }
            })?;
            debug!(
                "compiled query for {node_type}: {} patterns, {} captures",
                query.pattern_count(),
                query.capture_names().len()
            );
            queries.insert(node_type.clone(), query);
        }
        Ok(Self { queries })
    }

    pub fn get(&self, node_type: &str) -> Option<&Query> {
        self.queries.get(node_type)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Run the query registered for `node`'s type against it. `None` if there
    /// is no such query, an empty list if there is one but it didn't match.
    pub fn captures<'a>(&'a self, node: Node<'a>, source: &'a [u8]) -> Option<Vec<Capture<'a>>> {
        let query = self.get(node.kind())?;
        Some(evaluate(query, node, source))
    }
}

/// All captures of `query` inside `node`, in the order tree-sitter reports
/// them. Only matches rooted at `node` itself count; nested nodes of the same
/// type get their own turn when the traversal reaches them.
pub fn evaluate<'a>(query: &'a Query, node: Node<'a>, source: &'a [u8]) -> Vec<Capture<'a>> {
    let names = query.capture_names();
    let mut cursor = QueryCursor::new();
    cursor.set_max_start_depth(Some(0));
    let mut captures = cursor.captures(query, node, source);

    let mut result = Vec::new();
    while let Some((query_match, index)) = captures.next() {
        let capture = query_match.captures[*index];
        result.push(Capture {
            node: capture.node,
            action: TagAction::from_capture_name(names[capture.index as usize]),
        });
    }
    result
}
