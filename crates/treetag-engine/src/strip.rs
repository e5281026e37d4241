//! Comment removal for query sources.
//!
//! Rule files allow `#` line comments inside queries, which tree-sitter's
//! query language doesn't know about. They are removed before compiling.

use regex::Regex;
use std::sync::OnceLock;

static RUNS_RE: OnceLock<Regex> = OnceLock::new();

/// Remove `#` comments from a query, leaving `#` inside double quotes alone.
///
/// The text is split into quoted runs, comment runs (up to the end of the
/// line) and everything else. A `"` without a closing partner is kept as is,
/// so a broken query still fails to compile instead of being patched up here.
pub fn strip_comments(query: &str) -> String {
    let runs = RUNS_RE.get_or_init(|| {
        Regex::new(r##""[^"]*"|"|#.*|[^#"]+"##).expect("comment stripping regex is valid")
    });

    runs.find_iter(query)
        .map(|run| run.as_str())
        .filter(|run| !run.starts_with('#'))
        .collect()
}
