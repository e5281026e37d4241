/*!
 * # treetag engine
 *
 * Keeps a tree-sitter syntax tree in sync with a text widget and turns the
 * part of the tree that is on screen into `(range, tag)` instructions.
 *
 * ## Pipeline
 *
 * 1. The widget reports text changes ([`TextChange`]). A single change becomes
 *    an [`EditDescriptor`] and the tree is reparsed incrementally, several
 *    changes at once mean a full parse ([`plan_edit`]).
 * 2. [`Traversal`] walks only the nodes overlapping the visible range. Queries
 *    from the language's rule file ([`QuerySet`]) tag interesting parts of a
 *    node directly, everything else is tagged leaf by leaf ([`decide_tag`]).
 * 3. [`HighlighterSession`] clears the affected range and draws the result
 *    into its [`HostWidget`].
 *
 * ## Coordinates
 *
 * The widget counts columns in characters, tree-sitter counts bytes. The text
 * is parsed as a projection where every character is one byte
 * ([`project_buffer`]), which keeps both in agreement at the cost of seeing
 * non-ASCII characters as `?`.
 *
 * ```rust
 * use treetag_engine::{HighlighterSession, MemoryWidget, Point};
 *
 * let widget = MemoryWidget::new("def greet(name):\n    print(name)\n");
 * let mut session = HighlighterSession::for_language(widget, "python", None).unwrap();
 * assert_eq!(session.host().tags_at(Point::new(0, 4)), vec!["Token.Name.Function"]);
 *
 * let change = session.host_mut().replace(Point::new(1, 4), Point::new(1, 9), "log");
 * session.on_edit(&[change]).unwrap();
 * assert_eq!(session.host().tags_at(Point::new(1, 4)), vec!["Token.Name.Function"]);
 * ```
 */

pub mod edit;
pub mod error;
pub mod grammar;
pub mod host;
pub mod query;
pub mod range;
pub mod session;
pub mod strip;
pub mod tags;
pub mod traverse;

pub use edit::{EditDescriptor, EditPlan, TextChange, plan_edit};
pub use error::HighlightError;
pub use grammar::{Grammar, Language, project_buffer};
pub use host::{HostWidget, MemoryWidget};
pub use query::{Capture, QuerySet, RECURSE_CAPTURE, TagAction};
pub use range::{TextRange, VisibleRange};
pub use session::{HighlighterSession, apply};
pub use strip::strip_comments;
pub use tags::{OPERATOR_TAG, TEXT_TAG, decide_tag, structural_default};
pub use traverse::{Highlight, TagRules, Traversal};
pub use tree_sitter::Point;
pub use treetag_config::{ConfigError, TagRuleConfig, TokenRule};
