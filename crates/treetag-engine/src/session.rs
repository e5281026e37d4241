use log::{debug, trace};
use std::path::Path;
use tree_sitter::Tree;
use treetag_config::TagRuleConfig;

use crate::edit::{EditPlan, TextChange, plan_edit};
use crate::grammar::{Grammar, Language, project_buffer};
use crate::query::TagAction;
use crate::traverse::{Highlight, TagRules, Traversal};
use crate::{HighlightError, HostWidget, TextRange};

/// Keeps the tags of one open document up to date.
///
/// Owns the parser, the compiled rules and the one syntax tree of the
/// document. Every notification is handled to completion before returning;
/// there is nothing running in the background.
pub struct HighlighterSession<H> {
    host: H,
    grammar: Grammar,
    rules: TagRules,
    tree: Tree,
    /// The projected buffer `tree` was parsed from.
    source: Vec<u8>,
    /// What was visible the last time tags were drawn.
    highlighted: Option<TextRange>,
}

impl<H: HostWidget> HighlighterSession<H> {
    /// Set up highlighting for the text in `host` and tag its visible part.
    ///
    /// Fails if any query in `config` doesn't compile, rather than
    /// highlighting with half the rules.
    pub fn new(host: H, language: Language, config: TagRuleConfig) -> Result<Self, HighlightError> {
        let rules = TagRules::new(language, config)?;
        let mut grammar = Grammar::new(language)?;
        let source = project_buffer(&host.full_text());
        let tree = grammar.parse(&source)?;
        debug!(
            "started {} session: {} bytes, {} queries",
            language.name(),
            source.len(),
            rules.queries().len()
        );

        let mut session = Self {
            host,
            grammar,
            rules,
            tree,
            source,
            highlighted: None,
        };
        let visible = session.host.visible_range();
        session.refresh(visible);
        Ok(session)
    }

    /// Like [`HighlighterSession::new`], loading the rules for `name` from
    /// `rules_dir` or the bundled rule files.
    pub fn for_language(host: H, name: &str, rules_dir: Option<&Path>) -> Result<Self, HighlightError> {
        let language =
            Language::from_name(name).ok_or_else(|| HighlightError::UnknownLanguage(name.to_string()))?;
        let config = TagRuleConfig::load_for_language(language.name(), rules_dir)?;
        Self::new(host, language, config)
    }

    /// The host changed its text. `changes` is everything one user action
    /// did, already applied to the host.
    pub fn on_edit(&mut self, changes: &[TextChange]) -> Result<(), HighlightError> {
        let plan = plan_edit(changes, &self.host);
        if plan == EditPlan::Unchanged {
            return Ok(());
        }

        let source = project_buffer(&self.host.full_text());
        // The tree is only replaced once parsing succeeded.
        self.tree = match plan {
            EditPlan::Incremental(edit) => {
                debug!("incremental reparse: {edit:?}");
                self.grammar.reparse(&source, self.tree.clone(), &edit)?
            }
            _ => {
                debug!("{} changes at once, parsing from scratch", changes.len());
                self.grammar.parse(&source)?
            }
        };
        self.source = source;

        let visible = self.host.visible_range();
        self.refresh(visible);
        Ok(())
    }

    /// The host scrolled. The tree stays as it is.
    pub fn on_scroll(&mut self, visible: TextRange) {
        self.refresh(visible);
    }

    /// Redraw all tags in `visible`.
    ///
    /// Tags in the previously drawn range and in `visible` are cleared
    /// first, so nothing stale survives in either.
    pub fn refresh(&mut self, visible: TextRange) {
        if let Some(previous) = self.highlighted.replace(visible)
            && previous != visible
        {
            self.host.delete_tags(previous.start, previous.end);
        }
        self.host.delete_tags(visible.start, visible.end);

        let traversal = Traversal::over_tree(&self.tree, &self.rules, &self.source, visible);
        let count = apply(
            &mut self.host,
            traversal.map(|(node, action)| Highlight::new(&node, action)),
        );
        trace!("drew {count} tags in {visible}");
    }

    /// What [`HighlighterSession::refresh`] would draw for `range`.
    pub fn highlights(&self, range: TextRange) -> Vec<Highlight<'_>> {
        Traversal::over_tree(&self.tree, &self.rules, &self.source, range)
            .map(|(node, action)| Highlight::new(&node, action))
            .collect()
    }

    pub fn language(&self) -> Language {
        self.grammar.language()
    }

    pub fn rules(&self) -> &TagRules {
        &self.rules
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Direct access to the host. Text changes made through this must be
    /// reported back with [`HighlighterSession::on_edit`].
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

/// Draw `highlights` in order: recurse markers clear their range, everything
/// else adds its tag. Returns how many instructions were applied.
pub fn apply<'a, H: HostWidget + ?Sized>(
    host: &mut H,
    highlights: impl IntoIterator<Item = Highlight<'a>>,
) -> usize {
    let mut count = 0;
    for highlight in highlights {
        let TextRange { start, end } = highlight.range;
        match highlight.action {
            TagAction::Recurse => host.delete_tags(start, end),
            TagAction::Tag(tag) => host.add_tag(tag, start, end),
        }
        count += 1;
    }
    count
}
