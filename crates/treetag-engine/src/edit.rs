//! Translating host edit notifications into tree-sitter edits.

use tree_sitter::{InputEdit, Point};

use crate::{HostWidget, TextRange};

/// One text change as reported by the host, in its own coordinates.
///
/// Points are 0-based, columns count characters. `old_end` is where the
/// replaced text ended before the edit, `new_end` where the inserted text ends
/// after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub start: Point,
    pub old_end: Point,
    pub new_end: Point,
    pub old_text: String,
    pub new_text: String,
}

/// Byte and point bookkeeping for one edit, in the form `Tree::edit` wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDescriptor {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

impl EditDescriptor {
    /// Build the descriptor for `change`, which starts `start_byte` bytes
    /// into the projected buffer. One character is one byte there, so the
    /// text lengths are character counts.
    pub fn from_change(change: &TextChange, start_byte: usize) -> Self {
        Self {
            start_byte,
            old_end_byte: start_byte + change.old_text.chars().count(),
            new_end_byte: start_byte + change.new_text.chars().count(),
            start_point: change.start,
            old_end_point: change.old_end,
            new_end_point: change.new_end,
        }
    }
}

impl From<EditDescriptor> for InputEdit {
    fn from(edit: EditDescriptor) -> Self {
        InputEdit {
            start_byte: edit.start_byte,
            old_end_byte: edit.old_end_byte,
            new_end_byte: edit.new_end_byte,
            start_position: edit.start_point,
            old_end_position: edit.old_end_point,
            new_end_position: edit.new_end_point,
        }
    }
}

/// How the tree has to be brought up to date after a batch of changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPlan {
    Unchanged,
    /// Several regions changed at once (multiple cursors, search and
    /// replace). Rare enough that parsing everything again is fine.
    FullReparse,
    Incremental(EditDescriptor),
}

/// Decide how to handle `changes`, which the host has already applied.
pub fn plan_edit<H: HostWidget + ?Sized>(changes: &[TextChange], host: &H) -> EditPlan {
    match changes {
        [] => EditPlan::Unchanged,
        [change] => {
            let start_byte = chars_before(host, change.start);
            EditPlan::Incremental(EditDescriptor::from_change(change, start_byte))
        }
        _ => EditPlan::FullReparse,
    }
}

/// Number of characters between the start of the buffer and `point`.
///
/// Everything before the start of a change is the same before and after it,
/// so the host's current text can be used.
pub fn chars_before<H: HostWidget + ?Sized>(host: &H, point: Point) -> usize {
    host.text(TextRange::new(Point::new(0, 0), point))
        .chars()
        .count()
}
