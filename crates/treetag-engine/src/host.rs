//! The text widget a highlighter session draws into.

use std::collections::BTreeMap;
use tree_sitter::Point;
use xi_rope::{LinesMetric, Rope};

use crate::range::point_key;
use crate::{TextChange, TextRange};

/// What a session needs from the widget that owns the text.
///
/// All points are 0-based `(row, column)` with columns counted in characters.
pub trait HostWidget {
    fn text(&self, range: TextRange) -> String;

    /// Position just past the last character.
    fn end_point(&self) -> Point;

    fn visible_range(&self) -> TextRange;

    fn add_tag(&mut self, tag: &str, start: Point, end: Point);

    /// Remove every tag from the given region, splitting tags that stick out.
    fn delete_tags(&mut self, start: Point, end: Point);

    fn full_text(&self) -> String {
        self.text(TextRange::new(Point::new(0, 0), self.end_point()))
    }
}

impl<H: HostWidget + ?Sized> HostWidget for &mut H {
    fn text(&self, range: TextRange) -> String {
        (**self).text(range)
    }

    fn end_point(&self) -> Point {
        (**self).end_point()
    }

    fn visible_range(&self) -> TextRange {
        (**self).visible_range()
    }

    fn add_tag(&mut self, tag: &str, start: Point, end: Point) {
        (**self).add_tag(tag, start, end)
    }

    fn delete_tags(&mut self, start: Point, end: Point) {
        (**self).delete_tags(start, end)
    }
}

/// In-memory widget backed by a rope. Used by the CLI and in tests.
#[derive(Debug, Clone)]
pub struct MemoryWidget {
    buffer: Rope,
    visible: Option<TextRange>,
    tags: BTreeMap<String, Vec<TextRange>>,
}

impl MemoryWidget {
    pub fn new(text: &str) -> Self {
        Self {
            buffer: Rope::from(text),
            visible: None,
            tags: BTreeMap::new(),
        }
    }

    /// Restrict what counts as visible. Without this the whole text is.
    pub fn set_visible_range(&mut self, range: TextRange) {
        self.visible = Some(range);
    }

    /// Replace the text between `start` and `end` and report the change the
    /// way an editor widget would. Existing tags move along with the text.
    pub fn replace(&mut self, start: Point, end: Point, new_text: &str) -> TextChange {
        let old_text = self.text(TextRange::new(start, end));
        let start_offset = self.offset_of(start);
        let end_offset = self.offset_of(end).max(start_offset);
        self.buffer.edit(start_offset..end_offset, new_text);

        let new_end = point_after(start, new_text);
        for spans in self.tags.values_mut() {
            for span in spans.iter_mut() {
                span.start = shift_point(span.start, start, end, new_end);
                span.end = shift_point(span.end, start, end, new_end);
            }
            spans.retain(|span| !span.is_empty());
        }
        self.tags.retain(|_, spans| !spans.is_empty());

        TextChange {
            start,
            old_end: end,
            new_end,
            old_text,
            new_text: new_text.to_string(),
        }
    }

    /// Tags covering the character at `point`, sorted by name.
    pub fn tags_at(&self, point: Point) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|(_, spans)| spans.iter().any(|span| span.contains(point)))
            .map(|(tag, _)| tag.as_str())
            .collect()
    }

    /// Every tagged region, ordered by position and then tag name.
    pub fn spans(&self) -> Vec<(TextRange, &str)> {
        let mut spans: Vec<(TextRange, &str)> = self
            .tags
            .iter()
            .flat_map(|(tag, spans)| spans.iter().map(move |span| (*span, tag.as_str())))
            .collect();
        spans.sort_by_key(|(span, tag)| (point_key(span.start), point_key(span.end), *tag));
        spans
    }

    fn line_count(&self) -> usize {
        self.buffer.measure::<LinesMetric>() + 1
    }

    /// Byte offset into the rope. Points past the end of a line clamp to
    /// the line break, points past the last line to the end of the text.
    fn offset_of(&self, point: Point) -> usize {
        if point.row >= self.line_count() {
            return self.buffer.len();
        }
        let line_start = self.buffer.offset_of_line(point.row);
        let line_end = if point.row + 1 < self.line_count() {
            self.buffer.offset_of_line(point.row + 1)
        } else {
            self.buffer.len()
        };
        let line = self.buffer.slice_to_cow(line_start..line_end);
        let line = line.strip_suffix('\n').unwrap_or(&line);
        let column = line
            .char_indices()
            .nth(point.column)
            .map(|(index, _)| index)
            .unwrap_or(line.len());
        line_start + column
    }
}

impl HostWidget for MemoryWidget {
    fn text(&self, range: TextRange) -> String {
        let start = self.offset_of(range.start);
        let end = self.offset_of(range.end).max(start);
        self.buffer.slice_to_cow(start..end).into_owned()
    }

    fn end_point(&self) -> Point {
        let last_row = self.line_count() - 1;
        let line_start = self.buffer.offset_of_line(last_row);
        let column = self
            .buffer
            .slice_to_cow(line_start..self.buffer.len())
            .chars()
            .count();
        Point::new(last_row, column)
    }

    fn visible_range(&self) -> TextRange {
        self.visible
            .unwrap_or_else(|| TextRange::new(Point::new(0, 0), self.end_point()))
    }

    fn add_tag(&mut self, tag: &str, start: Point, end: Point) {
        let span = TextRange::new(start, end);
        if span.is_empty() {
            return;
        }
        self.tags.entry(tag.to_string()).or_default().push(span);
    }

    fn delete_tags(&mut self, start: Point, end: Point) {
        let cut = TextRange::new(start, end);
        for spans in self.tags.values_mut() {
            *spans = spans
                .iter()
                .flat_map(|span| subtract(*span, cut))
                .collect();
        }
        self.tags.retain(|_, spans| !spans.is_empty());
    }
}

/// Where the cursor ends up after typing `text` at `start`.
fn point_after(start: Point, text: &str) -> Point {
    match text.rsplit_once('\n') {
        Some((before, last_line)) => Point::new(
            start.row + before.matches('\n').count() + 1,
            last_line.chars().count(),
        ),
        None => Point::new(start.row, start.column + text.chars().count()),
    }
}

fn shift_point(point: Point, start: Point, old_end: Point, new_end: Point) -> Point {
    if point_key(point) <= point_key(start) {
        point
    } else if point_key(point) < point_key(old_end) {
        start
    } else if point.row == old_end.row {
        Point::new(new_end.row, new_end.column + point.column - old_end.column)
    } else {
        Point::new(point.row + new_end.row - old_end.row, point.column)
    }
}

fn subtract(span: TextRange, cut: TextRange) -> Vec<TextRange> {
    if !span.overlaps(&cut) {
        return vec![span];
    }
    let mut pieces = Vec::with_capacity(2);
    if point_key(span.start) < point_key(cut.start) {
        pieces.push(TextRange::new(span.start, cut.start));
    }
    if point_key(cut.end) < point_key(span.end) {
        pieces.push(TextRange::new(cut.end, span.end));
    }
    pieces
}
