use super::Tree;
use super::subtree::Subtree;
use crate::length::{Length, Point};

/// A text replacement, in the coordinates of the text before and after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_position: Point,
    pub old_end_position: Point,
    pub new_end_position: Point,
}

impl InputEdit {
    /// The edit replacing `range` of `old_text` with `replacement`.
    pub fn replace(old_text: &[u8], range: std::ops::Range<usize>, replacement: &[u8]) -> Self {
        let end = range.end.min(old_text.len());
        let start = range.start.min(end);
        let start_len = Length::of(&old_text[..start]);
        let old_end = start_len + Length::of(&old_text[start..end]);
        let new_end = start_len + Length::of(replacement);
        Self {
            start_byte: start,
            old_end_byte: end,
            new_end_byte: start + replacement.len(),
            start_position: start_len.extent,
            old_end_position: old_end.extent,
            new_end_position: new_end.extent,
        }
    }

    /// Insertion of `text` at `offset` of `old_text`.
    pub fn insert(old_text: &[u8], offset: usize, text: &[u8]) -> Self {
        Self::replace(old_text, offset..offset, text)
    }

    pub fn is_noop(&self) -> bool {
        self.start_byte == self.old_end_byte && self.start_byte == self.new_end_byte
    }

    fn lengths(&self) -> Span {
        Span {
            start: Length::new(self.start_byte as u32, self.start_position),
            old_end: Length::new(self.old_end_byte as u32, self.old_end_position),
            new_end: Length::new(self.new_end_byte as u32, self.new_end_position),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("edit range {start}..{old_end} is inverted")]
    InvertedRange { start: usize, old_end: usize },
    #[error("edit ends at byte {new_end}, before its start at byte {start}")]
    NewEndBeforeStart { start: usize, new_end: usize },
    #[error("edit range {start}..{old_end} lies outside the {len}-byte tree")]
    OutOfBounds {
        start: usize,
        old_end: usize,
        len: usize,
    },
}

#[derive(Clone, Copy)]
struct Span {
    start: Length,
    old_end: Length,
    new_end: Length,
}

impl Tree {
    /// A copy of the tree with positions adjusted for `edit`.
    ///
    /// Subtrees touching the edit are marked as changed, which keeps the next
    /// parse from reusing them. The text itself is not consulted.
    pub fn edit(&self, edit: &InputEdit) -> Result<Tree, EditError> {
        if edit.start_byte > edit.old_end_byte {
            return Err(EditError::InvertedRange {
                start: edit.start_byte,
                old_end: edit.old_end_byte,
            });
        }
        if edit.new_end_byte < edit.start_byte {
            return Err(EditError::NewEndBeforeStart {
                start: edit.start_byte,
                new_end: edit.new_end_byte,
            });
        }
        if edit.old_end_byte > self.len() {
            return Err(EditError::OutOfBounds {
                start: edit.start_byte,
                old_end: edit.old_end_byte,
                len: self.len(),
            });
        }
        if edit.is_noop() {
            return Ok(self.clone());
        }

        let span = edit.lengths();
        let mut edited: Vec<_> = self
            .edited
            .iter()
            .map(|&(start, end)| (shift(start, span, false), shift(end, span, true)))
            .collect();
        edited.push((span.start, span.new_end));

        Ok(Tree {
            root: edit_subtree(&self.root, span),
            language: self.language.clone(),
            edited,
        })
    }

    pub(crate) fn edited_ranges(&self) -> &[(Length, Length)] {
        &self.edited
    }
}

/// Map a position through an edit. Positions inside replaced text move to
/// the start of the replacement, or to its end when `is_end`.
fn shift(position: Length, edit: Span, is_end: bool) -> Length {
    if position.bytes < edit.start.bytes || (position.bytes == edit.start.bytes && !is_end) {
        position
    } else if position.bytes >= edit.old_end.bytes {
        edit.new_end + (position - edit.old_end)
    } else if is_end {
        edit.new_end
    } else {
        edit.start
    }
}

/// Copy-on-write walk from the root to every subtree touching the edit.
/// Each stacked edit is relative to the start of its subtree's padding.
fn edit_subtree(root: &Subtree, edit: Span) -> Subtree {
    let mut result = root.clone();
    let mut stack: Vec<(&mut Subtree, Span)> = vec![(&mut result, edit)];

    while let Some((tree, edit)) = stack.pop() {
        let is_noop = edit.old_end.bytes == edit.start.bytes && edit.new_end.bytes == edit.start.bytes;
        let is_pure_insertion = edit.old_end.bytes == edit.start.bytes;

        let mut padding = tree.padding();
        let mut size = tree.size();
        let total = tree.total();
        let reach = total.bytes + tree.lookahead_bytes();
        if edit.start.bytes > reach || (is_noop && edit.start.bytes == reach) {
            continue;
        }

        if edit.old_end.bytes <= padding.bytes {
            // the edit lies within the padding
            padding = edit.new_end + (padding - edit.old_end);
        } else if edit.start.bytes < padding.bytes {
            // the edit starts in the padding and ends in the content
            size = size.saturating_sub(edit.old_end - padding);
            padding = edit.new_end;
        } else if edit.start.bytes < total.bytes
            || (edit.start.bytes == total.bytes && is_pure_insertion)
        {
            size = (edit.new_end - padding) + total.saturating_sub(edit.old_end);
        }

        let data = tree.make_mut();
        data.padding = padding;
        data.size = size;
        data.has_changes = true;

        let mut child_right = Length::ZERO;
        let mut new_end = edit.new_end;
        let mut insertion = is_pure_insertion;
        for (index, child) in data.children.iter_mut().enumerate() {
            let child_total = child.tree.total();
            let child_left = child_right;
            child_right = child_left + child_total;

            if child_right.bytes + child.tree.lookahead_bytes() < edit.start.bytes {
                continue;
            }
            if child_left.bytes > edit.old_end.bytes
                || (child_left.bytes == edit.old_end.bytes && child_total.bytes > 0 && index > 0)
            {
                break;
            }

            let child_edit = Span {
                start: edit.start.saturating_sub(child_left),
                old_end: edit.old_end.saturating_sub(child_left),
                new_end: new_end.saturating_sub(child_left),
            };

            // only the first child touching the edit receives the new text
            if child_right.bytes > edit.start.bytes
                || (child_right.bytes == edit.start.bytes && insertion)
            {
                new_end = edit.start;
                insertion = false;
            }

            stack.push((&mut child.tree, child_edit));
        }
    }

    result
}
