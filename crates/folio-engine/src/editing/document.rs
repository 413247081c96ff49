use crate::editing::nodes::{coalesce_runs, Align, Block, ListKind, MarkKind, Marks, TextRun};
use crate::editing::{Cmd, Patch};
use crate::html::{self, HtmlError};

/// A caret endpoint: a leaf block (paragraph or heading, counted in
/// document order including those nested in list items) and a byte
/// offset into that leaf's concatenated run text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// The active range targeted by the next command. `anchor` is where the
/// selection started, `head` where it currently ends; they may be in
/// either document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
}

impl Selection {
    pub fn new(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    pub fn caret(at: Position) -> Self {
        Self {
            anchor: at,
            head: at,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }

    /// Endpoints in document order.
    pub fn ordered(&self) -> (Position, Position) {
        if self.anchor <= self.head {
            (self.anchor, self.head)
        } else {
            (self.head, self.anchor)
        }
    }
}

/// The editable document: an ordered sequence of top-level blocks plus
/// the current selection and a version counter.
///
/// Invariant: the document is never empty — an empty document is a
/// single empty paragraph, so there is always a valid caret position.
/// All mutation goes through [`Document::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub(crate) blocks: Vec<Block>,
    pub(crate) selection: Selection,
    pub(crate) version: u64,
}

impl Document {
    /// Create an empty document: one empty paragraph, caret at its start.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::empty_paragraph()],
            selection: Selection::caret(Position::new(0, 0)),
            version: 0,
        }
    }

    /// Seed a document from a serialized HTML fragment.
    pub fn from_html(fragment: &str) -> Result<Self, HtmlError> {
        let mut blocks = html::parse_fragment(fragment)?;
        if blocks.is_empty() {
            blocks.push(Block::empty_paragraph());
        }
        let mut doc = Self {
            blocks,
            selection: Selection::caret(Position::new(0, 0)),
            version: 0,
        };
        doc.normalize();
        // Start with the caret at the end of the seeded content.
        let last = doc.leaf_count() - 1;
        doc.selection = Selection::caret(Position::new(last, doc.leaf_len(last).unwrap_or(0)));
        Ok(doc)
    }

    /// Serialize to a structure-preserving HTML fragment.
    pub fn to_html(&self) -> String {
        html::to_html(self)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Set the selection, clamping it to valid leaf indices and
    /// snapping offsets to character boundaries.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = self.clamp_selection(selection);
    }

    /// Select the whole document.
    pub fn select_all(&mut self) {
        let last = self.leaf_count() - 1;
        self.selection = Selection::new(
            Position::new(0, 0),
            Position::new(last, self.leaf_len(last).unwrap_or(0)),
        );
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply a command to the document.
    ///
    /// Every successful mutation bumps the version exactly once;
    /// degenerate commands return the document unchanged with
    /// `changed == false` and never raise an error.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let applied = crate::editing::commands::apply_command(self, &cmd);
        if applied.changed {
            self.normalize();
            self.selection = self.clamp_selection(applied.new_selection);
            self.version += 1;
        }
        Patch {
            changed: applied.changed,
            new_selection: self.selection,
            version: self.version,
        }
    }

    // ============ Leaf access ============

    /// Number of leaf blocks (paragraphs and headings, including those
    /// nested in list items) in document order.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        visit_leaves(&self.blocks, &mut |_, _| count += 1);
        count
    }

    /// Concatenated run text of the given leaf.
    pub fn leaf_text(&self, index: usize) -> Option<String> {
        let mut found = None;
        visit_leaves(&self.blocks, &mut |i, block| {
            if i == index {
                found = Some(block.text());
            }
        });
        found
    }

    /// Byte length of the given leaf's text.
    pub fn leaf_len(&self, index: usize) -> Option<usize> {
        self.leaf_text(index).map(|t| t.len())
    }

    pub(crate) fn with_leaf_mut<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Block) -> R,
    ) -> Option<R> {
        let mut f = Some(f);
        let mut result = None;
        visit_leaves_mut(&mut self.blocks, &mut |i, block| {
            if i == index
                && let Some(f) = f.take()
            {
                result = Some(f(block));
            }
        });
        result
    }

    /// Visit every leaf whose index falls in the ordered selection
    /// range, passing the leaf-local byte range the selection covers.
    pub(crate) fn for_selected_leaves_mut(
        &mut self,
        f: &mut impl FnMut(&mut Block, std::ops::Range<usize>),
    ) {
        let (start, end) = self.selection.ordered();
        visit_leaves_mut(&mut self.blocks, &mut |i, block| {
            if i < start.block || i > end.block {
                return;
            }
            let len = block.text().len();
            let from = if i == start.block { start.offset } else { 0 };
            let to = if i == end.block { end.offset } else { len };
            f(block, from.min(len)..to.min(len));
        });
    }

    /// Marks governing the caret position: the run containing the
    /// character before the caret, or the first run at a leaf start.
    pub(crate) fn marks_at_caret(&self) -> Marks {
        let at = self.selection.ordered().0;
        let mut found = Marks::default();
        visit_leaves(&self.blocks, &mut |i, block| {
            if i != at.block {
                return;
            }
            if let Block::Paragraph { runs, .. } | Block::Heading { runs, .. } = block {
                let mut pos = 0;
                for run in runs {
                    let end = pos + run.text.len();
                    // The run ending at the caret governs, i.e. the one
                    // holding the character before it.
                    if at.offset <= end {
                        found = run.marks.clone();
                        return;
                    }
                    pos = end;
                }
            }
        });
        found
    }

    // ============ Active-state queries ============

    /// Whether `kind` is uniformly present across the selection, or at
    /// the caret when the selection is empty. Used by frontends to
    /// highlight toolbar state.
    pub fn is_mark_active(&self, kind: MarkKind) -> bool {
        self.uniform_marks(|marks| marks.has(kind))
    }

    /// Whether a link mark covers the selection (or caret).
    pub fn is_link_active(&self) -> bool {
        self.uniform_marks(|marks| marks.link.is_some())
    }

    /// Whether every block intersecting the selection is a heading of
    /// the given level.
    pub fn is_heading_active(&self, level: u8) -> bool {
        self.all_selected_leaves(|block| matches!(block, Block::Heading { level: l, .. } if *l == level))
    }

    /// Whether every block intersecting the selection has the given
    /// alignment.
    pub fn is_align_active(&self, align: Align) -> bool {
        self.all_selected_leaves(|block| match block {
            Block::Paragraph { align: a, .. } | Block::Heading { align: a, .. } => *a == align,
            _ => false,
        })
    }

    /// Whether every top-level block intersecting the selection is a
    /// list of the given kind.
    pub fn is_list_active(&self, kind: ListKind) -> bool {
        let range = self.selected_top_range();
        !self.blocks[range.clone()].is_empty()
            && self.blocks[range].iter().all(|b| b.list_kind() == Some(kind))
    }

    fn uniform_marks(&self, pred: impl Fn(&Marks) -> bool) -> bool {
        if self.selection.is_caret() {
            return pred(&self.marks_at_caret());
        }
        let (start, end) = self.selection.ordered();
        let mut any = false;
        let mut all = true;
        visit_leaves(&self.blocks, &mut |i, block| {
            if i < start.block || i > end.block {
                return;
            }
            if let Block::Paragraph { runs, .. } | Block::Heading { runs, .. } = block {
                let len = block.text().len();
                let from = if i == start.block { start.offset } else { 0 };
                let to = if i == end.block { end.offset } else { len };
                let mut pos = 0;
                for run in runs {
                    let run_end = pos + run.text.len();
                    if run_end.min(to) > pos.max(from) {
                        any = true;
                        if !pred(&run.marks) {
                            all = false;
                        }
                    }
                    pos = run_end;
                }
            }
        });
        any && all
    }

    fn all_selected_leaves(&self, pred: impl Fn(&Block) -> bool) -> bool {
        let (start, end) = self.selection.ordered();
        let mut any = false;
        let mut all = true;
        visit_leaves(&self.blocks, &mut |i, block| {
            if i >= start.block && i <= end.block {
                any = true;
                if !pred(block) {
                    all = false;
                }
            }
        });
        any && all
    }

    /// Range of top-level block indices whose leaves intersect the
    /// selection.
    pub(crate) fn selected_top_range(&self) -> std::ops::Range<usize> {
        let (start, end) = self.selection.ordered();
        let mut first = None;
        let mut last = 0;
        let mut next_leaf = 0;
        for (top, block) in self.blocks.iter().enumerate() {
            let leaves = count_leaves(std::slice::from_ref(block));
            let span = next_leaf..next_leaf + leaves;
            if span.start <= end.block && start.block < span.end {
                first.get_or_insert(top);
                last = top;
            }
            next_leaf = span.end;
        }
        match first {
            Some(first) => first..last + 1,
            None => 0..0,
        }
    }

    // ============ Normalization ============

    /// Restore the structural invariants after a mutation: prune empty
    /// list items and lists, coalesce runs, keep at least one block.
    pub(crate) fn normalize(&mut self) {
        prune_blocks(&mut self.blocks);
        if self.blocks.is_empty() {
            self.blocks.push(Block::empty_paragraph());
        }
        self.selection = self.clamp_selection(self.selection);
    }

    fn clamp_selection(&self, selection: Selection) -> Selection {
        Selection {
            anchor: self.clamp_position(selection.anchor),
            head: self.clamp_position(selection.head),
        }
    }

    fn clamp_position(&self, pos: Position) -> Position {
        let block = pos.block.min(self.leaf_count() - 1);
        let text = self.leaf_text(block).unwrap_or_default();
        let mut offset = pos.offset.min(text.len());
        while offset > 0 && !text.is_char_boundary(offset) {
            offset -= 1;
        }
        Position::new(block, offset)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Visit leaves (paragraphs/headings) in document order with their
/// flat leaf index.
pub(crate) fn visit_leaves<'a>(blocks: &'a [Block], f: &mut impl FnMut(usize, &'a Block)) {
    fn walk<'a>(blocks: &'a [Block], next: &mut usize, f: &mut impl FnMut(usize, &'a Block)) {
        for block in blocks {
            match block {
                Block::Paragraph { .. } | Block::Heading { .. } => {
                    f(*next, block);
                    *next += 1;
                }
                Block::BulletList { items } | Block::OrderedList { items } => {
                    for item in items {
                        walk(&item.blocks, next, f);
                    }
                }
            }
        }
    }
    let mut next = 0;
    walk(blocks, &mut next, f);
}

pub(crate) fn visit_leaves_mut(blocks: &mut [Block], f: &mut impl FnMut(usize, &mut Block)) {
    fn walk(blocks: &mut [Block], next: &mut usize, f: &mut impl FnMut(usize, &mut Block)) {
        for block in blocks {
            match block {
                Block::Paragraph { .. } | Block::Heading { .. } => {
                    f(*next, block);
                    *next += 1;
                }
                Block::BulletList { items } | Block::OrderedList { items } => {
                    for item in items {
                        walk(&mut item.blocks, next, f);
                    }
                }
            }
        }
    }
    let mut next = 0;
    walk(blocks, &mut next, f);
}

pub(crate) fn count_leaves(blocks: &[Block]) -> usize {
    let mut count = 0;
    visit_leaves(blocks, &mut |_, _| count += 1);
    count
}

fn prune_blocks(blocks: &mut Vec<Block>) {
    blocks.retain_mut(|block| match block {
        Block::Paragraph { runs, .. } | Block::Heading { runs, .. } => {
            coalesce_runs(runs);
            true
        }
        Block::BulletList { items } | Block::OrderedList { items } => {
            items.retain_mut(|item| {
                prune_blocks(&mut item.blocks);
                !item.blocks.is_empty()
            });
            !items.is_empty()
        }
    });
}

/// Build a single-paragraph document from plain text. Convenience for
/// tests and frontends.
pub fn paragraph_doc(text: &str) -> Document {
    let mut doc = Document::new();
    doc.blocks = vec![Block::paragraph(vec![TextRun::plain(text)])];
    doc.select_all();
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::nodes::ListItem;
    use pretty_assertions::assert_eq;

    // ============ Invariant tests ============

    #[test]
    fn test_new_document_is_single_empty_paragraph() {
        let doc = Document::new();

        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.blocks()[0], Block::empty_paragraph());
        assert_eq!(doc.leaf_count(), 1);
        assert_eq!(doc.version(), 0);
        assert_eq!(doc.selection(), Selection::caret(Position::new(0, 0)));
    }

    #[test]
    fn test_normalize_restores_nonempty_invariant() {
        let mut doc = Document::new();
        doc.blocks.clear();
        doc.normalize();

        assert_eq!(doc.blocks().len(), 1);
        assert!(doc.blocks()[0].is_leaf());
    }

    #[test]
    fn test_normalize_prunes_empty_lists() {
        let mut doc = Document::new();
        doc.blocks = vec![
            Block::BulletList { items: vec![] },
            Block::paragraph(vec![TextRun::plain("kept")]),
            Block::OrderedList {
                items: vec![ListItem::new(vec![])],
            },
        ];
        doc.normalize();

        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.leaf_text(0).unwrap(), "kept");
    }

    // ============ Leaf traversal tests ============

    #[test]
    fn test_leaf_indices_cover_nested_list_items() {
        let mut doc = Document::new();
        doc.blocks = vec![
            Block::paragraph(vec![TextRun::plain("first")]),
            Block::BulletList {
                items: vec![
                    ListItem::new(vec![Block::paragraph(vec![TextRun::plain("second")])]),
                    ListItem::new(vec![Block::paragraph(vec![TextRun::plain("third")])]),
                ],
            },
            Block::heading(2, vec![TextRun::plain("fourth")]),
        ];

        assert_eq!(doc.leaf_count(), 4);
        assert_eq!(doc.leaf_text(1).unwrap(), "second");
        assert_eq!(doc.leaf_text(3).unwrap(), "fourth");
    }

    #[test]
    fn test_selected_top_range_spans_containers() {
        let mut doc = Document::new();
        doc.blocks = vec![
            Block::paragraph(vec![TextRun::plain("a")]),
            Block::BulletList {
                items: vec![
                    ListItem::new(vec![Block::paragraph(vec![TextRun::plain("b")])]),
                    ListItem::new(vec![Block::paragraph(vec![TextRun::plain("c")])]),
                ],
            },
            Block::paragraph(vec![TextRun::plain("d")]),
        ];

        // Leaves 1..=2 live inside the list (top block 1).
        doc.set_selection(Selection::new(Position::new(1, 0), Position::new(2, 1)));
        assert_eq!(doc.selected_top_range(), 1..2);

        doc.set_selection(Selection::new(Position::new(0, 0), Position::new(3, 0)));
        assert_eq!(doc.selected_top_range(), 0..3);
    }

    // ============ Selection clamping tests ============

    #[test]
    fn test_set_selection_clamps_out_of_range() {
        let mut doc = paragraph_doc("hello");
        doc.set_selection(Selection::new(Position::new(5, 99), Position::new(0, 2)));

        let sel = doc.selection();
        assert_eq!(sel.anchor, Position::new(0, 5));
        assert_eq!(sel.head, Position::new(0, 2));
    }

    #[test]
    fn test_set_selection_snaps_to_char_boundary() {
        let mut doc = paragraph_doc("héllo");
        // 'é' occupies bytes 1..3; offset 2 is inside it.
        doc.set_selection(Selection::caret(Position::new(0, 2)));

        assert_eq!(doc.selection().head.offset, 1);
    }

    #[test]
    fn test_ordered_swaps_reversed_endpoints() {
        let sel = Selection::new(Position::new(1, 3), Position::new(0, 7));
        let (start, end) = sel.ordered();

        assert_eq!(start, Position::new(0, 7));
        assert_eq!(end, Position::new(1, 3));
    }
}
