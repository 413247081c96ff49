/// Block-level text alignment. Only paragraphs and headings carry
/// alignment; list containers inherit from their item content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// CSS keyword for the serializer.
    pub fn as_css(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim() {
            "left" => Some(Align::Left),
            "center" => Some(Align::Center),
            "right" => Some(Align::Right),
            _ => None,
        }
    }
}

/// List container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// Character-level marks that can be toggled from the toolbar.
/// Links are handled separately because they carry an href.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
}

/// The set of marks active on a text run. A set, not a stack: any
/// combination may be active at once and no ordering is significant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub link: Option<String>,
}

impl Marks {
    pub fn has(&self, kind: MarkKind) -> bool {
        match kind {
            MarkKind::Bold => self.bold,
            MarkKind::Italic => self.italic,
            MarkKind::Underline => self.underline,
        }
    }

    pub fn set(&mut self, kind: MarkKind, on: bool) {
        match kind {
            MarkKind::Bold => self.bold = on,
            MarkKind::Italic => self.italic = on,
            MarkKind::Underline => self.underline = on,
        }
    }

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline && self.link.is_none()
    }
}

/// A contiguous run of text sharing one mark set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: Marks,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn with_marks(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }
}

/// One list item. Items hold child blocks so nested lists round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub blocks: Vec<Block>,
}

impl ListItem {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

/// A structural document node.
///
/// Paragraphs and headings are the leaves that carry text runs; lists
/// are containers whose items in turn hold blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph {
        runs: Vec<TextRun>,
        align: Align,
    },
    Heading {
        level: u8,
        runs: Vec<TextRun>,
        align: Align,
    },
    BulletList {
        items: Vec<ListItem>,
    },
    OrderedList {
        items: Vec<ListItem>,
    },
}

impl Block {
    pub fn empty_paragraph() -> Self {
        Block::Paragraph {
            runs: Vec::new(),
            align: Align::Left,
        }
    }

    pub fn paragraph(runs: Vec<TextRun>) -> Self {
        Block::Paragraph {
            runs,
            align: Align::Left,
        }
    }

    pub fn heading(level: u8, runs: Vec<TextRun>) -> Self {
        Block::Heading {
            level,
            runs,
            align: Align::Left,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Block::Paragraph { .. } | Block::Heading { .. })
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Block::BulletList { .. } | Block::OrderedList { .. })
    }

    pub fn list_kind(&self) -> Option<ListKind> {
        match self {
            Block::BulletList { .. } => Some(ListKind::Bullet),
            Block::OrderedList { .. } => Some(ListKind::Ordered),
            _ => None,
        }
    }

    /// The runs of a leaf block, `None` for containers.
    pub fn runs(&self) -> Option<&[TextRun]> {
        match self {
            Block::Paragraph { runs, .. } | Block::Heading { runs, .. } => Some(runs),
            _ => None,
        }
    }

    pub(crate) fn runs_mut(&mut self) -> Option<&mut Vec<TextRun>> {
        match self {
            Block::Paragraph { runs, .. } | Block::Heading { runs, .. } => Some(runs),
            _ => None,
        }
    }

    /// The concatenated run text of a leaf block. Empty for containers.
    pub fn text(&self) -> String {
        match self {
            Block::Paragraph { runs, .. } | Block::Heading { runs, .. } => {
                runs.iter().map(|r| r.text.as_str()).collect()
            }
            _ => String::new(),
        }
    }
}

/// Coalesce adjacent runs with identical marks and drop empty runs, so
/// that equal formatting states compare structurally equal.
pub(crate) fn coalesce_runs(runs: &mut Vec<TextRun>) {
    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs.drain(..) {
        if run.text.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.marks == run.marks => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }
    *runs = merged;
}

/// Copy the runs overlapping `range` (byte offsets into the concatenated
/// text), splitting at the boundaries.
pub(crate) fn slice_runs(runs: &[TextRun], range: std::ops::Range<usize>) -> Vec<TextRun> {
    let mut out = Vec::new();
    let mut pos = 0;
    for run in runs {
        let start = range.start.max(pos);
        let end = range.end.min(pos + run.text.len());
        if start < end {
            out.push(TextRun::with_marks(
                run.text[start - pos..end - pos].to_string(),
                run.marks.clone(),
            ));
        }
        pos += run.text.len();
    }
    out
}

/// Apply `edit` to the marks of every run segment inside `range`,
/// splitting runs at the boundaries. Returns whether any mark set
/// actually changed.
pub(crate) fn edit_marks_in_range(
    runs: &mut Vec<TextRun>,
    range: std::ops::Range<usize>,
    edit: impl Fn(&mut Marks),
) -> bool {
    let mut out: Vec<TextRun> = Vec::with_capacity(runs.len() + 2);
    let mut changed = false;
    let mut pos = 0;
    for run in runs.drain(..) {
        let len = run.text.len();
        let start = range.start.max(pos);
        let end = range.end.min(pos + len);
        if start >= end {
            out.push(run);
        } else {
            let head = &run.text[..start - pos];
            let body = &run.text[start - pos..end - pos];
            let tail = &run.text[end - pos..];
            if !head.is_empty() {
                out.push(TextRun::with_marks(head.to_string(), run.marks.clone()));
            }
            let mut marks = run.marks.clone();
            edit(&mut marks);
            if marks != run.marks {
                changed = true;
            }
            out.push(TextRun::with_marks(body.to_string(), marks));
            if !tail.is_empty() {
                out.push(TextRun::with_marks(tail.to_string(), run.marks.clone()));
            }
        }
        pos += len;
    }
    *runs = out;
    coalesce_runs(runs);
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bold() -> Marks {
        Marks {
            bold: true,
            ..Marks::default()
        }
    }

    // ============ Run coalescing tests ============

    #[test]
    fn test_coalesce_merges_equal_marks() {
        let mut runs = vec![
            TextRun::plain("Hello "),
            TextRun::plain("world"),
            TextRun::with_marks("!", bold()),
        ];
        coalesce_runs(&mut runs);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Hello world");
        assert_eq!(runs[1].text, "!");
    }

    #[test]
    fn test_coalesce_drops_empty_runs() {
        let mut runs = vec![
            TextRun::plain(""),
            TextRun::plain("text"),
            TextRun::with_marks("", bold()),
        ];
        coalesce_runs(&mut runs);

        assert_eq!(runs, vec![TextRun::plain("text")]);
    }

    // ============ Run slicing tests ============

    #[test]
    fn test_slice_runs_splits_at_boundaries() {
        let runs = vec![TextRun::plain("Hello "), TextRun::with_marks("world", bold())];

        let sliced = slice_runs(&runs, 3..8);
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced[0].text, "lo ");
        assert_eq!(sliced[1].text, "wo");
        assert!(sliced[1].marks.bold);
    }

    #[test]
    fn test_slice_runs_empty_range() {
        let runs = vec![TextRun::plain("Hello")];
        assert!(slice_runs(&runs, 2..2).is_empty());
    }

    // ============ Mark editing tests ============

    #[test]
    fn test_edit_marks_splits_run() {
        let mut runs = vec![TextRun::plain("Hello world")];
        let changed = edit_marks_in_range(&mut runs, 0..5, |m| m.bold = true);

        assert!(changed);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Hello");
        assert!(runs[0].marks.bold);
        assert_eq!(runs[1].text, " world");
        assert!(!runs[1].marks.bold);
    }

    #[test]
    fn test_edit_marks_reports_no_change() {
        let mut runs = vec![TextRun::with_marks("Hello", bold())];
        let changed = edit_marks_in_range(&mut runs, 0..5, |m| m.bold = true);

        assert!(!changed);
        assert_eq!(runs.len(), 1);
    }

    #[test]
    fn test_edit_marks_round_trip_restores_structure() {
        let original = vec![TextRun::plain("Hello world")];
        let mut runs = original.clone();

        edit_marks_in_range(&mut runs, 2..7, |m| m.bold = true);
        assert_eq!(runs.len(), 3);
        edit_marks_in_range(&mut runs, 2..7, |m| m.bold = false);

        assert_eq!(runs, original);
    }
}
