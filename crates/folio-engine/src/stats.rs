//! Word and character statistics derived from the document.
//!
//! Counts are computed over the *text projection*: the flattened plain
//! text of the document, leaf texts concatenated in document order with
//! a single space at each block boundary.

use crate::editing::document::visit_leaves;
use crate::editing::Document;
use crate::notify::{ChangeSubscriber, NotifyPhase};

/// Current document statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocStats {
    pub word_count: usize,
    pub char_count: usize,
}

/// The flattened plain-text reading of the document.
pub fn text_projection(doc: &Document) -> String {
    let mut out = String::new();
    visit_leaves(doc.blocks(), &mut |index, block| {
        if index > 0 {
            out.push(' ');
        }
        out.push_str(&block.text());
    });
    out
}

/// Compute stats for a document from scratch.
pub fn compute(doc: &Document) -> DocStats {
    let projection = text_projection(doc);
    DocStats {
        word_count: projection.split_whitespace().count(),
        char_count: projection.chars().count(),
    }
}

/// Keeps the current stats in sync with the document, recomputing on
/// every change notification.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    current: DocStats,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recompute(&mut self, doc: &Document) {
        self.current = compute(doc);
    }

    pub fn current(&self) -> DocStats {
        self.current
    }
}

impl ChangeSubscriber for StatsAggregator {
    fn phase(&self) -> NotifyPhase {
        NotifyPhase::Stats
    }

    fn document_changed(&mut self, doc: &Document) {
        self.recompute(doc);
    }
}
