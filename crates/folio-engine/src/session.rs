//! The editor session: an explicit value owned by the frontend.
//!
//! The session wires the document to its derived computations (stats,
//! then pagination — the notifier enforces that order) and holds the
//! two host capabilities the core needs: measuring rendered content
//! height and prompting for text. The core never touches a rendering
//! surface; tests substitute deterministic fakes for both capabilities.

use std::cell::RefCell;
use std::rc::Rc;

use crate::editing::{Cmd, Document, Patch, Selection};
use crate::html::HtmlError;
use crate::layout::{MeasureHeight, Page, PaginationEngine};
use crate::notify::ChangeNotifier;
use crate::stats::{DocStats, StatsAggregator};

/// Capability: synchronously ask the user for a line of text, `None`
/// on cancel.
pub type PromptText = Box<dyn FnMut(&str) -> Option<String>>;

pub struct EditorSession {
    document: Document,
    notifier: ChangeNotifier,
    stats: Rc<RefCell<StatsAggregator>>,
    layout: Rc<RefCell<PaginationEngine>>,
    prompt: PromptText,
}

impl EditorSession {
    /// Start a session from a serialized fragment, computing initial
    /// stats and pagination before returning.
    pub fn new(
        initial_html: &str,
        measure: MeasureHeight,
        prompt: PromptText,
    ) -> Result<Self, HtmlError> {
        let document = Document::from_html(initial_html)?;
        let stats = Rc::new(RefCell::new(StatsAggregator::new()));
        let layout = Rc::new(RefCell::new(PaginationEngine::new(measure)));

        let mut notifier = ChangeNotifier::new();
        notifier.subscribe(stats.clone());
        notifier.subscribe(layout.clone());
        notifier.notify(&document);

        Ok(Self {
            document,
            notifier,
            stats,
            layout,
            prompt,
        })
    }

    /// Apply a command. A committed mutation fires the change notifier
    /// exactly once, synchronously, before this returns; a no-op fires
    /// nothing.
    pub fn dispatch(&mut self, cmd: Cmd) -> Patch {
        let patch = self.document.apply(cmd);
        if patch.changed {
            self.notifier.notify(&self.document);
        }
        patch
    }

    /// Ask the host for a URL and link the selection to it. A
    /// cancelled or empty prompt leaves the document unchanged.
    pub fn insert_link_from_prompt(&mut self) -> Patch {
        let href = (self.prompt)("Enter URL:");
        self.dispatch(Cmd::SetLink { href })
    }

    /// Re-run pagination against a fresh measurement, e.g. after a
    /// viewport resize. Stats are untouched: the text did not change.
    pub fn handle_resize(&mut self) {
        self.layout.borrow_mut().recompute();
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.document.set_selection(selection);
    }

    pub fn stats(&self) -> DocStats {
        self.stats.borrow().current()
    }

    pub fn page_count(&self) -> usize {
        self.layout.borrow().page_count()
    }

    pub fn pages(&self) -> Vec<Page> {
        self.layout.borrow().pages().to_vec()
    }

    /// Serialize the current document to an HTML fragment.
    pub fn export_html(&self) -> String {
        self.document.to_html()
    }

    /// End the session. Subscribers and capabilities are released;
    /// the host drops its event subscriptions alongside.
    pub fn teardown(self) {}
}
