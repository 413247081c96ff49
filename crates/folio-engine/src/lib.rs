pub mod editing;
pub mod export;
pub mod html;
pub mod layout;
pub mod notify;
pub mod session;
pub mod stats;

// Re-export key types for easier usage
pub use editing::{
    Align, Block, Cmd, Document, ListItem, ListKind, MarkKind, Marks, Patch, Position, Selection,
    TextRun,
};
pub use export::{export_document, ExportError, EXPORT_FILE_NAME, EXPORT_MIME_TYPE};
pub use html::HtmlError;
pub use layout::{
    available_height, page_count_for_height, MeasureHeight, Page, PaginationEngine, Paginator,
    PAGE_HEIGHT, PAGE_PADDING, PAGE_WIDTH,
};
pub use notify::{ChangeNotifier, ChangeSubscriber, NotifyPhase};
pub use session::{EditorSession, PromptText};
pub use stats::{text_projection, DocStats, StatsAggregator};
