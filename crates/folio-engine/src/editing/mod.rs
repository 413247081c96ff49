/*!
 * Document model and command dispatch.
 *
 * The document is a typed block tree: paragraphs and headings carry
 * text runs with mark sets, lists carry items that in turn carry
 * blocks. All mutation flows through a closed [`Cmd`] enum applied
 * with [`Document::apply`], which returns a [`Patch`] describing what
 * happened. Degenerate input never raises an error — commands that
 * cannot apply return the document unchanged.
 *
 * ## Usage pattern
 *
 * ```rust
 * use folio_engine::editing::{Cmd, Document, MarkKind, Position, Selection};
 *
 * // 1. Seed a document from a serialized fragment
 * let mut doc = Document::from_html("<p>Hello world</p>").unwrap();
 *
 * // 2. Select a range and apply commands
 * doc.set_selection(Selection::new(Position::new(0, 0), Position::new(0, 5)));
 * let patch = doc.apply(Cmd::ToggleMark { mark: MarkKind::Bold });
 * assert!(patch.changed);
 *
 * // 3. Serialize back out
 * assert_eq!(doc.to_html(), "<p><strong>Hello</strong> world</p>");
 * ```
 */

pub mod commands;
pub mod document;
pub mod nodes;
pub mod patch;

pub use commands::Cmd;
pub use document::{Document, Position, Selection};
pub use nodes::{Align, Block, ListItem, ListKind, MarkKind, Marks, TextRun};
pub use patch::Patch;
