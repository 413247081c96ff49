use crate::editing::document::{Document, Position, Selection};
use crate::editing::nodes::{
    coalesce_runs, edit_marks_in_range, slice_runs, Align, Block, ListItem, ListKind, MarkKind,
    Marks, TextRun,
};

/// Commands that can be applied to the document.
///
/// A closed set: every mutation the editor supports is one of these
/// variants, dispatched through [`Document::apply`]. All commands
/// operate relative to the current selection and degrade to no-ops on
/// degenerate input instead of raising errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Insert text at the caret, replacing the selection if non-empty.
    InsertText { text: String },
    /// Delete the selection, or the character before the caret.
    DeleteBackward,
    /// Split the caret's block in two.
    SplitBlock,
    /// Toggle bold/italic/underline over the selection.
    ToggleMark { mark: MarkKind },
    /// Toggle heading of the given level (1..=3); re-applying the same
    /// level reverts to paragraph.
    ToggleHeading { level: u8 },
    /// Convert selected blocks back to paragraphs.
    SetParagraph,
    /// Set block alignment on selected paragraphs and headings.
    SetTextAlign { align: Align },
    /// Wrap/unwrap selected blocks in a list of the given kind.
    ToggleList { kind: ListKind },
    /// Attach a link over the selection. `None` or an empty string is a
    /// no-op.
    SetLink { href: Option<String> },
}

/// Outcome of a command before the document normalizes and versions it.
pub(crate) struct Applied {
    pub changed: bool,
    pub new_selection: Selection,
}

fn unchanged(doc: &Document) -> Applied {
    Applied {
        changed: false,
        new_selection: doc.selection(),
    }
}

pub(crate) fn apply_command(doc: &mut Document, cmd: &Cmd) -> Applied {
    match cmd {
        Cmd::InsertText { text } => insert_text(doc, text),
        Cmd::DeleteBackward => delete_backward(doc),
        Cmd::SplitBlock => split_block(doc),
        Cmd::ToggleMark { mark } => toggle_mark(doc, *mark),
        Cmd::ToggleHeading { level } => toggle_heading(doc, *level),
        Cmd::SetParagraph => set_paragraph(doc),
        Cmd::SetTextAlign { align } => set_text_align(doc, *align),
        Cmd::ToggleList { kind } => toggle_list(doc, *kind),
        Cmd::SetLink { href } => set_link(doc, href.as_deref()),
    }
}

// ============ Inline marks ============

fn toggle_mark(doc: &mut Document, mark: MarkKind) -> Applied {
    if doc.selection().is_caret() {
        return unchanged(doc);
    }
    // Uniform presence removes the mark everywhere; anything less adds
    // it everywhere, so a second application restores the original.
    let enable = !doc.is_mark_active(mark);
    let mut changed = false;
    doc.for_selected_leaves_mut(&mut |block, range| {
        if let Some(runs) = block.runs_mut() {
            changed |= edit_marks_in_range(runs, range, |marks| marks.set(mark, enable));
        }
    });
    Applied {
        changed,
        new_selection: doc.selection(),
    }
}

fn set_link(doc: &mut Document, href: Option<&str>) -> Applied {
    let Some(href) = href.filter(|href| !href.is_empty()) else {
        return unchanged(doc);
    };
    if doc.selection().is_caret() {
        return unchanged(doc);
    }
    let mut changed = false;
    doc.for_selected_leaves_mut(&mut |block, range| {
        if let Some(runs) = block.runs_mut() {
            changed |= edit_marks_in_range(runs, range, |marks| {
                marks.link = Some(href.to_string());
            });
        }
    });
    Applied {
        changed,
        new_selection: doc.selection(),
    }
}

// ============ Block kind and attributes ============

fn toggle_heading(doc: &mut Document, level: u8) -> Applied {
    if !(1..=3).contains(&level) {
        return unchanged(doc);
    }
    let revert = doc.is_heading_active(level);
    let mut changed = false;
    doc.for_selected_leaves_mut(&mut |block, _| match block {
        Block::Paragraph { runs, align } if !revert => {
            *block = Block::Heading {
                level,
                runs: std::mem::take(runs),
                align: *align,
            };
            changed = true;
        }
        Block::Heading {
            level: current,
            runs,
            align,
        } => {
            if revert {
                *block = Block::Paragraph {
                    runs: std::mem::take(runs),
                    align: *align,
                };
                changed = true;
            } else if *current != level {
                *current = level;
                changed = true;
            }
        }
        _ => {}
    });
    Applied {
        changed,
        new_selection: doc.selection(),
    }
}

fn set_paragraph(doc: &mut Document) -> Applied {
    let mut changed = false;
    doc.for_selected_leaves_mut(&mut |block, _| {
        if let Block::Heading { runs, align, .. } = block {
            *block = Block::Paragraph {
                runs: std::mem::take(runs),
                align: *align,
            };
            changed = true;
        }
    });
    Applied {
        changed,
        new_selection: doc.selection(),
    }
}

fn set_text_align(doc: &mut Document, align: Align) -> Applied {
    let mut changed = false;
    doc.for_selected_leaves_mut(&mut |block, _| match block {
        Block::Paragraph { align: current, .. } | Block::Heading { align: current, .. } => {
            if *current != align {
                *current = align;
                changed = true;
            }
        }
        _ => {}
    });
    Applied {
        changed,
        new_selection: doc.selection(),
    }
}

// ============ Lists ============

fn toggle_list(doc: &mut Document, kind: ListKind) -> Applied {
    let range = doc.selected_top_range();
    if range.is_empty() {
        return unchanged(doc);
    }
    let selected = &doc.blocks[range.clone()];
    if selected.iter().all(|b| b.list_kind() == Some(kind)) {
        // Unwrap: hoist the item content back to the top level. Leaf
        // order is preserved, so the selection stays valid.
        let removed: Vec<Block> = doc.blocks.splice(range.clone(), std::iter::empty()).collect();
        let mut unwrapped = Vec::new();
        for block in removed {
            match block {
                Block::BulletList { items } | Block::OrderedList { items } => {
                    for item in items {
                        unwrapped.extend(item.blocks);
                    }
                }
                other => unwrapped.push(other),
            }
        }
        doc.blocks.splice(range.start..range.start, unwrapped);
    } else if selected.iter().all(|b| b.is_list()) {
        // Re-tag containers of the other kind without touching items.
        for block in &mut doc.blocks[range] {
            let items = match block {
                Block::BulletList { items } | Block::OrderedList { items } => {
                    std::mem::take(items)
                }
                _ => continue,
            };
            *block = match kind {
                ListKind::Bullet => Block::BulletList { items },
                ListKind::Ordered => Block::OrderedList { items },
            };
        }
    } else {
        // Wrap: each selected block becomes an item; items of lists
        // already in the selection are merged in.
        let removed: Vec<Block> = doc.blocks.splice(range.clone(), std::iter::empty()).collect();
        let mut items = Vec::new();
        for block in removed {
            match block {
                Block::BulletList { items: list_items }
                | Block::OrderedList { items: list_items } => items.extend(list_items),
                leaf => items.push(ListItem::new(vec![leaf])),
            }
        }
        let list = match kind {
            ListKind::Bullet => Block::BulletList { items },
            ListKind::Ordered => Block::OrderedList { items },
        };
        doc.blocks.insert(range.start, list);
    }
    Applied {
        changed: true,
        new_selection: doc.selection(),
    }
}

// ============ Text editing ============

fn insert_text(doc: &mut Document, text: &str) -> Applied {
    if text.is_empty() {
        return unchanged(doc);
    }
    delete_selection(doc);
    let caret = doc.selection().ordered().0;
    let marks = doc.marks_at_caret();
    doc.with_leaf_mut(caret.block, |block| {
        if let Some(runs) = block.runs_mut() {
            insert_into_runs(runs, caret.offset, text, marks);
        }
    });
    Applied {
        changed: true,
        new_selection: Selection::caret(Position::new(caret.block, caret.offset + text.len())),
    }
}

fn delete_backward(doc: &mut Document) -> Applied {
    if !doc.selection().is_caret() {
        let changed = delete_selection(doc);
        return Applied {
            changed,
            new_selection: doc.selection(),
        };
    }
    let caret = doc.selection().head;
    if caret.offset == 0 {
        // Block joining is out of scope; the caret stays put.
        return unchanged(doc);
    }
    let text = doc.leaf_text(caret.block).unwrap_or_default();
    let mut prev = caret.offset - 1;
    while prev > 0 && !text.is_char_boundary(prev) {
        prev -= 1;
    }
    doc.with_leaf_mut(caret.block, |block| {
        if let Some(runs) = block.runs_mut() {
            remove_range_in_runs(runs, prev..caret.offset);
        }
    });
    Applied {
        changed: true,
        new_selection: Selection::caret(Position::new(caret.block, prev)),
    }
}

fn split_block(doc: &mut Document) -> Applied {
    delete_selection(doc);
    let caret = doc.selection().ordered().0;
    let blocks = std::mem::take(&mut doc.blocks);
    let mut next = 0;
    doc.blocks = rebuild_split(blocks, &mut next, caret);
    Applied {
        changed: true,
        new_selection: Selection::caret(Position::new(caret.block + 1, 0)),
    }
}

/// Remove the selected range, merging the remainder of the last
/// selected leaf into the first. Returns whether anything was removed;
/// leaves the caret at the selection start.
fn delete_selection(doc: &mut Document) -> bool {
    let (start, end) = doc.selection().ordered();
    if start == end {
        return false;
    }
    if start.block == end.block {
        doc.with_leaf_mut(start.block, |block| {
            if let Some(runs) = block.runs_mut() {
                remove_range_in_runs(runs, start.offset..end.offset);
            }
        });
    } else {
        let mut tail = Vec::new();
        doc.with_leaf_mut(end.block, |block| {
            if let Some(runs) = block.runs_mut() {
                let total = runs_len(runs);
                tail = slice_runs(runs, end.offset..total);
            }
        });
        let blocks = std::mem::take(&mut doc.blocks);
        let mut next = 0;
        doc.blocks = rebuild_delete(blocks, &mut next, start, end, &mut Some(tail));
    }
    doc.selection = Selection::caret(start);
    true
}

fn runs_len(runs: &[TextRun]) -> usize {
    runs.iter().map(|run| run.text.len()).sum()
}

fn insert_into_runs(runs: &mut Vec<TextRun>, offset: usize, text: &str, marks: Marks) {
    if runs.is_empty() {
        runs.push(TextRun::with_marks(text, marks));
        return;
    }
    let mut pos = 0;
    for run in runs.iter_mut() {
        let end = pos + run.text.len();
        // At a run boundary the preceding run wins, so typing extends
        // the formatting of the character before the caret.
        if offset <= end {
            run.text.insert_str(offset - pos, text);
            return;
        }
        pos = end;
    }
    if let Some(last) = runs.last_mut() {
        last.text.push_str(text);
    }
}

fn remove_range_in_runs(runs: &mut Vec<TextRun>, range: std::ops::Range<usize>) {
    let total = runs_len(runs);
    let mut kept = slice_runs(runs, 0..range.start);
    kept.extend(slice_runs(runs, range.end..total));
    coalesce_runs(&mut kept);
    *runs = kept;
}

/// Rebuild the tree with the leaf span (start, end] removed and the
/// carried tail runs appended to the start leaf.
fn rebuild_delete(
    blocks: Vec<Block>,
    next: &mut usize,
    start: Position,
    end: Position,
    tail: &mut Option<Vec<TextRun>>,
) -> Vec<Block> {
    let mut out = Vec::new();
    for mut block in blocks {
        if block.is_leaf() {
            let index = *next;
            *next += 1;
            if index == start.block {
                if let Some(runs) = block.runs_mut() {
                    let mut kept = slice_runs(runs, 0..start.offset);
                    kept.extend(tail.take().unwrap_or_default());
                    coalesce_runs(&mut kept);
                    *runs = kept;
                }
                out.push(block);
            } else if index > start.block && index <= end.block {
                // Dropped with the selection.
            } else {
                out.push(block);
            }
        } else {
            match block {
                Block::BulletList { items } => {
                    let items = rebuild_delete_items(items, next, start, end, tail);
                    if !items.is_empty() {
                        out.push(Block::BulletList { items });
                    }
                }
                Block::OrderedList { items } => {
                    let items = rebuild_delete_items(items, next, start, end, tail);
                    if !items.is_empty() {
                        out.push(Block::OrderedList { items });
                    }
                }
                _ => {}
            }
        }
    }
    out
}

fn rebuild_delete_items(
    items: Vec<ListItem>,
    next: &mut usize,
    start: Position,
    end: Position,
    tail: &mut Option<Vec<TextRun>>,
) -> Vec<ListItem> {
    let mut out = Vec::new();
    for item in items {
        let blocks = rebuild_delete(item.blocks, next, start, end, tail);
        if !blocks.is_empty() {
            out.push(ListItem::new(blocks));
        }
    }
    out
}

/// Rebuild the tree with the caret's leaf split in two at the caret.
/// Splitting a heading at its very end yields a fresh paragraph, the
/// editor's behavior when pressing Enter after a heading.
fn rebuild_split(blocks: Vec<Block>, next: &mut usize, caret: Position) -> Vec<Block> {
    let mut out = Vec::new();
    for block in blocks {
        match block {
            Block::Paragraph { runs, align } => {
                let index = *next;
                *next += 1;
                if index == caret.block {
                    let total = runs_len(&runs);
                    out.push(Block::Paragraph {
                        runs: slice_runs(&runs, 0..caret.offset),
                        align,
                    });
                    out.push(Block::Paragraph {
                        runs: slice_runs(&runs, caret.offset..total),
                        align,
                    });
                } else {
                    out.push(Block::Paragraph { runs, align });
                }
            }
            Block::Heading { level, runs, align } => {
                let index = *next;
                *next += 1;
                if index == caret.block {
                    let total = runs_len(&runs);
                    out.push(Block::Heading {
                        level,
                        runs: slice_runs(&runs, 0..caret.offset),
                        align,
                    });
                    if caret.offset >= total {
                        out.push(Block::Paragraph { runs: Vec::new(), align });
                    } else {
                        out.push(Block::Heading {
                            level,
                            runs: slice_runs(&runs, caret.offset..total),
                            align,
                        });
                    }
                } else {
                    out.push(Block::Heading { level, runs, align });
                }
            }
            Block::BulletList { items } => {
                out.push(Block::BulletList {
                    items: rebuild_split_items(items, next, caret),
                });
            }
            Block::OrderedList { items } => {
                out.push(Block::OrderedList {
                    items: rebuild_split_items(items, next, caret),
                });
            }
        }
    }
    out
}

fn rebuild_split_items(items: Vec<ListItem>, next: &mut usize, caret: Position) -> Vec<ListItem> {
    items
        .into_iter()
        .map(|item| ListItem::new(rebuild_split(item.blocks, next, caret)))
        .collect()
}
