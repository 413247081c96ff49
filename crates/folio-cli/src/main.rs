use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use folio_config::Config;
use folio_engine::{
    export_document, Align, Block, Cmd, EditorSession, ListKind, MarkKind, Position, Selection,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block as Panel, Borders, Paragraph},
    Frame, Terminal,
};
use std::{cell::Cell, env, io::stdout, path::PathBuf, process, rc::Rc};

/// Seed fragment for a fresh editor.
const INITIAL_CONTENT: &str = "<p>Start typing your document here...</p>";

/// Layout units one rendered text row stands for when estimating
/// content height.
const LINE_HEIGHT: u32 = 24;

enum Mode {
    Edit,
    /// Collecting a link URL in the status line.
    LinkInput(String),
}

struct App {
    session: EditorSession,
    /// Content height reported by the last render; the session's
    /// measure capability reads this cell.
    measured: Rc<Cell<Option<u32>>>,
    export_path: PathBuf,
    mode: Mode,
    status: Option<String>,
}

impl App {
    fn new(export_path: PathBuf) -> Result<Self> {
        let measured = Rc::new(Cell::new(None));
        let reader = measured.clone();
        let session = EditorSession::new(
            INITIAL_CONTENT,
            Box::new(move || reader.get()),
            // Link URLs are collected through the status-line input
            // mode rather than a host prompt.
            Box::new(|_| None),
        )?;
        Ok(Self {
            session,
            measured,
            export_path,
            mode: Mode::Edit,
            status: None,
        })
    }

    fn dispatch(&mut self, cmd: Cmd) {
        self.status = None;
        self.session.dispatch(cmd);
    }

    fn move_caret(&mut self, forward: bool, extend: bool) {
        let doc = self.session.document();
        let sel = doc.selection();
        let mut head = sel.head;
        let text = doc.leaf_text(head.block).unwrap_or_default();
        if forward {
            if head.offset < text.len() {
                let mut next = head.offset + 1;
                while next < text.len() && !text.is_char_boundary(next) {
                    next += 1;
                }
                head.offset = next;
            } else if head.block + 1 < doc.leaf_count() {
                head = Position::new(head.block + 1, 0);
            }
        } else if head.offset > 0 {
            let mut prev = head.offset - 1;
            while prev > 0 && !text.is_char_boundary(prev) {
                prev -= 1;
            }
            head.offset = prev;
        } else if head.block > 0 {
            let block = head.block - 1;
            head = Position::new(block, doc.leaf_len(block).unwrap_or(0));
        }
        let anchor = if extend { sel.anchor } else { head };
        self.session.set_selection(Selection::new(anchor, head));
    }

    fn move_block(&mut self, down: bool, extend: bool) {
        let doc = self.session.document();
        let sel = doc.selection();
        let mut head = sel.head;
        if down && head.block + 1 < doc.leaf_count() {
            head = Position::new(head.block + 1, head.offset);
        } else if !down && head.block > 0 {
            head = Position::new(head.block - 1, head.offset);
        }
        let anchor = if extend { sel.anchor } else { head };
        // set_selection clamps the offset into the new block.
        self.session.set_selection(Selection::new(anchor, head));
    }

    fn export(&mut self) {
        match export_document(self.session.document(), &self.export_path) {
            Ok(path) => self.status = Some(format!("Exported {}", path.display())),
            Err(e) => self.status = Some(format!("Export failed: {e}")),
        }
    }
}

fn main() -> Result<()> {
    // Export directory from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let export_path = if args.len() == 2 {
        PathBuf::from(&args[1])
    } else if args.len() == 1 {
        match Config::load() {
            Ok(Some(config)) => config.export_path,
            Ok(None) => PathBuf::from("."),
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} [export-folder-path]", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [export-folder-path]", args[0]);
        process::exit(1);
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new(export_path)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal unconditionally, however the loop ended
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    <B as ratatui::backend::Backend>::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        match event::read()? {
            Event::Resize(_, _) => app.session.handle_resize(),
            Event::Key(key) => {
                if let Mode::LinkInput(buffer) = &mut app.mode {
                    match key.code {
                        KeyCode::Enter => {
                            let href = std::mem::take(buffer);
                            app.mode = Mode::Edit;
                            app.dispatch(Cmd::SetLink {
                                href: (!href.is_empty()).then_some(href),
                            });
                        }
                        KeyCode::Esc => app.mode = Mode::Edit,
                        KeyCode::Backspace => {
                            buffer.pop();
                        }
                        KeyCode::Char(c) => buffer.push(c),
                        _ => {}
                    }
                    continue;
                }

                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                let alt = key.modifiers.contains(KeyModifiers::ALT);
                let shift = key.modifiers.contains(KeyModifiers::SHIFT);
                match key.code {
                    KeyCode::Char('q') if ctrl => return Ok(()),
                    KeyCode::Char('b') if ctrl => app.dispatch(Cmd::ToggleMark {
                        mark: MarkKind::Bold,
                    }),
                    KeyCode::Char('e') if ctrl => app.dispatch(Cmd::ToggleMark {
                        mark: MarkKind::Italic,
                    }),
                    KeyCode::Char('u') if ctrl => app.dispatch(Cmd::ToggleMark {
                        mark: MarkKind::Underline,
                    }),
                    KeyCode::Char('k') if ctrl => {
                        app.mode = Mode::LinkInput(String::new());
                    }
                    KeyCode::Char('a') if ctrl => {
                        let doc = app.session.document();
                        let last = doc.leaf_count() - 1;
                        let end = doc.leaf_len(last).unwrap_or(0);
                        app.session.set_selection(Selection::new(
                            Position::new(0, 0),
                            Position::new(last, end),
                        ));
                    }
                    KeyCode::Char('s') if ctrl => app.export(),
                    KeyCode::Char(c @ '1'..='3') if alt => app.dispatch(Cmd::ToggleHeading {
                        level: c as u8 - b'0',
                    }),
                    KeyCode::Char('0') if alt => app.dispatch(Cmd::SetParagraph),
                    KeyCode::Char('b') if alt => app.dispatch(Cmd::ToggleList {
                        kind: ListKind::Bullet,
                    }),
                    KeyCode::Char('n') if alt => app.dispatch(Cmd::ToggleList {
                        kind: ListKind::Ordered,
                    }),
                    KeyCode::Char('l') if alt => app.dispatch(Cmd::SetTextAlign {
                        align: Align::Left,
                    }),
                    KeyCode::Char('c') if alt => app.dispatch(Cmd::SetTextAlign {
                        align: Align::Center,
                    }),
                    KeyCode::Char('r') if alt => app.dispatch(Cmd::SetTextAlign {
                        align: Align::Right,
                    }),
                    KeyCode::Left => app.move_caret(false, shift),
                    KeyCode::Right => app.move_caret(true, shift),
                    KeyCode::Up => app.move_block(false, shift),
                    KeyCode::Down => app.move_block(true, shift),
                    KeyCode::Enter => app.dispatch(Cmd::SplitBlock),
                    KeyCode::Backspace => app.dispatch(Cmd::DeleteBackward),
                    KeyCode::Char(c) if !ctrl && !alt => app.dispatch(Cmd::InsertText {
                        text: c.to_string(),
                    }),
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(toolbar(app), chunks[0]);
    render_pages(f, app, chunks[1]);
    f.render_widget(status_bar(app), chunks[2]);
}

fn toolbar(app: &App) -> Paragraph<'static> {
    let doc = app.session.document();
    let indicator = |label: &'static str, active: bool| {
        let style = if active {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        Span::styled(format!(" {label} "), style)
    };

    let spans = vec![
        indicator("B", doc.is_mark_active(MarkKind::Bold)),
        indicator("I", doc.is_mark_active(MarkKind::Italic)),
        indicator("U", doc.is_mark_active(MarkKind::Underline)),
        indicator("Link", doc.is_link_active()),
        Span::raw(" | "),
        indicator("H1", doc.is_heading_active(1)),
        indicator("H2", doc.is_heading_active(2)),
        indicator("H3", doc.is_heading_active(3)),
        Span::raw(" | "),
        indicator("•", doc.is_list_active(ListKind::Bullet)),
        indicator("1.", doc.is_list_active(ListKind::Ordered)),
        Span::raw(" | "),
        indicator("⟸", doc.is_align_active(Align::Left)),
        indicator("⟺", doc.is_align_active(Align::Center)),
        indicator("⟹", doc.is_align_active(Align::Right)),
    ];
    Paragraph::new(Line::from(spans))
}

fn render_pages(f: &mut Frame, app: &mut App, area: ratatui::layout::Rect) {
    let pages = app.session.pages();
    let content = content_lines(app.session.document());

    // Report the rendered content height back to the pagination
    // engine; it reads this on the next recompute.
    let inner_width = area.width.saturating_sub(4).max(1) as usize;
    let rendered_rows: usize = content
        .iter()
        .map(|line| display_rows(line, inner_width))
        .sum();
    app.measured.set(Some(rendered_rows as u32 * LINE_HEIGHT));

    // Stack the pages vertically; pages past the viewport are clipped.
    let mut constraints: Vec<Constraint> = pages
        .iter()
        .map(|_| Constraint::Length((area.height / pages.len().max(1) as u16).max(4)))
        .collect();
    constraints.push(Constraint::Min(0));
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, page) in pages.iter().enumerate() {
        let panel = Panel::default()
            .borders(Borders::ALL)
            .title(format!("Page {}", page.number));
        let widget = if i == 0 {
            // Only the first page renders live content; the rest are
            // placeholders sized to page geometry.
            Paragraph::new(content.clone())
                .block(panel)
                .wrap(ratatui::widgets::Wrap { trim: false })
        } else {
            Paragraph::new(Vec::<Line>::new()).block(panel)
        };
        f.render_widget(widget, slots[i]);
    }
}

fn status_bar(app: &App) -> Paragraph<'_> {
    let line = match &app.mode {
        Mode::LinkInput(buffer) => Line::from(format!("Enter URL: {buffer}▏  (Esc to cancel)")),
        Mode::Edit => {
            let stats = app.session.stats();
            let mut text = format!(
                "{} words  {} chars  {} page(s)",
                stats.word_count,
                stats.char_count,
                app.session.page_count()
            );
            match &app.status {
                Some(status) => text = format!("{text}  |  {status}"),
                None => {
                    text.push_str(
                        "  |  ^B/^E/^U marks  ^K link  Alt+1-3 heading  Alt+B/N lists  \
                         Alt+L/C/R align  ^S export  ^Q quit",
                    );
                }
            }
            Line::from(text)
        }
    };
    Paragraph::new(line)
}

/// Flatten the document into styled terminal lines.
fn content_lines(doc: &folio_engine::Document) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    blocks_to_lines(doc.blocks(), 0, &mut lines);
    lines
}

fn blocks_to_lines(blocks: &[Block], depth: usize, lines: &mut Vec<Line<'static>>) {
    for block in blocks {
        match block {
            Block::Paragraph { runs, align } => {
                lines.push(runs_to_line(runs, None, depth, *align, Style::default()));
                lines.push(Line::default());
            }
            Block::Heading { level, runs, align } => {
                let prefix = "#".repeat(*level as usize);
                lines.push(runs_to_line(
                    runs,
                    Some(format!("{prefix} ")),
                    depth,
                    *align,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                lines.push(Line::default());
            }
            Block::BulletList { items } => {
                for item in items {
                    items_to_lines(&item.blocks, "• ", depth, lines);
                }
                lines.push(Line::default());
            }
            Block::OrderedList { items } => {
                for (n, item) in items.iter().enumerate() {
                    items_to_lines(&item.blocks, &format!("{}. ", n + 1), depth, lines);
                }
                lines.push(Line::default());
            }
        }
    }
}

fn items_to_lines(blocks: &[Block], marker: &str, depth: usize, lines: &mut Vec<Line<'static>>) {
    let mut first = true;
    for block in blocks {
        match block {
            Block::Paragraph { runs, align } | Block::Heading { runs, align, .. } => {
                let prefix = if first {
                    format!("{}{marker}", "  ".repeat(depth))
                } else {
                    " ".repeat(depth * 2 + marker.len())
                };
                lines.push(runs_to_line(runs, Some(prefix), 0, *align, Style::default()));
                first = false;
            }
            Block::BulletList { .. } | Block::OrderedList { .. } => {
                blocks_to_lines(std::slice::from_ref(block), depth + 1, lines);
            }
        }
    }
}

fn runs_to_line(
    runs: &[folio_engine::TextRun],
    prefix: Option<String>,
    depth: usize,
    align: Align,
    base: Style,
) -> Line<'static> {
    let mut spans = Vec::new();
    if depth > 0 {
        spans.push(Span::raw("  ".repeat(depth)));
    }
    if let Some(prefix) = prefix {
        spans.push(Span::styled(prefix, base));
    }
    for run in runs {
        let mut style = base;
        if run.marks.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if run.marks.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if run.marks.underline || run.marks.link.is_some() {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        spans.push(Span::styled(run.text.clone(), style));
    }
    let alignment = match align {
        Align::Left => Alignment::Left,
        Align::Center => Alignment::Center,
        Align::Right => Alignment::Right,
    };
    Line::from(spans).alignment(alignment)
}

fn display_rows(line: &Line, width: usize) -> usize {
    let chars: usize = line.spans.iter().map(|s| s.content.chars().count()).sum();
    chars.div_ceil(width).max(1)
}
