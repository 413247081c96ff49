use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::editing::nodes::{Align, Block, ListItem, ListKind, Marks, TextRun};
use crate::html::HtmlError;

/// Read an HTML fragment into document blocks.
///
/// Recognizes the tags the serializer emits (`p`, `h1`–`h3`, `ul`,
/// `ol`, `li`, `strong`/`b`, `em`/`i`, `u`, `a`) plus `br`; unknown
/// inline tags are transparent. The fragment must be well-formed
/// markup; anything else raises [`HtmlError::Malformed`].
pub fn parse_fragment(fragment: &str) -> Result<Vec<Block>, HtmlError> {
    let mut reader = Reader::from_str(fragment);
    let mut builder = FragmentBuilder::default();

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => builder.open(&e)?,
            Ok(Event::End(e)) => builder.close(e.name().as_ref()),
            Ok(Event::Empty(e)) => {
                builder.open(&e)?;
                builder.close(e.name().as_ref());
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| HtmlError::Malformed(e.to_string()))?;
                builder.text(&text);
            }
            Ok(_) => {}
            Err(e) => return Err(HtmlError::Malformed(e.to_string())),
        }
    }

    Ok(builder.finish())
}

enum LeafKind {
    Paragraph,
    Heading(u8),
}

struct OpenLeaf {
    kind: LeafKind,
    align: Align,
    runs: Vec<TextRun>,
}

#[derive(Default)]
struct FragmentBuilder {
    top: Vec<Block>,
    /// Open list containers, innermost last.
    lists: Vec<(ListKind, Vec<ListItem>)>,
    /// Open list items, innermost last.
    items: Vec<Vec<Block>>,
    leaf: Option<OpenLeaf>,
    /// Mark context per open inline element.
    marks: Vec<Marks>,
}

impl FragmentBuilder {
    fn open(&mut self, e: &BytesStart) -> Result<(), HtmlError> {
        match e.name().as_ref() {
            b"p" => self.open_leaf(LeafKind::Paragraph, read_align(e)?),
            b"h1" => self.open_leaf(LeafKind::Heading(1), read_align(e)?),
            b"h2" => self.open_leaf(LeafKind::Heading(2), read_align(e)?),
            b"h3" => self.open_leaf(LeafKind::Heading(3), read_align(e)?),
            b"ul" => {
                self.close_leaf();
                self.lists.push((ListKind::Bullet, Vec::new()));
            }
            b"ol" => {
                self.close_leaf();
                self.lists.push((ListKind::Ordered, Vec::new()));
            }
            b"li" => {
                if !self.lists.is_empty() {
                    self.items.push(Vec::new());
                }
            }
            b"strong" | b"b" => self.push_marks(|m| m.bold = true),
            b"em" | b"i" => self.push_marks(|m| m.italic = true),
            b"u" => self.push_marks(|m| m.underline = true),
            b"a" => {
                let href = read_attribute(e, b"href")?;
                self.push_marks(|m| m.link = href.clone());
            }
            b"br" => {
                if self.leaf.is_some() {
                    self.text("\n");
                }
            }
            _ => self.push_marks(|_| {}),
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"p" | b"h1" | b"h2" | b"h3" => self.close_leaf(),
            b"ul" | b"ol" => {
                self.close_leaf();
                if let Some((kind, items)) = self.lists.pop() {
                    self.push_block(match kind {
                        ListKind::Bullet => Block::BulletList { items },
                        ListKind::Ordered => Block::OrderedList { items },
                    });
                }
            }
            b"li" => {
                self.close_leaf();
                if let Some(blocks) = self.items.pop()
                    && let Some((_, items)) = self.lists.last_mut()
                {
                    items.push(ListItem::new(blocks));
                }
            }
            b"br" => {}
            _ => {
                self.marks.pop();
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.leaf.is_none() {
            // Inter-tag whitespace is formatting, not content.
            if text.trim().is_empty() {
                return;
            }
            // Bare text becomes an implicit paragraph.
            self.open_leaf(LeafKind::Paragraph, Align::Left);
        }
        let marks = self.marks.last().cloned().unwrap_or_default();
        if let Some(leaf) = &mut self.leaf {
            leaf.runs.push(TextRun::with_marks(text, marks));
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.close_leaf();
        // Fold any containers left open at end of input.
        while !self.lists.is_empty() {
            if let Some(blocks) = self.items.pop()
                && let Some((_, items)) = self.lists.last_mut()
            {
                items.push(ListItem::new(blocks));
            }
            if self.items.len() < self.lists.len()
                && let Some((kind, items)) = self.lists.pop()
            {
                self.push_block(match kind {
                    ListKind::Bullet => Block::BulletList { items },
                    ListKind::Ordered => Block::OrderedList { items },
                });
            }
        }
        self.top
    }

    fn open_leaf(&mut self, kind: LeafKind, align: Align) {
        self.close_leaf();
        self.leaf = Some(OpenLeaf {
            kind,
            align,
            runs: Vec::new(),
        });
    }

    fn close_leaf(&mut self) {
        if let Some(leaf) = self.leaf.take() {
            let block = match leaf.kind {
                LeafKind::Paragraph => Block::Paragraph {
                    runs: leaf.runs,
                    align: leaf.align,
                },
                LeafKind::Heading(level) => Block::Heading {
                    level,
                    runs: leaf.runs,
                    align: leaf.align,
                },
            };
            self.push_block(block);
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.items.last_mut() {
            Some(item) => item.push(block),
            None => self.top.push(block),
        }
    }

    fn push_marks(&mut self, edit: impl Fn(&mut Marks)) {
        let mut marks = self.marks.last().cloned().unwrap_or_default();
        edit(&mut marks);
        self.marks.push(marks);
    }
}

fn read_attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>, HtmlError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| HtmlError::Malformed(e.to_string()))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| HtmlError::Malformed(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn read_align(e: &BytesStart) -> Result<Align, HtmlError> {
    let Some(style) = read_attribute(e, b"style")? else {
        return Ok(Align::Left);
    };
    for declaration in style.split(';') {
        if let Some((property, value)) = declaration.split_once(':')
            && property.trim() == "text-align"
            && let Some(align) = Align::from_css(value)
        {
            return Ok(align);
        }
    }
    Ok(Align::Left)
}
