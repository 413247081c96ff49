use crate::editing::nodes::{Align, Block, ListItem, TextRun};
use crate::editing::Document;

/// Serialize the document to an HTML fragment.
pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    write_blocks(&mut out, doc.blocks());
    out
}

fn write_blocks(out: &mut String, blocks: &[Block]) {
    for block in blocks {
        write_block(out, block);
    }
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph { runs, align } => {
            write_open_tag(out, "p", *align);
            write_runs(out, runs);
            out.push_str("</p>");
        }
        Block::Heading { level, runs, align } => {
            let tag = match level {
                1 => "h1",
                2 => "h2",
                _ => "h3",
            };
            write_open_tag(out, tag, *align);
            write_runs(out, runs);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        Block::BulletList { items } => {
            out.push_str("<ul>");
            write_items(out, items);
            out.push_str("</ul>");
        }
        Block::OrderedList { items } => {
            out.push_str("<ol>");
            write_items(out, items);
            out.push_str("</ol>");
        }
    }
}

fn write_items(out: &mut String, items: &[ListItem]) {
    for item in items {
        out.push_str("<li>");
        write_blocks(out, &item.blocks);
        out.push_str("</li>");
    }
}

fn write_open_tag(out: &mut String, tag: &str, align: Align) {
    out.push('<');
    out.push_str(tag);
    if align != Align::Left {
        out.push_str(" style=\"text-align: ");
        out.push_str(align.as_css());
        out.push('"');
    }
    out.push('>');
}

fn write_runs(out: &mut String, runs: &[TextRun]) {
    for run in runs {
        // Canonical nesting: link outermost, then strong, em, u.
        if let Some(href) = &run.marks.link {
            out.push_str("<a href=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(href));
            out.push_str("\">");
        }
        if run.marks.bold {
            out.push_str("<strong>");
        }
        if run.marks.italic {
            out.push_str("<em>");
        }
        if run.marks.underline {
            out.push_str("<u>");
        }
        out.push_str(&html_escape::encode_text(&run.text));
        if run.marks.underline {
            out.push_str("</u>");
        }
        if run.marks.italic {
            out.push_str("</em>");
        }
        if run.marks.bold {
            out.push_str("</strong>");
        }
        if run.marks.link.is_some() {
            out.push_str("</a>");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::nodes::Marks;
    use crate::editing::document::paragraph_doc;
    use crate::editing::{Cmd, Document, MarkKind, Position, Selection};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_serializes_to_empty_paragraph() {
        let doc = Document::new();
        assert_eq!(to_html(&doc), "<p></p>");
    }

    #[test]
    fn test_plain_paragraph() {
        let doc = paragraph_doc("Hello world");
        assert_eq!(to_html(&doc), "<p>Hello world</p>");
    }

    #[test]
    fn test_marked_runs_use_inline_tags() {
        let mut doc = paragraph_doc("Hello world");
        doc.set_selection(Selection::new(Position::new(0, 0), Position::new(0, 5)));
        doc.apply(Cmd::ToggleMark {
            mark: MarkKind::Bold,
        });

        assert_eq!(to_html(&doc), "<p><strong>Hello</strong> world</p>");
    }

    #[test]
    fn test_stacked_marks_nest_canonically() {
        let mut doc = Document::new();
        doc.blocks = vec![Block::paragraph(vec![TextRun::with_marks(
            "all of it",
            Marks {
                bold: true,
                italic: true,
                underline: true,
                link: Some("https://example.com".to_string()),
            },
        )])];

        insta::assert_snapshot!(
            to_html(&doc),
            @r#"<p><a href="https://example.com"><strong><em><u>all of it</u></em></strong></a></p>"#
        );
    }

    #[test]
    fn test_alignment_becomes_style_attribute() {
        let mut doc = paragraph_doc("centered");
        doc.apply(Cmd::SetTextAlign {
            align: Align::Center,
        });

        assert_eq!(
            to_html(&doc),
            "<p style=\"text-align: center\">centered</p>"
        );
    }

    #[test]
    fn test_left_alignment_is_implicit() {
        let doc = paragraph_doc("plain");
        assert!(!to_html(&doc).contains("style"));
    }

    #[test]
    fn test_lists_and_headings() {
        let mut doc = Document::new();
        doc.blocks = vec![
            Block::heading(2, vec![TextRun::plain("Shopping")]),
            Block::BulletList {
                items: vec![
                    ListItem::new(vec![Block::paragraph(vec![TextRun::plain("milk")])]),
                    ListItem::new(vec![Block::paragraph(vec![TextRun::plain("eggs")])]),
                ],
            },
        ];

        insta::assert_snapshot!(
            to_html(&doc),
            @"<h2>Shopping</h2><ul><li><p>milk</p></li><li><p>eggs</p></li></ul>"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let doc = paragraph_doc("a < b && c > d");
        assert_eq!(to_html(&doc), "<p>a &lt; b &amp;&amp; c &gt; d</p>");
    }

    #[test]
    fn test_href_is_attribute_escaped() {
        let mut doc = paragraph_doc("link");
        doc.select_all();
        doc.apply(Cmd::SetLink {
            href: Some("https://example.com/?a=1&b=\"2\"".to_string()),
        });

        let html = to_html(&doc);
        assert!(html.contains("a=1&amp;b=&quot;2&quot;"));
    }
}
