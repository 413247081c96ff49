//! Serialize/reparse round-trips and end-to-end editing scenarios.

use std::cell::Cell;
use std::rc::Rc;

use folio_engine::{
    Align, Cmd, Document, EditorSession, ListKind, MarkKind, Position, Selection,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

// ============ Round-trip properties ============

#[rstest]
#[case("<p>Hello world</p>")]
#[case("<p></p>")]
#[case("<h1>Title</h1><p>Body</p>")]
#[case("<p style=\"text-align: center\">mid</p>")]
#[case("<p style=\"text-align: right\"><strong>bold right</strong></p>")]
#[case("<ul><li><p>one</p></li><li><p>two</p></li></ul>")]
#[case("<ol><li><p>first</p></li></ol>")]
#[case("<h2>List</h2><ul><li><p><em>styled</em> item</p></li></ul>")]
#[case("<p><a href=\"https://example.com\"><strong>both</strong></a> plain</p>")]
fn canonical_fragments_round_trip_verbatim(#[case] fragment: &str) {
    let doc = Document::from_html(fragment).unwrap();
    assert_eq!(doc.to_html(), fragment);
}

#[test]
fn edited_document_round_trips_structurally() {
    let mut doc = Document::from_html("<p>Hello world, this is folio</p>").unwrap();
    doc.set_selection(Selection::new(Position::new(0, 0), Position::new(0, 5)));
    doc.apply(Cmd::ToggleMark {
        mark: MarkKind::Bold,
    });
    doc.set_selection(Selection::new(Position::new(0, 6), Position::new(0, 11)));
    doc.apply(Cmd::ToggleMark {
        mark: MarkKind::Italic,
    });
    doc.apply(Cmd::SetTextAlign {
        align: Align::Center,
    });

    let reparsed = Document::from_html(&doc.to_html()).unwrap();

    assert_eq!(reparsed.blocks(), doc.blocks());
}

#[test]
fn list_round_trip_preserves_items_and_marks() {
    let mut doc = Document::from_html("<p>alpha</p><p>beta</p>").unwrap();
    doc.select_all();
    doc.apply(Cmd::ToggleList {
        kind: ListKind::Ordered,
    });
    doc.set_selection(Selection::new(Position::new(0, 0), Position::new(0, 5)));
    doc.apply(Cmd::SetLink {
        href: Some("https://example.com".to_string()),
    });

    let reparsed = Document::from_html(&doc.to_html()).unwrap();

    assert_eq!(reparsed.blocks(), doc.blocks());
    assert_eq!(reparsed.leaf_text(0).unwrap(), "alpha");
    assert_eq!(reparsed.leaf_text(1).unwrap(), "beta");
}

// ============ End-to-end editing scenario ============

#[test]
fn editing_session_walkthrough() {
    let height = Rc::new(Cell::new(None));
    let reader = height.clone();
    let mut session = EditorSession::new(
        "<p>Start typing your document here...</p>",
        Box::new(move || reader.get()),
        Box::new(|_| Some("https://example.com".to_string())),
    )
    .unwrap();

    // Fresh editor: the seed text counts, one page.
    assert_eq!(session.page_count(), 1);
    assert_eq!(session.stats().word_count, 5);

    // Replace the seed with a short document.
    session.set_selection(Selection::new(
        Position::new(0, 0),
        Position::new(0, session.document().leaf_text(0).unwrap().len()),
    ));
    session.dispatch(Cmd::InsertText {
        text: "Quarterly report".to_string(),
    });
    assert_eq!(session.stats().word_count, 2);
    assert_eq!(session.stats().char_count, 16);

    // Make it a centered title.
    session.dispatch(Cmd::ToggleHeading { level: 1 });
    session.dispatch(Cmd::SetTextAlign {
        align: Align::Center,
    });

    // Add a body paragraph after it.
    session.set_selection(Selection::caret(Position::new(0, 16)));
    session.dispatch(Cmd::SplitBlock);
    session.dispatch(Cmd::InsertText {
        text: "Revenue grew".to_string(),
    });

    // Link part of the body through the prompt capability.
    session.set_selection(Selection::new(Position::new(1, 0), Position::new(1, 7)));
    let patch = session.insert_link_from_prompt();
    assert!(patch.changed);

    // Content now measures three pages tall.
    height.set(Some(2500));
    session.handle_resize();
    assert_eq!(session.page_count(), 3);

    let html = session.export_html();
    assert_eq!(
        html,
        "<h1 style=\"text-align: center\">Quarterly report</h1>\
         <p><a href=\"https://example.com\">Revenue</a> grew</p>"
    );

    // The exported fragment seeds an identical document.
    let reparsed = Document::from_html(&html).unwrap();
    assert_eq!(reparsed.blocks(), session.document().blocks());

    session.teardown();
}
