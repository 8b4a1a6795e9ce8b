//! In-memory report PDFs for integration tests.

#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Something drawn on a test page.
#[derive(Clone)]
pub enum Mark {
    /// Text at (x, baseline y) in 12pt Helvetica
    Text(&'static str, f32, f32),
    /// Text at (x, baseline y) in 10pt Helvetica
    Small(&'static str, f32, f32),
    /// Stroked segment from (x0, y0) to (x1, y1)
    Stroke(f32, f32, f32, f32),
    /// Filled rectangle (x, y, width, height), e.g. a scanned image stand-in
    Fill(f32, f32, f32, f32),
}

/// A bookmark pointing at a page, with nested children.
pub struct Bookmark {
    pub title: &'static str,
    pub page: usize,
    pub children: Vec<Bookmark>,
}

impl Bookmark {
    pub fn new(title: &'static str, page: usize) -> Self {
        Self {
            title,
            page,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Bookmark>) -> Self {
        self.children = children;
        self
    }
}

/// A page with plain lines stacked from the top, 30pt apart.
pub fn lines(texts: &[&'static str]) -> Vec<Mark> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| Mark::Text(text, 72.0, 760.0 - 30.0 * i as f32))
        .collect()
}

/// Build a PDF with the given pages, bookmarks and optional info title.
pub fn build_pdf(pages: &[Vec<Mark>], bookmarks: &[Bookmark], info_title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids = Vec::new();
    for marks in pages {
        let content: Content<Vec<Operation>> = Content {
            operations: marks.iter().flat_map(operations).collect(),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_ids.len() as i64),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if !bookmarks.is_empty() {
        let outlines_id = doc.new_object_id();
        let (first, last) = add_bookmarks(&mut doc, bookmarks, outlines_id, &page_ids);
        doc.objects.insert(
            outlines_id,
            Object::Dictionary(dictionary! {
                "Type" => "Outlines",
                "First" => first,
                "Last" => last,
                "Count" => Object::Integer(bookmarks.len() as i64),
            }),
        );
        catalog.set("Outlines", outlines_id);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = info_title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
        });
        doc.trailer.set("Info", info_id);
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Write a built PDF into `dir` under `name`.
pub fn write_pdf(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn add_bookmarks(
    doc: &mut Document,
    bookmarks: &[Bookmark],
    parent: ObjectId,
    page_ids: &[ObjectId],
) -> (ObjectId, ObjectId) {
    let ids: Vec<ObjectId> = bookmarks.iter().map(|_| doc.new_object_id()).collect();

    for (i, bookmark) in bookmarks.iter().enumerate() {
        let mut item = dictionary! {
            "Title" => Object::string_literal(bookmark.title),
            "Parent" => parent,
            "Dest" => vec![
                Object::Reference(page_ids[bookmark.page]),
                Object::Name(b"XYZ".to_vec()),
                Object::Null,
                Object::Null,
                Object::Null,
            ],
        };
        if i > 0 {
            item.set("Prev", ids[i - 1]);
        }
        if i + 1 < ids.len() {
            item.set("Next", ids[i + 1]);
        }
        if !bookmark.children.is_empty() {
            let (first, last) = add_bookmarks(doc, &bookmark.children, ids[i], page_ids);
            item.set("First", first);
            item.set("Last", last);
            item.set("Count", Object::Integer(bookmark.children.len() as i64));
        }
        doc.objects.insert(ids[i], Object::Dictionary(item));
    }

    (ids[0], ids[ids.len() - 1])
}

fn operations(mark: &Mark) -> Vec<Operation> {
    match *mark {
        Mark::Text(text, x, y) => text_ops(text, x, y, 12.0),
        Mark::Small(text, x, y) => text_ops(text, x, y, 10.0),
        Mark::Stroke(x0, y0, x1, y1) => vec![
            Operation::new("m", vec![Object::Real(x0), Object::Real(y0)]),
            Operation::new("l", vec![Object::Real(x1), Object::Real(y1)]),
            Operation::new("S", vec![]),
        ],
        Mark::Fill(x, y, w, h) => vec![
            Operation::new(
                "re",
                vec![Object::Real(x), Object::Real(y), Object::Real(w), Object::Real(h)],
            ),
            Operation::new("f", vec![]),
        ],
    }
}

fn text_ops(text: &str, x: f32, y: f32, size: f32) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Real(size)]),
        Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}
