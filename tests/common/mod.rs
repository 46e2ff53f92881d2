//! Builders for small in-memory test PDFs.

#![allow(dead_code)]

use lopdf::{dictionary, Dictionary, Document, Object, Stream};

/// One page: its content stream and extra page dictionary entries.
pub struct TestPage {
    pub content: String,
    pub extra: Dictionary,
}

impl TestPage {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            extra: Dictionary::new(),
        }
    }

    pub fn with(mut self, key: &str, value: Object) -> Self {
        self.extra.set(key, value);
        self
    }
}

/// Document-level settings for [`build_pdf`].
#[derive(Default)]
pub struct TestDoc {
    pub pages: Vec<TestPage>,
    /// Extra entries on the root `/Pages` node (inherited attributes)
    pub pages_extra: Dictionary,
    /// Extra entries on the catalog
    pub catalog_extra: Dictionary,
    pub info: Option<Dictionary>,
}

/// Courier 12pt text at a user-space baseline position.
pub fn courier_line(x: f64, y: f64, text: &str) -> String {
    format!("BT /F2 12 Tf {} {} Td ({}) Tj ET\n", x, y, text)
}

pub fn rect_array(values: [i64; 4]) -> Object {
    Object::Array(values.iter().map(|v| Object::Integer(*v)).collect())
}

/// Serialize a document with a Helvetica `/F1` and a Courier `/F2` font
/// shared through the page tree resources and a US Letter media box.
pub fn build_pdf(test_doc: TestDoc) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let helvetica_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let courier_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => Object::Reference(helvetica_id),
            "F2" => Object::Reference(courier_id),
        },
    });

    let count = test_doc.pages.len();
    let mut kids = Vec::with_capacity(count);
    for page in test_doc.pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page.content.into_bytes()));
        let mut dict = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
        };
        for (key, value) in page.extra.iter() {
            dict.set(key.clone(), value.clone());
        }
        kids.push(Object::Reference(doc.add_object(dict)));
    }

    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(count as i64),
        "Resources" => Object::Reference(resources_id),
        "MediaBox" => rect_array([0, 0, 612, 792]),
    };
    for (key, value) in test_doc.pages_extra.iter() {
        pages.set(key.clone(), value.clone());
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    };
    for (key, value) in test_doc.catalog_extra.iter() {
        catalog.set(key.clone(), value.clone());
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    if let Some(info) = test_doc.info {
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", Object::Reference(info_id));
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A document with the given pages and nothing else.
pub fn simple_pdf(pages: Vec<TestPage>) -> Vec<u8> {
    build_pdf(TestDoc {
        pages,
        ..Default::default()
    })
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {} to be close to {}",
        actual,
        expected
    );
}
