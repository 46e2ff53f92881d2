//! Benchmarks for page text extraction and search.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lopdf::{dictionary, Object, Stream};
use pdfpage::{CaseSensitivity, Document, LoadOptions, Rect, Rotation, SearchDirection, TextLayout};

/// Creates a PDF whose pages each carry `lines` lines of Helvetica text.
fn create_test_pdf(page_count: usize, lines: usize) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::with_capacity(page_count);
    for p in 0..page_count {
        let mut content = String::from("BT /F1 10 Tf 14 TL 72 740 Td\n");
        for l in 0..lines {
            content.push_str(&format!(
                "(Page {} line {}: the quick brown fox jumps over the lazy dog) Tj T*\n",
                p + 1,
                l + 1
            ));
        }
        content.push_str("ET\n");

        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count as i64),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Benchmark single-page text in both layouts.
fn bench_page_text(c: &mut Criterion) {
    let data = create_test_pdf(1, 40);
    let doc = Document::from_bytes(&data).unwrap();
    let page = doc.page(0).unwrap();

    let mut group = c.benchmark_group("page_text");
    group.bench_function("physical", |b| {
        b.iter(|| page.text_with_layout(None, black_box(TextLayout::PhysicalLayout)).unwrap());
    });
    group.bench_function("raw", |b| {
        b.iter(|| page.text_with_layout(None, black_box(TextLayout::RawOrderLayout)).unwrap());
    });
    group.bench_function("text_list", |b| {
        b.iter(|| page.text_list().unwrap());
    });
    group.finish();
}

/// Benchmark walking every match on a page.
fn bench_search(c: &mut Criterion) {
    let data = create_test_pdf(1, 40);
    let doc = Document::from_bytes(&data).unwrap();
    let page = doc.page(0).unwrap();

    c.bench_function("search_next_all", |b| {
        b.iter(|| {
            let mut rect = Rect::default();
            let mut hits = 0;
            while page
                .search(
                    black_box("lazy dog"),
                    &mut rect,
                    SearchDirection::NextResult,
                    CaseSensitivity::CaseInsensitive,
                    Rotation::Rotate0,
                )
                .unwrap()
            {
                hits += 1;
            }
            hits
        });
    });
}

/// Benchmark whole-document text, sequential against parallel.
fn bench_document_text(c: &mut Criterion) {
    let data = create_test_pdf(20, 40);
    let mut group = c.benchmark_group("document_text");

    for (name, options) in [
        ("sequential", LoadOptions::new().sequential()),
        ("parallel", LoadOptions::new()),
    ] {
        let doc = Document::from_bytes_with_options(&data, options).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| doc.text(TextLayout::PhysicalLayout).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_page_text, bench_search, bench_document_text);
criterion_main!(benches);
