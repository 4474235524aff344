mod common;

use common::{config_for, tessdata, CallLog, FakeEngine};
use image::{GrayImage, Luma};
use std::path::{Path, PathBuf};
use tessapi::engine::OcrEngine;
use tessapi::pixels::PixelBuffer;
use tessapi::renderer::{Document, RenderOutcome, RenderedFormat};
use tessapi::tesseract::outputbase_for;
use tessapi::{OcrError, Tesseract};

fn write_page(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    GrayImage::from_pixel(1024, 800, Luma([255])).save(&path).unwrap();
    path
}

#[test]
fn test_create_documents_writes_every_format() {
    let data = tessdata(&["eng"]);
    let log = CallLog::default();
    let mut tess = Tesseract::new(FakeEngine::new(log.clone()), config_for(data.path()));

    let work = tempfile::tempdir().unwrap();
    let inputs = vec![write_page(work.path(), "eurotext.png"), write_page(work.path(), "phototest.png")];
    let results = work.path().join("test/results");
    let outputbases = vec![results.join("docrenderer-1"), results.join("docrenderer-2")];
    let formats = [RenderedFormat::Hocr, RenderedFormat::Pdf, RenderedFormat::Text];

    let reports = tess.create_documents(&inputs, &outputbases, &formats).unwrap();

    assert_eq!(reports.len(), 2);
    for (report, base) in reports.iter().zip(&outputbases) {
        assert_eq!(report.pages, 1);
        assert!(report.failures().is_empty());
        for format in formats {
            let output = report.output(format).unwrap();
            assert_eq!(output.outcome, RenderOutcome::Written);
            assert_eq!(output.path, format.output_path(base));
            assert!(output.path.exists(), "{} missing", output.path.display());
        }
    }

    let pdf = std::fs::read(results.join("docrenderer-1.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    let hocr = std::fs::read_to_string(results.join("docrenderer-2.hocr")).unwrap();
    assert!(hocr.contains("<div class='ocr_page'"));
    assert!(hocr.contains("<title>phototest.png</title>"));
    let text = std::fs::read_to_string(results.join("docrenderer-1.txt")).unwrap();
    assert!(text.starts_with(common::EUROTEXT));
}

#[test]
fn test_each_page_is_recognized_once_for_all_formats() {
    let data = tessdata(&["eng"]);
    let log = CallLog::default();
    let mut tess = Tesseract::new(FakeEngine::new(log.clone()), config_for(data.path()));

    let work = tempfile::tempdir().unwrap();
    let input = write_page(work.path(), "page.png");
    let base = outputbase_for(&input, work.path());

    tess.create_documents(
        &[&input],
        &[&base],
        &[RenderedFormat::Text, RenderedFormat::Hocr, RenderedFormat::Tsv],
    )
    .unwrap();

    assert_eq!(log.count("recognize"), 1);
    assert_eq!(log.count("add_image"), 3);
    assert_eq!(log.count("begin_document"), 3);
    assert_eq!(log.count("end_document"), 3);

    // renderers are driven in the requested order
    let entries = log.entries();
    let adds: Vec<&str> = entries
        .iter()
        .filter(|e| e.starts_with("add_image:"))
        .map(String::as_str)
        .collect();
    assert_eq!(adds, vec!["add_image:text", "add_image:hocr", "add_image:tsv"]);

    // input name is set before each page is recognized
    let name = entries.iter().position(|e| e.starts_with("input_name:")).unwrap();
    let recognize = entries.iter().position(|e| e == "recognize").unwrap();
    assert!(name < recognize);
}

#[test]
fn test_failed_format_does_not_affect_others() {
    let data = tessdata(&["eng"]);
    let mut engine = FakeEngine::new(CallLog::default());
    engine.broken_formats = vec![RenderedFormat::Pdf];
    engine.missing_formats = vec![RenderedFormat::Alto];
    let mut tess = Tesseract::new(engine, config_for(data.path()));

    let work = tempfile::tempdir().unwrap();
    let input = write_page(work.path(), "scan.png");
    let base = work.path().join("out/scan");

    let reports = tess
        .create_documents(
            &[&input],
            &[&base],
            &[RenderedFormat::Pdf, RenderedFormat::Text, RenderedFormat::Alto],
        )
        .unwrap();
    let report = &reports[0];

    let failed: Vec<RenderedFormat> = report.failures().into_iter().map(|(f, _)| f).collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.contains(&RenderedFormat::Pdf));
    assert!(failed.contains(&RenderedFormat::Alto));

    assert!(report.output(RenderedFormat::Text).unwrap().is_written());
    assert!(base.with_extension("txt").exists());
    assert!(!base.with_extension("pdf").exists());
}

#[test]
fn test_mismatched_lengths_are_rejected() {
    let data = tessdata(&["eng"]);
    let log = CallLog::default();
    let mut tess = Tesseract::new(FakeEngine::new(log.clone()), config_for(data.path()));

    let err = tess
        .create_documents(&["a.png", "b.png"], &["out/a"], &[RenderedFormat::Text])
        .unwrap_err();
    assert!(matches!(err, OcrError::InvalidArgument(_)));

    let err = tess.create_documents(&["a.png"], &["out/a"], &[]).unwrap_err();
    assert_eq!(err.code(), "INVALID_ARGUMENT");
    assert_eq!(log.count("init"), 0);
}

#[test]
fn test_undecodable_input_fails_the_call() {
    let data = tessdata(&["eng"]);
    let mut tess = Tesseract::new(FakeEngine::new(CallLog::default()), config_for(data.path()));
    let work = tempfile::tempdir().unwrap();

    let err = tess
        .create_documents(
            &[work.path().join("absent.png")],
            &[work.path().join("absent")],
            &[RenderedFormat::Text],
        )
        .unwrap_err();
    assert_eq!(err.code(), "MISSING_FILE");
}

#[test]
fn test_document_protocol_by_hand() {
    let data = tessdata(&["eng"]);
    let mut engine = FakeEngine::new(CallLog::default());
    engine.broken_formats = vec![RenderedFormat::Hocr];
    let mut tess = Tesseract::new(engine, config_for(data.path()));

    let work = tempfile::tempdir().unwrap();
    let base = work.path().join("manual");
    let page = common::blank_page();
    let buffer = PixelBuffer::from_image(&page).unwrap();

    let renderers = [RenderedFormat::Text, RenderedFormat::Hocr]
        .into_iter()
        .map(|format| tess.engine_mut().create_renderer(format, &base))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let document = Document::<FakeEngine, _>::new(renderers);
    assert_eq!(document.formats(), vec![RenderedFormat::Text, RenderedFormat::Hocr]);

    let mut document = document.begin("manual");
    for _ in 0..2 {
        tess.recognize(&buffer, None, None).unwrap();
        assert_eq!(document.add_page(tess.engine_mut()), 2);
    }
    let document = document.end();

    assert_eq!(document.pages(), 2);
    let text = String::from_utf8(document.read(RenderedFormat::Text).unwrap()).unwrap();
    assert_eq!(text, format!("{0}\n{0}\n", common::EUROTEXT));

    let err = document.read(RenderedFormat::Hocr).unwrap_err();
    assert_eq!(err.code(), "RENDER_ERROR");
    assert!(matches!(document.read(RenderedFormat::Pdf), Err(OcrError::InvalidArgument(_))));
}

#[test]
fn test_closing_releases_renderers_before_reading() {
    let data = tessdata(&["eng"]);
    let log = CallLog::default();
    let mut engine = FakeEngine::new(log.clone());
    engine.flush_on_drop = true;
    let mut tess = Tesseract::new(engine, config_for(data.path()));

    let work = tempfile::tempdir().unwrap();
    let base = work.path().join("buffered");
    let page = common::blank_page();
    let buffer = PixelBuffer::from_image(&page).unwrap();

    let renderer = tess.engine_mut().create_renderer(RenderedFormat::Text, &base).unwrap();
    let mut document = Document::<FakeEngine, _>::new(vec![renderer]).begin("buffered");
    tess.recognize(&buffer, None, None).unwrap();
    document.add_page(tess.engine_mut());
    let document = document.end();

    assert_eq!(log.count("drop_renderer"), 1);
    assert_eq!(document.formats(), vec![RenderedFormat::Text]);
    assert_eq!(document.outputs().len(), 1);
    let text = String::from_utf8(document.read(RenderedFormat::Text).unwrap()).unwrap();
    assert_eq!(text, format!("{}\n", common::EUROTEXT));
}

#[test]
fn test_outputbase_uses_file_stem() {
    assert_eq!(
        outputbase_for(Path::new("scans/page.png"), Path::new("out")),
        PathBuf::from("out/page")
    );
}
