use std::io::{Cursor, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use question_forge::error::ExtractionError;
use question_forge::media::{
    encode_image_for_transport, extract_docx_text, process_uploads, process_uploads_with, validate_uploads, PdfRasterizer,
    UploadedFile, MAX_IMAGE_DIMENSION,
};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut out, ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

fn docx_bytes(document_xml: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::FileOptions::default())
        .unwrap();
    writer.write_all(document_xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

fn file(name: &str) -> UploadedFile {
    UploadedFile::new(name, Vec::new()).unwrap()
}

#[test]
fn large_image_is_downscaled_to_jpeg() {
    let image = DynamicImage::new_rgba8(2048, 1024);
    let encoded = encode_image_for_transport(&image).unwrap();

    let jpeg = STANDARD.decode(encoded).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    let decoded = image::load_from_memory(&jpeg).unwrap();
    assert_eq!(decoded.dimensions(), (MAX_IMAGE_DIMENSION, 512));
}

#[test]
fn small_image_keeps_its_size() {
    let encoded = encode_image_for_transport(&DynamicImage::new_rgb8(300, 200)).unwrap();
    let decoded = image::load_from_memory(&STANDARD.decode(encoded).unwrap()).unwrap();
    assert_eq!(decoded.dimensions(), (300, 200));
}

#[test]
fn at_most_ten_files_are_accepted() {
    let ten: Vec<_> = (0..10).map(|i| file(&format!("p{}.png", i))).collect();
    assert!(validate_uploads(&ten).is_ok());

    let eleven: Vec<_> = (0..11).map(|i| file(&format!("p{}.png", i))).collect();
    assert!(matches!(
        validate_uploads(&eleven),
        Err(ExtractionError::TooManyFiles { count: 11, max: 10 })
    ));
}

#[test]
fn documents_cannot_be_combined() {
    assert!(matches!(
        validate_uploads(&[file("skript.pdf"), file("bild.png")]),
        Err(ExtractionError::MixedUpload)
    ));
    assert!(matches!(
        validate_uploads(&[file("a.pdf"), file("b.docx")]),
        Err(ExtractionError::MultipleDocuments)
    ));
    assert!(validate_uploads(&[file("single.docx")]).is_ok());
}

#[test]
fn unsupported_extension_is_rejected() {
    assert!(matches!(
        UploadedFile::new("tabelle.xlsx", Vec::new()),
        Err(ExtractionError::UnsupportedFile(_))
    ));
}

#[test]
fn docx_paragraphs_become_lines() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Erster</w:t></w:r><w:r><w:t xml:space="preserve"> Absatz</w:t></w:r></w:p>
    <w:p><w:r><w:t>A</w:t><w:tab/><w:t>B &amp; C</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
    let text = extract_docx_text(&docx_bytes(xml)).unwrap();
    assert_eq!(text, "Erster Absatz\nA\tB & C");
}

#[test]
fn docx_without_document_part_is_an_error() {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("other.xml", zip::write::FileOptions::default()).unwrap();
    writer.write_all(b"<x/>").unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    assert!(matches!(extract_docx_text(&bytes), Err(ExtractionError::Docx(_))));
}

#[test]
fn image_uploads_are_decoded() {
    let uploads = vec![
        UploadedFile::new("seite1.png", png_bytes(40, 20)).unwrap(),
        UploadedFile::new("seite2.PNG", png_bytes(10, 10)).unwrap(),
    ];
    let content = process_uploads(&uploads).unwrap();

    assert!(content.text.is_empty());
    assert_eq!(content.images.len(), 2);
    assert_eq!(content.images[0].dimensions(), (40, 20));
}

#[test]
fn docx_upload_yields_text() {
    let xml = r#"<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t>Inhalt</w:t></w:r></w:p></w:body></w:document>"#;
    let content = process_uploads(&[UploadedFile::new("notes.docx", docx_bytes(xml)).unwrap()]).unwrap();
    assert_eq!(content.text, "Inhalt");
    assert!(content.images.is_empty());
}

/// One empty page, no text layer.
fn blank_pdf() -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>",
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] /Resources << >> /Contents 4 0 R >>",
        "<< /Length 0 >>\nstream\n\nendstream",
    ];
    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", index + 1, body).as_bytes());
    }
    let xref_offset = pdf.len();
    let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in &offsets {
        tail.push_str(&format!("{:010} 00000 n \n", offset));
    }
    tail.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));
    pdf.extend_from_slice(tail.as_bytes());
    pdf
}

/// A stand-in for `pdftoppm`: a shell script that copies prepared PNGs to
/// `<prefix>-<page>.png`, where the prefix is the last argument.
fn fake_renderer(dir: &std::path::Path, pages: &[(u32, (u32, u32))]) -> PdfRasterizer {
    let mut script = String::from("for last; do :; done\n");
    for (page, (width, height)) in pages {
        let source = dir.join(format!("source-{}.png", page));
        std::fs::write(&source, png_bytes(*width, *height)).unwrap();
        script.push_str(&format!("cp '{}' \"$last-{}.png\"\n", source.display(), page));
    }
    let script_path = dir.join("render.sh");
    std::fs::write(&script_path, script).unwrap();
    PdfRasterizer::new("/bin/sh").with_leading_args([script_path])
}

fn failing_renderer(dir: &std::path::Path) -> PdfRasterizer {
    let script_path = dir.join("fail.sh");
    std::fs::write(&script_path, "echo 'Syntax Error: broken xref' >&2\nexit 3\n").unwrap();
    PdfRasterizer::new("/bin/sh").with_leading_args([script_path])
}

#[cfg(unix)]
#[test]
fn rendered_pages_follow_page_numbers() {
    let dir = tempfile::tempdir().unwrap();
    // page 10 sorts before page 2 as text
    let renderer = fake_renderer(dir.path(), &[(10, (30, 10)), (2, (20, 10))]);

    let pages = renderer.render(b"%PDF-1.4").unwrap();

    let sizes: Vec<_> = pages.iter().map(|p| p.dimensions()).collect();
    assert_eq!(sizes, vec![(20, 10), (30, 10)]);
}

#[cfg(unix)]
#[test]
fn renderer_failure_carries_stderr() {
    let dir = tempfile::tempdir().unwrap();
    match failing_renderer(dir.path()).render(b"%PDF-1.4") {
        Err(ExtractionError::Render(message)) => assert!(message.contains("broken xref")),
        other => panic!("expected Render error, got {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn text_less_pdf_is_used_as_page_images() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = fake_renderer(dir.path(), &[(1, (50, 70))]);
    let upload = UploadedFile::new("scan.pdf", blank_pdf()).unwrap();

    let content = process_uploads_with(&[upload], &renderer).unwrap();

    assert!(content.text.is_empty());
    assert_eq!(content.images.len(), 1);
    assert_eq!(content.images[0].dimensions(), (50, 70));
}

#[cfg(unix)]
#[test]
fn text_less_pdf_is_an_error_when_rendering_fails() {
    let dir = tempfile::tempdir().unwrap();
    let upload = UploadedFile::new("scan.pdf", blank_pdf()).unwrap();

    match process_uploads_with(&[upload], &failing_renderer(dir.path())) {
        Err(ExtractionError::NoExtractableText { file, reason }) => {
            assert_eq!(file, "scan.pdf");
            assert!(reason.contains("broken xref"));
        }
        other => panic!("expected NoExtractableText, got {:?}", other.map(|c| c.images.len())),
    }
}

#[test]
fn missing_renderer_program_is_reported() {
    let upload = UploadedFile::new("scan.pdf", blank_pdf()).unwrap();
    let renderer = PdfRasterizer::new("/nonexistent/bin/pdftoppm");

    assert!(matches!(
        process_uploads_with(&[upload], &renderer),
        Err(ExtractionError::NoExtractableText { .. })
    ));
}
