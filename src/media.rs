//! Source material intake: uploaded PDF/DOCX/image files become plain text and
//! decoded images, and images are re-encoded for transport to the model.
//! A PDF without a text layer is rendered page by page with `pdftoppm` and
//! its pages are used as images instead.

use std::ffi::OsString;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::Command;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info, instrument, warn};

use crate::error::ExtractionError;

pub const MAX_UPLOAD_FILES: usize = 10;
pub const MAX_IMAGE_DIMENSION: u32 = 1024;
pub const JPEG_QUALITY: u8 = 85;
pub const PDF_RENDER_DPI: u32 = 200;

/// RGB, at most 1024px on the long side, JPEG quality 85, base64.
pub fn encode_image_for_transport(image: &DynamicImage) -> Result<String, ExtractionError> {
    let mut rgb = image.to_rgb8();
    if rgb.width().max(rgb.height()) > MAX_IMAGE_DIMENSION {
        rgb = DynamicImage::ImageRgb8(rgb)
            .thumbnail(MAX_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION)
            .to_rgb8();
    }

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;
    Ok(STANDARD.encode(&jpeg))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Docx,
    Image,
}

impl UploadKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" => Some(Self::Image),
            _ => None,
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Self::Pdf | Self::Docx)
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub kind: UploadKind,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ExtractionError> {
        let name = name.into();
        let kind = UploadKind::from_file_name(&name).ok_or_else(|| ExtractionError::UnsupportedFile(name.clone()))?;
        Ok(Self { name, kind, bytes })
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        let bytes = std::fs::read(path).map_err(|source| ExtractionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, bytes)
    }
}

/// Text and images pulled out of a set of uploads.
#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    pub text: String,
    pub images: Vec<DynamicImage>,
}

/// Either one PDF/DOCX or up to ten images.
pub fn validate_uploads(files: &[UploadedFile]) -> Result<(), ExtractionError> {
    if files.len() > MAX_UPLOAD_FILES {
        return Err(ExtractionError::TooManyFiles { count: files.len(), max: MAX_UPLOAD_FILES });
    }
    let has_document = files.iter().any(|f| f.kind.is_document());
    let has_image = files.iter().any(|f| f.kind == UploadKind::Image);
    if has_document && files.len() > 1 {
        return Err(if has_image { ExtractionError::MixedUpload } else { ExtractionError::MultipleDocuments });
    }
    Ok(())
}

pub fn process_uploads(files: &[UploadedFile]) -> Result<ExtractedContent, ExtractionError> {
    process_uploads_with(files, &PdfRasterizer::default())
}

/// Like [`process_uploads`], rendering text-less PDFs with `rasterizer`.
#[instrument(skip(files, rasterizer), fields(files = files.len()))]
pub fn process_uploads_with(files: &[UploadedFile], rasterizer: &PdfRasterizer) -> Result<ExtractedContent, ExtractionError> {
    validate_uploads(files)?;

    let mut text = String::new();
    let mut images = Vec::new();
    for file in files {
        match file.kind {
            UploadKind::Pdf => {
                let extracted = extract_pdf_text(&file.bytes)?;
                if extracted.is_empty() {
                    warn!(
                        file = %file.name,
                        renderer = %rasterizer.program().display(),
                        "PDF contains no extractable text, rendering pages as images"
                    );
                    let pages = rasterizer.render(&file.bytes).map_err(|e| {
                        warn!(file = %file.name, error = %e, "PDF page rendering failed");
                        ExtractionError::NoExtractableText {
                            file: file.name.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    info!(file = %file.name, pages = pages.len(), "Rendered PDF pages");
                    images.extend(pages);
                } else {
                    text.push_str(&extracted);
                    text.push_str("\n\n");
                }
            }
            UploadKind::Docx => {
                text.push_str(&extract_docx_text(&file.bytes)?);
                text.push_str("\n\n");
            }
            UploadKind::Image => images.push(image::load_from_memory(&file.bytes)?),
        }
    }

    info!(text_len = text.trim().len(), images = images.len(), "Processed uploads");
    Ok(ExtractedContent { text: text.trim().to_string(), images })
}

/// Renders PDF pages to PNG with poppler's `pdftoppm` and decodes them.
#[derive(Debug, Clone)]
pub struct PdfRasterizer {
    program: PathBuf,
    leading_args: Vec<OsString>,
    dpi: u32,
}

impl Default for PdfRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PdfRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            dpi: PDF_RENDER_DPI,
        }
    }

    /// Arguments passed before the `pdftoppm` ones, e.g. a script for an interpreter.
    #[must_use]
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Pages in document order.
    pub fn render(&self, pdf_bytes: &[u8]) -> Result<Vec<DynamicImage>, ExtractionError> {
        let dir = tempfile::Builder::new()
            .prefix("question_forge_pdf")
            .tempdir()
            .map_err(|source| ExtractionError::Io {
                path: std::env::temp_dir().display().to_string(),
                source,
            })?;
        let input_path = dir.path().join("input.pdf");
        std::fs::write(&input_path, pdf_bytes).map_err(|source| ExtractionError::Io {
            path: input_path.display().to_string(),
            source,
        })?;

        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(&input_path)
            .arg(dir.path().join("page"))
            .output()
            .map_err(|e| ExtractionError::Render(format!("failed to run {}: {}", self.program.display(), e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Render(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let pages = rendered_pages(dir.path())?;
        if pages.is_empty() {
            return Err(ExtractionError::Render("no pages were rendered".to_string()));
        }
        debug!(pages = pages.len(), "Decoding rendered pages");
        pages
            .iter()
            .map(|path| -> Result<DynamicImage, ExtractionError> {
                let bytes = std::fs::read(path).map_err(|source| ExtractionError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Ok(image::load_from_memory(&bytes)?)
            })
            .collect()
    }
}

/// PNG files in `dir`, ordered by the page number at the end of the file stem.
fn rendered_pages(dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ExtractionError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    let mut pages: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    pages.sort_by_key(|path| (page_number(path).unwrap_or(u32::MAX), path.clone()));
    Ok(pages)
}

fn page_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let digits_start = stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    stem[digits_start..].parse().ok()
}

pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))?;
    Ok(text.trim().to_string())
}

/// Paragraph text of `word/document.xml`, one paragraph per line.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::Docx(e.to_string()))?;
    let mut xml = Vec::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Docx(e.to_string()))?
        .read_to_end(&mut xml)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut reader = Reader::from_reader(xml.as_slice());
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::Empty(e)) if e.name().as_ref() == b"w:tab" => current.push('\t'),
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let unescaped = e.unescape().map_err(|err| ExtractionError::Docx(err.to_string()))?;
                current.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(ExtractionError::Docx(format!("failed to parse document.xml: {}", err))),
        }
        buf.clear();
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    debug!(paragraphs = paragraphs.len(), "Extracted DOCX paragraphs");
    Ok(paragraphs.join("\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_detected_from_extension() {
        assert_eq!(UploadKind::from_file_name("Skript.PDF"), Some(UploadKind::Pdf));
        assert_eq!(UploadKind::from_file_name("notes.docx"), Some(UploadKind::Docx));
        assert_eq!(UploadKind::from_file_name("photo.jpeg"), Some(UploadKind::Image));
        assert_eq!(UploadKind::from_file_name("archive.zip"), None);
        assert_eq!(UploadKind::from_file_name("README"), None);
    }

    #[test]
    fn page_number_is_read_from_stem_suffix() {
        assert_eq!(page_number(Path::new("/tmp/x/page-07.png")), Some(7));
        assert_eq!(page_number(Path::new("page-12.png")), Some(12));
        assert_eq!(page_number(Path::new("cover.png")), None);
    }
}
