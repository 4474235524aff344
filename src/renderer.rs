//! Multi-format rendering protocol.
//!
//! A [`Document`] owns an ordered list of renderers, one per output format,
//! and drives them all through begin-document, one add-image per recognized
//! page, and end-document. The engine recognizes each page once; every
//! renderer reads the same recognition state. Each renderer succeeds or
//! fails on its own, so one broken format never hides the others.
//!
//! The protocol state is part of the type: pages can only be added to an
//! open document and outputs can only be read from a closed one. Closing a
//! document releases its renderers, so their files are complete on disk
//! before anything reads them.

use crate::engine::OcrEngine;
use crate::error::OcrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output formats a renderer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderedFormat {
    Text,
    Hocr,
    Pdf,
    Box,
    Unlv,
    Tsv,
    Alto,
}

impl RenderedFormat {
    pub const ALL: &'static [RenderedFormat] = &[
        RenderedFormat::Text,
        RenderedFormat::Hocr,
        RenderedFormat::Pdf,
        RenderedFormat::Box,
        RenderedFormat::Unlv,
        RenderedFormat::Tsv,
        RenderedFormat::Alto,
    ];

    /// File extension the native renderer appends to the output base
    pub fn extension(self) -> &'static str {
        match self {
            RenderedFormat::Text => "txt",
            RenderedFormat::Hocr => "hocr",
            RenderedFormat::Pdf => "pdf",
            RenderedFormat::Box => "box",
            RenderedFormat::Unlv => "unlv",
            RenderedFormat::Tsv => "tsv",
            RenderedFormat::Alto => "xml",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RenderedFormat::Text => "text",
            RenderedFormat::Hocr => "hocr",
            RenderedFormat::Pdf => "pdf",
            RenderedFormat::Box => "box",
            RenderedFormat::Unlv => "unlv",
            RenderedFormat::Tsv => "tsv",
            RenderedFormat::Alto => "alto",
        }
    }

    /// `<outputbase>.<extension>`
    pub fn output_path(self, outputbase: &Path) -> PathBuf {
        let mut path = outputbase.as_os_str().to_owned();
        path.push(".");
        path.push(self.extension());
        PathBuf::from(path)
    }
}

impl fmt::Display for RenderedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderedFormat {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, OcrError> {
        let needle = s.trim().to_lowercase();
        RenderedFormat::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == needle || f.extension() == needle)
            .ok_or_else(|| OcrError::InvalidArgument(format!("unknown output format '{}'", s)))
    }
}

/// One renderer producing one output format.
///
/// `E` is the engine whose recognition state `add_image` reads.
pub trait PageRenderer<E: ?Sized> {
    fn format(&self) -> RenderedFormat;

    /// Where the renderer writes its output
    fn output_path(&self) -> &Path;

    fn begin_document(&mut self, title: &str) -> bool;

    /// Consume the engine's current recognition result as one page
    fn add_image(&mut self, engine: &mut E) -> bool;

    fn end_document(&mut self) -> bool;

    /// Pages added so far
    fn image_num(&self) -> i32;
}

/// Document state: renderers created, nothing written
pub struct Created;
/// Document state: begun, accepting pages
pub struct Open;
/// Document state: ended, outputs readable
pub struct Closed;

/// Outcome of one format after the document was closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RenderOutcome {
    Written,
    Failed { message: String },
}

/// Per-format entry of a document report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedOutput {
    pub format: RenderedFormat,
    pub path: PathBuf,
    pub outcome: RenderOutcome,
}

impl RenderedOutput {
    pub fn is_written(&self) -> bool {
        self.outcome == RenderOutcome::Written
    }
}

/// Result of rendering one input into every requested format
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub input: PathBuf,
    pub outputbase: PathBuf,
    pub pages: u32,
    pub outputs: Vec<RenderedOutput>,
}

impl DocumentReport {
    pub fn output(&self, format: RenderedFormat) -> Option<&RenderedOutput> {
        self.outputs.iter().find(|o| o.format == format)
    }

    /// Formats that failed, with their messages
    pub fn failures(&self) -> Vec<(RenderedFormat, &str)> {
        self.outputs
            .iter()
            .filter_map(|o| match &o.outcome {
                RenderOutcome::Failed { message } => Some((o.format, message.as_str())),
                RenderOutcome::Written => None,
            })
            .collect()
    }
}

struct Slot<R> {
    renderer: R,
    failure: Option<String>,
}

impl<R> Slot<R> {
    fn fail(&mut self, format: RenderedFormat, message: &str) {
        tracing::warn!("Renderer '{}' failed: {}", format, message);
        self.failure = Some(message.to_string());
    }
}

/// Ordered renderer list driven through the document protocol
pub struct Document<E: OcrEngine, S> {
    slots: Vec<Slot<E::Renderer>>,
    /// Filled when the document is closed
    outputs: Vec<RenderedOutput>,
    pages: u32,
    _state: PhantomData<S>,
}

impl<E: OcrEngine, S> Document<E, S> {
    fn transition<T>(self) -> Document<E, T> {
        Document {
            slots: self.slots,
            outputs: self.outputs,
            pages: self.pages,
            _state: PhantomData,
        }
    }

    pub fn formats(&self) -> Vec<RenderedFormat> {
        self.slots
            .iter()
            .map(|s| s.renderer.format())
            .chain(self.outputs.iter().map(|o| o.format))
            .collect()
    }

    /// Pages added to the document
    pub fn pages(&self) -> u32 {
        self.pages
    }
}

impl<E: OcrEngine> Document<E, Created> {
    pub fn new(renderers: Vec<E::Renderer>) -> Self {
        Self {
            slots: renderers
                .into_iter()
                .map(|renderer| Slot {
                    renderer,
                    failure: None,
                })
                .collect(),
            outputs: Vec::new(),
            pages: 0,
            _state: PhantomData,
        }
    }

    /// Begin the document on every renderer
    pub fn begin(mut self, title: &str) -> Document<E, Open> {
        for slot in &mut self.slots {
            if !slot.renderer.begin_document(title) {
                let format = slot.renderer.format();
                slot.fail(format, "begin document failed");
            }
        }
        self.transition()
    }
}

impl<E: OcrEngine> Document<E, Open> {
    /// Hand the engine's current recognition result to every renderer still
    /// in good standing. Returns how many accepted the page.
    pub fn add_page(&mut self, engine: &mut E) -> usize {
        self.pages += 1;
        let mut accepted = 0;

        for slot in &mut self.slots {
            if slot.failure.is_some() {
                continue;
            }
            if slot.renderer.add_image(engine) {
                accepted += 1;
            } else {
                let format = slot.renderer.format();
                let message = format!("add image failed on page {}", self.pages);
                slot.fail(format, &message);
            }
        }

        accepted
    }

    /// Record a page that could not be recognized against every renderer
    pub fn fail_page(&mut self, message: &str) {
        self.pages += 1;
        for slot in &mut self.slots {
            if slot.failure.is_none() {
                let format = slot.renderer.format();
                slot.fail(format, message);
            }
        }
    }

    /// End the document on every renderer, then release the renderers
    pub fn end(mut self) -> Document<E, Closed> {
        for slot in &mut self.slots {
            if slot.failure.is_some() {
                continue;
            }
            if !slot.renderer.end_document() {
                let format = slot.renderer.format();
                slot.fail(format, "end document failed");
            }
        }

        self.outputs = self
            .slots
            .drain(..)
            .map(|slot| RenderedOutput {
                format: slot.renderer.format(),
                path: slot.renderer.output_path().to_path_buf(),
                outcome: match slot.failure {
                    Some(message) => RenderOutcome::Failed { message },
                    None => RenderOutcome::Written,
                },
            })
            .collect();
        self.transition()
    }
}

impl<E: OcrEngine> Document<E, Closed> {
    pub fn outputs(&self) -> &[RenderedOutput] {
        &self.outputs
    }

    /// Read the output of one format
    pub fn read(&self, format: RenderedFormat) -> Result<Vec<u8>, OcrError> {
        let output = self
            .outputs
            .iter()
            .find(|o| o.format == format)
            .ok_or_else(|| OcrError::InvalidArgument(format!("format '{}' was not requested", format)))?;

        if let RenderOutcome::Failed { message } = &output.outcome {
            return Err(OcrError::RenderError {
                format: format.to_string(),
                message: message.clone(),
            });
        }

        Ok(std::fs::read(&output.path)?)
    }

    pub fn into_report(self, input: &Path, outputbase: &Path) -> DocumentReport {
        DocumentReport {
            input: input.to_path_buf(),
            outputbase: outputbase.to_path_buf(),
            pages: self.pages,
            outputs: self.outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions_match_native_renderers() {
        assert_eq!(RenderedFormat::Text.extension(), "txt");
        assert_eq!(RenderedFormat::Hocr.extension(), "hocr");
        assert_eq!(RenderedFormat::Pdf.extension(), "pdf");
        assert_eq!(RenderedFormat::Alto.extension(), "xml");
    }

    #[test]
    fn test_output_path_appends_extension() {
        let path = RenderedFormat::Pdf.output_path(Path::new("test/results/docrenderer-1"));
        assert_eq!(path, PathBuf::from("test/results/docrenderer-1.pdf"));

        // a dot in the base name is kept, not replaced
        let path = RenderedFormat::Text.output_path(Path::new("out/scan.v2"));
        assert_eq!(path, PathBuf::from("out/scan.v2.txt"));
    }

    #[test]
    fn test_format_parses_name_or_extension() {
        assert_eq!("HOCR".parse::<RenderedFormat>().unwrap(), RenderedFormat::Hocr);
        assert_eq!("txt".parse::<RenderedFormat>().unwrap(), RenderedFormat::Text);
        assert!("docx".parse::<RenderedFormat>().is_err());
    }

    #[test]
    fn test_report_lists_failures_independently() {
        let report = DocumentReport {
            input: PathBuf::from("eurotext.png"),
            outputbase: PathBuf::from("out"),
            pages: 1,
            outputs: vec![
                RenderedOutput {
                    format: RenderedFormat::Text,
                    path: PathBuf::from("out.txt"),
                    outcome: RenderOutcome::Written,
                },
                RenderedOutput {
                    format: RenderedFormat::Pdf,
                    path: PathBuf::from("out.pdf"),
                    outcome: RenderOutcome::Failed {
                        message: "end document failed".to_string(),
                    },
                },
            ],
        };

        assert!(report.output(RenderedFormat::Text).unwrap().is_written());
        assert_eq!(report.failures(), vec![(RenderedFormat::Pdf, "end document failed")]);
    }
}
