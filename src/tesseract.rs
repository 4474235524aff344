//! Lifecycle façade over an [`OcrEngine`].
//!
//! [`Tesseract`] owns one engine and drives it in the order the native API
//! requires: initialize, configure, set an image (and optional rectangle),
//! recognize, then read text, iterators or renderer output. Configuration is
//! applied when the engine is initialized and on first use after
//! [`Tesseract::set_config`], never in the middle of a call.

use crate::capi::PageIteratorLevel;
use crate::config::TessConfig;
use crate::decode;
use crate::deskew::{self, SkewEstimator};
use crate::engine::{InitOptions, OcrEngine, PageOrientation};
use crate::error::OcrError;
use crate::iterator::{ElementCursor, TextElement};
use crate::monitor::ProgressMonitor;
use crate::pixels::{PixelBuffer, Rect};
use crate::renderer::{Document, DocumentReport, RenderOutcome, RenderedFormat, RenderedOutput};
use crate::tessdata;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How often [`Tesseract::recognize_with_progress`] samples the monitor
pub const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(50);

const HOCR_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\"\n    \
\"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\">\n\
<html xmlns=\"http://www.w3.org/1999/xhtml\" xml:lang=\"en\" lang=\"en\">\n \
<head>\n  <title></title>\n  \
<meta http-equiv=\"Content-Type\" content=\"text/html;charset=utf-8\"/>\n  \
<meta name='ocr-system' content='tesseract'/>\n  \
<meta name='ocr-capabilities' content='ocr_page ocr_carea ocr_par ocr_line ocrx_word'/>\n \
</head>\n <body>\n";

const HOCR_FOOTER: &str = " </body>\n</html>\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Created,
    Initialized,
    ImageSet,
    Recognized,
}

/// Raises the observer's stop flag when dropped
struct StopOnDrop<'a>(&'a AtomicBool);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Owns an engine and sequences every call into it
pub struct Tesseract<E: OcrEngine> {
    engine: E,
    config: TessConfig,
    stage: Stage,
    /// Config changed since the last init
    stale: bool,
}

impl<E: OcrEngine> Tesseract<E> {
    /// Wrap an engine. Nothing is initialized until first use or [`init`](Self::init).
    pub fn new(engine: E, config: TessConfig) -> Self {
        Self {
            engine,
            config,
            stage: Stage::Created,
            stale: false,
        }
    }

    pub fn config(&self) -> &TessConfig {
        &self.config
    }

    /// Replace the configuration; it takes effect on the next operation
    pub fn set_config(&mut self, config: TessConfig) {
        self.config = config;
        self.stale = true;
    }

    /// Set one variable now (if initialized) and keep it for later inits
    pub fn set_variable(&mut self, name: &str, value: &str) -> Result<(), OcrError> {
        if self.stage > Stage::Created && !self.stale && !self.engine.set_variable(name, value) {
            return Err(OcrError::UnknownVariable(name.to_string()));
        }
        self.config.set_variable(name, value);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.stage > Stage::Created
    }

    /// Initialize the engine from the current configuration.
    ///
    /// An engine that is already initialized is ended first.
    pub fn init(&mut self) -> Result<(), OcrError> {
        if self.stage > Stage::Created {
            tracing::debug!("Ending {} before re-initialization", self.engine.name());
            self.engine.end();
            self.stage = Stage::Created;
        }

        let datapath = tessdata::resolve_datapath(&self.config)?;
        let options = InitOptions {
            datapath,
            language: self.config.language.clone(),
            engine_mode: self.config.engine_mode,
            configs: self.config.configs.clone(),
            variables: self.config.init_variables.clone(),
            set_only_non_debug_params: false,
        };

        self.engine.init(&options)?;

        for (name, value) in &self.config.variables {
            if !self.engine.set_variable(name, value) {
                self.engine.end();
                return Err(OcrError::UnknownVariable(name.clone()));
            }
        }
        self.engine.set_page_seg_mode(self.config.page_seg_mode);

        self.stage = Stage::Initialized;
        self.stale = false;

        tracing::info!(
            "{} initialized (datapath: {:?}, language: {}, oem: {}, psm: {})",
            self.engine.name(),
            options.datapath,
            options.language,
            options.engine_mode,
            self.config.page_seg_mode
        );
        Ok(())
    }

    fn ensure_initialized(&mut self) -> Result<(), OcrError> {
        if self.stage == Stage::Created || self.stale {
            self.init()?;
        }
        Ok(())
    }

    /// Release language data; the next operation initializes again
    pub fn end(&mut self) {
        if self.stage > Stage::Created {
            self.engine.end();
            self.stage = Stage::Created;
        }
    }

    /// Forget the current image and results, keeping the engine initialized
    pub fn clear(&mut self) {
        if self.stage > Stage::Initialized {
            self.engine.clear();
            self.stage = Stage::Initialized;
        }
    }

    fn set_image(&mut self, buffer: &PixelBuffer<'_>, rect: Option<Rect>) -> Result<(), OcrError> {
        let region = rect
            .map(|r| r.clip_to(buffer.width(), buffer.height()))
            .transpose()?;

        self.ensure_initialized()?;
        self.engine.set_image(buffer);
        if let Some(ppi) = self.config.source_resolution {
            self.engine.set_source_resolution(ppi);
        }
        if let Some(region) = region {
            tracing::debug!("Restricting recognition to {}", region);
            self.engine.set_rectangle(region);
        }
        self.stage = Stage::ImageSet;
        Ok(())
    }

    /// Provide an image and recognize it.
    ///
    /// `rect` is clipped to the image; a rectangle outside it is an error.
    /// With a `monitor`, progress is written into it and cancellation or its
    /// deadline stop the engine early.
    pub fn recognize(
        &mut self,
        buffer: &PixelBuffer<'_>,
        rect: Option<Rect>,
        monitor: Option<&ProgressMonitor>,
    ) -> Result<(), OcrError> {
        self.set_image(buffer, rect)?;

        if let Err(e) = self.engine.recognize(monitor) {
            if monitor.is_some_and(ProgressMonitor::is_cancelled) {
                tracing::info!("Recognition cancelled");
                return Err(OcrError::Cancelled);
            }
            return Err(e);
        }

        self.stage = Stage::Recognized;
        Ok(())
    }

    /// Recognize while an observer thread reports progress through `report`.
    ///
    /// `report` is called whenever the progress value changes and once more
    /// after recognition returns. The observer only reads the monitor.
    pub fn recognize_with_progress<F>(
        &mut self,
        buffer: &PixelBuffer<'_>,
        rect: Option<Rect>,
        monitor: &ProgressMonitor,
        mut report: F,
    ) -> Result<(), OcrError>
    where
        F: FnMut(&ProgressMonitor) + Send,
    {
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            let done = &done;
            let observer = scope.spawn(move || {
                let mut last = -1;
                while !done.load(Ordering::Acquire) {
                    let progress = monitor.progress();
                    if progress != last {
                        report(monitor);
                        last = progress;
                    }
                    std::thread::sleep(PROGRESS_POLL_INTERVAL);
                }
                report(monitor);
            });

            let result = {
                // raised on unwind as well
                let _stop = StopOnDrop(done);
                self.recognize(buffer, rect, Some(monitor))
            };

            if let Err(panic) = observer.join() {
                std::panic::resume_unwind(panic);
            }
            result
        })
    }

    /// Plain text of the current recognition result.
    ///
    /// `None` when no image has been provided; `Some("")` when recognition
    /// found nothing.
    pub fn text(&mut self) -> Option<String> {
        if self.stage < Stage::ImageSet {
            return None;
        }
        self.engine.utf8_text()
    }

    /// hOCR markup for the current result, numbered as `page` (0-based)
    pub fn hocr_text(&mut self, page: u32) -> Option<String> {
        if self.stage < Stage::ImageSet {
            return None;
        }
        self.engine.hocr_text(page)
    }

    /// Mean word confidence (0-100) of the current result
    pub fn mean_confidence(&mut self) -> Option<i32> {
        if self.stage < Stage::Recognized {
            return None;
        }
        Some(self.engine.mean_text_conf())
    }

    fn page_output(&mut self, page: u32) -> String {
        let output = if self.config.hocr {
            self.hocr_text(page)
        } else {
            self.text()
        };
        output.unwrap_or_default()
    }

    fn ocr_pages(&mut self, pages: &[DynamicImage], rect: Option<Rect>, input: Option<&Path>) -> Result<String, OcrError> {
        let mut result = String::new();

        for (index, page) in pages.iter().enumerate() {
            let buffer = PixelBuffer::from_image(page)?;
            if let Some(input) = input {
                self.ensure_initialized()?;
                self.engine.set_input_name(&input.to_string_lossy());
            }
            self.recognize(&buffer, rect, None)?;
            result.push_str(&self.page_output(index as u32));
            tracing::debug!("Recognized page {} of {}", index + 1, pages.len());
        }

        if self.config.hocr {
            result.insert_str(0, HOCR_HEADER);
            result.push_str(HOCR_FOOTER);
        }
        Ok(result)
    }

    /// Recognize one decoded image
    pub fn do_ocr(&mut self, image: &DynamicImage) -> Result<String, OcrError> {
        self.ocr_pages(std::slice::from_ref(image), None, None)
    }

    /// Recognize the part of `image` inside `rect`
    pub fn do_ocr_region(&mut self, image: &DynamicImage, rect: Rect) -> Result<String, OcrError> {
        self.ocr_pages(std::slice::from_ref(image), Some(rect), None)
    }

    /// Recognize every page in order and concatenate the results
    pub fn do_ocr_pages(&mut self, pages: &[DynamicImage], rect: Option<Rect>) -> Result<String, OcrError> {
        self.ocr_pages(pages, rect, None)
    }

    /// Recognize raw pixels
    pub fn do_ocr_buffer(&mut self, buffer: &PixelBuffer<'_>, rect: Option<Rect>) -> Result<String, OcrError> {
        self.recognize(buffer, rect, None)?;
        let mut output = self.page_output(0);
        if self.config.hocr {
            output.insert_str(0, HOCR_HEADER);
            output.push_str(HOCR_FOOTER);
        }
        Ok(output)
    }

    /// Decode and recognize a file (any raster format or a PDF).
    ///
    /// The file name is passed to the engine as the input name, so a UNLV
    /// zone file (`<name>.uzn`) beside the image is honoured by page
    /// segmentation modes without column finding.
    pub fn do_ocr_file(&mut self, path: &Path) -> Result<String, OcrError> {
        self.do_ocr_file_region(path, None)
    }

    pub fn do_ocr_file_region(&mut self, path: &Path, rect: Option<Rect>) -> Result<String, OcrError> {
        let pages = decode::load_pages(path)?;
        if pages.is_empty() {
            return Err(OcrError::ProcessingError(format!("{} has no pages", path.display())));
        }
        tracing::info!("Recognizing {} page(s) from {:?}", pages.len(), path);
        self.ocr_pages(&pages, rect, Some(path))
    }

    /// Cursor over the elements of the current result, or `None` before
    /// recognition
    pub fn elements(&mut self, level: PageIteratorLevel) -> Option<ElementCursor<E::Cursor<'_>>> {
        if self.stage < Stage::Recognized {
            return None;
        }
        self.engine
            .result_cursor()
            .map(|cursor| ElementCursor::new(cursor, level))
    }

    /// Recognize `image` and collect every element at `level`
    pub fn text_elements(&mut self, image: &DynamicImage, level: PageIteratorLevel) -> Result<Vec<TextElement>, OcrError> {
        let buffer = PixelBuffer::from_image(image)?;
        self.recognize(&buffer, None, None)?;

        Ok(match self.elements(level) {
            Some(mut cursor) => cursor.elements().collect(),
            None => Vec::new(),
        })
    }

    /// Run layout analysis only and return a cursor over its elements.
    ///
    /// The engine keeps its own copy of the pixels, so `buffer` may be
    /// dropped while the cursor is alive.
    pub fn analyse_layout(
        &mut self,
        buffer: &PixelBuffer<'_>,
        level: PageIteratorLevel,
    ) -> Result<ElementCursor<E::Layout<'_>>, OcrError> {
        self.set_image(buffer, None)?;
        self.engine
            .analyse_layout()
            .map(|cursor| ElementCursor::new(cursor, level))
            .ok_or_else(|| OcrError::ProcessingError("layout analysis found no page content".to_string()))
    }

    /// Orientation of the first block on the page
    pub fn page_orientation(&mut self, buffer: &PixelBuffer<'_>) -> Result<Option<PageOrientation>, OcrError> {
        let mut cursor = self.analyse_layout(buffer, PageIteratorLevel::Block)?;
        if !cursor.begin() {
            return Ok(None);
        }
        Ok(cursor.orientation())
    }

    /// Straighten a page before recognition using the configured threshold
    pub fn deskew(&self, image: DynamicImage, estimator: &dyn SkewEstimator) -> DynamicImage {
        deskew::correct_skew(image, estimator, self.config.min_deskew_angle).image
    }

    /// Render every input into every format, one document per input.
    ///
    /// `inputs[i]` is written to `outputbases[i]` plus each format's
    /// extension. Each page is recognized once and handed to every renderer.
    /// A format that fails is reported in its [`DocumentReport`] without
    /// affecting the other formats; inputs that cannot be decoded fail the
    /// whole call.
    pub fn create_documents<P, Q>(
        &mut self,
        inputs: &[P],
        outputbases: &[Q],
        formats: &[RenderedFormat],
    ) -> Result<Vec<DocumentReport>, OcrError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        if inputs.len() != outputbases.len() {
            return Err(OcrError::InvalidArgument(format!(
                "{} inputs but {} output bases",
                inputs.len(),
                outputbases.len()
            )));
        }
        if formats.is_empty() {
            return Err(OcrError::InvalidArgument("no output format requested".to_string()));
        }

        inputs
            .iter()
            .zip(outputbases)
            .map(|(input, outputbase)| self.create_document(input.as_ref(), outputbase.as_ref(), formats))
            .collect()
    }

    fn create_document(
        &mut self,
        input: &Path,
        outputbase: &Path,
        formats: &[RenderedFormat],
    ) -> Result<DocumentReport, OcrError> {
        let pages = decode::load_pages(input)?;
        self.ensure_initialized()?;

        if let Some(parent) = outputbase.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut renderers = Vec::with_capacity(formats.len());
        let mut unavailable = Vec::new();
        for &format in formats {
            match self.engine.create_renderer(format, outputbase) {
                Ok(renderer) => renderers.push(renderer),
                Err(e) => {
                    tracing::warn!("Cannot create {} renderer: {}", format, e);
                    unavailable.push(RenderedOutput {
                        format,
                        path: format.output_path(outputbase),
                        outcome: RenderOutcome::Failed { message: e.to_string() },
                    });
                }
            }
        }

        let title = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut document = Document::<E, _>::new(renderers).begin(&title);

        for (index, page) in pages.iter().enumerate() {
            let recognized = PixelBuffer::from_image(page).and_then(|buffer| {
                self.engine.set_input_name(&input.to_string_lossy());
                self.recognize(&buffer, None, None)
            });

            match recognized {
                Ok(()) => {
                    document.add_page(&mut self.engine);
                }
                Err(e) => document.fail_page(&format!("page {} not recognized: {}", index + 1, e)),
            }
        }

        let mut report = document.end().into_report(input, outputbase);
        report.outputs.extend(unavailable);

        tracing::info!(
            "Rendered {:?} ({} page(s)) to {:?}: {} format(s) failed",
            input,
            report.pages,
            outputbase,
            report.failures().len()
        );
        Ok(report)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Direct engine access. Any state changed here is outside the façade's
    /// sequencing, so results read afterwards reflect whatever the engine holds.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }
}

/// Resolve the output base for `input` inside `dir`: the file stem, so
/// `scans/page.png` renders to `dir/page.<ext>`
pub fn outputbase_for(input: &Path, dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "output".into());
    dir.join(stem)
}
