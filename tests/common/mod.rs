//! Scripted engine used by the integration tests.
//!
//! `FakeEngine` "recognizes" a fixed page of words with fixed boxes, honours
//! rectangles, the character whitelist and the `digits` config, and logs
//! every call so tests can check the order the façade uses.

#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Luma};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tessapi::capi::{
    Orientation, PageIteratorLevel, PageSegMode, PolyBlockType, TextlineOrder, WritingDirection,
};
use tessapi::config::TessConfig;
use tessapi::engine::{
    Baseline, BoundingBox, FontAttributes, InitOptions, OcrEngine, PageCursor, PageOrientation, ParagraphInfo,
    ResultCursor,
};
use tessapi::monitor::ProgressMonitor;
use tessapi::pixels::{PixelBuffer, Rect};
use tessapi::renderer::{PageRenderer, RenderedFormat};
use tessapi::OcrError;

pub const EUROTEXT: &str = "The (quick) [brown] {fox} jumps!\nOver the $43,456.78 <lazy> #90 dog";

pub const DIGITS: &str = "-0123456789.";

/// Shared call log; outlives the engine so drops can be observed
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries with the argument part (after ':') stripped
    pub fn calls(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|e| e.split(':').next().unwrap_or_default().to_string())
            .collect()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeWord {
    pub text: String,
    pub line: usize,
    pub bbox: BoundingBox,
}

/// The eurotext transcript laid out as two lines of words on a 1024x800 page
pub fn eurotext_words() -> Vec<FakeWord> {
    EUROTEXT
        .lines()
        .enumerate()
        .flat_map(|(line, text)| {
            let top = 40 + line as i32 * 60;
            text.split(' ').enumerate().map(move |(i, word)| {
                let left = 30 + i as i32 * 120;
                FakeWord {
                    text: word.to_string(),
                    line,
                    bbox: BoundingBox {
                        left,
                        top,
                        right: left + 100,
                        bottom: top + 40,
                    },
                }
            })
        })
        .collect()
}

/// Blank page the size of the eurotext scan
pub fn blank_page() -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(1024, 800, Luma([255])))
}

/// Tessdata directory with stub traineddata files
pub fn tessdata(languages: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for language in languages {
        std::fs::write(dir.path().join(format!("{}.traineddata", language)), b"stub").unwrap();
    }
    dir
}

pub fn config_for(dir: &Path) -> TessConfig {
    TessConfig {
        datapath: Some(dir.to_path_buf()),
        ..TessConfig::default()
    }
}

const KNOWN_VARIABLES: &[&str] = &[
    "tessedit_char_whitelist",
    "tessedit_char_blacklist",
    "tessedit_create_hocr",
    "load_system_dawg",
    "load_freq_dawg",
    "user_defined_dpi",
    "preserve_interword_spaces",
];

pub struct FakeEngine {
    pub log: CallLog,
    words: Vec<FakeWord>,
    pub broken_formats: Vec<RenderedFormat>,
    pub missing_formats: Vec<RenderedFormat>,
    pub fail_init: bool,
    pub panic_on_recognize: bool,
    /// Renderers hold their output until dropped, like a buffered stream
    pub flush_on_drop: bool,
    datapath: Option<PathBuf>,
    language: Option<String>,
    variables: BTreeMap<String, String>,
    psm: PageSegMode,
    image: Option<(u32, u32)>,
    rect: Option<Rect>,
    recognized: bool,
}

impl FakeEngine {
    pub fn new(log: CallLog) -> Self {
        Self::with_words(log, eurotext_words())
    }

    pub fn with_words(log: CallLog, words: Vec<FakeWord>) -> Self {
        log.push("create");
        Self {
            log,
            words,
            broken_formats: Vec::new(),
            missing_formats: Vec::new(),
            fail_init: false,
            panic_on_recognize: false,
            flush_on_drop: false,
            datapath: None,
            language: None,
            variables: BTreeMap::new(),
            psm: PageSegMode::default(),
            image: None,
            rect: None,
            recognized: false,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Words inside the rectangle, with non-whitelisted characters dropped
    fn visible_words(&self) -> Vec<FakeWord> {
        let whitelist = self.variable("tessedit_char_whitelist").filter(|w| !w.is_empty());

        self.words
            .iter()
            .filter(|w| self.rect.map_or(true, |r| w.bbox.within(r)))
            .filter_map(|w| {
                let text: String = match whitelist {
                    Some(allowed) => w.text.chars().filter(|c| allowed.contains(*c)).collect(),
                    None => w.text.clone(),
                };
                (!text.is_empty()).then(|| FakeWord { text, ..w.clone() })
            })
            .collect()
    }

    fn page_text(&self) -> String {
        let words = self.visible_words();
        let mut text = String::new();
        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                text.push(if words[i - 1].line == word.line { ' ' } else { '\n' });
            }
            text.push_str(&word.text);
        }
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }

    fn page_hocr(&self, page: u32) -> String {
        let (width, height) = self.image.unwrap_or_default();
        let mut hocr = format!(
            "  <div class='ocr_page' id='page_{}' title='bbox 0 0 {} {}'>\n",
            page + 1,
            width,
            height
        );
        for (i, word) in self.visible_words().iter().enumerate() {
            let b = word.bbox;
            hocr.push_str(&format!(
                "   <span class='ocrx_word' id='word_{}_{}' title='bbox {} {} {} {}'>{}</span>\n",
                page + 1,
                i + 1,
                b.left,
                b.top,
                b.right,
                b.bottom,
                word.text
            ));
        }
        hocr.push_str("  </div>\n");
        hocr
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.log.push("delete");
    }
}

impl OcrEngine for FakeEngine {
    type Cursor<'a> = FakeCursor<'a>;
    type Layout<'a> = FakeCursor<'a>;
    type Renderer = FakeRenderer;

    fn name(&self) -> &'static str {
        "fake"
    }

    fn version(&self) -> String {
        "5.3.0-fake".to_string()
    }

    fn init(&mut self, options: &InitOptions) -> Result<(), OcrError> {
        self.log.push(format!("init:{}", options.language));
        if self.fail_init {
            return Err(OcrError::InitializationError("scripted failure".to_string()));
        }
        for config in &options.configs {
            if config == "digits" {
                self.variables
                    .insert("tessedit_char_whitelist".to_string(), DIGITS.to_string());
            }
        }
        for (name, value) in &options.variables {
            self.variables.insert(name.clone(), value.clone());
        }
        self.datapath = Some(options.datapath.clone());
        self.language = Some(options.language.clone());
        Ok(())
    }

    fn end(&mut self) {
        self.log.push("end");
        self.datapath = None;
        self.language = None;
        self.variables.clear();
        self.image = None;
        self.rect = None;
        self.recognized = false;
    }

    fn clear(&mut self) {
        self.log.push("clear");
        self.image = None;
        self.rect = None;
        self.recognized = false;
    }

    fn datapath(&self) -> Option<String> {
        self.datapath.as_ref().map(|p| p.to_string_lossy().into_owned())
    }

    fn init_languages(&self) -> Option<String> {
        self.language.clone()
    }

    fn loaded_languages(&self) -> Vec<String> {
        self.language
            .iter()
            .flat_map(|l| l.split('+'))
            .map(str::to_string)
            .collect()
    }

    fn available_languages(&self) -> Vec<String> {
        let Some(dir) = &self.datapath else {
            return Vec::new();
        };
        tessapi::tessdata::installed_languages(dir).unwrap_or_default()
    }

    fn set_variable(&mut self, name: &str, value: &str) -> bool {
        self.log.push(format!("set_variable:{}={}", name, value));
        if !KNOWN_VARIABLES.contains(&name) {
            return false;
        }
        self.variables.insert(name.to_string(), value.to_string());
        true
    }

    fn string_variable(&self, name: &str) -> Option<String> {
        self.variables.get(name).cloned()
    }

    fn set_page_seg_mode(&mut self, mode: PageSegMode) {
        self.log.push(format!("psm:{}", mode.as_raw()));
        self.psm = mode;
    }

    fn page_seg_mode(&self) -> Result<PageSegMode, OcrError> {
        Ok(self.psm)
    }

    fn set_input_name(&mut self, name: &str) {
        self.log.push(format!("input_name:{}", name));
    }

    fn set_source_resolution(&mut self, ppi: u32) {
        self.log.push(format!("resolution:{}", ppi));
    }

    fn set_image(&mut self, image: &PixelBuffer<'_>) {
        self.log.push(format!(
            "set_image:{}x{}x{}",
            image.width(),
            image.height(),
            image.bytes_per_pixel()
        ));
        self.image = Some((image.width(), image.height()));
        self.rect = None;
        self.recognized = false;
    }

    fn set_rectangle(&mut self, rect: Rect) {
        self.log.push(format!("set_rectangle:{}", rect));
        self.rect = Some(rect);
    }

    fn recognize(&mut self, monitor: Option<&ProgressMonitor>) -> Result<(), OcrError> {
        self.log.push("recognize");
        if self.panic_on_recognize {
            panic!("scripted recognition panic");
        }
        if self.image.is_none() {
            return Err(OcrError::ProcessingError("no image".to_string()));
        }

        if let Some(monitor) = monitor {
            let total = self.words.len().max(1);
            for done in 0..=self.words.len() {
                if monitor.is_cancelled() {
                    return Err(OcrError::ProcessingError("cancelled by monitor".to_string()));
                }
                monitor.record_words(done as i32);
                monitor.record_progress((done * 100 / total) as i32);
            }
        }

        self.recognized = true;
        Ok(())
    }

    fn utf8_text(&mut self) -> Option<String> {
        self.log.push("utf8_text");
        self.image?;
        Some(self.page_text())
    }

    fn hocr_text(&mut self, page: u32) -> Option<String> {
        self.log.push(format!("hocr_text:{}", page));
        self.image?;
        Some(self.page_hocr(page))
    }

    fn mean_text_conf(&mut self) -> i32 {
        if self.visible_words().is_empty() {
            0
        } else {
            87
        }
    }

    fn result_cursor(&mut self) -> Option<FakeCursor<'_>> {
        self.log.push("result_cursor");
        if !self.recognized {
            return None;
        }
        Some(FakeCursor::new(self.visible_words()))
    }

    fn analyse_layout(&mut self) -> Option<FakeCursor<'_>> {
        self.log.push("analyse_layout");
        self.image?;
        Some(FakeCursor::new(self.words.clone()))
    }

    fn create_renderer(&mut self, format: RenderedFormat, outputbase: &Path) -> Result<FakeRenderer, OcrError> {
        self.log.push(format!("create_renderer:{}", format));
        if self.missing_formats.contains(&format) {
            return Err(OcrError::RenderError {
                format: format.to_string(),
                message: "renderer could not be created".to_string(),
            });
        }
        Ok(FakeRenderer {
            format,
            path: format.output_path(outputbase),
            pages: Vec::new(),
            title: String::new(),
            broken: self.broken_formats.contains(&format),
            flush_on_drop: self.flush_on_drop,
            pending: None,
            log: self.log.clone(),
        })
    }
}

/// Cursor over a snapshot of the page, at word or line granularity
pub struct FakeCursor<'a> {
    words: Vec<FakeWord>,
    index: usize,
    _engine: PhantomData<&'a mut FakeEngine>,
}

impl FakeCursor<'_> {
    fn new(words: Vec<FakeWord>) -> Self {
        Self {
            words,
            index: 0,
            _engine: PhantomData,
        }
    }

    fn current(&self) -> Option<&FakeWord> {
        self.words.get(self.index)
    }

    /// Words making up the element at `level` that contains the current word
    fn element(&self, level: PageIteratorLevel) -> Vec<&FakeWord> {
        let Some(current) = self.current() else {
            return Vec::new();
        };
        match level {
            PageIteratorLevel::Word | PageIteratorLevel::Symbol => vec![current],
            PageIteratorLevel::TextLine => self.words.iter().filter(|w| w.line == current.line).collect(),
            PageIteratorLevel::Block | PageIteratorLevel::Para => self.words.iter().collect(),
        }
    }
}

impl PageCursor for FakeCursor<'_> {
    fn begin(&mut self) {
        self.index = 0;
    }

    fn advance(&mut self, level: PageIteratorLevel) -> bool {
        let Some(current) = self.current().cloned() else {
            return false;
        };
        self.index = match level {
            PageIteratorLevel::Word | PageIteratorLevel::Symbol => self.index + 1,
            PageIteratorLevel::TextLine => self
                .words
                .iter()
                .position(|w| w.line > current.line)
                .unwrap_or(self.words.len()),
            PageIteratorLevel::Block | PageIteratorLevel::Para => self.words.len(),
        };
        self.index < self.words.len()
    }

    fn is_at_beginning_of(&self, level: PageIteratorLevel) -> bool {
        self.element(level).first().is_some_and(|w| Some(*w) == self.current())
    }

    fn is_at_final_element(&self, level: PageIteratorLevel, _element: PageIteratorLevel) -> bool {
        self.element(level).last().is_some_and(|w| Some(*w) == self.current())
    }

    fn bounding_box(&self, level: PageIteratorLevel) -> Option<BoundingBox> {
        let words = self.element(level);
        let first = words.first()?.bbox;
        Some(words.iter().fold(first, |acc, w| BoundingBox {
            left: acc.left.min(w.bbox.left),
            top: acc.top.min(w.bbox.top),
            right: acc.right.max(w.bbox.right),
            bottom: acc.bottom.max(w.bbox.bottom),
        }))
    }

    fn block_type(&self) -> Option<PolyBlockType> {
        self.current().map(|_| PolyBlockType::FlowingText)
    }

    fn baseline(&self, level: PageIteratorLevel) -> Option<Baseline> {
        let b = self.bounding_box(level)?;
        Some(Baseline {
            x1: b.left,
            y1: b.bottom - 8,
            x2: b.right,
            y2: b.bottom - 8,
        })
    }

    fn orientation(&mut self) -> Option<PageOrientation> {
        self.current()?;
        Some(PageOrientation {
            orientation: Orientation::PageUp,
            writing_direction: WritingDirection::LeftToRight,
            textline_order: TextlineOrder::TopToBottom,
            deskew_angle: 0.0,
        })
    }

    fn paragraph_info(&mut self) -> Option<ParagraphInfo> {
        None
    }
}

impl ResultCursor for FakeCursor<'_> {
    fn text(&self, level: PageIteratorLevel) -> Option<String> {
        let words = self.element(level);
        if words.is_empty() {
            return None;
        }
        let joined = words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");
        Some(match level {
            PageIteratorLevel::Word | PageIteratorLevel::Symbol => joined,
            _ => format!("{}\n", joined),
        })
    }

    fn confidence(&self, _level: PageIteratorLevel) -> f32 {
        if self.current().is_some() {
            91.0
        } else {
            0.0
        }
    }

    fn word_font_attributes(&self) -> Option<FontAttributes> {
        self.current()?;
        Some(FontAttributes {
            font_name: "Times_New_Roman".to_string(),
            is_bold: false,
            is_italic: false,
            is_underlined: false,
            is_monospace: false,
            is_serif: true,
            is_smallcaps: false,
            pointsize: 12,
            font_id: 1,
        })
    }

    fn word_recognition_language(&self) -> Option<String> {
        self.current().map(|_| "eng".to_string())
    }

    fn word_is_from_dictionary(&self) -> bool {
        self.current()
            .is_some_and(|w| w.text.chars().all(char::is_alphabetic))
    }

    fn word_is_numeric(&self) -> bool {
        self.current()
            .is_some_and(|w| w.text.chars().all(|c| c.is_ascii_digit()))
    }
}

/// Renderer writing a simplified version of each format to disk at end-document
pub struct FakeRenderer {
    format: RenderedFormat,
    path: PathBuf,
    pages: Vec<String>,
    title: String,
    broken: bool,
    flush_on_drop: bool,
    pending: Option<String>,
    log: CallLog,
}

impl Drop for FakeRenderer {
    fn drop(&mut self) {
        self.log.push(format!("drop_renderer:{}", self.format));
        if let Some(content) = self.pending.take() {
            std::fs::write(&self.path, content).unwrap();
        }
    }
}

impl PageRenderer<FakeEngine> for FakeRenderer {
    fn format(&self) -> RenderedFormat {
        self.format
    }

    fn output_path(&self) -> &Path {
        &self.path
    }

    fn begin_document(&mut self, title: &str) -> bool {
        self.log.push(format!("begin_document:{}", self.format));
        self.title = title.to_string();
        true
    }

    fn add_image(&mut self, engine: &mut FakeEngine) -> bool {
        self.log.push(format!("add_image:{}", self.format));
        let page = self.pages.len() as u32;
        let content = match self.format {
            RenderedFormat::Hocr => engine.hocr_text(page),
            _ => engine.utf8_text(),
        };
        match content {
            Some(content) => {
                self.pages.push(content);
                true
            }
            None => false,
        }
    }

    fn end_document(&mut self) -> bool {
        self.log.push(format!("end_document:{}", self.format));
        if self.broken {
            return false;
        }

        let body = self.pages.concat();
        let content = match self.format {
            RenderedFormat::Hocr => format!(
                "<html>\n <head><title>{}</title></head>\n <body>\n{} </body>\n</html>\n",
                self.title, body
            ),
            RenderedFormat::Pdf => format!("%PDF-1.5\n% {} page(s)\n{}%%EOF\n", self.pages.len(), body),
            _ => body,
        };
        if self.flush_on_drop {
            self.pending = Some(content);
            return true;
        }
        std::fs::write(&self.path, content).is_ok()
    }

    fn image_num(&self) -> i32 {
        self.pages.len() as i32
    }
}
