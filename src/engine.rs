use crate::capi::{
    OcrEngineMode, Orientation, PageIteratorLevel, PageSegMode, ParagraphJustification, PolyBlockType,
    TextlineOrder, WritingDirection,
};
use crate::error::OcrError;
use crate::monitor::ProgressMonitor;
use crate::pixels::{PixelBuffer, Rect};
use crate::renderer::{PageRenderer, RenderedFormat};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Everything the engine needs at initialization time
#[derive(Debug, Clone, PartialEq)]
pub struct InitOptions {
    /// Directory holding `<lang>.traineddata`
    pub datapath: PathBuf,
    /// One or more languages joined with `+`
    pub language: String,
    pub engine_mode: OcrEngineMode,
    /// Config file names (e.g. "digits", "hocr") read during init
    pub configs: Vec<String>,
    /// Variables that only take effect when set during init
    pub variables: Vec<(String, String)>,
    /// Only apply non-debug variables from `variables`
    pub set_only_non_debug_params: bool,
}

/// Trait that every OCR engine handle must implement.
///
/// Mirrors the native handle lifecycle; the façade in [`crate::tesseract`]
/// decides call order. Implementations own exactly one engine instance and
/// release it when dropped.
pub trait OcrEngine {
    /// Result cursor; borrows the engine so recognition state cannot change
    /// while it is alive
    type Cursor<'a>: ResultCursor
    where
        Self: 'a;

    /// Layout-only cursor from page analysis
    type Layout<'a>: PageCursor
    where
        Self: 'a;

    /// One output-format renderer
    type Renderer: PageRenderer<Self>;

    /// Returns the engine identifier (e.g., "tesseract")
    fn name(&self) -> &'static str;

    /// Native library version string
    fn version(&self) -> String;

    fn init(&mut self, options: &InitOptions) -> Result<(), OcrError>;

    /// Release language data; the handle stays valid and may be initialized again
    fn end(&mut self);

    /// Forget the current image and recognition results
    fn clear(&mut self);

    fn datapath(&self) -> Option<String>;

    fn init_languages(&self) -> Option<String>;

    fn loaded_languages(&self) -> Vec<String>;

    fn available_languages(&self) -> Vec<String>;

    /// Returns false when the engine does not know the variable
    fn set_variable(&mut self, name: &str, value: &str) -> bool;

    fn string_variable(&self, name: &str) -> Option<String>;

    fn set_page_seg_mode(&mut self, mode: PageSegMode);

    fn page_seg_mode(&self) -> Result<PageSegMode, OcrError>;

    fn set_input_name(&mut self, name: &str);

    fn set_source_resolution(&mut self, ppi: u32);

    fn set_image(&mut self, image: &PixelBuffer<'_>);

    fn set_rectangle(&mut self, rect: Rect);

    /// Blocks until recognition finishes, fails or is cancelled
    fn recognize(&mut self, monitor: Option<&ProgressMonitor>) -> Result<(), OcrError>;

    /// `None` when the engine has nothing to read (no image, not initialized)
    fn utf8_text(&mut self) -> Option<String>;

    fn hocr_text(&mut self, page: u32) -> Option<String>;

    fn mean_text_conf(&mut self) -> i32;

    fn result_cursor(&mut self) -> Option<Self::Cursor<'_>>;

    fn analyse_layout(&mut self) -> Option<Self::Layout<'_>>;

    fn create_renderer(&mut self, format: RenderedFormat, outputbase: &Path) -> Result<Self::Renderer, OcrError>;
}

/// Forward-only traversal over page layout elements
pub trait PageCursor {
    /// Reset to the first element of the page
    fn begin(&mut self);

    /// Move to the next element at `level`; false when none remains
    fn advance(&mut self, level: PageIteratorLevel) -> bool;

    fn is_at_beginning_of(&self, level: PageIteratorLevel) -> bool;

    fn is_at_final_element(&self, level: PageIteratorLevel, element: PageIteratorLevel) -> bool;

    /// `None` when the cursor is not on an element at `level`
    fn bounding_box(&self, level: PageIteratorLevel) -> Option<BoundingBox>;

    fn block_type(&self) -> Option<PolyBlockType>;

    fn baseline(&self, level: PageIteratorLevel) -> Option<Baseline>;

    fn orientation(&mut self) -> Option<PageOrientation>;

    fn paragraph_info(&mut self) -> Option<ParagraphInfo>;
}

/// Page traversal with recognition results attached
pub trait ResultCursor: PageCursor {
    fn text(&self, level: PageIteratorLevel) -> Option<String>;

    fn confidence(&self, level: PageIteratorLevel) -> f32;

    fn word_font_attributes(&self) -> Option<FontAttributes>;

    fn word_recognition_language(&self) -> Option<String>;

    fn word_is_from_dictionary(&self) -> bool;

    fn word_is_numeric(&self) -> bool;
}

/// Pixel bounds of an element (right/bottom exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// True when this box lies entirely inside `rect`
    pub fn within(&self, rect: Rect) -> bool {
        self.left >= rect.left as i32
            && self.top >= rect.top as i32
            && self.right <= rect.right() as i32
            && self.bottom <= rect.bottom() as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Baseline {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// Orientation of the page or block the cursor is in
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageOrientation {
    pub orientation: Orientation,
    pub writing_direction: WritingDirection,
    pub textline_order: TextlineOrder,
    /// Radians; rotate by this to level the text
    pub deskew_angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParagraphInfo {
    pub justification: ParagraphJustification,
    pub is_list_item: bool,
    pub is_crown: bool,
    pub first_line_indent: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontAttributes {
    pub font_name: String,
    pub is_bold: bool,
    pub is_italic: bool,
    pub is_underlined: bool,
    pub is_monospace: bool,
    pub is_serif: bool,
    pub is_smallcaps: bool,
    pub pointsize: i32,
    pub font_id: i32,
}
