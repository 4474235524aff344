//! Tesseract engine over the C API
//!
//! [`BaseApi`] owns one `TessBaseAPI*` and releases it when dropped. Every
//! call goes straight to the native library; the call order is left to the
//! [`crate::tesseract::Tesseract`] façade.
//!
//! The native engine object behind the handle only exists between a
//! successful `Init` and `End`. Accessors that read it (datapath, parameters,
//! dictionary lookups) answer `None` or an error outside that window instead
//! of calling into the library.

mod iterator;
mod monitor;
mod renderer;
mod text;

pub use iterator::{LayoutIterator, PageIteratorView, ResultIterator};
pub use renderer::NativeRenderer;

use self::monitor::NativeMonitor;
use self::text::{borrowed_text, take_int_array, take_text, take_text_array};
use crate::capi::{sys, OcrEngineMode, PageSegMode};
use crate::engine::{InitOptions, OcrEngine};
use crate::error::OcrError;
use crate::monitor::ProgressMonitor;
use crate::pixels::{PixelBuffer, Rect};
use crate::renderer::RenderedFormat;
use serde::Serialize;
use std::ffi::CString;
use std::os::raw::{c_char, c_double, c_float, c_int};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::time::Instant;

/// Result of orientation and script detection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrientationScript {
    /// Clockwise rotation of the page, in degrees
    pub orient_deg: i32,
    pub orient_conf: f32,
    pub script_name: Option<String>,
    pub script_conf: f32,
}

/// Owned native engine handle
pub struct BaseApi {
    handle: NonNull<sys::TessBaseAPI>,
    /// Language data loaded by a successful `Init`, not yet `End`ed
    initialized: bool,
}

// A handle may move to another thread; it is never shared between threads.
unsafe impl Send for BaseApi {}

impl BaseApi {
    pub fn new() -> Result<Self, OcrError> {
        let handle = NonNull::new(unsafe { sys::TessBaseAPICreate() })
            .ok_or_else(|| OcrError::InitializationError("TessBaseAPICreate returned null".to_string()))?;
        Ok(Self {
            handle,
            initialized: false,
        })
    }

    /// Whether language data is loaded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn require_init(&self, what: &str) -> Result<(), OcrError> {
        if self.initialized {
            Ok(())
        } else {
            Err(OcrError::InitializationError(format!("{} needs an initialized engine", what)))
        }
    }

    pub(crate) fn as_ptr(&mut self) -> *mut sys::TessBaseAPI {
        self.handle.as_ptr()
    }

    fn as_const(&self) -> *const sys::TessBaseAPI {
        self.handle.as_ptr()
    }

    /// Native library version, without needing a handle
    pub fn library_version() -> String {
        unsafe { borrowed_text(sys::TessVersion()) }.unwrap_or_default()
    }

    pub fn int_variable(&self, name: &str) -> Option<i32> {
        if !self.initialized {
            return None;
        }
        let name = CString::new(name).ok()?;
        let mut value: c_int = 0;
        let found = unsafe { sys::TessBaseAPIGetIntVariable(self.as_const(), name.as_ptr(), &mut value) };
        (found != sys::FALSE).then_some(value)
    }

    pub fn bool_variable(&self, name: &str) -> Option<bool> {
        if !self.initialized {
            return None;
        }
        let name = CString::new(name).ok()?;
        let mut value: sys::BOOL = sys::FALSE;
        let found = unsafe { sys::TessBaseAPIGetBoolVariable(self.as_const(), name.as_ptr(), &mut value) };
        (found != sys::FALSE).then_some(value != sys::FALSE)
    }

    pub fn double_variable(&self, name: &str) -> Option<f64> {
        if !self.initialized {
            return None;
        }
        let name = CString::new(name).ok()?;
        let mut value: c_double = 0.0;
        let found = unsafe { sys::TessBaseAPIGetDoubleVariable(self.as_const(), name.as_ptr(), &mut value) };
        (found != sys::FALSE).then_some(value)
    }

    /// Dump every engine variable with its current value to `path`
    pub fn print_variables_to_file(&self, path: &Path) -> Result<(), OcrError> {
        self.require_init("printing variables")?;
        let filename = CString::new(path.to_string_lossy().as_bytes())?;
        if unsafe { sys::TessBaseAPIPrintVariablesToFile(self.as_const(), filename.as_ptr()) } == sys::FALSE {
            return Err(OcrError::ProcessingError(format!(
                "could not write variables to {}",
                path.display()
            )));
        }
        Ok(())
    }

    /// Apply a config file after initialization
    pub fn read_config_file(&mut self, path: &Path) -> Result<(), OcrError> {
        self.require_init("reading a config file")?;
        let filename = CString::new(path.to_string_lossy().as_bytes())?;
        unsafe { sys::TessBaseAPIReadConfigFile(self.as_ptr(), filename.as_ptr()) };
        Ok(())
    }

    /// Prepare for layout analysis without loading recognition data
    pub fn init_for_analyse_page(&mut self) {
        unsafe { sys::TessBaseAPIInitForAnalysePage(self.as_ptr()) }
    }

    pub fn engine_mode(&self) -> Result<OcrEngineMode, OcrError> {
        OcrEngineMode::try_from(unsafe { sys::TessBaseAPIOem(self.as_const()) })
    }

    /// One-shot recognition of a rectangle of raw pixels
    pub fn rect(&mut self, buffer: &PixelBuffer<'_>, rect: Rect) -> Result<String, OcrError> {
        let rect = rect.clip_to(buffer.width(), buffer.height())?;
        let text = unsafe {
            take_text(sys::TessBaseAPIRect(
                self.as_ptr(),
                buffer.data().as_ptr(),
                buffer.bytes_per_pixel() as c_int,
                buffer.bytes_per_line() as c_int,
                rect.left as c_int,
                rect.top as c_int,
                rect.width as c_int,
                rect.height as c_int,
            ))
        };
        text.ok_or_else(|| OcrError::ProcessingError(format!("recognition of {} failed", rect)))
    }

    /// Recognize every page of `input` and feed each one to `renderer`.
    ///
    /// The engine decodes `input` itself (leptonica formats, multi-page TIFF
    /// included). A `timeout_ms` of 0 means no limit.
    pub fn process_pages(
        &mut self,
        input: &Path,
        retry_config: Option<&str>,
        timeout_ms: u32,
        renderer: &mut NativeRenderer,
    ) -> Result<(), OcrError> {
        let filename = CString::new(input.to_string_lossy().as_bytes())?;
        let retry = retry_config.map(CString::new).transpose()?;
        let timeout = timeout_ms.min(c_int::MAX as u32) as c_int;

        let ok = unsafe {
            sys::TessBaseAPIProcessPages(
                self.as_ptr(),
                filename.as_ptr(),
                retry.as_ref().map_or(ptr::null(), |r| r.as_ptr()),
                timeout,
                renderer.as_ptr(),
            )
        };

        if ok == sys::FALSE {
            return Err(OcrError::ProcessingError(format!(
                "processing pages of {} failed",
                input.display()
            )));
        }
        Ok(())
    }

    /// Confidence of every recognized word, in reading order
    pub fn all_word_confidences(&mut self) -> Vec<i32> {
        unsafe { take_int_array(sys::TessBaseAPIAllWordConfidences(self.as_ptr())) }
    }

    pub fn alto_text(&mut self, page: u32) -> Option<String> {
        unsafe { take_text(sys::TessBaseAPIGetAltoText(self.as_ptr(), page as c_int)) }
    }

    pub fn tsv_text(&mut self, page: u32) -> Option<String> {
        unsafe { take_text(sys::TessBaseAPIGetTsvText(self.as_ptr(), page as c_int)) }
    }

    pub fn box_text(&mut self, page: u32) -> Option<String> {
        unsafe { take_text(sys::TessBaseAPIGetBoxText(self.as_ptr(), page as c_int)) }
    }

    pub fn unlv_text(&mut self) -> Option<String> {
        unsafe { take_text(sys::TessBaseAPIGetUNLVText(self.as_ptr())) }
    }

    /// Dictionary lookup; `None` before initialization
    pub fn is_valid_word(&mut self, word: &str) -> Option<bool> {
        if !self.initialized {
            return None;
        }
        let word = CString::new(word).ok()?;
        Some(unsafe { sys::TessBaseAPIIsValidWord(self.as_ptr(), word.as_ptr()) != 0 })
    }

    /// Orientation and script of the current image; needs `osd.traineddata`
    pub fn detect_orientation_script(&mut self) -> Option<OrientationScript> {
        let mut orient_deg: c_int = 0;
        let mut orient_conf: c_float = 0.0;
        let mut script_name: *const c_char = ptr::null();
        let mut script_conf: c_float = 0.0;

        let found = unsafe {
            sys::TessBaseAPIDetectOrientationScript(
                self.as_ptr(),
                &mut orient_deg,
                &mut orient_conf,
                &mut script_name,
                &mut script_conf,
            )
        };
        if found == sys::FALSE {
            return None;
        }

        Some(OrientationScript {
            orient_deg,
            orient_conf,
            script_name: unsafe { borrowed_text(script_name) },
            script_conf,
        })
    }

    fn cstring_pointers(values: &[CString]) -> Vec<*mut c_char> {
        values.iter().map(|v| v.as_ptr() as *mut c_char).collect()
    }
}

impl OcrEngine for BaseApi {
    type Cursor<'a> = ResultIterator<'a>;
    type Layout<'a> = LayoutIterator<'a>;
    type Renderer = NativeRenderer;

    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn version(&self) -> String {
        Self::library_version()
    }

    fn init(&mut self, options: &InitOptions) -> Result<(), OcrError> {
        let datapath = CString::new(options.datapath.to_string_lossy().as_bytes())?;
        let language = CString::new(options.language.as_str())?;

        let configs = options
            .configs
            .iter()
            .map(|c| CString::new(c.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let names = options
            .variables
            .iter()
            .map(|(n, _)| CString::new(n.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let values = options
            .variables
            .iter()
            .map(|(_, v)| CString::new(v.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut config_ptrs = Self::cstring_pointers(&configs);
        let mut name_ptrs = Self::cstring_pointers(&names);
        let mut value_ptrs = Self::cstring_pointers(&values);

        tracing::debug!(
            "TessBaseAPIInit4(datapath={:?}, language={}, oem={}, configs={:?}, {} init variable(s))",
            options.datapath,
            options.language,
            options.engine_mode,
            options.configs,
            names.len()
        );

        // a failed Init leaves no engine object behind
        self.initialized = false;
        let status = unsafe {
            sys::TessBaseAPIInit4(
                self.as_ptr(),
                datapath.as_ptr(),
                language.as_ptr(),
                options.engine_mode.as_raw(),
                if config_ptrs.is_empty() { ptr::null_mut() } else { config_ptrs.as_mut_ptr() },
                config_ptrs.len() as c_int,
                if name_ptrs.is_empty() { ptr::null_mut() } else { name_ptrs.as_mut_ptr() },
                if value_ptrs.is_empty() { ptr::null_mut() } else { value_ptrs.as_mut_ptr() },
                name_ptrs.len(),
                if options.set_only_non_debug_params { sys::TRUE } else { sys::FALSE },
            )
        };

        if status != 0 {
            return Err(OcrError::InitializationError(format!(
                "Failed to initialize Tesseract with language '{}' from {:?} (status {})",
                options.language, options.datapath, status
            )));
        }
        self.initialized = true;
        Ok(())
    }

    fn end(&mut self) {
        unsafe { sys::TessBaseAPIEnd(self.as_ptr()) }
        self.initialized = false;
    }

    fn clear(&mut self) {
        unsafe { sys::TessBaseAPIClear(self.as_ptr()) }
    }

    fn datapath(&self) -> Option<String> {
        if !self.initialized {
            return None;
        }
        // GetDatapath takes a non-const handle but does not modify it
        unsafe { borrowed_text(sys::TessBaseAPIGetDatapath(self.handle.as_ptr())) }
    }

    fn init_languages(&self) -> Option<String> {
        unsafe { borrowed_text(sys::TessBaseAPIGetInitLanguagesAsString(self.as_const())) }.filter(|l| !l.is_empty())
    }

    fn loaded_languages(&self) -> Vec<String> {
        unsafe { take_text_array(sys::TessBaseAPIGetLoadedLanguagesAsVector(self.as_const())) }
    }

    fn available_languages(&self) -> Vec<String> {
        unsafe { take_text_array(sys::TessBaseAPIGetAvailableLanguagesAsVector(self.as_const())) }
    }

    fn set_variable(&mut self, name: &str, value: &str) -> bool {
        let (Ok(name), Ok(value)) = (CString::new(name), CString::new(value)) else {
            return false;
        };
        unsafe { sys::TessBaseAPISetVariable(self.as_ptr(), name.as_ptr(), value.as_ptr()) != sys::FALSE }
    }

    fn string_variable(&self, name: &str) -> Option<String> {
        if !self.initialized {
            return None;
        }
        let name = CString::new(name).ok()?;
        unsafe { borrowed_text(sys::TessBaseAPIGetStringVariable(self.as_const(), name.as_ptr())) }
    }

    fn set_page_seg_mode(&mut self, mode: PageSegMode) {
        unsafe { sys::TessBaseAPISetPageSegMode(self.as_ptr(), mode.as_raw()) }
    }

    fn page_seg_mode(&self) -> Result<PageSegMode, OcrError> {
        PageSegMode::try_from(unsafe { sys::TessBaseAPIGetPageSegMode(self.as_const()) })
    }

    fn set_input_name(&mut self, name: &str) {
        match CString::new(name) {
            Ok(name) => unsafe { sys::TessBaseAPISetInputName(self.as_ptr(), name.as_ptr()) },
            Err(_) => tracing::warn!("Input name {:?} contains NUL, not passed to the engine", name),
        }
    }

    fn set_source_resolution(&mut self, ppi: u32) {
        unsafe { sys::TessBaseAPISetSourceResolution(self.as_ptr(), ppi.min(c_int::MAX as u32) as c_int) }
    }

    fn set_image(&mut self, image: &PixelBuffer<'_>) {
        tracing::debug!(
            "TessBaseAPISetImage({}x{}, {} bytes/pixel, {} bytes/line)",
            image.width(),
            image.height(),
            image.bytes_per_pixel(),
            image.bytes_per_line()
        );
        // SetImage copies the pixels, so the buffer may go away afterwards
        unsafe {
            sys::TessBaseAPISetImage(
                self.as_ptr(),
                image.data().as_ptr(),
                image.width() as c_int,
                image.height() as c_int,
                image.bytes_per_pixel() as c_int,
                image.bytes_per_line() as c_int,
            )
        }
    }

    fn set_rectangle(&mut self, rect: Rect) {
        unsafe {
            sys::TessBaseAPISetRectangle(
                self.as_ptr(),
                rect.left as c_int,
                rect.top as c_int,
                rect.width as c_int,
                rect.height as c_int,
            )
        }
    }

    fn recognize(&mut self, monitor: Option<&ProgressMonitor>) -> Result<(), OcrError> {
        let native = monitor.map(NativeMonitor::new).transpose()?;
        let started = Instant::now();

        let status = unsafe {
            sys::TessBaseAPIRecognize(
                self.as_ptr(),
                native.as_ref().map_or(ptr::null_mut(), NativeMonitor::as_ptr),
            )
        };
        drop(native);

        if status != 0 {
            let deadline = monitor.and_then(ProgressMonitor::deadline);
            if deadline.is_some_and(|d| started.elapsed() >= d) {
                return Err(OcrError::ProcessingError(format!(
                    "recognition stopped after exceeding its deadline of {:?}",
                    deadline.unwrap_or_default()
                )));
            }
            return Err(OcrError::ProcessingError(format!("recognition failed (status {})", status)));
        }

        tracing::debug!("Recognition finished in {:?}", started.elapsed());
        Ok(())
    }

    fn utf8_text(&mut self) -> Option<String> {
        unsafe { take_text(sys::TessBaseAPIGetUTF8Text(self.as_ptr())) }
    }

    fn hocr_text(&mut self, page: u32) -> Option<String> {
        unsafe { take_text(sys::TessBaseAPIGetHOCRText(self.as_ptr(), page as c_int)) }
    }

    fn mean_text_conf(&mut self) -> i32 {
        unsafe { sys::TessBaseAPIMeanTextConf(self.as_ptr()) }
    }

    fn result_cursor(&mut self) -> Option<ResultIterator<'_>> {
        NonNull::new(unsafe { sys::TessBaseAPIGetIterator(self.as_ptr()) }).and_then(ResultIterator::new)
    }

    fn analyse_layout(&mut self) -> Option<LayoutIterator<'_>> {
        NonNull::new(unsafe { sys::TessBaseAPIAnalyseLayout(self.as_ptr()) }).map(LayoutIterator::new)
    }

    fn create_renderer(&mut self, format: RenderedFormat, outputbase: &Path) -> Result<NativeRenderer, OcrError> {
        let datadir = self
            .datapath()
            .ok_or_else(|| OcrError::InitializationError("engine is not initialized".to_string()))?;
        NativeRenderer::new(format, outputbase, &datadir)
    }
}

impl Drop for BaseApi {
    fn drop(&mut self) {
        // Delete ends the engine first if it is still initialized
        unsafe { sys::TessBaseAPIDelete(self.handle.as_ptr()) }
    }
}
