//! Native result renderers (`TessResultRenderer`)

use super::text::borrowed_text;
use super::BaseApi;
use crate::capi::sys;
use crate::error::OcrError;
use crate::renderer::{PageRenderer, RenderedFormat};
use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// One renderer writing `<outputbase>.<extension>`
pub struct NativeRenderer {
    ptr: NonNull<sys::TessResultRenderer>,
    format: RenderedFormat,
    output: PathBuf,
}

impl NativeRenderer {
    /// `datadir` is only read by the PDF renderer, which loads its glyph-less
    /// font (`pdf.ttf`) from there
    pub fn new(format: RenderedFormat, outputbase: &Path, datadir: &str) -> Result<Self, OcrError> {
        let base = CString::new(outputbase.to_string_lossy().as_bytes())?;
        let datadir = CString::new(datadir)?;

        let raw = unsafe {
            match format {
                RenderedFormat::Text => sys::TessTextRendererCreate(base.as_ptr()),
                RenderedFormat::Hocr => sys::TessHOcrRendererCreate(base.as_ptr()),
                RenderedFormat::Pdf => sys::TessPDFRendererCreate(base.as_ptr(), datadir.as_ptr(), sys::FALSE),
                RenderedFormat::Box => sys::TessBoxTextRendererCreate(base.as_ptr()),
                RenderedFormat::Unlv => sys::TessUnlvRendererCreate(base.as_ptr()),
                RenderedFormat::Tsv => sys::TessTsvRendererCreate(base.as_ptr()),
                RenderedFormat::Alto => sys::TessAltoRendererCreate(base.as_ptr()),
            }
        };

        let ptr = NonNull::new(raw).ok_or_else(|| OcrError::RenderError {
            format: format.to_string(),
            message: "renderer could not be created".to_string(),
        })?;

        tracing::debug!("Created {} renderer for {:?}", format, outputbase);
        Ok(Self {
            ptr,
            format,
            output: format.output_path(outputbase),
        })
    }

    pub(crate) fn as_ptr(&mut self) -> *mut sys::TessResultRenderer {
        self.ptr.as_ptr()
    }

    /// Extension the native renderer reports (e.g. "txt")
    pub fn extension(&self) -> Option<String> {
        unsafe { borrowed_text(sys::TessResultRendererExtention(self.ptr.as_ptr())) }
    }

    /// Title given at begin-document
    pub fn title(&self) -> Option<String> {
        unsafe { borrowed_text(sys::TessResultRendererTitle(self.ptr.as_ptr())) }
    }
}

impl PageRenderer<BaseApi> for NativeRenderer {
    fn format(&self) -> RenderedFormat {
        self.format
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    fn begin_document(&mut self, title: &str) -> bool {
        let Ok(title) = CString::new(title) else {
            return false;
        };
        unsafe { sys::TessResultRendererBeginDocument(self.ptr.as_ptr(), title.as_ptr()) != sys::FALSE }
    }

    fn add_image(&mut self, engine: &mut BaseApi) -> bool {
        unsafe { sys::TessResultRendererAddImage(self.ptr.as_ptr(), engine.as_ptr()) != sys::FALSE }
    }

    fn end_document(&mut self) -> bool {
        unsafe { sys::TessResultRendererEndDocument(self.ptr.as_ptr()) != sys::FALSE }
    }

    fn image_num(&self) -> i32 {
        unsafe { sys::TessResultRendererImageNum(self.ptr.as_ptr()) }
    }
}

impl Drop for NativeRenderer {
    fn drop(&mut self) {
        unsafe { sys::TessDeleteResultRenderer(self.ptr.as_ptr()) }
    }
}
