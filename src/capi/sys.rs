//! Raw declarations of the Tesseract C API (`tesseract/capi.h`, 4.x and 5.x).
//!
//! Nothing here has logic. Every signature mirrors the header exactly:
//! `BOOL` and the enum typedefs are C `int`, `size_t` is `usize`, and
//! output parameters are raw pointers. A mismatch is silent memory
//! corruption, so changes here must be checked against the header.
//!
//! # Safety
//!
//! All functions are `unsafe extern "C"`. Ownership rules:
//! - `char*` returns must be released with [`TessDeleteText`].
//! - `char**` returns must be released with [`TessDeleteTextArray`].
//! - `int*` returns must be released with [`TessDeleteIntArray`].
//! - `const char*` returns are borrowed from the engine and never freed.
//! - [`TessResultIteratorGetPageIterator`] returns the same object as its
//!   argument, viewed as a page iterator; it must not be deleted separately.

#![allow(non_camel_case_types, non_snake_case)]

use std::os::raw::{c_char, c_double, c_float, c_int, c_void};

pub type BOOL = c_int;
pub const TRUE: BOOL = 1;
pub const FALSE: BOOL = 0;

pub type TessOcrEngineMode = c_int;
pub type TessPageSegMode = c_int;
pub type TessPageIteratorLevel = c_int;
pub type TessPolyBlockType = c_int;
pub type TessOrientation = c_int;
pub type TessWritingDirection = c_int;
pub type TessTextlineOrder = c_int;
pub type TessParagraphJustification = c_int;

/// Opaque `tesseract::TessBaseAPI`
#[repr(C)]
pub struct TessBaseAPI {
    _opaque: [u8; 0],
}

/// Opaque `tesseract::PageIterator`
#[repr(C)]
pub struct TessPageIterator {
    _opaque: [u8; 0],
}

/// Opaque `tesseract::ResultIterator`
#[repr(C)]
pub struct TessResultIterator {
    _opaque: [u8; 0],
}

/// Opaque `tesseract::MutableIterator`
#[repr(C)]
pub struct TessMutableIterator {
    _opaque: [u8; 0],
}

/// Opaque `tesseract::ChoiceIterator`
#[repr(C)]
pub struct TessChoiceIterator {
    _opaque: [u8; 0],
}

/// Opaque `tesseract::TessResultRenderer`
#[repr(C)]
pub struct TessResultRenderer {
    _opaque: [u8; 0],
}

/// Opaque progress monitor (`tesseract::ETEXT_DESC`). Its layout changed
/// between releases, so it is only ever touched through `TessMonitor*`.
#[repr(C)]
pub struct ETEXT_DESC {
    _opaque: [u8; 0],
}

/// Opaque leptonica image
#[repr(C)]
pub struct Pix {
    _opaque: [u8; 0],
}

/// `bool (*)(void* cancel_this, int words)`; C++ `bool`, not `BOOL`
pub type TessCancelFunc = Option<unsafe extern "C" fn(cancel_this: *mut c_void, words: c_int) -> bool>;

/// `bool (*)(ETEXT_DESC* ths, int left, int right, int top, int bottom)`
pub type TessProgressFunc = Option<
    unsafe extern "C" fn(
        ths: *mut ETEXT_DESC,
        left: c_int,
        right: c_int,
        top: c_int,
        bottom: c_int,
    ) -> bool,
>;

#[cfg_attr(feature = "system-tesseract", link(name = "tesseract"))]
extern "C" {
    // --- General ---

    pub fn TessVersion() -> *const c_char;
    pub fn TessDeleteText(text: *const c_char);
    pub fn TessDeleteTextArray(arr: *mut *mut c_char);
    pub fn TessDeleteIntArray(arr: *const c_int);

    // --- Renderers ---

    pub fn TessTextRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;
    pub fn TessHOcrRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;
    pub fn TessHOcrRendererCreate2(outputbase: *const c_char, font_info: BOOL) -> *mut TessResultRenderer;
    pub fn TessAltoRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;
    pub fn TessTsvRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;
    pub fn TessPDFRendererCreate(
        outputbase: *const c_char,
        datadir: *const c_char,
        textonly: BOOL,
    ) -> *mut TessResultRenderer;
    pub fn TessUnlvRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;
    pub fn TessBoxTextRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;
    pub fn TessLSTMBoxRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;
    pub fn TessWordStrBoxRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;

    pub fn TessDeleteResultRenderer(renderer: *mut TessResultRenderer);
    pub fn TessResultRendererInsert(renderer: *mut TessResultRenderer, next: *mut TessResultRenderer);
    pub fn TessResultRendererNext(renderer: *mut TessResultRenderer) -> *mut TessResultRenderer;
    pub fn TessResultRendererBeginDocument(renderer: *mut TessResultRenderer, title: *const c_char) -> BOOL;
    pub fn TessResultRendererAddImage(renderer: *mut TessResultRenderer, api: *mut TessBaseAPI) -> BOOL;
    pub fn TessResultRendererEndDocument(renderer: *mut TessResultRenderer) -> BOOL;
    pub fn TessResultRendererExtention(renderer: *mut TessResultRenderer) -> *const c_char;
    pub fn TessResultRendererTitle(renderer: *mut TessResultRenderer) -> *const c_char;
    pub fn TessResultRendererImageNum(renderer: *mut TessResultRenderer) -> c_int;

    // --- Base API: lifecycle ---

    pub fn TessBaseAPICreate() -> *mut TessBaseAPI;
    pub fn TessBaseAPIDelete(handle: *mut TessBaseAPI);

    pub fn TessBaseAPISetInputName(handle: *mut TessBaseAPI, name: *const c_char);
    pub fn TessBaseAPIGetInputName(handle: *mut TessBaseAPI) -> *const c_char;
    pub fn TessBaseAPISetInputImage(handle: *mut TessBaseAPI, pix: *const Pix);
    pub fn TessBaseAPIGetInputImage(handle: *mut TessBaseAPI) -> *mut Pix;
    pub fn TessBaseAPIGetSourceYResolution(handle: *mut TessBaseAPI) -> c_int;
    pub fn TessBaseAPIGetDatapath(handle: *mut TessBaseAPI) -> *const c_char;
    pub fn TessBaseAPISetOutputName(handle: *mut TessBaseAPI, name: *const c_char);

    // --- Base API: variables ---

    pub fn TessBaseAPISetVariable(handle: *mut TessBaseAPI, name: *const c_char, value: *const c_char) -> BOOL;
    pub fn TessBaseAPISetDebugVariable(
        handle: *mut TessBaseAPI,
        name: *const c_char,
        value: *const c_char,
    ) -> BOOL;
    pub fn TessBaseAPIGetIntVariable(handle: *const TessBaseAPI, name: *const c_char, value: *mut c_int) -> BOOL;
    pub fn TessBaseAPIGetBoolVariable(handle: *const TessBaseAPI, name: *const c_char, value: *mut BOOL) -> BOOL;
    pub fn TessBaseAPIGetDoubleVariable(
        handle: *const TessBaseAPI,
        name: *const c_char,
        value: *mut c_double,
    ) -> BOOL;
    pub fn TessBaseAPIGetStringVariable(handle: *const TessBaseAPI, name: *const c_char) -> *const c_char;
    pub fn TessBaseAPIPrintVariablesToFile(handle: *const TessBaseAPI, filename: *const c_char) -> BOOL;

    // --- Base API: initialization ---

    pub fn TessBaseAPIInit1(
        handle: *mut TessBaseAPI,
        datapath: *const c_char,
        language: *const c_char,
        oem: TessOcrEngineMode,
        configs: *mut *mut c_char,
        configs_size: c_int,
    ) -> c_int;
    pub fn TessBaseAPIInit2(
        handle: *mut TessBaseAPI,
        datapath: *const c_char,
        language: *const c_char,
        oem: TessOcrEngineMode,
    ) -> c_int;
    pub fn TessBaseAPIInit3(handle: *mut TessBaseAPI, datapath: *const c_char, language: *const c_char) -> c_int;
    pub fn TessBaseAPIInit4(
        handle: *mut TessBaseAPI,
        datapath: *const c_char,
        language: *const c_char,
        mode: TessOcrEngineMode,
        configs: *mut *mut c_char,
        configs_size: c_int,
        vars_vec: *mut *mut c_char,
        vars_values: *mut *mut c_char,
        vars_vec_size: usize,
        set_only_non_debug_params: BOOL,
    ) -> c_int;

    pub fn TessBaseAPIGetInitLanguagesAsString(handle: *const TessBaseAPI) -> *const c_char;
    pub fn TessBaseAPIGetLoadedLanguagesAsVector(handle: *const TessBaseAPI) -> *mut *mut c_char;
    pub fn TessBaseAPIGetAvailableLanguagesAsVector(handle: *const TessBaseAPI) -> *mut *mut c_char;

    pub fn TessBaseAPIInitForAnalysePage(handle: *mut TessBaseAPI);
    pub fn TessBaseAPIReadConfigFile(handle: *mut TessBaseAPI, filename: *const c_char);
    pub fn TessBaseAPIReadDebugConfigFile(handle: *mut TessBaseAPI, filename: *const c_char);

    pub fn TessBaseAPISetPageSegMode(handle: *mut TessBaseAPI, mode: TessPageSegMode);
    pub fn TessBaseAPIGetPageSegMode(handle: *const TessBaseAPI) -> TessPageSegMode;

    // --- Base API: input ---

    pub fn TessBaseAPIRect(
        handle: *mut TessBaseAPI,
        imagedata: *const u8,
        bytes_per_pixel: c_int,
        bytes_per_line: c_int,
        left: c_int,
        top: c_int,
        width: c_int,
        height: c_int,
    ) -> *mut c_char;

    pub fn TessBaseAPIClearAdaptiveClassifier(handle: *mut TessBaseAPI);

    pub fn TessBaseAPISetImage(
        handle: *mut TessBaseAPI,
        imagedata: *const u8,
        width: c_int,
        height: c_int,
        bytes_per_pixel: c_int,
        bytes_per_line: c_int,
    );
    pub fn TessBaseAPISetImage2(handle: *mut TessBaseAPI, pix: *mut Pix);
    pub fn TessBaseAPISetSourceResolution(handle: *mut TessBaseAPI, ppi: c_int);
    pub fn TessBaseAPISetRectangle(handle: *mut TessBaseAPI, left: c_int, top: c_int, width: c_int, height: c_int);

    // --- Base API: recognition ---

    pub fn TessBaseAPIAnalyseLayout(handle: *mut TessBaseAPI) -> *mut TessPageIterator;
    pub fn TessBaseAPIRecognize(handle: *mut TessBaseAPI, monitor: *mut ETEXT_DESC) -> c_int;
    pub fn TessBaseAPIProcessPages(
        handle: *mut TessBaseAPI,
        filename: *const c_char,
        retry_config: *const c_char,
        timeout_millisec: c_int,
        renderer: *mut TessResultRenderer,
    ) -> BOOL;
    pub fn TessBaseAPIProcessPage(
        handle: *mut TessBaseAPI,
        pix: *mut Pix,
        page_index: c_int,
        filename: *const c_char,
        retry_config: *const c_char,
        timeout_millisec: c_int,
        renderer: *mut TessResultRenderer,
    ) -> BOOL;

    pub fn TessBaseAPIGetIterator(handle: *mut TessBaseAPI) -> *mut TessResultIterator;
    pub fn TessBaseAPIGetMutableIterator(handle: *mut TessBaseAPI) -> *mut TessMutableIterator;

    // --- Base API: results ---

    pub fn TessBaseAPIGetUTF8Text(handle: *mut TessBaseAPI) -> *mut c_char;
    pub fn TessBaseAPIGetHOCRText(handle: *mut TessBaseAPI, page_number: c_int) -> *mut c_char;
    pub fn TessBaseAPIGetAltoText(handle: *mut TessBaseAPI, page_number: c_int) -> *mut c_char;
    pub fn TessBaseAPIGetTsvText(handle: *mut TessBaseAPI, page_number: c_int) -> *mut c_char;
    pub fn TessBaseAPIGetBoxText(handle: *mut TessBaseAPI, page_number: c_int) -> *mut c_char;
    pub fn TessBaseAPIGetUNLVText(handle: *mut TessBaseAPI) -> *mut c_char;
    pub fn TessBaseAPIMeanTextConf(handle: *mut TessBaseAPI) -> c_int;
    pub fn TessBaseAPIAllWordConfidences(handle: *mut TessBaseAPI) -> *mut c_int;
    pub fn TessBaseAPIAdaptToWordStr(handle: *mut TessBaseAPI, mode: TessPageSegMode, wordstr: *const c_char) -> BOOL;

    pub fn TessBaseAPIClear(handle: *mut TessBaseAPI);
    pub fn TessBaseAPIEnd(handle: *mut TessBaseAPI);

    pub fn TessBaseAPIIsValidWord(handle: *mut TessBaseAPI, word: *const c_char) -> c_int;
    pub fn TessBaseAPIGetTextDirection(handle: *mut TessBaseAPI, out_offset: *mut c_int, out_slope: *mut c_float) -> BOOL;
    pub fn TessBaseAPIGetUnichar(handle: *mut TessBaseAPI, unichar_id: c_int) -> *const c_char;
    pub fn TessBaseAPIClearPersistentCache(handle: *mut TessBaseAPI);
    pub fn TessBaseAPIDetectOrientationScript(
        handle: *mut TessBaseAPI,
        orient_deg: *mut c_int,
        orient_conf: *mut c_float,
        script_name: *mut *const c_char,
        script_conf: *mut c_float,
    ) -> BOOL;
    pub fn TessBaseAPISetMinOrientationMargin(handle: *mut TessBaseAPI, margin: c_double);
    pub fn TessBaseAPINumDawgs(handle: *const TessBaseAPI) -> c_int;
    pub fn TessBaseAPIOem(handle: *const TessBaseAPI) -> TessOcrEngineMode;

    // --- Page iterator ---

    pub fn TessPageIteratorDelete(handle: *mut TessPageIterator);
    pub fn TessPageIteratorCopy(handle: *const TessPageIterator) -> *mut TessPageIterator;
    pub fn TessPageIteratorBegin(handle: *mut TessPageIterator);
    pub fn TessPageIteratorNext(handle: *mut TessPageIterator, level: TessPageIteratorLevel) -> BOOL;
    pub fn TessPageIteratorIsAtBeginningOf(handle: *const TessPageIterator, level: TessPageIteratorLevel) -> BOOL;
    pub fn TessPageIteratorIsAtFinalElement(
        handle: *const TessPageIterator,
        level: TessPageIteratorLevel,
        element: TessPageIteratorLevel,
    ) -> BOOL;
    pub fn TessPageIteratorBoundingBox(
        handle: *const TessPageIterator,
        level: TessPageIteratorLevel,
        left: *mut c_int,
        top: *mut c_int,
        right: *mut c_int,
        bottom: *mut c_int,
    ) -> BOOL;
    pub fn TessPageIteratorBlockType(handle: *const TessPageIterator) -> TessPolyBlockType;
    pub fn TessPageIteratorBaseline(
        handle: *const TessPageIterator,
        level: TessPageIteratorLevel,
        x1: *mut c_int,
        y1: *mut c_int,
        x2: *mut c_int,
        y2: *mut c_int,
    ) -> BOOL;
    pub fn TessPageIteratorOrientation(
        handle: *mut TessPageIterator,
        orientation: *mut TessOrientation,
        writing_direction: *mut TessWritingDirection,
        textline_order: *mut TessTextlineOrder,
        deskew_angle: *mut c_float,
    );
    pub fn TessPageIteratorParagraphInfo(
        handle: *mut TessPageIterator,
        justification: *mut TessParagraphJustification,
        is_list_item: *mut BOOL,
        is_crown: *mut BOOL,
        first_line_indent: *mut c_int,
    );

    // --- Result iterator ---

    pub fn TessResultIteratorDelete(handle: *mut TessResultIterator);
    pub fn TessResultIteratorCopy(handle: *const TessResultIterator) -> *mut TessResultIterator;
    pub fn TessResultIteratorGetPageIterator(handle: *mut TessResultIterator) -> *mut TessPageIterator;
    pub fn TessResultIteratorGetPageIteratorConst(handle: *const TessResultIterator) -> *const TessPageIterator;
    pub fn TessResultIteratorGetChoiceIterator(handle: *const TessResultIterator) -> *mut TessChoiceIterator;
    pub fn TessResultIteratorNext(handle: *mut TessResultIterator, level: TessPageIteratorLevel) -> BOOL;
    pub fn TessResultIteratorGetUTF8Text(
        handle: *const TessResultIterator,
        level: TessPageIteratorLevel,
    ) -> *mut c_char;
    pub fn TessResultIteratorConfidence(handle: *const TessResultIterator, level: TessPageIteratorLevel) -> c_float;
    pub fn TessResultIteratorWordRecognitionLanguage(handle: *const TessResultIterator) -> *const c_char;
    pub fn TessResultIteratorWordFontAttributes(
        handle: *const TessResultIterator,
        is_bold: *mut BOOL,
        is_italic: *mut BOOL,
        is_underlined: *mut BOOL,
        is_monospace: *mut BOOL,
        is_serif: *mut BOOL,
        is_smallcaps: *mut BOOL,
        pointsize: *mut c_int,
        font_id: *mut c_int,
    ) -> *const c_char;
    pub fn TessResultIteratorWordIsFromDictionary(handle: *const TessResultIterator) -> BOOL;
    pub fn TessResultIteratorWordIsNumeric(handle: *const TessResultIterator) -> BOOL;
    pub fn TessResultIteratorSymbolIsSuperscript(handle: *const TessResultIterator) -> BOOL;
    pub fn TessResultIteratorSymbolIsSubscript(handle: *const TessResultIterator) -> BOOL;
    pub fn TessResultIteratorSymbolIsDropcap(handle: *const TessResultIterator) -> BOOL;

    // --- Choice iterator ---

    pub fn TessChoiceIteratorDelete(handle: *mut TessChoiceIterator);
    pub fn TessChoiceIteratorNext(handle: *mut TessChoiceIterator) -> BOOL;
    pub fn TessChoiceIteratorGetUTF8Text(handle: *const TessChoiceIterator) -> *const c_char;
    pub fn TessChoiceIteratorConfidence(handle: *const TessChoiceIterator) -> c_float;

    // --- Progress monitor ---

    pub fn TessMonitorCreate() -> *mut ETEXT_DESC;
    pub fn TessMonitorDelete(monitor: *mut ETEXT_DESC);
    pub fn TessMonitorSetCancelFunc(monitor: *mut ETEXT_DESC, cancel_func: TessCancelFunc);
    pub fn TessMonitorSetCancelThis(monitor: *mut ETEXT_DESC, cancel_this: *mut c_void);
    pub fn TessMonitorGetCancelThis(monitor: *mut ETEXT_DESC) -> *mut c_void;
    pub fn TessMonitorSetProgressFunc(monitor: *mut ETEXT_DESC, progress_func: TessProgressFunc);
    pub fn TessMonitorGetProgress(monitor: *mut ETEXT_DESC) -> c_int;
    pub fn TessMonitorSetDeadlineMSecs(monitor: *mut ETEXT_DESC, deadline: c_int);
}
