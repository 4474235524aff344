//! Native page and result iterators.
//!
//! Both owned iterators borrow the [`BaseApi`] mutably for their lifetime,
//! so the image and recognition state they walk cannot change under them.

use super::text::{borrowed_text, take_text};
use super::BaseApi;
use crate::capi::sys;
use crate::capi::{
    Orientation, PageIteratorLevel, ParagraphJustification, PolyBlockType, TextlineOrder, WritingDirection,
};
use crate::engine::{Baseline, BoundingBox, FontAttributes, PageCursor, PageOrientation, ParagraphInfo, ResultCursor};
use std::marker::PhantomData;
use std::os::raw::{c_float, c_int};
use std::ptr::NonNull;

/// Page-iterator operations on a raw pointer that some owner keeps alive
#[derive(Clone, Copy)]
struct RawPage(NonNull<sys::TessPageIterator>);

impl RawPage {
    fn ptr(self) -> *mut sys::TessPageIterator {
        self.0.as_ptr()
    }

    fn begin(self) {
        unsafe { sys::TessPageIteratorBegin(self.ptr()) }
    }

    fn next(self, level: PageIteratorLevel) -> bool {
        unsafe { sys::TessPageIteratorNext(self.ptr(), level.as_raw()) != sys::FALSE }
    }

    fn is_at_beginning_of(self, level: PageIteratorLevel) -> bool {
        unsafe { sys::TessPageIteratorIsAtBeginningOf(self.ptr(), level.as_raw()) != sys::FALSE }
    }

    fn is_at_final_element(self, level: PageIteratorLevel, element: PageIteratorLevel) -> bool {
        unsafe { sys::TessPageIteratorIsAtFinalElement(self.ptr(), level.as_raw(), element.as_raw()) != sys::FALSE }
    }

    fn bounding_box(self, level: PageIteratorLevel) -> Option<BoundingBox> {
        let (mut left, mut top, mut right, mut bottom) = (0, 0, 0, 0);
        let found = unsafe {
            sys::TessPageIteratorBoundingBox(self.ptr(), level.as_raw(), &mut left, &mut top, &mut right, &mut bottom)
        };
        (found != sys::FALSE).then_some(BoundingBox {
            left,
            top,
            right,
            bottom,
        })
    }

    fn block_type(self) -> Option<PolyBlockType> {
        PolyBlockType::try_from(unsafe { sys::TessPageIteratorBlockType(self.ptr()) }).ok()
    }

    fn baseline(self, level: PageIteratorLevel) -> Option<Baseline> {
        let (mut x1, mut y1, mut x2, mut y2) = (0, 0, 0, 0);
        let found =
            unsafe { sys::TessPageIteratorBaseline(self.ptr(), level.as_raw(), &mut x1, &mut y1, &mut x2, &mut y2) };
        (found != sys::FALSE).then_some(Baseline { x1, y1, x2, y2 })
    }

    fn orientation(self) -> Option<PageOrientation> {
        let (mut orientation, mut direction, mut order): (c_int, c_int, c_int) = (0, 0, 0);
        let mut deskew_angle: c_float = 0.0;
        unsafe {
            sys::TessPageIteratorOrientation(
                self.ptr(),
                &mut orientation,
                &mut direction,
                &mut order,
                &mut deskew_angle,
            )
        };

        Some(PageOrientation {
            orientation: Orientation::try_from(orientation).ok()?,
            writing_direction: WritingDirection::try_from(direction).ok()?,
            textline_order: TextlineOrder::try_from(order).ok()?,
            deskew_angle,
        })
    }

    fn paragraph_info(self) -> Option<ParagraphInfo> {
        let mut justification: c_int = 0;
        let (mut is_list_item, mut is_crown) = (sys::FALSE, sys::FALSE);
        let mut first_line_indent: c_int = 0;
        unsafe {
            sys::TessPageIteratorParagraphInfo(
                self.ptr(),
                &mut justification,
                &mut is_list_item,
                &mut is_crown,
                &mut first_line_indent,
            )
        };

        Some(ParagraphInfo {
            justification: ParagraphJustification::try_from(justification).ok()?,
            is_list_item: is_list_item != sys::FALSE,
            is_crown: is_crown != sys::FALSE,
            first_line_indent,
        })
    }
}

/// Implements [`PageCursor`] for a type with `page()` and `step()`
macro_rules! page_cursor {
    ($ty:ty) => {
        impl PageCursor for $ty {
            fn begin(&mut self) {
                self.page().begin()
            }

            fn advance(&mut self, level: PageIteratorLevel) -> bool {
                self.step(level)
            }

            fn is_at_beginning_of(&self, level: PageIteratorLevel) -> bool {
                self.page().is_at_beginning_of(level)
            }

            fn is_at_final_element(&self, level: PageIteratorLevel, element: PageIteratorLevel) -> bool {
                self.page().is_at_final_element(level, element)
            }

            fn bounding_box(&self, level: PageIteratorLevel) -> Option<BoundingBox> {
                self.page().bounding_box(level)
            }

            fn block_type(&self) -> Option<PolyBlockType> {
                self.page().block_type()
            }

            fn baseline(&self, level: PageIteratorLevel) -> Option<Baseline> {
                self.page().baseline(level)
            }

            fn orientation(&mut self) -> Option<PageOrientation> {
                self.page().orientation()
            }

            fn paragraph_info(&mut self) -> Option<ParagraphInfo> {
                self.page().paragraph_info()
            }
        }
    };
}

/// Iterator over recognition results (`TessResultIterator`)
pub struct ResultIterator<'a> {
    ptr: NonNull<sys::TessResultIterator>,
    /// Same native object, seen as its page-iterator base
    page: RawPage,
    _api: PhantomData<&'a mut BaseApi>,
}

impl<'a> ResultIterator<'a> {
    /// Takes ownership of `ptr`
    pub(super) fn new(ptr: NonNull<sys::TessResultIterator>) -> Option<Self> {
        match NonNull::new(unsafe { sys::TessResultIteratorGetPageIterator(ptr.as_ptr()) }) {
            Some(page) => Some(Self {
                ptr,
                page: RawPage(page),
                _api: PhantomData,
            }),
            None => {
                unsafe { sys::TessResultIteratorDelete(ptr.as_ptr()) };
                None
            }
        }
    }

    fn page(&self) -> RawPage {
        self.page
    }

    fn step(&mut self, level: PageIteratorLevel) -> bool {
        unsafe { sys::TessResultIteratorNext(self.ptr.as_ptr(), level.as_raw()) != sys::FALSE }
    }

    /// The same native iterator seen as a page iterator. Borrowed only: it
    /// is released together with this result iterator.
    pub fn page_view(&mut self) -> PageIteratorView<'_> {
        PageIteratorView {
            page: self.page,
            _owner: PhantomData,
        }
    }

    pub fn symbol_is_superscript(&self) -> bool {
        unsafe { sys::TessResultIteratorSymbolIsSuperscript(self.ptr.as_ptr()) != sys::FALSE }
    }

    pub fn symbol_is_subscript(&self) -> bool {
        unsafe { sys::TessResultIteratorSymbolIsSubscript(self.ptr.as_ptr()) != sys::FALSE }
    }

    pub fn symbol_is_dropcap(&self) -> bool {
        unsafe { sys::TessResultIteratorSymbolIsDropcap(self.ptr.as_ptr()) != sys::FALSE }
    }

    /// Alternative readings of the current symbol with their confidences
    pub fn choices(&self) -> Vec<(String, f32)> {
        let Some(choices) = NonNull::new(unsafe { sys::TessResultIteratorGetChoiceIterator(self.ptr.as_ptr()) })
        else {
            return Vec::new();
        };

        let mut found = Vec::new();
        unsafe {
            loop {
                if let Some(text) = borrowed_text(sys::TessChoiceIteratorGetUTF8Text(choices.as_ptr())) {
                    found.push((text, sys::TessChoiceIteratorConfidence(choices.as_ptr())));
                }
                if sys::TessChoiceIteratorNext(choices.as_ptr()) == sys::FALSE {
                    break;
                }
            }
            sys::TessChoiceIteratorDelete(choices.as_ptr());
        }
        found
    }
}

page_cursor!(ResultIterator<'_>);

impl ResultCursor for ResultIterator<'_> {
    fn text(&self, level: PageIteratorLevel) -> Option<String> {
        unsafe { take_text(sys::TessResultIteratorGetUTF8Text(self.ptr.as_ptr(), level.as_raw())) }
    }

    fn confidence(&self, level: PageIteratorLevel) -> f32 {
        unsafe { sys::TessResultIteratorConfidence(self.ptr.as_ptr(), level.as_raw()) }
    }

    fn word_font_attributes(&self) -> Option<FontAttributes> {
        let (mut bold, mut italic, mut underlined) = (sys::FALSE, sys::FALSE, sys::FALSE);
        let (mut monospace, mut serif, mut smallcaps) = (sys::FALSE, sys::FALSE, sys::FALSE);
        let (mut pointsize, mut font_id): (c_int, c_int) = (0, 0);

        let name = unsafe {
            borrowed_text(sys::TessResultIteratorWordFontAttributes(
                self.ptr.as_ptr(),
                &mut bold,
                &mut italic,
                &mut underlined,
                &mut monospace,
                &mut serif,
                &mut smallcaps,
                &mut pointsize,
                &mut font_id,
            ))
        }?;

        Some(FontAttributes {
            font_name: name,
            is_bold: bold != sys::FALSE,
            is_italic: italic != sys::FALSE,
            is_underlined: underlined != sys::FALSE,
            is_monospace: monospace != sys::FALSE,
            is_serif: serif != sys::FALSE,
            is_smallcaps: smallcaps != sys::FALSE,
            pointsize,
            font_id,
        })
    }

    fn word_recognition_language(&self) -> Option<String> {
        unsafe { borrowed_text(sys::TessResultIteratorWordRecognitionLanguage(self.ptr.as_ptr())) }
    }

    fn word_is_from_dictionary(&self) -> bool {
        unsafe { sys::TessResultIteratorWordIsFromDictionary(self.ptr.as_ptr()) != sys::FALSE }
    }

    fn word_is_numeric(&self) -> bool {
        unsafe { sys::TessResultIteratorWordIsNumeric(self.ptr.as_ptr()) != sys::FALSE }
    }
}

impl Drop for ResultIterator<'_> {
    fn drop(&mut self) {
        unsafe { sys::TessResultIteratorDelete(self.ptr.as_ptr()) }
    }
}

/// Layout-only iterator from `TessBaseAPIAnalyseLayout`
pub struct LayoutIterator<'a> {
    page: RawPage,
    _api: PhantomData<&'a mut BaseApi>,
}

impl<'a> LayoutIterator<'a> {
    pub(super) fn new(ptr: NonNull<sys::TessPageIterator>) -> Self {
        Self {
            page: RawPage(ptr),
            _api: PhantomData,
        }
    }

    fn page(&self) -> RawPage {
        self.page
    }

    fn step(&mut self, level: PageIteratorLevel) -> bool {
        self.page.next(level)
    }

    /// Independent copy positioned at the same element
    pub fn try_clone(&self) -> Option<LayoutIterator<'a>> {
        NonNull::new(unsafe { sys::TessPageIteratorCopy(self.page.ptr()) }).map(LayoutIterator::new)
    }
}

page_cursor!(LayoutIterator<'_>);

impl Drop for LayoutIterator<'_> {
    fn drop(&mut self) {
        unsafe { sys::TessPageIteratorDelete(self.page.ptr()) }
    }
}

/// Page-iterator view of a [`ResultIterator`]; never released on its own
pub struct PageIteratorView<'r> {
    page: RawPage,
    _owner: PhantomData<&'r mut ()>,
}

impl PageIteratorView<'_> {
    fn page(&self) -> RawPage {
        self.page
    }

    fn step(&mut self, level: PageIteratorLevel) -> bool {
        self.page.next(level)
    }
}

page_cursor!(PageIteratorView<'_>);
