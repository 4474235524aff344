//! Guarded traversal over recognized elements.
//!
//! Native iterators happily read through a cursor that was never positioned
//! or has run off the end of the page. [`ElementCursor`] tracks where the
//! cursor is and answers `None` instead of asking the engine whenever it is
//! not on an element.

use crate::capi::{PageIteratorLevel, PolyBlockType};
use crate::engine::{Baseline, BoundingBox, FontAttributes, PageCursor, PageOrientation, ParagraphInfo, ResultCursor};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    NotBegun,
    AtElement,
    Exhausted,
}

/// One recognized element, copied out of the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextElement {
    pub text: String,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
    pub level: PageIteratorLevel,
}

/// Forward-only cursor at a fixed granularity
pub struct ElementCursor<C> {
    raw: C,
    level: PageIteratorLevel,
    position: Position,
}

impl<C: PageCursor> ElementCursor<C> {
    /// Wrap a raw cursor. Nothing can be read until [`begin`](Self::begin).
    pub fn new(raw: C, level: PageIteratorLevel) -> Self {
        Self {
            raw,
            level,
            position: Position::NotBegun,
        }
    }

    pub fn level(&self) -> PageIteratorLevel {
        self.level
    }

    /// True when the cursor is positioned on an element
    pub fn is_valid(&self) -> bool {
        self.position == Position::AtElement
    }

    /// Reset to the first element; returns whether the page has one
    pub fn begin(&mut self) -> bool {
        self.raw.begin();
        self.position = if self.raw.bounding_box(self.level).is_some() {
            Position::AtElement
        } else {
            Position::Exhausted
        };
        self.is_valid()
    }

    /// Move to the next element; returns whether one remains.
    ///
    /// Does nothing before `begin` or after the last element.
    pub fn advance(&mut self) -> bool {
        if self.position != Position::AtElement {
            return false;
        }

        if self.raw.advance(self.level) && self.raw.bounding_box(self.level).is_some() {
            true
        } else {
            self.position = Position::Exhausted;
            false
        }
    }

    fn current(&self) -> Option<&C> {
        self.is_valid().then_some(&self.raw)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.current()?.bounding_box(self.level)
    }

    pub fn block_type(&self) -> Option<PolyBlockType> {
        self.current()?.block_type()
    }

    pub fn baseline(&self) -> Option<Baseline> {
        self.current()?.baseline(self.level)
    }

    pub fn is_at_beginning_of(&self, level: PageIteratorLevel) -> Option<bool> {
        Some(self.current()?.is_at_beginning_of(level))
    }

    /// Whether the current element is the last `element` inside its `level`
    /// parent (e.g. last word of a line)
    pub fn is_at_final_element(&self, level: PageIteratorLevel, element: PageIteratorLevel) -> Option<bool> {
        Some(self.current()?.is_at_final_element(level, element))
    }

    pub fn orientation(&mut self) -> Option<PageOrientation> {
        if !self.is_valid() {
            return None;
        }
        self.raw.orientation()
    }

    pub fn paragraph_info(&mut self) -> Option<ParagraphInfo> {
        if !self.is_valid() {
            return None;
        }
        self.raw.paragraph_info()
    }

    pub fn into_inner(self) -> C {
        self.raw
    }
}

impl<C: ResultCursor> ElementCursor<C> {
    pub fn text(&self) -> Option<String> {
        self.current()?.text(self.level)
    }

    pub fn confidence(&self) -> Option<f32> {
        Some(self.current()?.confidence(self.level))
    }

    /// Font attributes of the word containing the current element
    pub fn font_attributes(&self) -> Option<FontAttributes> {
        self.current()?.word_font_attributes()
    }

    pub fn recognition_language(&self) -> Option<String> {
        self.current()?.word_recognition_language()
    }

    pub fn is_from_dictionary(&self) -> Option<bool> {
        Some(self.current()?.word_is_from_dictionary())
    }

    pub fn is_numeric(&self) -> Option<bool> {
        Some(self.current()?.word_is_numeric())
    }

    /// Snapshot of the current element
    pub fn element(&self) -> Option<TextElement> {
        let raw = self.current()?;
        Some(TextElement {
            text: raw.text(self.level).unwrap_or_default(),
            confidence: raw.confidence(self.level),
            bounding_box: raw.bounding_box(self.level)?,
            level: self.level,
        })
    }

    /// Visit every element from the beginning of the page, exactly once each
    pub fn elements(&mut self) -> Elements<'_, C> {
        Elements {
            cursor: self,
            started: false,
        }
    }
}

/// Iterator adapter returned by [`ElementCursor::elements`]
pub struct Elements<'c, C> {
    cursor: &'c mut ElementCursor<C>,
    started: bool,
}

impl<C: ResultCursor> Iterator for Elements<'_, C> {
    type Item = TextElement;

    fn next(&mut self) -> Option<TextElement> {
        let positioned = if self.started {
            self.cursor.advance()
        } else {
            self.started = true;
            self.cursor.begin()
        };

        if positioned {
            self.cursor.element()
        } else {
            None
        }
    }
}
