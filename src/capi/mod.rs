//! Tesseract C API surface
//!
//! The numeric enums from `publictypes.h` live here and are always compiled,
//! since configuration and the engine seam use them even without a native
//! engine. The raw `extern "C"` declarations live in [`sys`] and are only
//! compiled with the `engine-tesseract` feature.
//!
//! Every enum carries its native discriminant. Values coming back from the
//! native side go through `TryFrom<c_int>`; an unknown value is reported as
//! an error instead of being transmuted.

#[cfg(feature = "engine-tesseract")]
pub mod sys;

use crate::error::OcrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::os::raw::c_int;
use std::str::FromStr;

macro_rules! c_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(i32)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant = $value, )+
        }

        impl $name {
            /// Every variant, in discriminant order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Native discriminant
            pub fn as_raw(self) -> c_int {
                self as c_int
            }

            /// Lowercase name used by the CLI and configuration files
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl TryFrom<c_int> for $name {
            type Error = OcrError;

            fn try_from(raw: c_int) -> Result<Self, OcrError> {
                match raw {
                    $( $value => Ok($name::$variant), )+
                    other => Err(OcrError::Internal(format!(
                        "native returned unknown {} value {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = OcrError;

            /// Accepts either the lowercase name or the numeric value
            fn from_str(s: &str) -> Result<Self, OcrError> {
                let needle = s.trim().to_lowercase();
                if let Some(found) = $name::ALL.iter().find(|v| v.as_str() == needle) {
                    return Ok(*found);
                }
                needle
                    .parse::<c_int>()
                    .ok()
                    .and_then(|raw| $name::try_from(raw).ok())
                    .ok_or_else(|| {
                        OcrError::InvalidArgument(format!(
                            "'{}' is not a valid {}",
                            s,
                            stringify!($name)
                        ))
                    })
            }
        }
    };
}

c_enum! {
    /// OCR engine selection (`TessOcrEngineMode`)
    OcrEngineMode {
        /// Legacy engine only
        TesseractOnly = 0 => "tesseract_only",
        /// Neural net LSTM engine only
        LstmOnly = 1 => "lstm_only",
        /// Legacy and LSTM engines combined
        TesseractLstmCombined = 2 => "combined",
        /// Whatever is available in the loaded language data
        Default = 3 => "default",
    }
}

impl Default for OcrEngineMode {
    fn default() -> Self {
        OcrEngineMode::Default
    }
}

c_enum! {
    /// Page segmentation mode (`TessPageSegMode`)
    PageSegMode {
        /// Orientation and script detection only
        OsdOnly = 0 => "osd_only",
        /// Automatic page segmentation with OSD
        AutoOsd = 1 => "auto_osd",
        /// Automatic page segmentation, no OSD, no OCR
        AutoOnly = 2 => "auto_only",
        /// Fully automatic page segmentation, no OSD
        Auto = 3 => "auto",
        SingleColumn = 4 => "single_column",
        SingleBlockVertText = 5 => "single_block_vert_text",
        SingleBlock = 6 => "single_block",
        SingleLine = 7 => "single_line",
        SingleWord = 8 => "single_word",
        CircleWord = 9 => "circle_word",
        SingleChar = 10 => "single_char",
        SparseText = 11 => "sparse_text",
        SparseTextOsd = 12 => "sparse_text_osd",
        /// Single text line, bypassing Tesseract-specific hacks
        RawLine = 13 => "raw_line",
    }
}

impl Default for PageSegMode {
    fn default() -> Self {
        PageSegMode::Auto
    }
}

c_enum! {
    /// Iterator granularity (`TessPageIteratorLevel`)
    PageIteratorLevel {
        Block = 0 => "block",
        Para = 1 => "para",
        TextLine = 2 => "textline",
        Word = 3 => "word",
        Symbol = 4 => "symbol",
    }
}

impl Default for PageIteratorLevel {
    fn default() -> Self {
        PageIteratorLevel::Word
    }
}

c_enum! {
    /// Block classification (`TessPolyBlockType`)
    PolyBlockType {
        Unknown = 0 => "unknown",
        FlowingText = 1 => "flowing_text",
        HeadingText = 2 => "heading_text",
        PulloutText = 3 => "pullout_text",
        Equation = 4 => "equation",
        InlineEquation = 5 => "inline_equation",
        Table = 6 => "table",
        VerticalText = 7 => "vertical_text",
        CaptionText = 8 => "caption_text",
        FlowingImage = 9 => "flowing_image",
        HeadingImage = 10 => "heading_image",
        PulloutImage = 11 => "pullout_image",
        HorzLine = 12 => "horz_line",
        VertLine = 13 => "vert_line",
        Noise = 14 => "noise",
    }
}

c_enum! {
    /// Page orientation (`TessOrientation`)
    Orientation {
        PageUp = 0 => "page_up",
        PageRight = 1 => "page_right",
        PageDown = 2 => "page_down",
        PageLeft = 3 => "page_left",
    }
}

c_enum! {
    /// Writing direction (`TessWritingDirection`)
    WritingDirection {
        LeftToRight = 0 => "left_to_right",
        RightToLeft = 1 => "right_to_left",
        TopToBottom = 2 => "top_to_bottom",
    }
}

c_enum! {
    /// Order of text lines within a block (`TessTextlineOrder`)
    TextlineOrder {
        LeftToRight = 0 => "left_to_right",
        RightToLeft = 1 => "right_to_left",
        TopToBottom = 2 => "top_to_bottom",
    }
}

c_enum! {
    /// Paragraph justification (`TessParagraphJustification`)
    ParagraphJustification {
        Unknown = 0 => "unknown",
        Left = 1 => "left",
        Center = 2 => "center",
        Right = 3 => "right",
    }
}
