use crate::capi::{OcrEngineMode, PageSegMode};
use crate::error::OcrError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Minimum skew (degrees) worth correcting
pub const DEFAULT_MIN_DESKEW_ANGLE: f64 = 0.05;

/// Engine configuration, applied at initialization and never mid-call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessConfig {
    /// Directory holding `<lang>.traineddata`; falls back to
    /// `TESSDATA_PREFIX` and then the user cache directory
    pub datapath: Option<PathBuf>,
    /// Languages joined with `+` (e.g. "eng+deu")
    pub language: String,
    pub engine_mode: OcrEngineMode,
    pub page_seg_mode: PageSegMode,
    /// Variables set after initialization, in order
    pub variables: Vec<(String, String)>,
    /// Variables that must be set during initialization (e.g. `load_system_dawg`)
    pub init_variables: Vec<(String, String)>,
    /// Config files read during initialization (e.g. "digits", "hocr")
    pub configs: Vec<String>,
    /// Return hOCR markup instead of plain text
    pub hocr: bool,
    /// Scanning resolution to report to the engine when the image carries none
    pub source_resolution: Option<u32>,
    pub min_deskew_angle: f64,
    /// Download missing language data from tessdata_fast
    pub download_tessdata: bool,
}

impl Default for TessConfig {
    fn default() -> Self {
        Self {
            datapath: None,
            language: "eng".to_string(),
            engine_mode: OcrEngineMode::default(),
            page_seg_mode: PageSegMode::default(),
            variables: Vec::new(),
            init_variables: Vec::new(),
            configs: Vec::new(),
            hocr: false,
            source_resolution: None,
            min_deskew_angle: DEFAULT_MIN_DESKEW_ANGLE,
            download_tessdata: false,
        }
    }
}

impl TessConfig {
    /// Load from a JSON settings file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, OcrError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| OcrError::InvalidArgument(format!("invalid settings file {}: {}", path.display(), e)))
    }

    /// Set a variable, replacing an earlier value for the same name
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let (name, value) = (name.into(), value.into());
        match self.variables.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.variables.push((name, value)),
        }
        self
    }

    /// Restrict recognition to the given characters
    pub fn set_char_whitelist(&mut self, chars: &str) -> &mut Self {
        self.set_variable("tessedit_char_whitelist", chars)
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Languages listed in `language`
    pub fn languages(&self) -> Vec<&str> {
        self.language
            .split('+')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }
}

/// Parse a `name=value` pair as given on the command line
pub fn parse_variable(raw: &str) -> Result<(String, String), OcrError> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(OcrError::InvalidArgument(format!(
            "variable '{}' must look like name=value",
            raw
        ))),
    }
}
