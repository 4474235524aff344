//! OCR engine implementations
//!
//! Native engines are conditionally compiled based on feature flags. Without
//! one, the façade still works with any other [`OcrEngine`](crate::engine::OcrEngine).

#[cfg(feature = "engine-tesseract")]
pub mod tesseract;

/// Error message for builds without a native engine
pub const NO_ENGINE_MESSAGE: &str =
    "No OCR engine available. Build with --features static-tesseract or --features system-tesseract";

/// Names of the engines compiled into this build
pub fn compiled_engines() -> Vec<&'static str> {
    let mut engines = Vec::new();

    #[cfg(feature = "engine-tesseract")]
    engines.push("tesseract");

    engines
}

/// Create the default native engine
#[cfg(feature = "engine-tesseract")]
pub fn default_engine() -> Result<tesseract::BaseApi, crate::error::OcrError> {
    tracing::debug!(
        "Creating tesseract engine (library {})",
        tesseract::BaseApi::library_version()
    );
    tesseract::BaseApi::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiled_engines_follow_features() {
        let engines = compiled_engines();
        assert_eq!(engines.contains(&"tesseract"), cfg!(feature = "engine-tesseract"));
    }
}
