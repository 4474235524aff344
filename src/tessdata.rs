//! Language data resolution
//!
//! Finds the directory holding `<lang>.traineddata` files: an explicitly
//! configured path first, then `TESSDATA_PREFIX`, then a per-user cache
//! directory. Missing files can be downloaded from tessdata_fast on request.

use crate::config::TessConfig;
use crate::error::OcrError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Resolve the datapath for `config`, verifying every configured language
pub fn resolve_datapath(config: &TessConfig) -> Result<PathBuf, OcrError> {
    let from_env = std::env::var_os("TESSDATA_PREFIX")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    resolve_from(
        config.datapath.as_deref(),
        from_env,
        &config.languages(),
        config.download_tessdata,
    )
}

fn resolve_from(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    languages: &[&str],
    download: bool,
) -> Result<PathBuf, OcrError> {
    if languages.is_empty() {
        return Err(OcrError::InitializationError("no language configured".to_string()));
    }

    let (dir, source) = match (explicit, from_env) {
        (Some(path), _) => (path.to_path_buf(), "configured path"),
        (None, Some(path)) => (path, "TESSDATA_PREFIX"),
        (None, None) => (cache_dir(), "cache directory"),
    };

    if download {
        std::fs::create_dir_all(&dir).map_err(|e| {
            OcrError::InitializationError(format!("Failed to create tessdata directory: {}", e))
        })?;
    } else if !dir.is_dir() {
        return Err(OcrError::InitializationError(format!(
            "tessdata directory {} ({}) does not exist",
            dir.display(),
            source
        )));
    }

    for language in missing_languages(&dir, languages) {
        if !download {
            return Err(OcrError::InitializationError(format!(
                "language data '{}' not found in {} ({})",
                language,
                dir.display(),
                source
            )));
        }

        let target = traineddata_path(&dir, &language);
        tracing::info!(
            "Downloading tessdata for '{}' (this may take a moment)...",
            language
        );
        download_file(&tessdata_url(&language), &target)?;
        tracing::info!("Downloaded tessdata to {:?}", target);
    }

    tracing::debug!("Using tessdata from {:?} ({})", dir, source);
    Ok(dir)
}

/// Per-user cache directory for downloaded language data
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("tessapi")
        .join("tessdata")
}

pub fn traineddata_path(dir: &Path, language: &str) -> PathBuf {
    dir.join(format!("{}.traineddata", language))
}

/// Languages from `languages` without a traineddata file in `dir`
pub fn missing_languages(dir: &Path, languages: &[&str]) -> Vec<String> {
    languages
        .iter()
        .filter(|l| !traineddata_path(dir, l).is_file())
        .map(|l| l.to_string())
        .collect()
}

/// Languages with a traineddata file in `dir`, sorted
pub fn installed_languages(dir: &Path) -> Result<Vec<String>, OcrError> {
    let mut languages: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "traineddata"))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    languages.sort();
    Ok(languages)
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // Use tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::InitializationError(format!("Failed to download tessdata: {}", e)))?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        OcrError::InitializationError(format!("Failed to read tessdata response: {}", e))
    })?;

    // Write beside the target first so an interrupted download never leaves
    // a truncated traineddata file behind
    let partial = path.with_extension("traineddata.part");
    let mut file = File::create(&partial).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create tessdata file: {}", e))
    })?;
    file.write_all(&buffer).map_err(|e| {
        OcrError::InitializationError(format!("Failed to write tessdata file: {}", e))
    })?;
    std::fs::rename(&partial, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tessdata_with(languages: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for language in languages {
            std::fs::write(traineddata_path(dir.path(), language), b"stub").unwrap();
        }
        dir
    }

    #[test]
    fn test_explicit_path_wins_over_env() {
        let explicit = tessdata_with(&["eng"]);
        let env = tessdata_with(&["eng"]);

        let resolved = resolve_from(Some(explicit.path()), Some(env.path().to_path_buf()), &["eng"], false).unwrap();
        assert_eq!(resolved, explicit.path());
    }

    #[test]
    fn test_env_used_when_nothing_configured() {
        let env = tessdata_with(&["eng", "deu"]);
        let resolved = resolve_from(None, Some(env.path().to_path_buf()), &["eng", "deu"], false).unwrap();
        assert_eq!(resolved, env.path());
    }

    #[test]
    fn test_missing_language_is_an_init_error() {
        let dir = tessdata_with(&["eng"]);
        let err = resolve_from(Some(dir.path()), None, &["eng", "fra"], false).unwrap_err();
        assert_eq!(err.code(), "INIT_ERROR");
        assert!(err.to_string().contains("'fra'"));
    }

    #[test]
    fn test_missing_directory_is_an_init_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        assert!(resolve_from(Some(&gone), None, &["eng"], false).is_err());
    }

    #[test]
    fn test_installed_languages_lists_traineddata_only() {
        let dir = tessdata_with(&["osd", "eng"]);
        std::fs::write(dir.path().join("pdf.ttf"), b"font").unwrap();
        assert_eq!(installed_languages(dir.path()).unwrap(), vec!["eng", "osd"]);
        assert_eq!(missing_languages(dir.path(), &["eng", "jpn"]), vec!["jpn"]);
    }
}
