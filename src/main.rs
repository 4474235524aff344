use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tessapi::capi::{OcrEngineMode, PageIteratorLevel, PageSegMode};
use tessapi::config::{parse_variable, TessConfig};
use tessapi::engine::OcrEngine;
use tessapi::pixels::Rect;
use tessapi::renderer::RenderedFormat;
use tessapi::tesseract::{outputbase_for, Tesseract};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "tessapi")]
#[command(about = "Tesseract OCR from the command line")]
#[command(version)]
pub struct Args {
    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX", global = true)]
    pub tessdata_path: Option<PathBuf>,

    /// Language(s) for OCR, joined with '+' (e.g. "eng", "eng+deu")
    #[arg(long, env = "OCR_DEFAULT_LANGUAGE", global = true)]
    pub language: Option<String>,

    /// OCR engine mode (tesseract_only, lstm_only, combined, default or 0-3)
    #[arg(long, global = true)]
    pub oem: Option<OcrEngineMode>,

    /// Page segmentation mode (e.g. auto, single_block, or 0-13)
    #[arg(long, global = true)]
    pub psm: Option<PageSegMode>,

    /// Engine variable as NAME=VALUE; may be repeated
    #[arg(long = "var", value_name = "NAME=VALUE", global = true)]
    pub variables: Vec<String>,

    /// Config file read at initialization (e.g. "digits"); may be repeated
    #[arg(long = "config", value_name = "NAME", global = true)]
    pub configs: Vec<String>,

    /// JSON settings file; command-line options override it
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Download missing language data from tessdata_fast
    #[arg(long, global = true)]
    pub download_tessdata: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recognize text in images or PDFs
    Ocr {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Only recognize this region, as left,top,width,height
        #[arg(long)]
        rect: Option<Rect>,

        /// Print hOCR markup instead of plain text
        #[arg(long)]
        hocr: bool,

        /// Print one JSON object per input
        #[arg(long)]
        json: bool,
    },

    /// List recognized elements with confidence and bounding box as JSON
    Words {
        input: PathBuf,

        /// Granularity: block, para, textline, word or symbol
        #[arg(long, default_value = "word")]
        level: PageIteratorLevel,
    },

    /// Write searchable documents (text, hocr, pdf, box, unlv, tsv, alto)
    Render {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory receiving <input stem>.<extension> files
        #[arg(long, short = 'o', default_value = ".")]
        output_dir: PathBuf,

        /// Comma-separated output formats
        #[arg(long = "format", value_delimiter = ',', default_value = "text")]
        formats: Vec<RenderedFormat>,
    },

    /// List languages available in the tessdata directory
    Langs,

    /// Print version information
    Version,
}

#[derive(Serialize)]
struct OcrOutput<'a> {
    input: &'a std::path::Path,
    text: String,
    mean_confidence: Option<i32>,
}

#[derive(Serialize)]
struct LanguagesOutput {
    datapath: Option<String>,
    loaded: Vec<String>,
    available: Vec<String>,
}

fn build_config(args: &Args) -> anyhow::Result<TessConfig> {
    let mut config = match &args.settings {
        Some(path) => TessConfig::from_file(path)?,
        None => TessConfig::default(),
    };

    if let Some(path) = &args.tessdata_path {
        config.datapath = Some(path.clone());
    }
    if let Some(language) = &args.language {
        config.language = language.clone();
    }
    if let Some(oem) = args.oem {
        config.engine_mode = oem;
    }
    if let Some(psm) = args.psm {
        config.page_seg_mode = psm;
    }
    for raw in &args.variables {
        let (name, value) = parse_variable(raw)?;
        config.set_variable(name, value);
    }
    config.configs.extend(args.configs.iter().cloned());
    config.download_tessdata |= args.download_tessdata;

    if let Command::Ocr { hocr: true, .. } = args.command {
        config.hocr = true;
    }

    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = build_config(&args)?;

    tracing::info!("Starting tessapi v{}", env!("CARGO_PKG_VERSION"));

    if let Command::Version = args.command {
        println!("tessapi {}", env!("CARGO_PKG_VERSION"));
        println!("engines: {}", tessapi::engines::compiled_engines().join(", "));
        #[cfg(feature = "engine-tesseract")]
        println!(
            "tesseract {}",
            tessapi::engines::tesseract::BaseApi::library_version()
        );
        return Ok(());
    }

    run(config, args.command)
}

#[cfg(feature = "engine-tesseract")]
fn run(config: TessConfig, command: Command) -> anyhow::Result<()> {
    let engine = tessapi::engines::default_engine()?;
    execute(Tesseract::new(engine, config), command)
}

#[cfg(not(feature = "engine-tesseract"))]
fn run(_config: TessConfig, _command: Command) -> anyhow::Result<()> {
    anyhow::bail!(tessapi::engines::NO_ENGINE_MESSAGE)
}

#[cfg_attr(not(feature = "engine-tesseract"), allow(dead_code))]
fn execute<E: OcrEngine>(mut tess: Tesseract<E>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Ocr {
            inputs,
            rect,
            hocr: _,
            json,
        } => {
            for input in &inputs {
                let text = tess
                    .do_ocr_file_region(input, rect)
                    .with_context(|| format!("recognizing {}", input.display()))?;

                if json {
                    let output = OcrOutput {
                        input,
                        text,
                        mean_confidence: tess.mean_confidence(),
                    };
                    println!("{}", serde_json::to_string(&output)?);
                } else {
                    print!("{}", text);
                }
            }
        }

        Command::Words { input, level } => {
            let pages = tessapi::decode::load_pages(&input)?;
            let mut elements = Vec::new();
            for page in &pages {
                elements.extend(tess.text_elements(page, level)?);
            }
            println!("{}", serde_json::to_string_pretty(&elements)?);
        }

        Command::Render {
            inputs,
            output_dir,
            formats,
        } => {
            let outputbases: Vec<PathBuf> = inputs.iter().map(|i| outputbase_for(i, &output_dir)).collect();
            let reports = tess.create_documents(&inputs, &outputbases, &formats)?;
            println!("{}", serde_json::to_string_pretty(&reports)?);

            let failed: usize = reports.iter().map(|r| r.failures().len()).sum();
            if failed > 0 {
                anyhow::bail!("{} output(s) could not be written", failed);
            }
        }

        Command::Langs => {
            tess.init()?;
            let engine = tess.engine();
            let output = LanguagesOutput {
                datapath: engine.datapath(),
                loaded: engine.loaded_languages(),
                available: engine.available_languages(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Version => {}
    }

    Ok(())
}
