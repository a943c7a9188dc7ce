//! Command-line surface of the `pagetext` binary

use anyhow::{Context as _, Result};
use clap::Parser;
use pagetext_common::Device;
use pagetext_pipeline::{LayoutRenderer, Pipeline, PipelineConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "pagetext",
    version,
    about = "Two-column page OCR to TEI XML",
    long_about = "Detect text blocks on a page image with DocLayout-YOLO, order them for a\n\
                  two-column layout, OCR each block with Tesseract and write a TEI document.\n\n\
                  Outputs in the results directory:\n  \
                  - <image name>: page with detected layout boxes\n  \
                  - <stem>.xml: TEI document, one <div> per text block\n  \
                  - <stem>.json: reading order with per-block OCR text",
    after_help = "EXAMPLES:\n  \
                  pagetext --model models/doclayout_yolo_docstructbench_imgsz1280.onnx \\\n    \
                  --image-path assets/page_15.jpg\n\n  \
                  # GPU inference, four concurrent OCR calls, XML echoed to stdout\n  \
                  pagetext --model model.onnx --image-path page.jpg --device cuda --jobs 4 --print"
)]
pub struct Cli {
    /// DocLayout-YOLO ONNX model
    #[arg(long)]
    pub model: PathBuf,

    /// Page image to process
    #[arg(long)]
    pub image_path: PathBuf,

    /// Results directory (created if absent)
    #[arg(long, default_value = "outputs")]
    pub res_path: PathBuf,

    /// Detection confidence threshold [default: 0.3]
    #[arg(long)]
    pub conf: Option<f32>,

    /// Inference device: cpu, cuda or coreml [default: cpu]
    #[arg(long)]
    pub device: Option<Device>,

    /// Model input size [default: 1280]
    #[arg(long)]
    pub imgsz: Option<u32>,

    /// Tesseract language [default: fra]
    #[arg(long)]
    pub lang: Option<String>,

    /// Layout class to OCR [default: 1, plain text]
    #[arg(long)]
    pub target_class: Option<u32>,

    /// Per-block OCR timeout in seconds [default: 30]
    #[arg(long)]
    pub ocr_timeout_secs: Option<u64>,

    /// Concurrent OCR calls [default: 1]
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Binarize the page before OCR
    #[arg(long)]
    pub preprocess: bool,

    /// TrueType font for layout labels
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Box line width in the layout image [default: 2]
    #[arg(long)]
    pub line_width: Option<u32>,

    /// Label font size in the layout image [default: 14]
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Print the TEI document to stdout
    #[arg(long)]
    pub print: bool,

    /// TOML configuration file; flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Configuration file (or defaults) with command-line overrides applied
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_toml_file(path)?,
            None => PipelineConfig::default(),
        };

        config.layout.model_path.clone_from(&self.model);
        if let Some(conf) = self.conf {
            config.layout.confidence_threshold = conf;
        }
        if let Some(device) = self.device {
            config.layout.device = device;
        }
        if let Some(imgsz) = self.imgsz {
            config.layout.input_size = imgsz;
        }
        if let Some(target_class) = self.target_class {
            config.layout.target_class = target_class;
        }
        if let Some(lang) = &self.lang {
            config.ocr.language.clone_from(lang);
        }
        if let Some(secs) = self.ocr_timeout_secs {
            config.extraction.ocr_timeout_ms = secs.saturating_mul(1000);
        }
        if let Some(jobs) = self.jobs {
            config.extraction.max_concurrency = jobs.max(1);
        }
        if self.preprocess {
            config.preprocess.enabled = true;
        }
        if let Some(font) = &self.font {
            config.visualization.font_path = Some(font.clone());
        }
        if let Some(line_width) = self.line_width {
            config.visualization.line_width = line_width;
        }
        if let Some(font_size) = self.font_size {
            config.visualization.font_size = font_size;
        }

        Ok(config)
    }
}

/// Process one page and write its outputs
pub async fn run(cli: &Cli) -> Result<()> {
    let config = cli.pipeline_config()?;
    info!(
        "Processing {} with {} on {}",
        cli.image_path.display(),
        config.layout.model_path.display(),
        config.layout.device
    );

    let renderer = LayoutRenderer::new(config.visualization.clone())
        .context("Failed to prepare layout renderer")?;
    let mut pipeline = Pipeline::new(config).context("Failed to initialize pipeline")?;

    let page = pipeline
        .process_path(&cli.image_path)
        .await
        .with_context(|| format!("Failed to process {}", cli.image_path.display()))?;

    page.write_outputs(&cli.image_path, &cli.res_path, &renderer)?;

    if cli.print {
        print!("{}", page.document.to_xml_string()?);
    }
    println!("Results saved to {}", cli.res_path.display());
    Ok(())
}
