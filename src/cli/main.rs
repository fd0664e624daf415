//! Poster generation CLI
//!
//! Three subcommands drive the library: `segment` cuts a subject out of a
//! photo, `compose` lays a cut-out onto a template, and `generate` does both.

use super::config::CliConfigBuilder;
use crate::{
    compositor::PosterCompositor,
    generate_poster,
    segmentation::BackgroundSegmenter,
    services::ImageIOService,
    tracing_config::{events, init_cli_tracing, spans, TracingFormat},
    types::{PosterSpec, SegmentationResult},
    utils::{UploadLimits, UploadValidator},
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Instrument};

/// Business poster generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bizposter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Console, global = true)]
    pub log_format: LogFormat,

    /// API key for the remote background removal service
    #[arg(long, env = "BIZPOSTER_REMOVE_BG_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Remote background removal endpoint
    #[arg(long, env = "BIZPOSTER_REMOVE_BG_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Timeout for each remote attempt, in seconds
    #[arg(long, default_value_t = 15, global = true)]
    pub timeout: u64,

    /// Remote attempts before falling back to local segmentation
    #[arg(long, default_value_t = 2, global = true)]
    pub attempts: u32,

    /// Never call the remote service
    #[arg(long, global = true)]
    pub local_only: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Cut the subject out of a photo and save it as a transparent PNG
    Segment {
        /// Input photo (PNG, JPEG or WebP)
        input: PathBuf,

        /// Output PNG
        #[arg(short, long)]
        output: PathBuf,

        /// Skip the upload size and dimension checks
        #[arg(long)]
        skip_upload_checks: bool,
    },

    /// Compose a poster from an already segmented subject
    Compose {
        /// Transparent subject image
        #[arg(long)]
        foreground: PathBuf,

        /// Template artwork
        #[arg(long)]
        template: PathBuf,

        #[command(flatten)]
        text: TextArgs,

        /// TrueType font used for all text
        #[arg(long)]
        font: Option<PathBuf>,

        /// Output PNG
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Segment a photo and compose it onto a template
    Generate {
        /// Input photo (PNG, JPEG or WebP)
        photo: PathBuf,

        /// Template artwork
        #[arg(long)]
        template: PathBuf,

        #[command(flatten)]
        text: TextArgs,

        /// TrueType font used for all text
        #[arg(long)]
        font: Option<PathBuf>,

        /// Output PNG
        #[arg(short, long)]
        output: PathBuf,

        /// Also save the segmented subject
        #[arg(long)]
        save_cutout: Option<PathBuf>,

        /// Skip the upload size and dimension checks
        #[arg(long)]
        skip_upload_checks: bool,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Segment { .. } => "segment",
            Self::Compose { .. } => "compose",
            Self::Generate { .. } => "generate",
        }
    }
}

/// Poster text; empty fields fall back to placeholders
#[derive(Args, Debug, Clone, Default)]
pub struct TextArgs {
    /// Company profile JSON (camelCase keys); flags below override it
    #[arg(long)]
    pub profile: Option<PathBuf>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub business_type: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub tagline: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum LogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<LogFormat> for TracingFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Console => Self::Console,
            LogFormat::Compact => Self::Compact,
            #[cfg(feature = "tracing-json")]
            LogFormat::Json => Self::Json,
        }
    }
}

/// Main entry point for CLI
pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id =
        init_cli_tracing(cli.verbose, cli.log_format.into()).context("Failed to initialize tracing")?;
    let span = spans::session(&session_id, cli.command.name());

    let start = Instant::now();
    let outcome = run(&cli).instrument(span).await;
    events::performance_metric(cli.command.name(), start.elapsed().as_millis() as u64);

    if let Err(e) = &outcome {
        events::error_with_context(&**e, cli.command.name());
    }
    outcome
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Segment {
            input,
            output,
            skip_upload_checks,
        } => {
            let segmenter = CliConfigBuilder::segmenter(cli)?;
            let bytes = read_photo(input, *skip_upload_checks).await?;

            let result = with_spinner("Removing background", segmenter.segment(&bytes)).await;
            let summary = describe(&result);
            let image = result.into_image().context("Segmentation failed")?;

            ImageIOService::save_png(&image, output)
                .with_context(|| format!("Failed to write '{}'", output.display()))?;
            println!("{} -> {} ({})", input.display(), output.display(), summary);
        },

        Command::Compose {
            foreground,
            template,
            text,
            font,
            output,
        } => {
            let text = CliConfigBuilder::poster_text(text)?;
            let compositor = PosterCompositor::new(
                CliConfigBuilder::compositor_config(),
                CliConfigBuilder::text_renderer(font.as_deref())?,
            )?;

            let foreground = ImageIOService::load_asset(foreground)?;
            let template = ImageIOService::load_asset(template)?;
            let spec = PosterSpec {
                company_name: text.company_name,
                business_type: text.business_type,
                phone_number: text.phone_number,
                tagline: text.tagline,
                foreground,
                template,
            };

            let poster = compositor.compose(&spec).context("Failed to compose poster")?;
            poster
                .save_png(output)
                .with_context(|| format!("Failed to write '{}'", output.display()))?;
            println!("Poster saved to {}", output.display());
        },

        Command::Generate {
            photo,
            template,
            text,
            font,
            output,
            save_cutout,
            skip_upload_checks,
        } => {
            let text = CliConfigBuilder::poster_text(text)?;
            let segmenter: BackgroundSegmenter = CliConfigBuilder::segmenter(cli)?;
            let compositor = PosterCompositor::new(
                CliConfigBuilder::compositor_config(),
                CliConfigBuilder::text_renderer(font.as_deref())?,
            )?;

            let bytes = read_photo(photo, *skip_upload_checks).await?;
            let template = ImageIOService::load_asset(template)?;

            let generated = with_spinner(
                "Generating poster",
                generate_poster(&bytes, template, &text, &segmenter, &compositor),
            )
            .await
            .context("Failed to generate poster")?;

            if let Some(path) = save_cutout {
                ImageIOService::save_png(&generated.cutout, path)
                    .with_context(|| format!("Failed to write '{}'", path.display()))?;
            }
            generated
                .poster
                .save_png(output)
                .with_context(|| format!("Failed to write '{}'", output.display()))?;

            info!(
                source = %generated.segmentation_source,
                remote_attempts = generated.remote_attempts,
                "Poster generated"
            );
            println!(
                "Poster saved to {} (background: {})",
                output.display(),
                generated.segmentation_source
            );
        },
    }

    Ok(())
}

async fn read_photo(path: &Path, skip_checks: bool) -> Result<Vec<u8>> {
    async {
        let bytes = ImageIOService::read_bytes(path).await?;

        if !skip_checks {
            let (width, height) = UploadValidator::validate_bytes(&bytes, &UploadLimits::default())
                .with_context(|| format!("'{}' rejected", path.display()))?;
            info!(width, height, bytes = bytes.len(), "Photo accepted");
        }

        Ok::<_, anyhow::Error>(bytes)
    }
    .instrument(spans::file_processing(path))
    .await
}

fn describe(result: &SegmentationResult) -> String {
    match result.source {
        Some(source) => format!(
            "{}, {} remote attempt(s), {} ms",
            source, result.remote_attempts, result.elapsed_ms
        ),
        None => "failed".to_string(),
    }
}

async fn with_spinner<F: std::future::Future>(message: &'static str, future: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let output = future.await;
    spinner.finish_and_clear();
    output
}
