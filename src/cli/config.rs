//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, TextArgs};
use crate::{
    compositor::{FontTextRenderer, TextRenderer},
    config::{CompositorConfig, SegmenterConfig},
    profile::{CompanyProfile, PosterText},
    segmentation::BackgroundSegmenter,
};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Convert CLI arguments to library configuration
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the segmenter configuration from global flags
    pub(crate) fn segmenter_config(cli: &Cli) -> Result<SegmenterConfig> {
        let mut builder = SegmenterConfig::builder()
            .timeout_secs(cli.timeout)
            .max_attempts(if cli.local_only { 0 } else { cli.attempts });

        if let Some(endpoint) = &cli.endpoint {
            builder = builder.endpoint(endpoint.clone());
        }
        if let Some(key) = cli.api_key.as_deref().filter(|key| !key.trim().is_empty()) {
            builder = builder.api_key(key.trim());
        }

        builder.build().context("Invalid segmentation settings")
    }

    /// Build a segmenter, reporting whether the remote service is in play
    pub(crate) fn segmenter(cli: &Cli) -> Result<BackgroundSegmenter> {
        let config = Self::segmenter_config(cli)?;
        let segmenter = BackgroundSegmenter::new(config).context("Failed to create segmenter")?;
        debug!(remote = segmenter.has_remote(), "Segmenter ready");
        Ok(segmenter)
    }

    pub(crate) fn compositor_config() -> CompositorConfig {
        CompositorConfig::default()
    }

    /// Load the requested font, or the first system font found
    pub(crate) fn text_renderer(font: Option<&Path>) -> Result<Arc<dyn TextRenderer>> {
        let renderer = match font {
            Some(path) => FontTextRenderer::from_file(path)
                .with_context(|| format!("Failed to load font '{}'", path.display()))?,
            None => FontTextRenderer::discover().context("No font available, pass --font")?,
        };
        Ok(Arc::new(renderer))
    }

    /// Merge a profile file with explicit flags; flags win
    pub(crate) fn poster_text(args: &TextArgs) -> Result<PosterText> {
        let mut profile = match &args.profile {
            Some(path) => CompanyProfile::load(path)
                .with_context(|| format!("Failed to load profile '{}'", path.display()))?,
            None => CompanyProfile::default(),
        };

        let overrides = [
            (&mut profile.company_name, &args.company),
            (&mut profile.business_type, &args.business_type),
            (&mut profile.phone_number, &args.phone),
            (&mut profile.tagline, &args.tagline),
        ];
        for (field, value) in overrides {
            if value.is_some() {
                field.clone_from(value);
            }
        }

        Ok(profile.poster_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_segmenter_config_from_flags() {
        let cli = Cli::try_parse_from([
            "bizposter",
            "--api-key",
            "abc",
            "--timeout",
            "5",
            "segment",
            "in.jpg",
            "-o",
            "out.png",
        ])
        .unwrap();
        let config = CliConfigBuilder::segmenter_config(&cli).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.timeout_secs, 5);
        assert!(config.remote_enabled());
    }

    #[test]
    fn test_local_only_disables_remote() {
        let cli = Cli::try_parse_from([
            "bizposter",
            "--api-key",
            "abc",
            "--local-only",
            "segment",
            "in.jpg",
            "-o",
            "out.png",
        ])
        .unwrap();
        let config = CliConfigBuilder::segmenter_config(&cli).unwrap();
        assert!(!config.remote_enabled());
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let cli = Cli::try_parse_from([
            "bizposter",
            "--timeout",
            "0",
            "segment",
            "in.jpg",
            "-o",
            "out.png",
        ])
        .unwrap();
        assert!(CliConfigBuilder::segmenter_config(&cli).is_err());
    }

    #[test]
    fn test_poster_text_flags_override_profile() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("profile.json");
        std::fs::write(&profile, r#"{"companyName":"From File","tagline":"File tagline"}"#).unwrap();

        let args = TextArgs {
            profile: Some(profile),
            company: None,
            business_type: Some("Bakery".to_string()),
            phone: None,
            tagline: Some("Flag tagline".to_string()),
        };
        let text = CliConfigBuilder::poster_text(&args).unwrap();
        assert_eq!(text.company_name, "From File");
        assert_eq!(text.business_type, "Bakery");
        assert_eq!(text.tagline, "Flag tagline");
        assert_eq!(text.phone_number, "+91 00000 00000");
    }
}
