//! Bizposter CLI Tool
//!
//! Command-line interface for cutting a subject out of a photo and composing
//! it onto a business poster template.

#[cfg(feature = "cli")]
use bizposter::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
