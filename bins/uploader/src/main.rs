//! Uploads a local file to a Google Drive folder and prints its link.
//!
//! Usage: cargo run --bin uploader -- --folder <FOLDER_ID> <FILE>

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hackportal_core::storage::DriveUploader;
use hackportal_shared::StorageSettings;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Destination Drive folder id.
    #[arg(long, env = "DRIVE_FOLDER_ID")]
    folder: String,

    /// Name for the uploaded file (defaults to the local file name).
    #[arg(long)]
    name: Option<String>,

    /// MIME type (guessed from the extension when omitted).
    #[arg(long)]
    content_type: Option<String>,

    /// File to upload.
    file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hackportal=info,uploader=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = StorageSettings::load().context("failed to load storage configuration")?;

    let file_name = match args.name {
        Some(name) => name,
        None => args
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .context("file path has no usable file name")?,
    };
    let content_type = args.content_type.unwrap_or_else(|| {
        mime_guess::from_path(&args.file)
            .first_or_octet_stream()
            .essence_str()
            .to_owned()
    });

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let uploader = DriveUploader::from_settings(&settings)?;
    info!(%file_name, %content_type, size = bytes.len(), "Uploading");

    let url = uploader
        .upload(&args.folder, &file_name, &bytes, &content_type)
        .await?;

    println!("{url}");
    Ok(())
}
