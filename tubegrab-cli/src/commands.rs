//! CLI command implementations

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use tubegrab_core::{
    DownloadFormat, DownloadService, QualityChoice, RuntimeMode, TubegrabConfig,
};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Host to bind to (overrides TUBEGRAB_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (overrides TUBEGRAB_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show title, thumbnail and available resolutions of a video
    Info {
        /// Video URL
        url: String,
    },
    /// Download a video or its audio track
    Fetch {
        /// Video URL
        url: String,
        /// Output format: mp4 or mp3
        #[arg(short, long, default_value = "mp4")]
        format: String,
        /// Resolution label such as 720p, or "highest"
        #[arg(short, long)]
        quality: Option<String>,
        /// Output file (defaults to the sanitized title in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that the resolver and transcoder are usable
    Check,
}

/// Handle the CLI command
///
/// # Errors
/// Returns the failure of the command with context attached
pub async fn handle_command(command: Commands, mode: RuntimeMode) -> anyhow::Result<()> {
    let config = TubegrabConfig::from_env();
    match command {
        Commands::Serve { host, port } => serve(config, mode, host, port).await,
        Commands::Info { url } => show_info(&config, mode, &url).await,
        Commands::Fetch {
            url,
            format,
            quality,
            output,
        } => fetch(&config, mode, &url, &format, quality.as_deref(), output).await,
        Commands::Check => check(&config, mode).await,
    }
}

async fn serve(
    mut config: TubegrabConfig,
    mode: RuntimeMode,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tubegrab_web::run_server(config, mode)
        .await
        .map_err(|e| anyhow::anyhow!("server failed: {e}"))
}

async fn show_info(config: &TubegrabConfig, mode: RuntimeMode, url: &str) -> anyhow::Result<()> {
    let service = DownloadService::from_config(config, mode)?;
    let summary = service
        .lookup(url)
        .await
        .with_context(|| format!("failed to look up {url}"))?;

    println!("Title:       {}", summary.title);
    println!(
        "Thumbnail:   {}",
        summary.thumbnail_url.as_deref().unwrap_or("-")
    );
    if summary.resolutions.is_empty() {
        println!("Resolutions: none (audio download only)");
    } else {
        println!("Resolutions: {}", summary.resolutions.join(", "));
    }
    Ok(())
}

async fn fetch(
    config: &TubegrabConfig,
    mode: RuntimeMode,
    url: &str,
    format: &str,
    quality: Option<&str>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let format: DownloadFormat = format.parse()?;
    let quality = QualityChoice::from_form(quality);
    let service = DownloadService::from_config(config, mode)?;

    println!("Downloading {url} as {format} ({quality})...");
    let artifact = service
        .download(url, format, &quality)
        .await
        .with_context(|| format!("failed to download {url}"))?;

    let path = output.unwrap_or_else(|| PathBuf::from(&artifact.file_name));
    tokio::fs::write(&path, &artifact.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!(
        "Saved {} ({} bytes, {})",
        path.display(),
        artifact.bytes.len(),
        artifact.mime_type()
    );
    Ok(())
}

async fn check(config: &TubegrabConfig, mode: RuntimeMode) -> anyhow::Result<()> {
    let service = DownloadService::from_config(config, mode)?;
    let report = service.check_dependencies().await;

    let status = |ok: bool| if ok { "ok" } else { "MISSING" };
    println!("Mode:        {mode}");
    println!(
        "Resolver:    {} ({})",
        report.resolver,
        status(report.resolver_available)
    );
    println!("Transcoder:  {}", status(report.transcoder_available));

    if !report.resolver_available || !report.transcoder_available {
        anyhow::bail!("one or more dependencies are unavailable");
    }
    tracing::debug!("All dependencies available");
    Ok(())
}
