use std::path::PathBuf;

use anyhow::Context as _;
use cirrus::tracing_setup::{self, LogTarget};
use cirrus::{OverlayStyle, RampStyle, ServerConfig, SessionConfig};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cirrus", version, about = "Animated ASCII clouds with live-feed failover")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the animation to Telnet clients.
    Serve(ServeArgs),
    /// Play the animation in this terminal.
    Play(PlayArgs),
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// Initial glyph ramp (dots, stipple, fine, blocks, density).
    #[arg(long = "render-style")]
    render_style: Option<String>,

    /// Initial logo style (bold, minimal, ascii, slant, simple, dots, circles, stipple).
    #[arg(long)]
    style: Option<String>,

    /// Live feed URL (requires `ffmpeg` and `ffprobe` on PATH).
    #[arg(long = "feed-url")]
    feed_url: Option<String>,

    /// Append logs to this file.
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

impl SessionArgs {
    fn apply(&self, cfg: &mut SessionConfig) {
        if let Some(fps) = self.fps {
            cfg.fps = fps;
        }
        if let Some(name) = &self.render_style {
            cfg.ramp_style = RampStyle::from_name_or_default(name);
        }
        if let Some(name) = &self.style {
            cfg.overlay_style = OverlayStyle::from_name_or_default(name);
        }
        if let Some(url) = &self.feed_url {
            cfg.feed_url = Some(url.clone());
        }
    }
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// JSON server config; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[command(flatten)]
    session: SessionArgs,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    #[command(flatten)]
    session: SessionArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve(args) => cmd_serve(args),
        Command::Play(args) => cmd_play(args),
    }
}

/// Whether sessions may launch the configured feed.
fn feed_enabled(cfg: &SessionConfig) -> bool {
    if cfg.feed_url.is_none() {
        return false;
    }
    if !cirrus::is_ffmpeg_on_path() {
        tracing::warn!("ffmpeg not found on PATH; live feed disabled, showing clouds only");
        return false;
    }
    true
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let target = match &args.session.log_file {
        Some(path) => LogTarget::File(path.clone()),
        None => LogTarget::Stderr,
    };
    tracing_setup::init(target, tracing::Level::INFO)?;

    let mut cfg = match &args.config {
        Some(path) => ServerConfig::from_path(path)?,
        None => ServerConfig::default(),
    };
    if let Some(host) = &args.host {
        cfg.host = host.clone();
    }
    if let Some(port) = args.port {
        cfg.port = port;
    }
    args.session.apply(&mut cfg.session);
    cfg.validate()?;
    let feed = feed_enabled(&cfg.session);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    runtime.block_on(async {
        cirrus::transport::server::run_server(cfg, feed, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {e}");
            }
        })
        .await
    })?;
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    // Stderr would scribble over the animation.
    let target = match &args.session.log_file {
        Some(path) => LogTarget::File(path.clone()),
        None => LogTarget::Off,
    };
    tracing_setup::init(target, tracing::Level::INFO)?;

    let mut cfg = SessionConfig::default();
    args.session.apply(&mut cfg);
    cfg.validate()?;
    let feed = feed_enabled(&cfg);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    let exit = runtime.block_on(cirrus::transport::local::play(cfg, feed))?;
    tracing::info!(?exit, "play finished");
    Ok(())
}
