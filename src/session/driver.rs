use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::SessionConfig;
use crate::feed::ffmpeg::FfmpegLauncher;
use crate::feed::live::LiveFeedSource;
use crate::feed::process::FeedLauncher;
use crate::foundation::core::{Fps, Viewport};
use crate::foundation::error::CirrusResult;
use crate::render::glyph_renderer::{
    CLEAR_AND_HOME, ENTER_ALT_SCREEN, GlyphRenderer, HIDE_CURSOR, LEAVE_ALT_SCREEN, SHOW_CURSOR,
};
use crate::render::overlay::LogoOverlay;
use crate::session::input::{InputReceiver, InputSender, KeyAction, input_queue};
use crate::source::orchestrator::StreamOrchestrator;

/// Why [`Session::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionExit {
    /// A quit key was pressed.
    Quit,
    /// [`SessionHandle::stop`] was called.
    Stopped,
    /// Writing to the output channel failed.
    Disconnected,
}

struct HandleInner {
    input: InputSender,
    resize: watch::Sender<Viewport>,
    stop: watch::Sender<bool>,
}

/// Cloneable, thread-safe way for a transport to reach a session.
///
/// Only enqueues; all session state is mutated by the session's own task.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

impl SessionHandle {
    pub fn push_input(&self, c: char) -> bool {
        self.inner.input.push(c)
    }

    pub fn push_str(&self, s: &str) -> usize {
        self.inner.input.push_str(s)
    }

    /// Applied at the start of the next frame.
    pub fn resize(&self, viewport: Viewport) {
        self.inner.resize.send_replace(viewport);
    }

    pub fn stop(&self) {
        self.inner.stop.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.stop.borrow()
    }

    pub fn dropped_input(&self) -> usize {
        self.inner.input.dropped()
    }
}

/// One independent animation tied to one output channel.
pub struct Session<L: FeedLauncher = FfmpegLauncher> {
    config: Arc<SessionConfig>,
    fps: Fps,
    renderer: GlyphRenderer,
    orchestrator: StreamOrchestrator<L>,
    overlay: LogoOverlay,
    input: InputReceiver,
    resize_rx: watch::Receiver<Viewport>,
    stop_rx: watch::Receiver<bool>,
    handle: SessionHandle,
    elapsed: f64,
    auto_cycle: bool,
    since_cycle: f64,
}

impl Session<FfmpegLauncher> {
    /// Session over the system ffmpeg; the feed is attached only when `feed_enabled`.
    pub fn from_config(
        config: Arc<SessionConfig>,
        viewport: Viewport,
        feed_enabled: bool,
    ) -> CirrusResult<Self> {
        let live = config
            .live_feed()
            .filter(|_| feed_enabled)
            .map(LiveFeedSource::ffmpeg);
        Self::new(config, viewport, live)
    }
}

impl<L: FeedLauncher> Session<L> {
    pub fn new(
        config: Arc<SessionConfig>,
        viewport: Viewport,
        live: Option<LiveFeedSource<L>>,
    ) -> CirrusResult<Self> {
        config.validate()?;
        let fps = config.fps()?;
        let viewport = viewport.or_fallback().clamped();

        let (input_tx, input) = input_queue(config.input_capacity);
        let (resize_tx, resize_rx) = watch::channel(viewport);
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = SessionHandle {
            inner: Arc::new(HandleInner {
                input: input_tx,
                resize: resize_tx,
                stop: stop_tx,
            }),
        };

        Ok(Self {
            renderer: GlyphRenderer::new(viewport, config.ramp_style),
            orchestrator: StreamOrchestrator::new(viewport, live, config.orchestrator_opts()),
            overlay: LogoOverlay::new(config.overlay_style),
            fps,
            input,
            resize_rx,
            stop_rx,
            handle,
            elapsed: 0.0,
            auto_cycle: true,
            since_cycle: 0.0,
            config,
        })
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn renderer(&self) -> &GlyphRenderer {
        &self.renderer
    }

    pub fn overlay(&self) -> &LogoOverlay {
        &self.overlay
    }

    pub fn orchestrator(&self) -> &StreamOrchestrator<L> {
        &self.orchestrator
    }

    pub fn auto_cycle(&self) -> bool {
        self.auto_cycle
    }

    /// Animate into `out` until quit, stop or a write failure, then tear down.
    ///
    /// Teardown always runs and never fails: probe and feed are released, the terminal state is
    /// restored, and `out` is shut down.
    pub async fn run<W: AsyncWrite + Unpin>(&mut self, out: &mut W) -> SessionExit {
        let exit = match self.animate(out).await {
            Ok(exit) => exit,
            Err(e) => {
                tracing::debug!("session output failed: {e}");
                SessionExit::Disconnected
            }
        };
        self.teardown(out).await;
        tracing::info!(?exit, "session ended");
        exit
    }

    async fn animate<W: AsyncWrite + Unpin>(&mut self, out: &mut W) -> std::io::Result<SessionExit> {
        let preamble = format!("{ENTER_ALT_SCREEN}{CLEAR_AND_HOME}{HIDE_CURSOR}");
        out.write_all(preamble.as_bytes()).await?;
        out.flush().await?;

        self.orchestrator.start(self.renderer.viewport());
        let frame_interval = self.fps.frame_interval();
        let mut last = Instant::now();

        loop {
            let frame_start = Instant::now();
            let dt = frame_start.duration_since(last).as_secs_f64();
            last = frame_start;

            if *self.stop_rx.borrow() {
                return Ok(SessionExit::Stopped);
            }
            if self.resize_rx.has_changed().unwrap_or(false) {
                let viewport = *self.resize_rx.borrow_and_update();
                self.apply_resize(viewport);
            }
            if self.apply_input() {
                return Ok(SessionExit::Quit);
            }

            self.tick(dt);
            self.draw();
            let frame = self.renderer.present();
            out.write_all(frame.as_bytes()).await?;
            out.flush().await?;

            // Sleep only the positive remainder of the frame budget.
            if let Some(remaining) = frame_interval.checked_sub(frame_start.elapsed()) {
                tokio::select! {
                    _ = tokio::time::sleep(remaining) => {}
                    _ = self.stop_rx.changed() => {}
                }
            }
        }
    }

    fn apply_resize(&mut self, viewport: Viewport) {
        let viewport = viewport.clamped();
        if viewport.is_empty() || viewport == self.renderer.viewport() {
            return;
        }
        tracing::debug!(width = viewport.width, height = viewport.height, "session resized");
        self.renderer.resize(viewport);
        self.orchestrator.resize(viewport);
    }

    /// Apply queued keys in arrival order. Returns `true` on quit.
    fn apply_input(&mut self) -> bool {
        for key in self.input.drain() {
            match KeyAction::from_char(key) {
                KeyAction::NextRampStyle => {
                    self.renderer.next_style();
                    self.auto_cycle = false;
                }
                KeyAction::NextOverlayStyle => {
                    self.overlay.next_style();
                }
                KeyAction::Quit => return true,
                KeyAction::Ignore => {}
            }
        }
        false
    }

    fn tick(&mut self, dt: f64) {
        self.elapsed += dt;
        self.orchestrator.update(dt);
        if self.auto_cycle {
            self.since_cycle += dt;
            if self.since_cycle >= self.config.auto_cycle_secs {
                self.since_cycle = 0.0;
                self.renderer.next_style();
            }
        }
    }

    fn logo_opacity(&self) -> f64 {
        if self.config.logo_fade_secs <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.config.logo_fade_secs).min(1.0)
    }

    fn draw(&mut self) {
        let opacity = self.logo_opacity();
        self.renderer.clear();
        self.orchestrator.render(&mut self.renderer);
        self.overlay.render_bottom_right(
            &mut self.renderer,
            self.config.logo_margin_x,
            self.config.logo_margin_y,
            opacity,
        );
    }

    async fn teardown<W: AsyncWrite + Unpin>(&mut self, out: &mut W) {
        if let Some(join) = self.orchestrator.cancel_probe()
            && let Err(e) = tokio::task::spawn_blocking(move || join.wait()).await
        {
            tracing::debug!("probe join task failed: {e}");
        }
        self.orchestrator.cleanup();

        let restore = format!("{SHOW_CURSOR}{LEAVE_ALT_SCREEN}");
        if let Err(e) = out.write_all(restore.as_bytes()).await {
            tracing::debug!("restore terminal failed: {e}");
        }
        if let Err(e) = out.flush().await {
            tracing::debug!("final flush failed: {e}");
        }
        if let Err(e) = out.shutdown().await {
            tracing::debug!("channel shutdown failed: {e}");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/driver.rs"]
mod tests;
