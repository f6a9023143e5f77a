use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::feed::ffmpeg::FfmpegLauncher;
use crate::feed::process::{FeedLauncher, FeedProcess, FrameRead, LaunchRequest};
use crate::foundation::core::Viewport;
use crate::render::glyph_renderer::GlyphRenderer;
use crate::source::StreamSource;

/// Consecutive failed reads after which the feed stops itself.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Slack when comparing accumulated frame time against the read interval.
const READ_INTERVAL_SLACK: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq)]
pub struct LiveFeedConfig {
    pub url: String,
    pub target_fps: u32,
    pub failure_threshold: u32,
    /// Time between the graceful terminate request and the forceful kill.
    pub stop_grace: Duration,
    pub probe_timeout: Duration,
}

impl LiveFeedConfig {
    pub fn new(url: impl Into<String>, target_fps: u32) -> Self {
        Self {
            url: url.into(),
            target_fps: target_fps.max(1),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            stop_grace: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(3),
        }
    }

    fn read_interval(&self) -> f64 {
        1.0 / f64::from(self.target_fps.max(1))
    }
}

/// Reachability check detached from the source, so it can run on a background thread.
pub struct Prober<L: FeedLauncher> {
    launcher: Arc<L>,
    url: String,
    timeout: Duration,
}

impl<L: FeedLauncher> Clone for Prober<L> {
    fn clone(&self) -> Self {
        Self {
            launcher: Arc::clone(&self.launcher),
            url: self.url.clone(),
            timeout: self.timeout,
        }
    }
}

impl<L: FeedLauncher> Prober<L> {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn probe(&self, cancel: &AtomicBool) -> bool {
        self.launcher.probe(&self.url, self.timeout, cancel)
    }
}

/// Grayscale frames from an external decoder, one byte per cell.
pub struct LiveFeedSource<L: FeedLauncher = FfmpegLauncher> {
    launcher: Arc<L>,
    config: LiveFeedConfig,
    process: Option<L::Process>,
    frame: Vec<u8>,
    frame_viewport: Viewport,
    consecutive_failures: u32,
    running: bool,
    since_read: f64,
}

impl LiveFeedSource<FfmpegLauncher> {
    pub fn ffmpeg(config: LiveFeedConfig) -> Self {
        Self::new(FfmpegLauncher::default(), config)
    }
}

impl<L: FeedLauncher> LiveFeedSource<L> {
    pub fn new(launcher: L, config: LiveFeedConfig) -> Self {
        Self::with_shared_launcher(Arc::new(launcher), config)
    }

    pub fn with_shared_launcher(launcher: Arc<L>, config: LiveFeedConfig) -> Self {
        Self {
            launcher,
            config,
            process: None,
            frame: Vec::new(),
            frame_viewport: Viewport::new(0, 0),
            consecutive_failures: 0,
            running: false,
            since_read: 0.0,
        }
    }

    pub fn config(&self) -> &LiveFeedConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Most recent complete frame; empty until one arrives.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Geometry the decoder was started with.
    pub fn frame_viewport(&self) -> Viewport {
        self.frame_viewport
    }

    /// Launch the decoder at `viewport`. Returns `false` when it could not be started.
    pub fn start(&mut self, viewport: Viewport) -> bool {
        self.stop();
        if viewport.is_empty() {
            tracing::warn!(url = %self.config.url, "not starting live feed on an empty viewport");
            return false;
        }

        let request = LaunchRequest {
            url: self.config.url.clone(),
            viewport,
            fps: self.config.target_fps,
        };
        match self.launcher.launch(&request) {
            Ok(process) => {
                self.process = Some(process);
                self.frame_viewport = viewport;
                self.consecutive_failures = 0;
                self.running = true;
                // First update reads straight away.
                self.since_read = self.config.read_interval();
                tracing::info!(
                    url = %self.config.url,
                    width = viewport.width,
                    height = viewport.height,
                    "live feed started"
                );
                true
            }
            Err(e) => {
                tracing::warn!(url = %self.config.url, "live feed failed to start: {e}");
                false
            }
        }
    }

    /// Consume at most one read outcome per `1/target_fps` seconds.
    pub fn update(&mut self, dt: f64) {
        if !self.running {
            return;
        }
        if dt.is_finite() && dt > 0.0 {
            self.since_read += dt;
        }
        if self.since_read + READ_INTERVAL_SLACK < self.config.read_interval() {
            return;
        }

        let Some(process) = self.process.as_mut() else {
            self.running = false;
            return;
        };
        let expected = self.frame_viewport.area();
        match process.poll_frame() {
            FrameRead::Pending => return,
            FrameRead::Bytes(bytes) if bytes.len() == expected => {
                self.frame = bytes;
                self.consecutive_failures = 0;
            }
            FrameRead::Bytes(bytes) if !bytes.is_empty() => {
                tracing::debug!(got = bytes.len(), expected, "short read from live feed");
                self.record_failure();
            }
            FrameRead::Bytes(_) | FrameRead::Closed => self.record_failure(),
        }
        self.since_read = 0.0;
    }

    fn record_failure(&mut self) {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.config.failure_threshold {
            tracing::info!(
                url = %self.config.url,
                failures = self.consecutive_failures,
                "live feed stopped after repeated failed reads"
            );
            self.stop();
        }
    }

    /// Write the last frame, clipped to the smaller of the feed and renderer geometry.
    pub fn render_into(&self, renderer: &mut GlyphRenderer) {
        if self.frame.is_empty() {
            return;
        }
        let fw = self.frame_viewport.width;
        let w = fw.min(renderer.width());
        let h = self.frame_viewport.height.min(renderer.height());
        for y in 0..h {
            let row = &self.frame[y * fw..y * fw + w];
            for (x, byte) in row.iter().enumerate() {
                renderer.set_pixel(x as isize, y as isize, f64::from(*byte) / 255.0);
            }
        }
    }

    /// Running and the decoder process is still alive.
    pub fn is_available(&mut self) -> bool {
        self.running
            && self
                .process
                .as_mut()
                .is_some_and(|process| !process.has_exited())
    }

    pub fn prober(&self) -> Prober<L> {
        Prober {
            launcher: Arc::clone(&self.launcher),
            url: self.config.url.clone(),
            timeout: self.config.probe_timeout,
        }
    }

    /// Blocking reachability check, bounded by the configured probe timeout.
    pub fn probe(&self, cancel: &AtomicBool) -> bool {
        self.prober().probe(cancel)
    }

    /// Terminate the decoder and release it. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.running = false;
        self.frame.clear();
        if let Some(mut process) = self.process.take() {
            process.shutdown(self.config.stop_grace);
            tracing::debug!(url = %self.config.url, "live feed stopped");
        }
    }
}

impl<L: FeedLauncher> StreamSource for LiveFeedSource<L> {
    fn update(&mut self, dt: f64) {
        LiveFeedSource::update(self, dt);
    }

    fn render(&self, renderer: &mut GlyphRenderer) {
        self.render_into(renderer);
    }

    fn is_available(&mut self) -> bool {
        LiveFeedSource::is_available(self)
    }

    fn cleanup(&mut self) {
        self.stop();
    }

    /// Frame geometry is fixed at launch, so a running feed is restarted.
    fn resize(&mut self, viewport: Viewport) {
        if self.running {
            self.start(viewport);
        }
    }
}

impl<L: FeedLauncher> Drop for LiveFeedSource<L> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/feed/live.rs"]
mod tests;
