use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::feed::ffmpeg::FfmpegLauncher;
use crate::feed::live::LiveFeedSource;
use crate::feed::process::FeedLauncher;
use crate::field::compositor::CloudCompositor;
use crate::foundation::core::Viewport;
use crate::render::glyph_renderer::GlyphRenderer;
use crate::source::StreamSource;

const PROBE_JOIN_POLL: Duration = Duration::from_millis(5);

/// Which source currently feeds the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailoverState {
    /// Procedural clouds; a configured feed is probed in the background.
    FallbackActive,
    /// Frames come from the live feed.
    LiveActive,
}

impl FailoverState {
    pub fn label(self) -> &'static str {
        match self {
            Self::FallbackActive => "clouds",
            Self::LiveActive => "live",
        }
    }
}

/// Failover timing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrchestratorOpts {
    /// Minimum time between reachability probes while on the fallback.
    pub probe_interval: Duration,
    /// Upper bound on waiting for an in-flight probe during cleanup.
    pub probe_join_timeout: Duration,
}

impl Default for OrchestratorOpts {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(5),
            probe_join_timeout: Duration::from_secs(1),
        }
    }
}

/// A background probe and its one-slot result mailbox.
struct ProbeTask {
    result: Arc<Mutex<Option<bool>>>,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// A cancelled probe thread, waited on with a bound.
///
/// Returned by [`StreamOrchestrator::cancel_probe`] so async callers can do the blocking wait
/// off their executor.
pub struct ProbeJoin {
    handle: JoinHandle<()>,
    timeout: Duration,
}

impl ProbeJoin {
    /// Wait up to the join timeout. Returns `false` if the thread was left running.
    pub fn wait(self) -> bool {
        let deadline = Instant::now() + self.timeout;
        while !self.handle.is_finished() && Instant::now() < deadline {
            std::thread::sleep(PROBE_JOIN_POLL);
        }
        if self.handle.is_finished() {
            let _ = self.handle.join();
            true
        } else {
            tracing::debug!("live feed probe still running at cleanup; detaching");
            false
        }
    }
}

enum ProbePoll {
    Idle,
    Running,
    Done(bool),
}

/// Failover between a live feed and the procedural clouds.
///
/// Exactly one source is active at a time. While on the clouds, a configured feed is probed
/// on a background thread every `probe_interval`; the frame loop only ever polls the result.
pub struct StreamOrchestrator<L: FeedLauncher = FfmpegLauncher> {
    viewport: Viewport,
    fallback: CloudCompositor,
    live: Option<LiveFeedSource<L>>,
    state: FailoverState,
    opts: OrchestratorOpts,
    clock: f64,
    last_probe_at: f64,
    probe: Option<ProbeTask>,
}

impl<L: FeedLauncher> StreamOrchestrator<L> {
    pub fn new(viewport: Viewport, live: Option<LiveFeedSource<L>>, opts: OrchestratorOpts) -> Self {
        Self {
            viewport,
            fallback: CloudCompositor::new(viewport),
            live,
            state: FailoverState::FallbackActive,
            opts,
            clock: 0.0,
            last_probe_at: 0.0,
            probe: None,
        }
    }

    pub fn state(&self) -> FailoverState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.state == FailoverState::LiveActive
    }

    pub fn has_live_feed(&self) -> bool {
        self.live.is_some()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn fallback(&self) -> &CloudCompositor {
        &self.fallback
    }

    pub fn live(&self) -> Option<&LiveFeedSource<L>> {
        self.live.as_ref()
    }

    pub fn probe_in_flight(&self) -> bool {
        self.probe.is_some()
    }

    /// Seconds of orchestrator time since the probe timer was last reset.
    pub fn since_last_probe(&self) -> f64 {
        self.clock - self.last_probe_at
    }

    /// Try the live feed first; stay on the clouds when it does not start.
    pub fn start(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.fallback.resize(viewport);
        self.state = if self.live.as_mut().is_some_and(|live| live.start(viewport)) {
            FailoverState::LiveActive
        } else {
            FailoverState::FallbackActive
        };
        self.last_probe_at = self.clock;
        tracing::info!(source = self.state.label(), "stream started");
    }

    pub fn update(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.clock += dt;
        }

        if self.state == FailoverState::FallbackActive {
            self.collect_probe();
            if self.state == FailoverState::FallbackActive {
                self.maybe_spawn_probe();
            }
        }

        if self.state == FailoverState::FallbackActive {
            self.fallback.update(dt);
            return;
        }
        let available = self.live.as_mut().is_some_and(|live| {
            live.update(dt);
            live.is_available()
        });
        if !available {
            self.fall_back("live feed became unavailable");
        }
    }

    fn fall_back(&mut self, reason: &str) {
        if let Some(live) = self.live.as_mut() {
            live.stop();
        }
        self.state = FailoverState::FallbackActive;
        self.last_probe_at = self.clock;
        tracing::info!("{reason}; switching to clouds");
    }

    fn poll_probe(&mut self) -> ProbePoll {
        let Some(task) = self.probe.as_ref() else {
            return ProbePoll::Idle;
        };
        let taken = task.result.lock().take();
        let finished = task.handle.is_finished();
        if let Some(result) = taken {
            self.probe = None;
            return ProbePoll::Done(result);
        }
        if finished {
            // Finished without reporting (panicked).
            self.probe = None;
            return ProbePoll::Done(false);
        }
        ProbePoll::Running
    }

    fn collect_probe(&mut self) {
        match self.poll_probe() {
            ProbePoll::Idle | ProbePoll::Running => {}
            ProbePoll::Done(false) => tracing::debug!("live feed probe negative"),
            ProbePoll::Done(true) => {
                let viewport = self.viewport;
                let started = self.live.as_mut().is_some_and(|live| live.start(viewport));
                if started {
                    self.state = FailoverState::LiveActive;
                    self.last_probe_at = self.clock;
                    tracing::info!("live feed reachable again; switching to live");
                } else {
                    tracing::debug!("live feed probe positive but restart failed");
                }
            }
        }
    }

    fn maybe_spawn_probe(&mut self) {
        if self.probe.is_some() || self.since_last_probe() < self.opts.probe_interval.as_secs_f64()
        {
            return;
        }
        let Some(live) = self.live.as_ref() else {
            return;
        };
        self.last_probe_at = self.clock;

        let prober = live.prober();
        let result = Arc::new(Mutex::new(None));
        let cancel = Arc::new(AtomicBool::new(false));
        let (slot, flag) = (Arc::clone(&result), Arc::clone(&cancel));
        let spawned = std::thread::Builder::new()
            .name("cirrus-feed-probe".into())
            .spawn(move || {
                let reachable = prober.probe(&flag);
                *slot.lock() = Some(reachable);
            });
        match spawned {
            Ok(handle) => {
                tracing::debug!("probing live feed");
                self.probe = Some(ProbeTask {
                    result,
                    cancel,
                    handle,
                });
            }
            Err(e) => tracing::debug!("failed to start live feed probe: {e}"),
        }
    }

    pub fn render(&self, renderer: &mut GlyphRenderer) {
        match (self.state, self.live.as_ref()) {
            (FailoverState::LiveActive, Some(live)) => live.render_into(renderer),
            _ => self.fallback.render_into(renderer),
        }
    }

    /// Clouds always follow the new size; a live feed is relaunched at it.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.fallback.resize(viewport);
        if self.state != FailoverState::LiveActive {
            return;
        }
        let restarted = self.live.as_mut().is_some_and(|live| live.start(viewport));
        if !restarted {
            self.fall_back("live feed failed to restart after resize");
        }
    }

    /// Signal an in-flight probe to stop and hand back its thread.
    pub fn cancel_probe(&mut self) -> Option<ProbeJoin> {
        let task = self.probe.take()?;
        task.cancel.store(true, Ordering::Release);
        Some(ProbeJoin {
            handle: task.handle,
            timeout: self.opts.probe_join_timeout,
        })
    }

    /// Cancel any probe (bounded wait), then release the live feed and the clouds.
    pub fn cleanup(&mut self) {
        if let Some(join) = self.cancel_probe() {
            join.wait();
        }
        if let Some(live) = self.live.as_mut() {
            live.stop();
        }
        self.fallback.cleanup();
        self.state = FailoverState::FallbackActive;
    }
}

impl<L: FeedLauncher> StreamSource for StreamOrchestrator<L> {
    fn update(&mut self, dt: f64) {
        StreamOrchestrator::update(self, dt);
    }

    fn render(&self, renderer: &mut GlyphRenderer) {
        StreamOrchestrator::render(self, renderer);
    }

    /// The clouds are always there to fall back on.
    fn is_available(&mut self) -> bool {
        true
    }

    fn cleanup(&mut self) {
        StreamOrchestrator::cleanup(self);
    }

    fn resize(&mut self, viewport: Viewport) {
        StreamOrchestrator::resize(self, viewport);
    }
}

impl<L: FeedLauncher> Drop for StreamOrchestrator<L> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/orchestrator.rs"]
mod tests;
