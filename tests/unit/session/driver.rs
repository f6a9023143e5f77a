use super::*;
use crate::render::overlay::OverlayStyle;
use crate::render::ramp::RampStyle;
use std::time::Duration;
use tokio::io::AsyncReadExt;

fn config() -> SessionConfig {
    SessionConfig {
        fps: 10,
        ..SessionConfig::default()
    }
}

fn session_with(cfg: SessionConfig, viewport: Viewport) -> Session {
    Session::from_config(Arc::new(cfg), viewport, false).unwrap()
}

/// Run the session against an in-memory channel and collect everything it wrote.
async fn run_collect(session: &mut Session) -> (SessionExit, String) {
    let (mut ours, mut theirs) = tokio::io::duplex(1 << 16);
    let reader = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = theirs.read_to_end(&mut buf).await;
        buf
    });
    let exit = session.run(&mut ours).await;
    drop(ours);
    let bytes = reader.await.unwrap();
    (exit, String::from_utf8_lossy(&bytes).into_owned())
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = SessionConfig {
        fps: 0,
        ..SessionConfig::default()
    };
    assert!(Session::from_config(Arc::new(cfg), Viewport::new(10, 5), false).is_err());
}

#[test]
fn empty_viewport_uses_fallback_size() {
    let session = session_with(config(), Viewport::new(0, 0));
    assert_eq!(session.renderer().viewport(), Viewport::FALLBACK);
}

#[tokio::test(start_paused = true)]
async fn quit_key_ends_the_session_with_terminal_restored() {
    let mut session = session_with(config(), Viewport::new(20, 6));
    session.handle().push_str("q");
    let (exit, out) = run_collect(&mut session).await;

    assert_eq!(exit, SessionExit::Quit);
    assert!(out.starts_with(ENTER_ALT_SCREEN));
    assert!(out.contains(HIDE_CURSOR));
    assert!(out.ends_with(&format!("{SHOW_CURSOR}{LEAVE_ALT_SCREEN}")));
}

#[tokio::test(start_paused = true)]
async fn frames_are_written_until_stopped() {
    let mut session = session_with(config(), Viewport::new(20, 6));
    let handle = session.handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1050)).await;
        handle.stop();
    });

    let started = Instant::now();
    let (exit, out) = run_collect(&mut session).await;
    assert_eq!(exit, SessionExit::Stopped);

    // ~11 frames at 10 fps, each starting with clear-and-home.
    let frames = out.matches(CLEAR_AND_HOME).count() - 1;
    assert!((10..=12).contains(&frames), "frames = {frames}");
    assert!(started.elapsed() < Duration::from_millis(1100));
    assert!(session.handle().is_stopped());
}

#[tokio::test(start_paused = true)]
async fn keys_apply_in_arrival_order() {
    let mut session = session_with(config(), Viewport::new(20, 6));
    session.handle().push_str("nnmxq n");
    let (exit, _) = run_collect(&mut session).await;

    assert_eq!(exit, SessionExit::Quit);
    assert_eq!(session.renderer().style(), RampStyle::Dots.next().next());
    assert_eq!(session.overlay().style(), OverlayStyle::Bold.next());
    assert!(!session.auto_cycle());
}

#[tokio::test(start_paused = true)]
async fn ramp_auto_cycles_until_a_manual_switch() {
    let cfg = SessionConfig {
        auto_cycle_secs: 1.0,
        ..config()
    };
    let mut session = session_with(cfg, Viewport::new(20, 6));
    let handle = session.handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2550)).await;
        handle.stop();
    });
    let (exit, _) = run_collect(&mut session).await;

    assert_eq!(exit, SessionExit::Stopped);
    assert_eq!(session.renderer().style(), RampStyle::Dots.next().next());
    assert!(session.auto_cycle());
}

#[tokio::test(start_paused = true)]
async fn resize_reaches_renderer_and_clouds() {
    let mut session = session_with(config(), Viewport::new(20, 6));
    let handle = session.handle();
    handle.resize(Viewport::new(32, 9));
    handle.push_str("q");
    let (_, out) = run_collect(&mut session).await;

    assert_eq!(session.renderer().viewport(), Viewport::new(32, 9));
    assert_eq!(session.orchestrator().viewport(), Viewport::new(32, 9));
    assert!(!out.is_empty());
}

#[test]
fn huge_viewports_are_clamped_at_creation() {
    let session = session_with(config(), Viewport::new(65278, 65278));
    assert_eq!(session.renderer().viewport(), Viewport::MAX);
    assert_eq!(session.orchestrator().viewport(), Viewport::MAX);
}

#[tokio::test(start_paused = true)]
async fn huge_resize_is_clamped() {
    let mut session = session_with(config(), Viewport::new(20, 6));
    let handle = session.handle();
    handle.resize(Viewport::new(65278, 3));
    handle.push_str("q");
    run_collect(&mut session).await;

    assert_eq!(session.renderer().viewport(), Viewport::new(Viewport::MAX.width, 3));
    assert_eq!(session.orchestrator().viewport(), Viewport::new(Viewport::MAX.width, 3));
}

#[tokio::test(start_paused = true)]
async fn closed_channel_ends_the_session_as_disconnected() {
    let mut session = session_with(config(), Viewport::new(20, 6));
    let (mut ours, theirs) = tokio::io::duplex(64);
    drop(theirs);
    assert_eq!(session.run(&mut ours).await, SessionExit::Disconnected);
}

#[test]
fn logo_fades_in_then_draws_literally() {
    let cfg = SessionConfig {
        overlay_style: OverlayStyle::Ascii,
        logo_margin_x: 2,
        logo_margin_y: 1,
        logo_fade_secs: 2.0,
        ..config()
    };
    let vp = Viewport::new(80, 20);
    let mut session = session_with(cfg, vp);

    let overlay = LogoOverlay::new(OverlayStyle::Ascii);
    let (row, line) = OverlayStyle::Ascii
        .art()
        .iter()
        .enumerate()
        .find(|(_, l)| l.chars().any(|c| c != ' ' && !c.is_whitespace()))
        .unwrap();
    let (col, glyph) = line.chars().enumerate().find(|(_, c)| *c != ' ').unwrap();
    let x = (vp.width - 2 - overlay.width() + col) as isize;
    let y = (vp.height - 1 - overlay.height() + row) as isize;

    assert_eq!(session.logo_opacity(), 0.0);
    session.tick(1.0);
    assert!((session.logo_opacity() - 0.5).abs() < 1e-12);

    session.tick(1.5);
    assert_eq!(session.logo_opacity(), 1.0);
    session.draw();
    assert_eq!(session.renderer().glyph_at(x, y), Some(glyph));
}

mod teardown {
    use super::*;
    use crate::feed::live::{LiveFeedConfig, LiveFeedSource};
    use crate::feed::process::{FeedLauncher, FeedProcess, FrameRead, LaunchRequest};
    use crate::foundation::error::{CirrusError, CirrusResult};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, DuplexStream};
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct Script {
        refuse_launch: AtomicBool,
        probes: AtomicUsize,
        probe_cancelled: AtomicBool,
        shutdowns: AtomicUsize,
    }

    struct ScriptedLauncher(Arc<Script>);

    struct ScriptedProcess(Arc<Script>);

    impl FeedProcess for ScriptedProcess {
        fn poll_frame(&mut self) -> FrameRead {
            FrameRead::Pending
        }

        fn has_exited(&mut self) -> bool {
            false
        }

        fn shutdown(&mut self, _grace: Duration) {
            self.0.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl FeedLauncher for ScriptedLauncher {
        type Process = ScriptedProcess;

        fn launch(&self, _request: &LaunchRequest) -> CirrusResult<ScriptedProcess> {
            if self.0.refuse_launch.load(Ordering::SeqCst) {
                return Err(CirrusError::feed("scripted launch refusal"));
            }
            Ok(ScriptedProcess(Arc::clone(&self.0)))
        }

        /// Holds until cancelled.
        fn probe(&self, _url: &str, _timeout: Duration, cancel: &AtomicBool) -> bool {
            self.0.probes.fetch_add(1, Ordering::SeqCst);
            while !cancel.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(1));
            }
            self.0.probe_cancelled.store(true, Ordering::SeqCst);
            false
        }
    }

    fn scripted_session(script: &Arc<Script>) -> Session<ScriptedLauncher> {
        let live = LiveFeedSource::new(
            ScriptedLauncher(Arc::clone(script)),
            LiveFeedConfig::new("rtmp://scripted/live", 10),
        );
        Session::new(Arc::new(config()), Viewport::new(20, 6), Some(live)).unwrap()
    }

    /// Drain output until told to hang up, then drop the peer end.
    fn hang_up_on_signal(mut theirs: DuplexStream) -> oneshot::Sender<()> {
        let (tx, mut rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1 << 14];
            loop {
                tokio::select! {
                    _ = &mut rx => break,
                    read = theirs.read(&mut buf) => match read {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    },
                }
            }
        });
        tx
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_shuts_the_live_feed_down() {
        let script = Arc::new(Script::default());
        let mut session = scripted_session(&script);
        let (mut ours, theirs) = tokio::io::duplex(1 << 16);
        let hang_up = hang_up_on_signal(theirs);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            let _ = hang_up.send(());
        });

        let exit = session.run(&mut ours).await;

        assert_eq!(exit, SessionExit::Disconnected);
        assert_eq!(script.shutdowns.load(Ordering::SeqCst), 1);
        let live = session.orchestrator().live().unwrap();
        assert!(!live.is_running());
        assert!(!session.orchestrator().is_live());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_an_in_flight_probe() {
        let script = Arc::new(Script::default());
        script.refuse_launch.store(true, Ordering::SeqCst);
        let mut session = scripted_session(&script);
        let (mut ours, theirs) = tokio::io::duplex(1 << 16);
        let hang_up = hang_up_on_signal(theirs);
        let watched = Arc::clone(&script);
        tokio::spawn(async move {
            while watched.probes.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            let _ = hang_up.send(());
        });

        let exit = session.run(&mut ours).await;

        assert_eq!(exit, SessionExit::Disconnected);
        assert_eq!(script.probes.load(Ordering::SeqCst), 1);
        assert!(script.probe_cancelled.load(Ordering::SeqCst));
        assert!(!session.orchestrator().probe_in_flight());
        assert_eq!(script.shutdowns.load(Ordering::SeqCst), 0);
    }
}
