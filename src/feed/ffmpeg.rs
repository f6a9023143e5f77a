use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, sync_channel};
use std::time::{Duration, Instant};

use crate::feed::process::{FeedLauncher, FeedProcess, FrameRead, LaunchRequest};
use crate::foundation::error::{CirrusError, CirrusResult};

/// Frames buffered between the stdout reader thread and the render loop.
const FRAME_QUEUE_DEPTH: usize = 2;
const POLL_STEP: Duration = Duration::from_millis(10);

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Launches the system `ffmpeg` to decode a feed into raw grayscale frames on stdout.
#[derive(Clone, Debug)]
pub struct FfmpegLauncher {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for FfmpegLauncher {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegLauncher {
    fn decode_command(&self, req: &LaunchRequest) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args(["-loglevel", "error", "-i"])
            .arg(&req.url)
            .args([
                "-f",
                "rawvideo",
                "-pix_fmt",
                "gray",
                "-s",
                &format!("{}x{}", req.viewport.width, req.viewport.height),
                "-r",
                &req.fps.to_string(),
                "pipe:1",
            ]);
        cmd
    }

    /// `-rw_timeout` bounds I/O for every protocol; `-timeout` means "listen" for rtmp.
    fn probe_command(&self, url: &str, timeout: Duration) -> Command {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd.args(["-v", "quiet", "-rw_timeout"])
            .arg(timeout.as_micros().to_string())
            .arg("-i")
            .arg(url);
        cmd
    }
}

impl FeedLauncher for FfmpegLauncher {
    type Process = FfmpegProcess;

    fn launch(&self, req: &LaunchRequest) -> CirrusResult<FfmpegProcess> {
        if req.viewport.is_empty() {
            return Err(CirrusError::validation(
                "feed frame width/height must be non-zero",
            ));
        }
        if req.fps == 0 {
            return Err(CirrusError::validation("feed fps must be non-zero"));
        }

        let mut child = self.decode_command(req).spawn().map_err(|e| {
            CirrusError::feed(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CirrusError::feed("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CirrusError::feed("failed to open ffmpeg stderr (unexpected)"))?;

        std::thread::Builder::new()
            .name("cirrus-ffmpeg-stderr".into())
            .spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    tracing::debug!(target: "cirrus::ffmpeg", "{line}");
                }
            })
            .map_err(|e| CirrusError::feed(format!("failed to start stderr drain: {e}")))?;

        let frame_len = req.viewport.area();
        let (tx, rx) = sync_channel(FRAME_QUEUE_DEPTH);
        std::thread::Builder::new()
            .name("cirrus-ffmpeg-frames".into())
            .spawn(move || pump_frames(stdout, frame_len, tx))
            .map_err(|e| CirrusError::feed(format!("failed to start frame reader: {e}")))?;

        tracing::debug!(url = %req.url, pid = child.id(), "ffmpeg decoder started");
        Ok(FfmpegProcess {
            child: Some(child),
            frames: Some(rx),
        })
    }

    fn probe(&self, url: &str, timeout: Duration, cancel: &AtomicBool) -> bool {
        let spawned = self.probe_command(url, timeout).spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!("ffprobe could not be started: {e}");
                return false;
            }
        };

        let deadline = Instant::now() + timeout + Duration::from_secs(1);
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return status.success(),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!("ffprobe wait failed: {e}");
                    break;
                }
            }
            if cancel.load(Ordering::Acquire) || Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(POLL_STEP);
        }

        let _ = child.kill();
        let _ = child.wait();
        false
    }
}

/// Reads `frame_len`-sized chunks from ffmpeg stdout until EOF or until the receiver is gone.
fn pump_frames(mut stdout: ChildStdout, frame_len: usize, tx: SyncSender<FrameRead>) {
    loop {
        let mut buf = vec![0u8; frame_len];
        let outcome = match read_up_to(&mut stdout, &mut buf) {
            Ok(0) | Err(_) => FrameRead::Closed,
            Ok(n) => {
                buf.truncate(n);
                FrameRead::Bytes(buf)
            }
        };
        let closed = outcome == FrameRead::Closed;
        if tx.send(outcome).is_err() || closed {
            return;
        }
    }
}

/// Fill `buf` as far as the stream allows; returns the byte count (short only at EOF).
fn read_up_to(r: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// A running `ffmpeg` decode pipeline.
pub struct FfmpegProcess {
    child: Option<Child>,
    frames: Option<Receiver<FrameRead>>,
}

impl FeedProcess for FfmpegProcess {
    fn poll_frame(&mut self) -> FrameRead {
        let Some(rx) = self.frames.as_ref() else {
            return FrameRead::Closed;
        };
        match rx.try_recv() {
            Ok(read) => read,
            Err(TryRecvError::Empty) => FrameRead::Pending,
            Err(TryRecvError::Disconnected) => FrameRead::Closed,
        }
    }

    fn has_exited(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => !matches!(child.try_wait(), Ok(None)),
            None => true,
        }
    }

    fn shutdown(&mut self, grace: Duration) {
        // Dropping the receiver unblocks the reader thread's next send.
        self.frames = None;
        let Some(child) = self.child.take() else {
            return;
        };
        request_terminate(&child);
        let reaper = std::thread::Builder::new()
            .name("cirrus-ffmpeg-reaper".into())
            .spawn(move || reap(child, grace));
        if let Err(e) = reaper {
            tracing::debug!("failed to start ffmpeg reaper: {e}");
        }
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        self.frames = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(unix)]
fn request_terminate(child: &Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    if let Err(e) = kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM) {
        tracing::debug!("SIGTERM to ffmpeg failed: {e}");
    }
}

#[cfg(not(unix))]
fn request_terminate(_child: &Child) {}

/// Wait up to `grace` for a clean exit, then kill.
fn reap(mut child: Child, grace: Duration) {
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) if Instant::now() < deadline => std::thread::sleep(POLL_STEP),
            _ => break,
        }
    }
    tracing::debug!(pid = child.id(), "ffmpeg ignored SIGTERM, killing");
    let _ = child.kill();
    let _ = child.wait();
}
