use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::foundation::core::Viewport;
use crate::foundation::error::CirrusResult;

/// Outcome of one attempt to take a frame from a running decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameRead {
    /// A read completed with this many bytes; the caller checks it against the frame size.
    Bytes(Vec<u8>),
    /// The stream ended (zero-byte read) or the decoder is gone.
    Closed,
    /// Nothing new has arrived since the last attempt.
    Pending,
}

/// Parameters for launching a decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchRequest {
    pub url: String,
    /// Output geometry; one grayscale byte per cell.
    pub viewport: Viewport,
    pub fps: u32,
}

/// A running decoder that emits raw grayscale frames.
pub trait FeedProcess: Send {
    /// Non-blocking: return the next read outcome, if any.
    fn poll_frame(&mut self) -> FrameRead;

    /// Whether the decoder process has terminated.
    fn has_exited(&mut self) -> bool;

    /// Ask the decoder to stop, escalating to a forceful kill after `grace`.
    ///
    /// Must return promptly and be safe to call more than once.
    fn shutdown(&mut self, grace: Duration);
}

/// Starts decoders and checks feed reachability.
pub trait FeedLauncher: Send + Sync + 'static {
    type Process: FeedProcess;

    fn launch(&self, request: &LaunchRequest) -> CirrusResult<Self::Process>;

    /// Time-bounded reachability check. Returns `false` on timeout, error or cancellation.
    fn probe(&self, url: &str, timeout: Duration, cancel: &AtomicBool) -> bool;
}
