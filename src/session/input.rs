use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc::{self, error::TrySendError};

/// Effect of one key on a running session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    NextRampStyle,
    NextOverlayStyle,
    Quit,
    Ignore,
}

impl KeyAction {
    pub fn from_char(c: char) -> Self {
        match c {
            'n' => Self::NextRampStyle,
            'm' => Self::NextOverlayStyle,
            // q, Ctrl-C, Ctrl-D
            'q' | '\u{3}' | '\u{4}' => Self::Quit,
            _ => Self::Ignore,
        }
    }
}

/// Bounded single-character queue. Producers never block; a full queue drops the newest key.
pub fn input_queue(capacity: usize) -> (InputSender, InputReceiver) {
    let capacity = capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    (
        InputSender {
            tx,
            dropped: Arc::new(AtomicUsize::new(0)),
        },
        InputReceiver { rx, capacity },
    )
}

#[derive(Clone, Debug)]
pub struct InputSender {
    tx: mpsc::Sender<char>,
    dropped: Arc<AtomicUsize>,
}

impl InputSender {
    /// Enqueue one key. Returns `false` if it was dropped.
    pub fn push(&self, c: char) -> bool {
        match self.tx.try_send(c) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Enqueue the chars of `s` in order; returns how many were accepted.
    ///
    /// Stops at the first rejected char, so everything behind it is dropped too.
    pub fn push_str(&self, s: &str) -> usize {
        let mut chars = s.chars();
        let mut accepted = 0;
        for c in chars.by_ref() {
            if !self.push(c) {
                break;
            }
            accepted += 1;
        }
        let rest = chars.count();
        if rest > 0 && !self.tx.is_closed() {
            self.dropped.fetch_add(rest, Ordering::Relaxed);
        }
        accepted
    }

    /// Keys discarded because the queue was full.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub struct InputReceiver {
    rx: mpsc::Receiver<char>,
    capacity: usize,
}

impl InputReceiver {
    /// Take everything queued right now, oldest first.
    ///
    /// Bounded by the queue capacity so a flooding producer cannot stall the frame.
    pub fn drain(&mut self) -> Vec<char> {
        let mut keys = Vec::new();
        while keys.len() < self.capacity {
            match self.rx.try_recv() {
                Ok(c) => keys.push(c),
                Err(_) => break,
            }
        }
        keys
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/input.rs"]
mod tests;
