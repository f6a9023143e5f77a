//! Minimal Telnet: character-mode negotiation and NAWS window-size reports.

use crate::foundation::core::Viewport;

pub const IAC: u8 = 255;
pub const DONT: u8 = 254;
pub const DO: u8 = 253;
pub const WONT: u8 = 252;
pub const WILL: u8 = 251;
pub const SB: u8 = 250;
pub const SE: u8 = 240;
pub const OPT_ECHO: u8 = 1;
pub const OPT_SGA: u8 = 3;
pub const OPT_NAWS: u8 = 31;

/// Sent on connect: server echoes, suppresses go-ahead, asks for window size.
pub const NEGOTIATION: [u8; 9] = [
    IAC, WILL, OPT_ECHO, IAC, WILL, OPT_SGA, IAC, DO, OPT_NAWS,
];

/// Longest subnegotiation payload kept; anything longer is truncated.
const MAX_SUBNEGOTIATION: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TelnetEvent {
    Input(char),
    Resize(Viewport),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    /// Option byte of WILL/WONT/DO/DONT.
    Option,
    Sub,
    SubIac,
}

/// Incremental decoder for the inbound side of a Telnet connection.
#[derive(Clone, Debug)]
pub struct TelnetDecoder {
    state: State,
    after_cr: bool,
    sub: Vec<u8>,
    pending: Vec<u8>,
}

impl Default for TelnetDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelnetDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Data,
            after_cr: false,
            sub: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Decode one chunk. State carries over, so sequences may be split across chunks.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<TelnetEvent> {
        let mut events = Vec::new();
        for &b in bytes {
            let state = self.state;
            self.state = match state {
                State::Data if b == IAC => State::Iac,
                State::Data => {
                    self.data_byte(b, &mut events);
                    State::Data
                }
                State::Iac => match b {
                    IAC => {
                        self.data_byte(IAC, &mut events);
                        State::Data
                    }
                    WILL | WONT | DO | DONT => State::Option,
                    SB => {
                        self.sub.clear();
                        State::Sub
                    }
                    _ => State::Data,
                },
                State::Option => State::Data,
                State::Sub if b == IAC => State::SubIac,
                State::Sub => {
                    self.push_sub(b);
                    State::Sub
                }
                State::SubIac => match b {
                    SE => {
                        self.finish_sub(&mut events);
                        State::Data
                    }
                    IAC => {
                        self.push_sub(IAC);
                        State::Sub
                    }
                    _ => {
                        self.sub.clear();
                        State::Data
                    }
                },
            };
        }
        events
    }

    fn push_sub(&mut self, b: u8) {
        if self.sub.len() < MAX_SUBNEGOTIATION {
            self.sub.push(b);
        }
    }

    fn finish_sub(&mut self, events: &mut Vec<TelnetEvent>) {
        if let [OPT_NAWS, w0, w1, h0, h1, ..] = self.sub[..] {
            let viewport = Viewport::new(
                usize::from(u16::from_be_bytes([w0, w1])),
                usize::from(u16::from_be_bytes([h0, h1])),
            )
            .clamped();
            if !viewport.is_empty() {
                events.push(TelnetEvent::Resize(viewport));
            }
        }
        self.sub.clear();
    }

    fn data_byte(&mut self, b: u8, events: &mut Vec<TelnetEvent>) {
        if self.after_cr {
            self.after_cr = false;
            // CR NUL and CR LF both mean a bare CR.
            if b == 0 || b == b'\n' {
                return;
            }
        }
        if b == b'\r' {
            self.after_cr = true;
        }

        self.pending.push(b);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    events.extend(s.chars().map(TelnetEvent::Input));
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&self.pending[..valid]) {
                        events.extend(s.chars().map(TelnetEvent::Input));
                    }
                    match e.error_len() {
                        // Incomplete sequence; wait for more bytes.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        Some(bad) => {
                            self.pending.drain(..valid + bad);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transport/telnet.rs"]
mod tests;
