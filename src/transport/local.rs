use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::config::SessionConfig;
use crate::foundation::core::Viewport;
use crate::foundation::error::{CirrusError, CirrusResult};
use crate::session::{Session, SessionExit, SessionHandle};

const EVENT_POLL: Duration = Duration::from_millis(100);

/// Restores cooked mode on every exit path.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> CirrusResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::debug!("disable raw mode failed: {e}");
        }
    }
}

/// Terminal rows minus the one kept free below the picture.
pub fn viewport_for_terminal(cols: u16, rows: u16) -> Viewport {
    Viewport::new(usize::from(cols), usize::from(rows.saturating_sub(1))).or_fallback()
}

/// Map a key press to the character a remote terminal would have sent.
pub fn key_to_char(key: &KeyEvent) -> Option<char> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => match c {
            'c' | 'C' => Some('\u{3}'),
            'd' | 'D' => Some('\u{4}'),
            _ => None,
        },
        KeyCode::Char(c) => Some(c),
        KeyCode::Esc => Some('q'),
        _ => None,
    }
}

/// Run one session on the local terminal until it ends.
pub async fn play(config: SessionConfig, feed_enabled: bool) -> CirrusResult<SessionExit> {
    let (cols, rows) = terminal::size()?;
    let mut session =
        Session::from_config(Arc::new(config), viewport_for_terminal(cols, rows), feed_enabled)?;
    let handle = session.handle();

    let _raw = RawModeGuard::enable()?;
    let events = {
        let handle = handle.clone();
        std::thread::Builder::new()
            .name("cirrus-local-input".into())
            .spawn(move || forward_events(&handle))
            .map_err(|e| CirrusError::transport(format!("failed to start input thread: {e}")))?
    };

    let mut stdout = tokio::io::stdout();
    let exit = session.run(&mut stdout).await;

    handle.stop();
    if events.join().is_err() {
        tracing::debug!("local input thread panicked");
    }
    Ok(exit)
}

fn forward_events(handle: &SessionHandle) {
    while !handle.is_stopped() {
        match event::poll(EVENT_POLL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                tracing::debug!("terminal event poll failed: {e}");
                handle.stop();
                return;
            }
        }
        match event::read() {
            Ok(Event::Key(key)) => {
                if let Some(c) = key_to_char(&key) {
                    handle.push_input(c);
                }
            }
            Ok(Event::Resize(cols, rows)) => handle.resize(viewport_for_terminal(cols, rows)),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("terminal event read failed: {e}");
                handle.stop();
                return;
            }
        }
    }
}
