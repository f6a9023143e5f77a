use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::config::{ServerConfig, SessionConfig};
use crate::foundation::core::Viewport;
use crate::foundation::error::{CirrusError, CirrusResult};
use crate::session::{Session, SessionHandle};
use crate::transport::telnet::{NEGOTIATION, TelnetDecoder, TelnetEvent};

/// How long a new connection may take to report its window size.
pub const NAWS_WAIT: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 1024;

/// Bind `config.bind_addr()` and serve until `shutdown` resolves.
pub async fn run_server(
    config: ServerConfig,
    feed_enabled: bool,
    shutdown: impl Future<Output = ()>,
) -> CirrusResult<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| CirrusError::transport(format!("bind {addr}: {e}")))?;
    serve(listener, config, feed_enabled, shutdown).await
}

/// Accept Telnet connections on `listener`, one independent session each.
///
/// When `shutdown` resolves, accepting stops, every session is told to stop, and the server
/// waits up to `shutdown_grace_secs` for their teardown before aborting what is left.
pub async fn serve(
    listener: TcpListener,
    config: ServerConfig,
    feed_enabled: bool,
    shutdown: impl Future<Output = ()>,
) -> CirrusResult<()> {
    config.validate()?;
    let session_config = Arc::new(config.session.clone());
    let (stop_all, _) = watch::channel(false);
    let mut sessions = JoinSet::new();

    if let Ok(local) = listener.local_addr() {
        tracing::info!(%local, feed = feed_enabled, "listening");
    }

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let cfg = Arc::clone(&session_config);
                    let stop = stop_all.subscribe();
                    sessions.spawn(handle_connection(stream, peer, cfg, feed_enabled, stop));
                }
                Err(e) => tracing::warn!("accept failed: {e}"),
            },
            Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = joined {
                    tracing::warn!("session task failed: {e}");
                }
            }
        }
    }

    tracing::info!(sessions = sessions.len(), "shutting down");
    stop_all.send_replace(true);
    let drained = tokio::time::timeout(config.shutdown_grace(), async {
        while sessions.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        tracing::warn!(
            remaining = sessions.len(),
            "sessions did not finish in time; aborting"
        );
        sessions.abort_all();
    }
    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    config: Arc<SessionConfig>,
    feed_enabled: bool,
    stop_all: watch::Receiver<bool>,
) {
    tracing::info!(%peer, "connection opened");
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(%peer, "set_nodelay failed: {e}");
    }
    let (mut reader, mut writer) = stream.into_split();
    if let Err(e) = writer.write_all(&NEGOTIATION).await {
        tracing::debug!(%peer, "negotiation failed: {e}");
        return;
    }

    let mut decoder = TelnetDecoder::new();
    let mut early_input = String::new();
    let Some(viewport) = initial_viewport(&mut reader, &mut decoder, &mut early_input).await else {
        tracing::info!(%peer, "connection closed before session start");
        return;
    };

    let mut session = match Session::from_config(config, viewport, feed_enabled) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(%peer, "session could not start: {e}");
            return;
        }
    };
    let handle = session.handle();
    handle.push_str(&early_input);

    let pump = tokio::spawn(pump_input(reader, decoder, handle, stop_all));
    let exit = session.run(&mut writer).await;
    pump.abort();
    tracing::info!(%peer, ?exit, "connection closed");
}

/// Wait briefly for a NAWS report. `None` when the peer went away.
async fn initial_viewport<R: AsyncRead + Unpin>(
    reader: &mut R,
    decoder: &mut TelnetDecoder,
    early_input: &mut String,
) -> Option<Viewport> {
    let deadline = Instant::now() + NAWS_WAIT;
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let n = match tokio::time::timeout_at(deadline, reader.read(&mut buf)).await {
            Err(_) => return Some(Viewport::FALLBACK),
            Ok(Ok(0)) | Ok(Err(_)) => return None,
            Ok(Ok(n)) => n,
        };
        let mut reported = None;
        for event in decoder.feed(&buf[..n]) {
            match event {
                TelnetEvent::Input(c) => early_input.push(c),
                TelnetEvent::Resize(viewport) => reported = Some(viewport),
            }
        }
        if reported.is_some() {
            return reported;
        }
    }
}

/// Forward decoded input and resizes into the session until EOF, error, or server shutdown.
async fn pump_input<R: AsyncRead + Unpin>(
    mut reader: R,
    mut decoder: TelnetDecoder,
    handle: SessionHandle,
    mut stop_all: watch::Receiver<bool>,
) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => {
                    for event in decoder.feed(&buf[..n]) {
                        match event {
                            TelnetEvent::Input(c) => {
                                handle.push_input(c);
                            }
                            TelnetEvent::Resize(viewport) => handle.resize(viewport),
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!("connection read failed: {e}");
                    break;
                }
            },
            () = shutdown_signalled(&mut stop_all) => break,
        }
    }
    handle.stop();
}

/// Resolves once the server-wide stop flag is set or its sender is gone.
async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transport/server.rs"]
mod tests;
