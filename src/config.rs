use std::path::Path;
use std::time::Duration;

use crate::feed::live::LiveFeedConfig;
use crate::foundation::core::Fps;
use crate::foundation::error::{CirrusError, CirrusResult};
use crate::render::overlay::OverlayStyle;
use crate::render::ramp::RampStyle;
use crate::source::orchestrator::OrchestratorOpts;

/// Per-session settings, read once when a session starts.
///
/// Style names are normalized on deserialize: unknown names become the default style.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub fps: u32,
    pub ramp_style: RampStyle,
    pub overlay_style: OverlayStyle,
    pub feed_url: Option<String>,
    pub probe_interval_secs: f64,
    pub auto_cycle_secs: f64,
    pub input_capacity: usize,
    pub logo_margin_x: usize,
    pub logo_margin_y: usize,
    pub logo_fade_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fps: 10,
            ramp_style: RampStyle::default(),
            overlay_style: OverlayStyle::default(),
            feed_url: None,
            probe_interval_secs: 5.0,
            auto_cycle_secs: 30.0,
            input_capacity: 256,
            logo_margin_x: 10,
            logo_margin_y: 2,
            logo_fade_secs: 3.0,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> CirrusResult<()> {
        if self.fps == 0 {
            return Err(CirrusError::validation("fps must be > 0"));
        }
        if self.input_capacity == 0 {
            return Err(CirrusError::validation("input_capacity must be > 0"));
        }
        if !self.probe_interval_secs.is_finite() || self.probe_interval_secs <= 0.0 {
            return Err(CirrusError::validation(
                "probe_interval_secs must be finite and > 0",
            ));
        }
        if !self.auto_cycle_secs.is_finite() || self.auto_cycle_secs <= 0.0 {
            return Err(CirrusError::validation(
                "auto_cycle_secs must be finite and > 0",
            ));
        }
        if !self.logo_fade_secs.is_finite() || self.logo_fade_secs < 0.0 {
            return Err(CirrusError::validation(
                "logo_fade_secs must be finite and >= 0",
            ));
        }
        if self.feed_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(CirrusError::validation("feed_url must not be blank"));
        }
        Ok(())
    }

    pub fn fps(&self) -> CirrusResult<Fps> {
        Fps::new(self.fps)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.probe_interval_secs)
            .unwrap_or(OrchestratorOpts::default().probe_interval)
    }

    pub fn orchestrator_opts(&self) -> OrchestratorOpts {
        OrchestratorOpts {
            probe_interval: self.probe_interval(),
            ..OrchestratorOpts::default()
        }
    }

    /// Feed settings when a feed URL is configured.
    pub fn live_feed(&self) -> Option<LiveFeedConfig> {
        self.feed_url
            .as_deref()
            .map(|url| LiveFeedConfig::new(url.trim(), self.fps))
    }
}

/// Network server settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
    /// How long shutdown waits for sessions to finish their teardown.
    pub shutdown_grace_secs: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 2323,
            session: SessionConfig::default(),
            shutdown_grace_secs: 3.0,
        }
    }
}

impl ServerConfig {
    pub fn from_json_str(s: &str) -> CirrusResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| CirrusError::config(format!("invalid server config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> CirrusResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CirrusError::config(format!("read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> CirrusResult<()> {
        if self.host.trim().is_empty() {
            return Err(CirrusError::validation("host must not be empty"));
        }
        if !self.shutdown_grace_secs.is_finite() || self.shutdown_grace_secs < 0.0 {
            return Err(CirrusError::validation(
                "shutdown_grace_secs must be finite and >= 0",
            ));
        }
        self.session.validate()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::try_from_secs_f64(self.shutdown_grace_secs).unwrap_or(Duration::from_secs(3))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
