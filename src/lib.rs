#![forbid(unsafe_code)]

pub mod config;
pub mod feed;
pub mod field;
pub mod foundation;
pub mod render;
pub mod session;
pub mod source;
pub mod transport;

pub use config::{ServerConfig, SessionConfig};
pub use feed::ffmpeg::{FfmpegLauncher, is_ffmpeg_on_path};
pub use feed::live::{LiveFeedConfig, LiveFeedSource};
pub use field::compositor::CloudCompositor;
pub use foundation::core::{Fps, Viewport};
pub use foundation::error::{CirrusError, CirrusResult};
pub use foundation::tracing_setup;
pub use render::glyph_renderer::GlyphRenderer;
pub use render::overlay::{LogoOverlay, OverlayStyle};
pub use render::ramp::{GlyphRamp, RampStyle};
pub use session::{Session, SessionExit, SessionHandle};
pub use source::StreamSource;
pub use source::orchestrator::{FailoverState, StreamOrchestrator};
