pub mod ffmpeg;
pub mod live;
pub mod process;
