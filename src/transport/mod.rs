pub mod local;
pub mod server;
pub mod telnet;
