pub mod driver;
pub mod input;

pub use driver::{Session, SessionExit, SessionHandle};
