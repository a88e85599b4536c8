//! Sink implementations

mod file;
mod log;

pub use self::file::JsonlFileSink;
pub use self::log::LogSink;
