//! Reference sink implementations
//!
//! Minimal concrete sinks: console and file for real use, memory for tests.
//! Richer destinations (rotation, email, database) are deliberately out of
//! scope; they implement [`crate::Sink`] externally.

mod console;
mod file;
mod memory;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use memory::MemorySink;
