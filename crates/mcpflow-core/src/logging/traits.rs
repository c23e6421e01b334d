//! Logger trait

use std::sync::Arc;

/// Pluggable logging seam.
///
/// The engine never writes to stdout directly; every component takes a
/// [`SharedLogger`] so an embedding process can route log lines wherever
/// it wants. [`super::NoOpLogger`] silences everything,
/// [`super::ConsoleLogger`] prints to the terminal.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Cheap-to-clone handle shared across the engine
pub type SharedLogger = Arc<dyn Logger>;
