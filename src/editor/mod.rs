pub mod autosave;

pub use autosave::{AutosaveCoordinator, DEFAULT_AUTOSAVE_INTERVAL};
