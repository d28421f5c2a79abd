pub mod position_stack;
pub mod transcript;
pub mod callback;

pub use position_stack::{PositionStack, SharedMarks};
pub use transcript::TranscriptRecord;
pub use callback::Callback;
