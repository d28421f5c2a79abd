pub mod media_source;
#[cfg(test)]
pub mod mock;
pub mod rodio_source;

pub use media_source::{MediaError, MediaResult, MediaSource};
#[cfg(test)]
pub use mock::MockMediaSource;
pub use rodio_source::RodioMediaSource;
