//! Status/story playback.
//!
//! Split in two: [`StoryPlayer`] is a pure state machine over
//! `std::time::Instant` (tests never sleep), and [`StoryHandle`] drives it
//! with a real timer on a spawned tokio task.

mod handle;
mod player;

pub use handle::{StoryCommand, StoryHandle, StorySnapshot};
pub use player::{Playback, StoryError, StoryPlayer};
