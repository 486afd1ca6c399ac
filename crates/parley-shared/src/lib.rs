//! # parley-shared
//!
//! Domain types shared between the Parley client and server crates:
//! the user record exchanged over the auth API, the story/status model
//! consumed by the playback controller, and the wire-level constants
//! both sides must agree on.

pub mod constants;
pub mod types;

pub use types::*;
