//! # parley-client
//!
//! Client-side core of the Parley chat application:
//!
//! - [`SessionManager`] -- the authenticated-user lifecycle: request and
//!   verify one-time passcodes, persist the session token, expose
//!   current-user state through a watch channel, tear the session down on
//!   logout or invalid-token detection.
//! - [`story`] -- the status/story playback controller: auto-advancing
//!   timed slides with pause/resume, manual navigation, and per-slide
//!   progress.
//!
//! Both are independent; they share no state.  The UI layer holds a
//! `SessionManager` handle and opens a [`story::StoryHandle`] per viewed
//! story.

pub mod api;
pub mod session;
pub mod story;

mod error;

pub use api::ApiClient;
pub use error::ClientError;
pub use session::{SessionManager, SessionState};
