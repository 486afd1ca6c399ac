//! Domain model structs exchanged between the client, the store, and the
//! auth server.
//!
//! Wire names are camelCase to match the JSON contract of the auth API
//! (`phoneNumber`, `dob`, ...).

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{SLIDE_DURATION, VIDEO_SLIDE_DURATION};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An account record, keyed by phone number.
///
/// Everything beyond the phone number is optional profile data the user
/// fills in after signup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable account identifier.
    pub id: Uuid,
    /// E.164 phone number, unique per account.
    pub phone_number: String,
    /// Display name.
    pub username: Option<String>,
    /// Free-form profile text.
    pub bio: Option<String>,
    /// Date of birth.
    pub dob: Option<NaiveDate>,
}

/// Partial profile edit. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub dob: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Story / status
// ---------------------------------------------------------------------------

/// What a single status slide contains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Text,
    Image,
    Video,
}

/// One time-boxed slide inside a story.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: SlideKind,
    /// Text body for text slides, media URI otherwise.
    pub content: String,
    /// Whether this slide has been shown to the viewer.
    pub viewed: bool,
}

impl Slide {
    pub fn new(kind: SlideKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            viewed: false,
        }
    }
}

/// A story: one owner's ordered sequence of slides.
///
/// The slide order is fixed at load time; the caller supplies the slides,
/// the playback controller never fetches them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub owner_id: Uuid,
    pub owner_avatar: String,
    pub owner_name: String,
    pub slides: Vec<Slide>,
}

/// On-screen duration for a slide of the given kind.
pub fn slide_duration(kind: SlideKind) -> Duration {
    match kind {
        SlideKind::Video => VIDEO_SLIDE_DURATION,
        SlideKind::Text | SlideKind::Image => SLIDE_DURATION,
    }
}
