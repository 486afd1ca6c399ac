//! In-memory user directory: accounts, OTP challenges, session tokens.
//!
//! Invariants:
//! - at most one live challenge per phone number; issuing a new code
//!   supersedes the old one
//! - a code verifies against the most recently issued challenge only,
//!   succeeds at most once, and is dead after its TTL
//! - a session token maps to exactly one account

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::Mutex;
use uuid::Uuid;

use parley_shared::constants::OTP_LENGTH;
use parley_shared::{ProfileUpdate, User};

use crate::error::ApiError;

/// Generate a fresh numeric one-time passcode.
pub fn generate_otp_code() -> String {
    // 100000..=999999: always OTP_LENGTH digits, no leading zero.
    let code = rand::thread_rng().gen_range(100_000..1_000_000).to_string();
    debug_assert_eq!(code.len(), OTP_LENGTH);
    code
}

fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

struct OtpChallenge {
    code: String,
    issued_at: Instant,
}

struct UserRecord {
    user: User,
    challenge: Option<OtpChallenge>,
}

struct DirectoryInner {
    /// phone number -> account
    users: HashMap<String, UserRecord>,
    /// session token -> phone number
    sessions: HashMap<String, String>,
}

/// All server-side auth state, behind one async mutex.
pub struct UserDirectory {
    inner: Mutex<DirectoryInner>,
    otp_ttl: Duration,
}

impl UserDirectory {
    pub fn new(otp_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(DirectoryInner {
                users: HashMap::new(),
                sessions: HashMap::new(),
            }),
            otp_ttl,
        }
    }

    /// Whether an account exists for this phone number.
    pub async fn exists(&self, phone_number: &str) -> bool {
        self.inner.lock().await.users.contains_key(phone_number)
    }

    /// Store `code` as the live challenge for `phone_number`, creating the
    /// account if it does not exist yet.  Any prior challenge for the
    /// number is superseded.
    pub async fn store_challenge(&self, phone_number: &str, code: &str) {
        let mut inner = self.inner.lock().await;
        let record = inner
            .users
            .entry(phone_number.to_string())
            .or_insert_with(|| UserRecord {
                user: User {
                    id: Uuid::new_v4(),
                    phone_number: phone_number.to_string(),
                    username: None,
                    bio: None,
                    dob: None,
                },
                challenge: None,
            });
        record.challenge = Some(OtpChallenge {
            code: code.to_string(),
            issued_at: Instant::now(),
        });
    }

    /// Verify `code` against the live challenge for `phone_number`.
    ///
    /// On match the challenge is consumed and a session token is issued.
    /// A mismatch leaves the challenge in place so a typo can be retried.
    pub async fn verify(&self, phone_number: &str, code: &str) -> Result<(String, User), ApiError> {
        self.verify_at(phone_number, code, Instant::now()).await
    }

    /// [`verify`](Self::verify) with an explicit clock, for TTL tests.
    pub async fn verify_at(
        &self,
        phone_number: &str,
        code: &str,
        now: Instant,
    ) -> Result<(String, User), ApiError> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .users
            .get_mut(phone_number)
            .ok_or(ApiError::InvalidOtp)?;

        let Some(challenge) = record.challenge.as_ref() else {
            return Err(ApiError::InvalidOtp);
        };

        if now.saturating_duration_since(challenge.issued_at) > self.otp_ttl {
            record.challenge = None;
            return Err(ApiError::InvalidOtp);
        }

        if challenge.code != code {
            return Err(ApiError::InvalidOtp);
        }

        // One-time use: consumed on success.
        record.challenge = None;
        let user = record.user.clone();

        let token = generate_session_token();
        inner
            .sessions
            .insert(token.clone(), phone_number.to_string());

        Ok((token, user))
    }

    /// Resolve a session token to its account.
    pub async fn user_for_token(&self, token: &str) -> Result<User, ApiError> {
        let inner = self.inner.lock().await;
        let phone = inner.sessions.get(token).ok_or(ApiError::Unauthorized)?;
        let record = inner.users.get(phone).ok_or(ApiError::UserNotFound)?;
        Ok(record.user.clone())
    }

    /// Merge the non-empty fields of `update` into the token's account and
    /// return the updated record.
    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        let mut inner = self.inner.lock().await;
        let phone = inner
            .sessions
            .get(token)
            .cloned()
            .ok_or(ApiError::Unauthorized)?;
        let record = inner.users.get_mut(&phone).ok_or(ApiError::UserNotFound)?;

        if let Some(ref username) = update.username {
            record.user.username = Some(username.clone());
        }
        if let Some(ref bio) = update.bio {
            record.user.bio = Some(bio.clone());
        }
        if let Some(dob) = update.dob {
            record.user.dob = Some(dob);
        }

        Ok(record.user.clone())
    }
}
