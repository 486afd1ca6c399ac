//! Authenticated-user session lifecycle.
//!
//! [`SessionManager`] is an explicit service object handed to consumers by
//! reference; state changes are published on a `tokio::sync::watch`
//! channel instead of an implicit context.  A consumer that went away
//! simply stops reading its receiver -- publishing uses `send_replace`, so
//! a completed network call never fails or corrupts state because the UI
//! unmounted first.
//!
//! Failure policy: every network failure is caught here, logged, and
//! surfaced as a `Result`; nothing propagates as a panic, and no call is
//! retried.

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::{info, warn};

use parley_shared::{ProfileUpdate, User};
use parley_store::Database;

use crate::api::ApiClient;
use crate::error::{ClientError, Result};

/// Snapshot of the session, published on every change.
///
/// Invariant: `user.is_some()` implies `token.is_some()`.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// The authenticated user, `None` when logged out.
    pub user: Option<User>,
    /// The session token presented on authenticated calls.
    pub token: Option<String>,
    /// True only during the initial restore attempt at process start.
    pub loading: bool,
}

impl SessionState {
    fn initial() -> Self {
        Self {
            user: None,
            token: None,
            loading: true,
        }
    }

    fn logged_out() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Owns the session: the persisted token, the current user, and the watch
/// channel consumers subscribe to.
pub struct SessionManager {
    api: ApiClient,
    // rusqlite connections are Send but not Sync; every access is a short
    // synchronous query, so a std mutex is enough.
    store: Mutex<Database>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create a manager in the `loading` state.  Call [`restore`]
    /// (Self::restore) next to resolve it.
    pub fn new(api: ApiClient, store: Database) -> Self {
        let (state_tx, _) = watch::channel(SessionState::initial());
        Self {
            api,
            store: Mutex::new(store),
            state_tx,
        }
    }

    /// Subscribe to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Attempt to restore a previous session from the persisted token.
    ///
    /// On success the user is populated.  If the server affirmatively
    /// rejects the token it is cleared from storage; on a pure transport
    /// failure it is kept so a flaky network does not log the user out.
    /// `loading` becomes false exactly once, on every path.
    pub async fn restore(&self) {
        let mut next = SessionState::logged_out();

        if let Some(token) = self.load_stored_token() {
            match self.api.me(&token).await {
                Ok(user) => {
                    info!(user = %user.id, "session restored");
                    next.user = Some(user);
                    next.token = Some(token);
                }
                Err(e) if e.is_auth_rejection() => {
                    warn!(error = %e, "stored token rejected; clearing it");
                    self.clear_stored_token();
                }
                Err(e) => {
                    warn!(error = %e, "session restore failed; keeping stored token");
                }
            }
        }

        self.state_tx.send_replace(next);
    }

    /// Ask the server to deliver a fresh OTP to `phone_number`, creating
    /// the account if needed.  Never mutates local session state.
    pub async fn request_otp(&self, phone_number: &str) -> Result<()> {
        self.api.send_otp(phone_number).await.map_err(|e| {
            warn!(error = %e, "OTP request failed");
            e
        })
    }

    /// Login variant of [`request_otp`](Self::request_otp): fails with
    /// [`ClientError::NotFound`] when the number has no account.
    pub async fn request_login_otp(&self, phone_number: &str) -> Result<()> {
        self.api.send_login_otp(phone_number).await.map_err(|e| {
            warn!(error = %e, "login OTP request failed");
            e
        })
    }

    /// Submit an OTP.  On match the returned token is persisted and the
    /// session becomes authenticated; on mismatch local state is untouched
    /// so the input can simply be retried.
    pub async fn verify_otp(&self, phone_number: &str, otp: &str) -> Result<User> {
        let login = self.api.verify_otp(phone_number, otp).await.map_err(|e| {
            warn!(error = %e, "OTP verification failed");
            e
        })?;

        self.save_stored_token(&login.token);

        info!(user = %login.user.id, "login successful");
        self.state_tx.send_replace(SessionState {
            user: Some(login.user.clone()),
            token: Some(login.token),
            loading: false,
        });

        Ok(login.user)
    }

    /// Merge a profile edit into the authenticated user's record.
    ///
    /// An `Unauthorized` answer means the token has been invalidated
    /// upstream; the local session is torn down exactly as in
    /// [`logout`](Self::logout).
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        let token = self
            .state_tx
            .borrow()
            .token
            .clone()
            .ok_or(ClientError::NoSession)?;

        match self.api.update_profile(&token, &update).await {
            Ok(user) => {
                self.state_tx.send_modify(|s| s.user = Some(user.clone()));
                Ok(user)
            }
            Err(ClientError::Unauthorized) => {
                warn!("token invalidated upstream; logging out");
                self.logout();
                Err(ClientError::Unauthorized)
            }
            Err(e) => {
                warn!(error = %e, "profile update failed");
                Err(e)
            }
        }
    }

    /// Clear the persisted token and the in-memory session.  No network
    /// call; always succeeds locally.
    pub fn logout(&self) {
        self.clear_stored_token();
        self.state_tx.send_replace(SessionState::logged_out());
        info!("logged out");
    }

    // -- storage helpers (failures logged, never fatal) --

    fn load_stored_token(&self) -> Option<String> {
        let store = match self.store.lock() {
            Ok(guard) => guard,
            Err(e) => {
                warn!(error = %e, "store lock poisoned");
                return None;
            }
        };
        match store.load_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "failed to read stored token");
                None
            }
        }
    }

    fn save_stored_token(&self, token: &str) {
        if let Ok(store) = self.store.lock() {
            if let Err(e) = store.save_token(token) {
                warn!(error = %e, "failed to persist session token");
            }
        }
    }

    fn clear_stored_token(&self) {
        if let Ok(store) = self.store.lock() {
            if let Err(e) = store.clear_token() {
                warn!(error = %e, "failed to clear stored token");
            }
        }
    }
}
