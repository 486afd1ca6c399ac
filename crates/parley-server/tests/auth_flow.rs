//! End-to-end OTP login flow: the real client `SessionManager` talking to
//! the real axum router over a loopback socket, with a capturing SMS fake
//! and a throwaway on-disk token store.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use parley_client::{ApiClient, ClientError, SessionManager};
use parley_server::api::{build_router, AppState};
use parley_server::config::ServerConfig;
use parley_server::sms::{SmsError, SmsSender};
use parley_server::throttle::OtpThrottle;
use parley_server::users::UserDirectory;
use parley_store::Database;

const PHONE: &str = "+15551234567";

/// Captures the last delivered code instead of sending it anywhere.
#[derive(Default)]
struct CapturingSender {
    last_code: Mutex<Option<String>>,
}

impl CapturingSender {
    fn last_code(&self) -> String {
        self.last_code
            .lock()
            .unwrap()
            .clone()
            .expect("no OTP was delivered")
    }
}

#[async_trait]
impl SmsSender for CapturingSender {
    async fn send_otp(&self, _to: &str, code: &str) -> Result<(), SmsError> {
        *self.last_code.lock().unwrap() = Some(code.to_string());
        Ok(())
    }
}

/// Spawn the server on an ephemeral loopback port.
async fn spawn_server() -> (SocketAddr, Arc<CapturingSender>) {
    let sender = Arc::new(CapturingSender::default());
    let config = ServerConfig::default();
    let state = AppState {
        directory: Arc::new(UserDirectory::new(config.otp_ttl)),
        sms: sender.clone(),
        // The flow below sends several OTPs in quick succession.
        throttle: OtpThrottle::new(100.0, 100.0),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    (addr, sender)
}

fn manager_at(addr: SocketAddr, db_path: &Path) -> SessionManager {
    let api = ApiClient::new(format!("http://{addr}"));
    let store = Database::open_at(db_path).unwrap();
    SessionManager::new(api, store)
}

#[tokio::test]
async fn otp_login_round_trip() {
    let (addr, sender) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("client.db");

    let manager = manager_at(addr, &db_path);
    manager.restore().await;
    assert!(manager.state().user.is_none());

    manager.request_otp(PHONE).await.unwrap();
    let code = sender.last_code();

    let user = manager.verify_otp(PHONE, &code).await.unwrap();
    assert_eq!(user.phone_number, PHONE);

    let state = manager.state();
    assert!(state.is_authenticated());
    assert!(state.token.is_some());

    // A second process (fresh manager, same store) restores the session.
    let restored = manager_at(addr, &db_path);
    restored.restore().await;
    assert_eq!(
        restored.state().user.map(|u| u.id),
        Some(user.id),
    );
}

#[tokio::test]
async fn wrong_code_leaves_the_session_retryable() {
    let (addr, sender) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_at(addr, &dir.path().join("client.db"));

    manager.request_otp(PHONE).await.unwrap();
    let code = sender.last_code();
    let wrong = if code == "999999" { "111111" } else { "999999" };

    let err = manager.verify_otp(PHONE, wrong).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials));
    assert!(manager.state().user.is_none());

    // The challenge survives the typo; the real code still logs in.
    manager.verify_otp(PHONE, &code).await.unwrap();
    assert!(manager.state().is_authenticated());
}

#[tokio::test]
async fn a_second_request_invalidates_the_first_code() {
    let (addr, sender) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_at(addr, &dir.path().join("client.db"));

    manager.request_otp(PHONE).await.unwrap();
    let first = sender.last_code();
    manager.request_otp(PHONE).await.unwrap();
    let second = sender.last_code();

    if first != second {
        let err = manager.verify_otp(PHONE, &first).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidCredentials));
    }

    manager.verify_otp(PHONE, &second).await.unwrap();
}

#[tokio::test]
async fn a_code_is_single_use() {
    let (addr, sender) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_at(addr, &dir.path().join("client.db"));

    manager.request_otp(PHONE).await.unwrap();
    let code = sender.last_code();

    manager.verify_otp(PHONE, &code).await.unwrap();
    let err = manager.verify_otp(PHONE, &code).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials));
}

#[tokio::test]
async fn logout_then_restore_is_logged_out() {
    let (addr, sender) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("client.db");
    let manager = manager_at(addr, &db_path);

    manager.request_otp(PHONE).await.unwrap();
    manager.verify_otp(PHONE, &sender.last_code()).await.unwrap();
    assert!(manager.state().is_authenticated());

    manager.logout();
    assert!(manager.state().user.is_none());

    let fresh = manager_at(addr, &db_path);
    fresh.restore().await;
    let state = fresh.state();
    assert!(state.user.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn restore_clears_a_rejected_token() {
    let (addr, _sender) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("client.db");

    // A stale token the server has never seen.
    {
        let db = Database::open_at(&db_path).unwrap();
        db.save_token("deadbeef").unwrap();
    }

    let manager = manager_at(addr, &db_path);
    manager.restore().await;
    assert!(manager.state().user.is_none());

    // The server rejected it, so it must be gone from storage.
    let db = Database::open_at(&db_path).unwrap();
    assert_eq!(db.load_token().unwrap(), None);
}

#[tokio::test]
async fn profile_update_merges_fields_end_to_end() {
    let (addr, sender) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_at(addr, &dir.path().join("client.db"));

    manager.request_otp(PHONE).await.unwrap();
    manager.verify_otp(PHONE, &sender.last_code()).await.unwrap();

    let user = manager
        .update_profile(parley_shared::ProfileUpdate {
            username: Some("ada".into()),
            bio: None,
            dob: None,
        })
        .await
        .unwrap();
    assert_eq!(user.username.as_deref(), Some("ada"));

    let user = manager
        .update_profile(parley_shared::ProfileUpdate {
            bio: Some("hello".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(user.username.as_deref(), Some("ada"));
    assert_eq!(user.bio.as_deref(), Some("hello"));

    // The session snapshot tracks the edit.
    assert_eq!(
        manager.state().user.and_then(|u| u.username),
        Some("ada".to_string()),
    );
}

#[tokio::test]
async fn login_otp_requires_an_existing_account() {
    let (addr, _sender) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_at(addr, &dir.path().join("client.db"));

    let err = manager.request_login_otp("+15550001111").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound));
}
