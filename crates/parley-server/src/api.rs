use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Method},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use parley_shared::constants::AUTH_TOKEN_HEADER;
use parley_shared::{ProfileUpdate, User};

use crate::error::ApiError;
use crate::sms::SmsSender;
use crate::throttle::OtpThrottle;
use crate::users::{generate_otp_code, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<UserDirectory>,
    pub sms: Arc<dyn SmsSender>,
    pub throttle: OtpThrottle,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/user/send-otp", post(send_otp))
        .route("/api/user/send-login-otp", post(send_login_otp))
        .route("/api/user/verify-otp", post(verify_otp))
        .route("/api/user/verify-login-otp", post(verify_otp))
        .route("/api/user/me", get(me))
        .route("/api/user/update-profile", put(update_profile))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendOtpRequest {
    phone_number: String,
}

#[derive(Serialize)]
struct SendOtpResponse {
    success: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpRequest {
    phone_number: String,
    otp: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: User,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Signup / universal OTP request: creates the account on first contact.
async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, ApiError> {
    deliver_otp(&state, &req.phone_number).await
}

/// Login OTP request: the account must already exist.
async fn send_login_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, ApiError> {
    if !state.directory.exists(&req.phone_number).await {
        return Err(ApiError::UserNotFound);
    }
    deliver_otp(&state, &req.phone_number).await
}

/// Generate, deliver, then store a fresh challenge.  Storing last mirrors
/// the delivery contract: a failed send leaves any prior code live.
async fn deliver_otp(
    state: &AppState,
    phone_number: &str,
) -> Result<Json<SendOtpResponse>, ApiError> {
    if !state.throttle.check(phone_number).await {
        warn!(phone = %phone_number, "OTP send throttled");
        return Err(ApiError::TooManyRequests);
    }

    let code = generate_otp_code();

    state.sms.send_otp(phone_number, &code).await.map_err(|e| {
        warn!(phone = %phone_number, error = %e, "OTP delivery failed");
        ApiError::Delivery(e.to_string())
    })?;

    state.directory.store_challenge(phone_number, &code).await;

    info!(phone = %phone_number, "OTP issued");
    Ok(Json(SendOtpResponse { success: true }))
}

async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (token, user) = state.directory.verify(&req.phone_number, &req.otp).await?;

    info!(user = %user.id, "OTP verified, session issued");
    Ok(Json(LoginResponse { token, user }))
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let token = auth_token(&headers)?;
    let user = state.directory.user_for_token(token).await?;
    Ok(Json(user))
}

async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    let token = auth_token(&headers)?.to_string();
    let user = state.directory.update_profile(&token, &update).await?;

    info!(user = %user.id, "profile updated");
    Ok(Json(user))
}

fn auth_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::Unauthorized)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
