use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, ReadyResponse, SetupResponse, AUTH_FAILED,
            CREATE_DB_FAILED, INVALID_CREDENTIALS, INVALID_JSON, SEEDING_FAILED,
        },
        error::StoreError,
    },
    state::AppState,
};

/// Upper bound for setup-database so a single request cannot allocate unbounded rows.
pub const MAX_SETUP_COUNT: i64 = 1_000_000;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/get-user-token", post(get_user_token))
        .route("/create-db", get(create_db))
        .route("/setup-database/:count", post(setup_database))
}

pub async fn health() -> &'static str {
    "OK"
}

#[instrument(skip(state))]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(ReadyResponse { ready: true })),
        Err(e) => {
            error!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse { ready: false }),
            )
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn get_user_token(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> (StatusCode, Json<LoginResponse>) {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "rejected login body");
            return (
                StatusCode::BAD_REQUEST,
                Json(LoginResponse::rejected(INVALID_JSON)),
            );
        }
    };

    match state
        .store
        .find_by_credentials(&payload.username, &payload.hashed_password)
        .await
    {
        Ok(Some(user)) => {
            debug!(user_id = %user.id, username = %user.username, "login ok");
            (StatusCode::OK, Json(LoginResponse::authenticated(user.id)))
        }
        Ok(None) => {
            debug!(username = %payload.username, "login rejected");
            (
                StatusCode::OK,
                Json(LoginResponse::rejected(INVALID_CREDENTIALS)),
            )
        }
        Err(e) => {
            error!(error = %e, username = %payload.username, "find_by_credentials failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LoginResponse::rejected(AUTH_FAILED)),
            )
        }
    }
}

#[instrument(skip(state))]
pub async fn create_db(State(state): State<AppState>) -> Result<String, (StatusCode, String)> {
    let count = state.config.seed.count;
    match state.store.seed_users(count).await {
        Ok(inserted) => {
            info!(inserted, "users seeded");
            Ok(format!(
                "Successfully created {inserted} users in the database"
            ))
        }
        Err(e) => {
            error!(error = %e, count, "seed_users failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, CREATE_DB_FAILED.into()))
        }
    }
}

#[instrument(skip(state))]
pub async fn setup_database(
    State(state): State<AppState>,
    Path(count): Path<i64>,
) -> Response {
    if count < 0 {
        return (StatusCode::BAD_REQUEST, "Count must be non-negative").into_response();
    }
    if count > MAX_SETUP_COUNT {
        return (
            StatusCode::BAD_REQUEST,
            format!("Count must not exceed {MAX_SETUP_COUNT}"),
        )
            .into_response();
    }

    let seeded: Result<u64, StoreError> = async {
        let removed = state.store.reset_users().await?;
        debug!(removed, "users cleared");
        state.store.seed_users(count as u64).await
    }
    .await;

    match seeded {
        Ok(inserted) => {
            info!(inserted, "database reset and seeded");
            Json(SetupResponse {
                success: true,
                inserted: Some(inserted),
                error_message: None,
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, count, "setup_database failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SetupResponse {
                    success: false,
                    inserted: None,
                    error_message: Some(SEEDING_FAILED.into()),
                }),
            )
                .into_response()
        }
    }
}
