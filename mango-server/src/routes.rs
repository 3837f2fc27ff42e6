//! HTTP routes over the vault engine.

use crate::api::{ApiError, ApiResult};
use crate::validate::{self, NewCredentialRequest, UpdateCredentialRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use mango_vault::{Credential, OpContext, StoreOutcome, VaultEngine, VaultEntry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<VaultEngine>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(vault: Arc<VaultEngine>, request_timeout: Duration) -> Self {
        Self {
            vault,
            request_timeout,
        }
    }

    fn ctx(&self) -> OpContext {
        OpContext::with_timeout(self.request_timeout)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/credentials",
            get(list_credentials)
                .post(create_credentials)
                .put(missing_site)
                .delete(missing_site),
        )
        .route(
            "/credentials/",
            get(list_credentials)
                .post(create_credentials)
                .put(missing_site)
                .delete(missing_site),
        )
        .route(
            "/credentials/{site}",
            get(get_credentials)
                .put(update_credentials)
                .delete(delete_credentials),
        )
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn list_credentials(State(state): State<AppState>) -> ApiResult<Json<Vec<VaultEntry>>> {
    let entries = state.vault.show(&state.ctx()).await?;
    debug!(count = entries.len(), "listed credentials");
    Ok(Json(entries))
}

async fn create_credentials(
    State(state): State<AppState>,
    body: Result<Json<NewCredentialRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, &'static str)> {
    let Json(body) = body.map_err(|_| ApiError::InvalidBody)?;
    let cred = body.validate()?;

    let outcome = state
        .vault
        .store(&state.ctx(), &cred.site, &cred.username, &cred.password)
        .await?;
    Ok(match outcome {
        StoreOutcome::Created => (StatusCode::CREATED, "Credentials stored successfully.\n"),
        StoreOutcome::Updated => (StatusCode::OK, "Credentials updated successfully.\n"),
    })
}

async fn get_credentials(
    State(state): State<AppState>,
    Path(site): Path<String>,
) -> ApiResult<Json<Credential>> {
    let site = validate::site(&site)?;
    state
        .vault
        .retrieve(&state.ctx(), &site)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn update_credentials(
    State(state): State<AppState>,
    Path(site): Path<String>,
    body: Result<Json<UpdateCredentialRequest>, JsonRejection>,
) -> ApiResult<&'static str> {
    let Json(body) = body.map_err(|_| ApiError::InvalidBody)?;
    let cred = body.validate(&site)?;

    state
        .vault
        .update(&state.ctx(), &cred.site, &cred.username, &cred.password)
        .await?;
    Ok("Credentials updated successfully.\n")
}

async fn delete_credentials(
    State(state): State<AppState>,
    Path(site): Path<String>,
) -> ApiResult<&'static str> {
    let site = validate::site(&site)?;
    state.vault.delete(&state.ctx(), &site).await?;
    Ok("Credentials deleted successfully.\n")
}

async fn missing_site() -> ApiError {
    ApiError::MissingSite
}

/// Logs method, path, status and latency of every request. Bodies are
/// never logged.
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed = ?started.elapsed(),
        "request handled"
    );
    response
}
