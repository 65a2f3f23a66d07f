use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use quay_hooks::{Hook, HookInterceptor, HooksManager, RpcHandler, Status};

use crate::agent::ClusterAgent;
use crate::auth::{auth_middleware, AuthConfig};
use crate::errorhandler::{ApiError, ErrorHandler};
use crate::topology::{Topology, TopologyProvider};
use crate::types::*;

/// Header selecting the hooks session a call dispatches through.
pub const HOOKS_SESSION_HEADER: &str = "x-hooks-session";

/// Fully-qualified method selectors for the RPC surface.
pub mod selectors {
    pub const DOCUMENT_GET: &str = "/quay.data.v1.DocumentService/Get";
    pub const DOCUMENT_UPSERT: &str = "/quay.data.v1.DocumentService/Upsert";
    pub const DOCUMENT_REMOVE: &str = "/quay.data.v1.DocumentService/Remove";
    pub const BUCKET_LIST: &str = "/quay.admin.v1.BucketAdminService/ListBuckets";
    pub const BUCKET_CREATE: &str = "/quay.admin.v1.BucketAdminService/CreateBucket";
    pub const BUCKET_DELETE: &str = "/quay.admin.v1.BucketAdminService/DeleteBucket";
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn ClusterAgent>,
    pub hooks: Arc<HooksManager>,
    pub topology: Arc<dyn TopologyProvider>,
    pub auth_config: Arc<AuthConfig>,
    pub error_handler: Arc<ErrorHandler>,
    pub allowed_origins: Vec<String>,
}

/// Create the Axum router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = if state.allowed_origins.is_empty() {
        // Permissive for development
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(
                state
                    .allowed_origins
                    .iter()
                    .filter_map(|s| s.parse().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let auth_config = state.auth_config.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/topology", get(get_topology))
        .route("/api/v1/buckets", get(list_buckets).post(create_bucket))
        .route("/api/v1/buckets/{bucket}", delete(delete_bucket))
        .route(
            "/api/v1/buckets/{bucket}/docs/{key}",
            get(get_document).put(upsert_document).delete(remove_document),
        )
        .route("/api/v1/hooks/sessions", post(create_hooks_session))
        .route("/api/v1/hooks/sessions/{id}", delete(destroy_hooks_session))
        .route("/api/v1/hooks/sessions/{id}/hooks", post(install_hook))
        .layer(middleware::from_fn(move |req, next| {
            auth_middleware(auth_config.clone(), req, next)
        }))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the gateway server
pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let router = create_router(state);
    let addr = format!("{}:{}", host, port);

    info!(addr = %addr, "Starting gateway server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        return;
    }
    info!("Shutdown signal received");
}

/// Route the call through the hooks interceptor when the request names a
/// session, otherwise run the handler directly.
async fn dispatch(
    state: &AppState,
    headers: &HeaderMap,
    selector: &str,
    request: Value,
    handler: RpcHandler,
) -> Result<Value, ApiError> {
    let ctx = CancellationToken::new();

    let session_id = headers
        .get(HOOKS_SESSION_HEADER)
        .and_then(|value| value.to_str().ok());
    let Some(session_id) = session_id else {
        return handler(ctx, request).await.map_err(ApiError::from);
    };

    let Some(context) = state.hooks.get(session_id) else {
        return Err(ApiError(Status::invalid_argument(format!(
            "unknown hooks session '{session_id}'"
        ))));
    };

    HookInterceptor::new(context)
        .intercept(&ctx, selector, request, handler)
        .await
        .map_err(ApiError::from)
}

fn to_wire<T: serde::Serialize>(response: &T) -> Result<Value, Status> {
    serde_json::to_value(response).map_err(|err| Status::internal(err.to_string()))
}

// --- REST Handlers ---

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_topology(State(state): State<AppState>) -> Json<Topology> {
    Json(state.topology.topology().await)
}

async fn get_document(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let request = json!({"bucket_name": bucket.clone(), "key": key.clone()});

    let agent = state.agent.clone();
    let error_handler = state.error_handler.clone();
    let handler: RpcHandler = Box::new(move |_ctx, _request| {
        Box::pin(async move {
            let document = agent
                .get_document(&bucket, &key)
                .await
                .map_err(|err| error_handler.agent_error_to_status(&err))?;
            to_wire(&DocumentResponse {
                content: document.content,
                cas: document.cas,
            })
        })
    });

    let response = dispatch(&state, &headers, selectors::DOCUMENT_GET, request, handler).await?;
    Ok(Json(response))
}

async fn upsert_document(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<UpsertDocumentRequest>,
) -> Result<Json<Value>, ApiError> {
    let request = json!({"bucket_name": bucket.clone(), "key": key.clone(), "content": body.content.clone()});

    let agent = state.agent.clone();
    let error_handler = state.error_handler.clone();
    let content = body.content;
    let handler: RpcHandler = Box::new(move |_ctx, _request| {
        Box::pin(async move {
            let mutation = agent
                .upsert_document(&bucket, &key, content)
                .await
                .map_err(|err| error_handler.agent_error_to_status(&err))?;
            to_wire(&MutationResponse { cas: mutation.cas })
        })
    });

    let response = dispatch(&state, &headers, selectors::DOCUMENT_UPSERT, request, handler).await?;
    Ok(Json(response))
}

async fn remove_document(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let request = json!({"bucket_name": bucket.clone(), "key": key.clone()});

    let agent = state.agent.clone();
    let error_handler = state.error_handler.clone();
    let handler: RpcHandler = Box::new(move |_ctx, _request| {
        Box::pin(async move {
            let mutation = agent
                .remove_document(&bucket, &key)
                .await
                .map_err(|err| error_handler.agent_error_to_status(&err))?;
            to_wire(&MutationResponse { cas: mutation.cas })
        })
    });

    let response = dispatch(&state, &headers, selectors::DOCUMENT_REMOVE, request, handler).await?;
    Ok(Json(response))
}

async fn list_buckets(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let agent = state.agent.clone();
    let error_handler = state.error_handler.clone();
    let handler: RpcHandler = Box::new(move |_ctx, _request| {
        Box::pin(async move {
            let buckets = agent
                .list_buckets()
                .await
                .map_err(|err| error_handler.agent_error_to_status(&err))?;
            to_wire(&ListBucketsResponse {
                buckets: buckets
                    .into_iter()
                    .map(|bucket| BucketSummary {
                        bucket_name: bucket.name,
                        ram_quota_mb: bucket.ram_quota_mb,
                        num_documents: bucket.num_documents,
                    })
                    .collect(),
            })
        })
    });

    let response = dispatch(&state, &headers, selectors::BUCKET_LIST, json!({}), handler).await?;
    Ok(Json(response))
}

async fn create_bucket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateBucketRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request = json!({"bucket_name": body.bucket_name.clone(), "ram_quota_mb": body.ram_quota_mb});

    let agent = state.agent.clone();
    let error_handler = state.error_handler.clone();
    let handler: RpcHandler = Box::new(move |_ctx, _request| {
        Box::pin(async move {
            agent
                .create_bucket(&body.bucket_name, body.ram_quota_mb)
                .await
                .map_err(|err| error_handler.agent_error_to_status(&err))?;
            Ok(json!({}))
        })
    });

    let response = dispatch(&state, &headers, selectors::BUCKET_CREATE, request, handler).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn delete_bucket(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let request = json!({"bucket_name": bucket.clone()});

    let agent = state.agent.clone();
    let error_handler = state.error_handler.clone();
    let handler: RpcHandler = Box::new(move |_ctx, _request| {
        Box::pin(async move {
            agent
                .delete_bucket(&bucket)
                .await
                .map_err(|err| error_handler.agent_error_to_status(&err))?;
            Ok(json!({}))
        })
    });

    let response = dispatch(&state, &headers, selectors::BUCKET_DELETE, request, handler).await?;
    Ok(Json(response))
}

// --- Hooks control plane ---

async fn create_hooks_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.hooks.create_session();
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

async fn install_hook(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(hook): Json<Hook>,
) -> Result<StatusCode, ApiError> {
    let Some(context) = state.hooks.get(&id) else {
        return Err(ApiError(Status::not_found(format!(
            "Hooks session '{id}' was not found."
        ))));
    };

    info!(session = %id, selector = %hook.selector, "installing hook");
    context.registry().install(hook);
    Ok(StatusCode::NO_CONTENT)
}

async fn destroy_hooks_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.hooks.close_session(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError(Status::not_found(format!(
            "Hooks session '{id}' was not found."
        ))))
    }
}
