//! MCP-compatible HTTP server.
//!
//! Exposes conversation search and digest rendering as a JSON HTTP API
//! suitable for integration with Cursor, Claude, and other MCP-compatible
//! AI tools. The search engine is fitted once at startup and shared
//! read-only across all requests.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/tools/list` | List the registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call a registered tool by name |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must be a string" } }
//! ```
//!
//! Error codes: `bad_request` (400), `malformed_result` (400),
//! `not_found` (404), `internal` (500). Per-request errors never take the
//! process down; a filter that matches nothing is not an error at all and
//! yields an empty result list.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients and cross-origin MCP tool calls.
//!
//! # Cursor Integration
//!
//! Add the following to your Cursor MCP configuration:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "convo-search": {
//!       "command": "convo",
//!       "args": ["--config", "/path/to/convo.toml", "serve", "mcp"]
//!     }
//!   }
//! }
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::digest;
use crate::search::{self, SearchEngine, SearchError};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    /// Application configuration (wrapped in `Arc` for cheap cloning across handlers).
    config: Arc<Config>,
    /// The engine fitted at startup; read-only from here on.
    engine: Arc<SearchEngine>,
}

/// Starts the MCP-compatible HTTP server.
///
/// Loads the dataset, fits the search engine, binds to `[server].bind`,
/// and serves requests until the process is terminated. An empty corpus
/// aborts startup; there would be nothing to search.
///
/// This is the standard entry point used by the `convo serve mcp` command.
/// Tests that want a pre-built engine use [`run_server_with_engine`].
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let engine = search::build_engine(config)?;
    run_server_with_engine(config, Arc::new(engine)).await
}

/// Starts the MCP server over an already fitted engine.
pub async fn run_server_with_engine(
    config: &Config,
    engine: Arc<SearchEngine>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
        engine,
    };

    let catalog = tool_catalog();
    println!("Registered {} tools:", catalog.len());
    for t in &catalog {
        println!("  POST /tools/{} — {}", t.name, t.description);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("MCP server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Tool catalog ============

/// A registered tool, as reported by `GET /tools/list`.
#[derive(Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    /// OpenAI function-calling style parameter schema.
    pub parameters: Value,
}

/// The fixed set of tools this server exposes.
pub fn tool_catalog() -> Vec<ToolInfo> {
    vec![
        ToolInfo {
            name: "search_conversations".to_string(),
            description: "Search archived conversations with TF-IDF ranking, optionally \
                          filtered by community and year"
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Free-text query to rank conversations against"
                    },
                    "community": {
                        "type": "string",
                        "description": "Restrict results to one community"
                    },
                    "year": {
                        "type": "string",
                        "description": "Restrict results to one year"
                    },
                    "top_n": {
                        "type": "integer",
                        "description": "Maximum number of results (defaults to the configured limit)"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolInfo {
            name: "summarize_conversations".to_string(),
            description: "Render a plain-text digest of search results returned by \
                          search_conversations"
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "conversations": {
                        "type": "array",
                        "description": "Result objects as returned by search_conversations"
                    }
                },
                "required": ["conversations"]
            }),
        },
    ]
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 400 error for result objects the digest cannot read.
fn malformed_result(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "malformed_result".to_string(),
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error for unexpected engine failures.
fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /tools/list ============

/// JSON response body for `GET /tools/list`.
#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

/// Handler for `GET /tools/list`.
///
/// Returns the registered tools with their OpenAI function-calling
/// parameter schemas.
async fn handle_list_tools() -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: tool_catalog(),
    })
}

// ============ POST /tools/{name} ============

/// Handler for `POST /tools/{name}`.
///
/// Dispatches to the named tool. Returns `404` for unknown tool names and
/// `400` for parameter validation errors.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<Value>,
) -> Result<Json<Value>, AppError> {
    match name.as_str() {
        "search_conversations" => handle_search_tool(&state, &params),
        "summarize_conversations" => handle_summarize_tool(&state, &params),
        _ => Err(not_found(format!("no tool registered with name: {}", name))),
    }
}

/// `search_conversations`: rank conversations against a free-text query.
///
/// A filter that matches nothing responds with an empty `result` array
/// rather than an error; callers probe communities and years they do not
/// know exist.
fn handle_search_tool(state: &AppState, params: &Value) -> Result<Json<Value>, AppError> {
    let query = params
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("query must be a string"))?;
    let community = optional_str(params, "community")?;
    let year = optional_str(params, "year")?;
    let top_n = match params.get("top_n") {
        None | Some(Value::Null) => state.config.retrieval.default_top_n,
        Some(v) => v
            .as_i64()
            .ok_or_else(|| bad_request("top_n must be an integer"))?,
    };

    let results = match state.engine.search(query, community, year, top_n) {
        Ok(results) => results,
        Err(SearchError::EmptyResultSet) => Vec::new(),
        Err(e) => return Err(internal(e.to_string())),
    };

    Ok(Json(serde_json::json!({ "result": results })))
}

/// `summarize_conversations`: render the digest of a result batch.
fn handle_summarize_tool(state: &AppState, params: &Value) -> Result<Json<Value>, AppError> {
    let conversations = params
        .get("conversations")
        .and_then(Value::as_array)
        .ok_or_else(|| bad_request("conversations must be an array of result objects"))?;

    let results =
        digest::parse_results(conversations).map_err(|e| malformed_result(e.to_string()))?;
    let summary = digest::summarize(&results, state.config.digest.max_chars);

    Ok(Json(serde_json::json!({ "result": summary })))
}

/// Reads an optional string parameter; `null` counts as absent.
fn optional_str<'a>(params: &'a Value, key: &str) -> Result<Option<&'a str>, AppError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(bad_request(format!("{} must be a string", key))),
    }
}
