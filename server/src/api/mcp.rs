//! MCP Streamable HTTP endpoint handlers.
//!
//! Implements the MCP 2025-03-26 Streamable HTTP transport specification.
//!
//! ## Endpoints
//!
//! - `POST /mcp` - Send JSON-RPC requests; an initialize request with no
//!   session header mints a new session
//! - `GET /mcp` - Open SSE stream for server-initiated messages
//! - `DELETE /mcp` - Terminate a session

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Extension, Json,
};
use serde_json::{json, Value};
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::mcp::{
    handler::{JsonRpcRequest, JsonRpcResponse, McpHandler, ERROR_INTERNAL, ERROR_NO_SESSION},
    session::{SessionRegistry, StreamTransport, TransportEvent},
};
use crate::state::AppState;

/// Header name for MCP session ID.
const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

/// Validate Origin header for DNS rebinding protection.
fn validate_origin(headers: &HeaderMap) -> bool {
    // For local development, we accept requests without Origin
    // or from localhost origins
    if let Some(origin) = headers.get(header::ORIGIN) {
        if let Ok(origin_str) = origin.to_str() {
            if origin_str.starts_with("http://localhost")
                || origin_str.starts_with("https://localhost")
                || origin_str.starts_with("http://127.0.0.1")
                || origin_str.starts_with("https://127.0.0.1")
            {
                return true;
            }
            warn!("Rejecting MCP request from origin: {}", origin_str);
            return false;
        }
    }
    // No Origin header - accept (common for non-browser clients)
    true
}

/// Extract session ID from headers.
fn get_session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Build a JSON-RPC error response body with the given HTTP status.
///
/// The envelope echoes the request's `id` (explicit `null` when the request
/// carried none) so clients can correlate the rejection.
fn rpc_error(id: Value, status: StatusCode, code: i32, message: &str) -> Response {
    (status, Json(JsonRpcResponse::error(Some(id), code, message))).into_response()
}

/// Serialize a handler response, attaching the session id header.
fn rpc_response(response: JsonRpcResponse, session_id: &str) -> Response {
    let mut resp = (StatusCode::OK, Json(response)).into_response();
    if let Ok(hv) = HeaderValue::from_str(session_id) {
        resp.headers_mut()
            .insert(HeaderName::from_static(MCP_SESSION_ID_HEADER), hv);
    }
    resp
}

/// POST /mcp - Handle JSON-RPC requests.
///
/// An initialize request with no session header creates a new transport:
/// the handshake response is produced first, then the transport is activated
/// (minting the session id) and registered, and the id is returned in the
/// `Mcp-Session-Id` response header. Every other request must carry the
/// header of a live session.
pub async fn mcp_post(
    State(state): State<AppState>,
    Extension(sessions): Extension<SessionRegistry>,
    headers: HeaderMap,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    // Validate origin for DNS rebinding protection
    if !validate_origin(&headers) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Invalid origin"})),
        )
            .into_response();
    }

    let session_id = get_session_id(&headers);
    debug!(
        "MCP POST: method={}, session={:?}",
        request.method, session_id
    );

    let request_id = request.id.clone().unwrap_or(Value::Null);

    let Some(sid) = session_id else {
        if request.method != "initialize" {
            // CREATE_OR_CONTINUE without a session requires an initializer.
            return rpc_error(
                request_id,
                StatusCode::BAD_REQUEST,
                ERROR_NO_SESSION,
                "Bad Request: No valid session ID provided",
            );
        }
        return initialize_session(&state, &sessions, request).await;
    };

    if !sessions.lookup(&sid).await {
        return rpc_error(
            request_id,
            StatusCode::NOT_FOUND,
            ERROR_NO_SESSION,
            "Session not found",
        );
    }

    match McpHandler::handle_request(&state, request).await {
        Some(response) => rpc_response(response, &sid),
        // Notification - no response needed
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Create, activate, and register a transport for an initialize request.
async fn initialize_session(
    state: &AppState,
    sessions: &SessionRegistry,
    request: JsonRpcRequest,
) -> Response {
    let mut transport = StreamTransport::new();
    let request_id = request.id.clone().unwrap_or(Value::Null);

    let Some(response) = McpHandler::handle_request(state, request).await else {
        // An initialize request always yields a response; anything else is a bug.
        return rpc_error(
            request_id,
            StatusCode::INTERNAL_SERVER_ERROR,
            ERROR_INTERNAL,
            "Internal server error",
        );
    };

    // Two-phase construction: the handshake succeeded, so the transport may
    // now acquire its id and enter the registry.
    let sid = match transport.activate() {
        Ok(sid) => sid,
        Err(e) => {
            error!("MCP: transport activation failed: {}", e);
            return rpc_error(
                request_id,
                StatusCode::INTERNAL_SERVER_ERROR,
                ERROR_INTERNAL,
                "Internal server error",
            );
        }
    };
    if let Err(e) = sessions.register(transport).await {
        error!("MCP: session registration failed: {}", e);
        return rpc_error(
            request_id,
            StatusCode::INTERNAL_SERVER_ERROR,
            ERROR_INTERNAL,
            "Internal server error",
        );
    }

    info!("MCP: New session initialized: {}", sid);
    rpc_response(response, &sid)
}

/// GET /mcp - Open SSE stream for server-initiated messages.
///
/// Opens a Server-Sent Events stream for receiving server-initiated
/// JSON-RPC messages. Requires an existing session.
pub async fn mcp_get(
    Extension(sessions): Extension<SessionRegistry>,
    headers: HeaderMap,
) -> Response {
    if !validate_origin(&headers) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Invalid origin"})),
        )
            .into_response();
    }

    let session_id = match get_session_id(&headers) {
        Some(id) => id,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Mcp-Session-Id header required for SSE stream"})),
            )
                .into_response();
        }
    };

    let session_rx = match sessions.subscribe(&session_id).await {
        Some(rx) => rx,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Session not found"})),
            )
                .into_response();
        }
    };

    info!("MCP: SSE stream opened for session {}", session_id);

    let stream = BroadcastStream::new(session_rx).filter_map(|result| {
        match result {
            Ok(TransportEvent::JsonRpc(json)) => Some(Ok::<_, std::convert::Infallible>(
                Event::default().data(json),
            )),
            Err(_) => None, // Lagged or closed
        }
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response()
}

/// DELETE /mcp - Terminate a session.
///
/// Terminates the session identified by the `Mcp-Session-Id` header. A
/// repeated terminate for the same id reports "not found" rather than
/// resurrecting or crashing anything.
pub async fn mcp_delete(
    Extension(sessions): Extension<SessionRegistry>,
    headers: HeaderMap,
) -> Response {
    if !validate_origin(&headers) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let session_id = match get_session_id(&headers) {
        Some(id) => id,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Mcp-Session-Id header required"})),
            )
                .into_response();
        }
    };

    if sessions.terminate(&session_id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Session not found"})),
        )
            .into_response()
    }
}
