//! JSON-RPC 2.0 Server
//!
//! Serves the shelter API over stdio using line-delimited JSON-RPC 2.0.
//!
//! # Architecture
//!
//! - **Transport**: one request per input line, one response per output line
//! - **Dependencies**: only `serde_json` and anyhow (no RPC framework)
//! - **Dispatch**: methods and params are decoded by [`crate::api::Request`]
//!
//! # Error Codes
//!
//! | Code   | Meaning                                                     |
//! |--------|-------------------------------------------------------------|
//! | -32700 | Line is not valid JSON                                      |
//! | -32600 | Not a JSON-RPC 2.0 request object                           |
//! | -32601 | Unknown method                                              |
//! | -32602 | Params do not fit the method (including incomplete animals) |
//! | -32000 | Store failure; `data.code` holds the error code             |
//!
//! Errors raised by the caller's input keep -32602 even when they surface
//! from the store, again with `data.code` set.
//!
//! # Usage
//!
//! ```text
//! $ getpet --database shelter.db serve
//! {"jsonrpc":"2.0","id":1,"method":"animal/get","params":{"intakeNumber":1}}
//! {"jsonrpc":"2.0","id":1,"result":{"animal":{"intakeNumber":1,...}}}
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufRead, Write};

use crate::api::{self, Request, RequestError};
use crate::error::ShelterError;
use crate::service::ShelterService;

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const SERVER_ERROR: i32 = -32000;

// ============================================================================
// JSON-RPC 2.0 Structures
// ============================================================================

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Option<Value>, code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data,
            }),
        }
    }

    fn from_request_error(id: Option<Value>, err: &RequestError) -> Self {
        let code = match err {
            RequestError::UnknownMethod(_) => METHOD_NOT_FOUND,
            RequestError::InvalidParams(_) => INVALID_PARAMS,
        };
        Self::failure(id, code, err.to_string(), None)
    }

    fn from_shelter_error(id: Option<Value>, err: &ShelterError) -> Self {
        let code = if err.is_client_error() {
            INVALID_PARAMS
        } else {
            SERVER_ERROR
        };
        Self::failure(
            id,
            code,
            err.message(),
            Some(serde_json::json!({ "code": err.error_code() })),
        )
    }
}

// ============================================================================
// Server
// ============================================================================

/// Serve requests from stdin until it is closed
///
/// # Errors
///
/// Returns an error if stdio communication fails.
#[allow(clippy::future_not_send)]
pub async fn serve(service: &ShelterService) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve_lines(service, stdin.lock(), stdout.lock()).await
}

/// Serve requests from any line source, writing responses to `output`
///
/// Blank lines are skipped. Every other line produces exactly one response line.
#[allow(clippy::future_not_send)]
pub async fn serve_lines<R: BufRead, W: Write>(
    service: &ShelterService,
    input: R,
    mut output: W,
) -> Result<()> {
    tracing::info!("RPC server listening on stdio");

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(service, &line).await;
        writeln!(output, "{}", serde_json::to_string(&response)?)?;
        output.flush()?;
    }

    tracing::info!("RPC input closed, stopping server");
    Ok(())
}

/// Handle one raw request line
pub async fn handle_line(service: &ShelterService, line: &str) -> JsonRpcResponse {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected unparseable request");
            return JsonRpcResponse::failure(None, PARSE_ERROR, format!("Parse error: {e}"), None);
        }
    };

    let id = value.get("id").cloned();
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
                None,
            );
        }
    };

    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::failure(
            request.id,
            INVALID_REQUEST,
            format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            None,
        );
    }

    handle_request(service, request).await
}

async fn handle_request(service: &ShelterService, request: JsonRpcRequest) -> JsonRpcResponse {
    let call = match Request::from_parts(&request.method, request.params) {
        Ok(call) => call,
        Err(e) => {
            tracing::debug!(method = %request.method, error = %e, "Rejected request");
            return JsonRpcResponse::from_request_error(request.id, &e);
        }
    };

    let method = call.method();
    match api::handle(service, call).await {
        Ok(response) => match serde_json::to_value(response) {
            Ok(result) => {
                tracing::debug!(method, "Request succeeded");
                JsonRpcResponse::success(request.id, result)
            }
            Err(e) => JsonRpcResponse::failure(
                request.id,
                SERVER_ERROR,
                format!("Could not serialize result: {e}"),
                None,
            ),
        },
        Err(e) => {
            tracing::warn!(method, code = e.error_code(), "Request failed");
            JsonRpcResponse::from_shelter_error(request.id, &e)
        }
    }
}
