use serde::{Deserialize, Serialize};

use crate::contract::{CoreRequest, CoreResponse};
use crate::engine::{AppEngine, EngineError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidRequest,
    NotFound,
    Launch,
    Config,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportResponse {
    Ok { response: CoreResponse },
    Err { error: ErrorResponse },
}

pub fn handle_request(engine: &AppEngine, request: CoreRequest) -> TransportResponse {
    match engine.handle_command(request) {
        Ok(response) => TransportResponse::Ok { response },
        Err(error) => TransportResponse::Err {
            error: map_engine_error(error),
        },
    }
}

/// Decodes one JSON request and encodes its response; never fails, a
/// malformed payload becomes an `invalid_json` error response.
pub fn handle_json(engine: &AppEngine, payload: &str) -> String {
    let response = match decode(payload) {
        Ok(request) => handle_request(engine, request),
        Err(rejected) => rejected,
    };

    encode(&response)
}

pub fn decode(payload: &str) -> Result<CoreRequest, TransportResponse> {
    serde_json::from_str::<CoreRequest>(payload).map_err(|error| TransportResponse::Err {
        error: ErrorResponse {
            code: ErrorCode::InvalidJson,
            message: error.to_string(),
        },
    })
}

pub fn encode(response: &TransportResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|error| {
        log::error!("failed to encode transport response: {error}");
        r#"{"status":"err","error":{"code":"invalid_request","message":"unencodable response"}}"#
            .to_string()
    })
}

fn map_engine_error(error: EngineError) -> ErrorResponse {
    let message = error.to_string();
    let code = match error {
        EngineError::Query(_) | EngineError::InvalidRequest(_) => ErrorCode::InvalidRequest,
        EngineError::NotFound(_) => ErrorCode::NotFound,
        EngineError::Launch(_) => ErrorCode::Launch,
        EngineError::Config(_) => ErrorCode::Config,
    };
    ErrorResponse { code, message }
}
