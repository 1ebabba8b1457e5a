//! Credential checking for WebSocket connections

use warp::http::HeaderMap;

use crate::auth::token::{extract_bearer_token, TokenManager};
use crate::error::{RelayError, Result};

/// Extract a bearer token from the WebSocket subprotocol header.
/// Browser WebSocket clients cannot set arbitrary headers, so the token may
/// ride in Sec-WebSocket-Protocol instead.
/// Format: "bearer.{token}" or "token.{token}"
pub fn extract_token_from_subprotocol(headers: &HeaderMap) -> Option<String> {
    if let Some(protocol_header) = headers.get("sec-websocket-protocol") {
        if let Ok(protocol_str) = protocol_header.to_str() {
            for protocol in protocol_str.split(',') {
                let protocol = protocol.trim();
                if let Some(token) = protocol.strip_prefix("bearer.") {
                    return Some(token.to_string());
                }
                if let Some(token) = protocol.strip_prefix("token.") {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

/// Token extraction: Authorization header first, subprotocol second
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = extract_bearer_token(auth_str) {
                return Some(token);
            }
        }
    }

    extract_token_from_subprotocol(headers)
}

/// Verify the connecting peer's credential, once, before the upgrade
/// completes. Returns the verified peer identity, or `None` when
/// verification is disabled. A missing or invalid credential rejects the
/// connection without it ever entering the receive loop.
pub fn authenticate_connection(
    headers: &HeaderMap,
    verifier: Option<&TokenManager>,
) -> Result<Option<String>> {
    let verifier = match verifier {
        Some(verifier) => verifier,
        None => return Ok(None),
    };

    let token = extract_token(headers).ok_or(RelayError::Unauthorized)?;
    let peer_id = verifier.verify(&token)?;
    Ok(Some(peer_id))
}
