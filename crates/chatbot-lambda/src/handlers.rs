// Request handlers for the chat endpoint
//
// OPTIONS answers the CORS preflight, POST runs one chat turn, anything
// else is 405. Every response body is JSON.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chatbot_core::{ChatError, ChatMessage, ChatRequest, Conversation, ModelFamily};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::{HttpResponseData, LambdaState};

pub(crate) async fn handle_http_request(
    method: &str,
    body: Option<&str>,
    is_base64_encoded: bool,
    state: &LambdaState,
) -> HttpResponseData {
    match method {
        "OPTIONS" => {
            HttpResponseData::json(200, &json!({"message": "CORS preflight successful"}))
        }
        "POST" => handle_chat(body, is_base64_encoded, state).await,
        _ => HttpResponseData::json(
            405,
            &json!({
                "error": "Method not allowed. Use POST method.",
                "allowed_methods": ["POST", "OPTIONS"],
            }),
        ),
    }
}

async fn handle_chat(
    body: Option<&str>,
    is_base64_encoded: bool,
    state: &LambdaState,
) -> HttpResponseData {
    let result = match decode_body(body, is_base64_encoded) {
        Ok(body) => chat(&body, state).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(body) => HttpResponseData::json(200, &body),
        Err(err) => {
            if err.status_code() >= 500 {
                error!(error = %err, status = err.status_label(), "Chat request failed");
            } else {
                info!(error = %err, "Rejected chat request");
            }
            HttpResponseData::json(err.status_code(), &err.to_body())
        }
    }
}

fn decode_body(body: Option<&str>, is_base64_encoded: bool) -> Result<String, ChatError> {
    let Some(body) = body else {
        return Ok(String::new());
    };
    if !is_base64_encoded {
        return Ok(body.to_string());
    }
    let bytes = STANDARD
        .decode(body.as_bytes())
        .map_err(|_| ChatError::InvalidJson)?;
    String::from_utf8(bytes).map_err(|_| ChatError::InvalidJson)
}

async fn chat(body: &str, state: &LambdaState) -> Result<Value, ChatError> {
    let request = ChatRequest::from_json(body, &state.request_defaults())?;
    let family = ModelFamily::detect(&request.model_id)?;

    let store = match (&request.session_id, &state.store) {
        (Some(session_id), Some(store)) => Some((session_id.as_str(), store)),
        _ => None,
    };

    let mut messages = match store {
        Some((session_id, store)) => store.load(session_id).await.unwrap_or_else(|err| {
            warn!(session_id, error = %format!("{:#}", err), "Could not load history, continuing without it");
            Vec::new()
        }),
        None => Vec::new(),
    };
    messages.push(ChatMessage::user(request.message.as_str()));

    let payload = family.request_body(&messages, request.max_tokens, request.temperature);
    let started = Instant::now();
    let raw = state
        .model
        .invoke(&request.model_id, payload.to_string().into_bytes())
        .await?;
    let reply = family.extract_text(&raw)?;
    let processing_time = round_secs(started.elapsed().as_secs_f64());

    info!(
        model_id = %request.model_id,
        history = messages.len() - 1,
        processing_time,
        "Model replied"
    );

    if let Some((session_id, store)) = store {
        messages.push(ChatMessage::assistant(reply.as_str()));
        let conversation = Conversation::new(
            session_id,
            messages,
            state.config.history_limit,
            chrono::Utc::now().timestamp(),
            state.config.history_ttl_secs,
        );
        if let Err(err) = store.save(&conversation).await {
            warn!(session_id, error = %format!("{:#}", err), "Could not save history");
        }
    }

    Ok(json!({
        "response": reply,
        "session_id": request.session_id,
        "model_used": request.model_id,
        "processing_time": processing_time,
        "region": state.config.bedrock_region,
        "status": "success",
    }))
}

/// Seconds rounded to two decimals
fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}
