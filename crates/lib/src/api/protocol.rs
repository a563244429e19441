//! Wizard backend wire types (sessions, chat, history, export).

use serde::{Deserialize, Serialize};

use crate::transcript::Turn;

/// Body of `POST /sessions/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub raw_text: Option<String>,
}

/// Response of `POST /sessions/`: `{ run_id, state, messages?, current_step? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub run_id: String,
    #[serde(default)]
    pub state: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Turn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
}

/// Body of `POST /chat/{run_id}/message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response of `POST /chat/{run_id}/message` and `GET /chat/{run_id}/history`.
///
/// `messages` is the full transcript. A missing `current_step` deserializes as an empty
/// (unrecognized) step rather than failing the whole turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub run_id: String,
    #[serde(default)]
    pub messages: Vec<Turn>,
    #[serde(default)]
    pub current_step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(default)]
    pub state: serde_json::Value,
    /// Open record; see [`crate::snapshot::UiData`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_data: Option<serde_json::Value>,
}

/// Response of `GET /export/{run_id}/scope-details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeDetailsExport {
    pub run_id: String,
    #[serde(default)]
    pub scope_details: serde_json::Value,
    #[serde(default)]
    pub total_scopes: usize,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Role;

    #[test]
    fn create_session_without_optional_fields() {
        let r: CreateSessionResponse =
            serde_json::from_str(r#"{"run_id":"run-1","state":{}}"#).unwrap();
        assert_eq!(r.run_id, "run-1");
        assert!(r.messages.is_none());
        assert!(r.current_step.is_none());
    }

    #[test]
    fn chat_response_tolerates_missing_ui_data_and_step() {
        let r: ChatResponse = serde_json::from_str(
            r#"{"run_id":"run-1","messages":[{"role":"user","content":"hi","timestamp":"2024-05-01T09:30:00"}],"state":{}}"#,
        )
        .unwrap();
        assert_eq!(r.messages.len(), 1);
        assert_eq!(r.messages[0].role, Role::User);
        assert_eq!(r.current_step, "");
        assert!(r.ui_data.is_none());
    }

    #[test]
    fn chat_response_with_null_ui_data() {
        let r: ChatResponse = serde_json::from_str(
            r#"{"run_id":"run-1","messages":[],"current_step":"networks","next_step":"networks","state":{},"ui_data":null}"#,
        )
        .unwrap();
        assert_eq!(r.current_step, "networks");
        assert!(r.ui_data.is_none());
    }

    #[test]
    fn create_session_request_sends_null_raw_text() {
        let body = serde_json::to_value(CreateSessionRequest::default()).unwrap();
        assert_eq!(body, serde_json::json!({ "raw_text": null }));
    }
}
