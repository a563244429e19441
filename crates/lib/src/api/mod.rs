//! Transport client for the wizard backend.
//!
//! Three boundary operations drive a conversation (create session, send a chat turn,
//! fetch history) and are exposed through the [`Transport`] trait so the orchestrator can
//! run against the HTTP client or a test double. Export and health are HTTP-only extras.

mod client;
mod protocol;

pub use client::{ApiClient, ApiError, Transport, DEFAULT_BASE_URL};
pub use protocol::{
    ChatRequest, ChatResponse, CreateSessionRequest, CreateSessionResponse, HealthResponse,
    ScopeDetailsExport,
};
