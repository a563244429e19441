//! Turn orchestrator: owns the session tuple (run id, transcript, step, snapshot) together
//! with the input buffer, loading flags and error banner, and mediates every backend call.
//!
//! Calls are spawned on a tokio runtime; their results come back as completions over a
//! channel and are applied on the owning thread by [`Orchestrator::poll`] (frame-driven
//! front ends) or [`Orchestrator::next_completion`] (async front ends). At most one chat
//! turn is in flight at a time; a submit while one is pending is dropped. Completions
//! issued before a restart carry an older generation and are discarded.

use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::api::{ApiError, ChatResponse, CreateSessionResponse, Transport};
use crate::render::{self, RenderPlan};
use crate::snapshot::UiData;
use crate::step::CurrentStep;
use crate::transcript::{Transcript, Turn};

pub const WELCOME_MESSAGE: &str = "안녕하세요! 구성도 생성 도구입니다.\n\n어떤 법인의 구성도를 만들어드릴까요?\n법인명과 센터 정보를 알려주세요.\n\n예시: \"법인은 은행이고 AWS, 의왕으로 구성되어있습니다\"";

/// Banner text when a session cannot be created or resumed.
pub const INIT_FAILED_MESSAGE: &str = "세션 초기화에 실패했습니다.";

/// Assistant turn appended when a chat request fails.
pub const TURN_FAILED_MESSAGE: &str =
    "죄송합니다. 메시지 처리 중 오류가 발생했습니다. 다시 시도해주세요.";

/// Hint shown under the input: the backend treats "다시" as "go back one step".
pub const GO_BACK_HINT: &str = "언제든지 \"다시\"라고 입력하면 이전 단계로 돌아갈 수 있습니다";

/// Result of applying one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    SessionReady,
    SessionFailed,
    TurnCompleted,
    TurnFailed,
    /// Completion from before a restart; ignored.
    Stale,
}

/// A session as adopted from either create or history.
struct SessionStart {
    run_id: String,
    messages: Vec<Turn>,
    current_step: Option<String>,
    ui_data: Option<serde_json::Value>,
}

impl From<CreateSessionResponse> for SessionStart {
    fn from(r: CreateSessionResponse) -> Self {
        Self {
            run_id: r.run_id,
            messages: r.messages.unwrap_or_default(),
            current_step: r.current_step,
            ui_data: None,
        }
    }
}

impl From<ChatResponse> for SessionStart {
    fn from(r: ChatResponse) -> Self {
        Self {
            run_id: r.run_id,
            messages: r.messages,
            current_step: Some(r.current_step),
            ui_data: r.ui_data,
        }
    }
}

enum Outcome {
    Session(Result<SessionStart, ApiError>),
    Turn(Result<ChatResponse, ApiError>),
}

struct Completion {
    generation: u64,
    outcome: Outcome,
}

pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    runtime: Handle,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    /// Bumped by restart; completions tagged with an older value are dropped.
    generation: u64,
    session: Option<String>,
    transcript: Transcript,
    step: CurrentStep,
    snapshot: UiData,
    input: String,
    /// Session create/resume pending.
    initializing: bool,
    /// Chat turn pending (the in-flight guard).
    in_flight: bool,
    /// Initialization error banner.
    error: Option<String>,
    welcome: String,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            runtime,
            completions_tx,
            completions_rx,
            generation: 0,
            session: None,
            transcript: Transcript::new(),
            step: CurrentStep::default(),
            snapshot: UiData::default(),
            input: String::new(),
            initializing: false,
            in_flight: false,
            error: None,
            welcome: WELCOME_MESSAGE.to_string(),
        }
    }

    /// Override the welcome turn synthesized when a new session has no messages.
    pub fn with_welcome_message(mut self, text: impl Into<String>) -> Self {
        self.welcome = text.into();
        self
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn current_step(&self) -> &CurrentStep {
        &self.step
    }

    pub fn snapshot(&self) -> &UiData {
        &self.snapshot
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// True while a chat turn is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// True while a session create/resume is pending.
    pub fn is_initializing(&self) -> bool {
        self.initializing
    }

    /// True when any backend call is outstanding.
    pub fn is_pending(&self) -> bool {
        self.in_flight || self.initializing
    }

    /// Initialization error banner, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Whether `submit` would dispatch a turn right now.
    pub fn can_submit(&self) -> bool {
        self.session.is_some() && !self.in_flight && !self.input.trim().is_empty()
    }

    /// Render plan for the current step and snapshot.
    pub fn plan(&self) -> RenderPlan {
        render::plan(&self.step, &self.snapshot)
    }

    /// Create a new session. No-op while one is pending or already active (use `restart`
    /// to replace an active session). Calling again after a failure is the retry.
    pub fn initialize(&mut self) {
        if !self.begin_session() {
            return;
        }
        let transport = Arc::clone(&self.transport);
        self.dispatch(async move {
            Outcome::Session(
                transport
                    .create_session(None)
                    .await
                    .map(SessionStart::from),
            )
        });
    }

    /// Adopt an existing run by fetching its history. Same guards and failure banner as
    /// `initialize`.
    pub fn resume(&mut self, run_id: impl Into<String>) {
        if !self.begin_session() {
            return;
        }
        let run_id = run_id.into();
        let transport = Arc::clone(&self.transport);
        self.dispatch(async move {
            Outcome::Session(
                transport
                    .get_chat_history(&run_id)
                    .await
                    .map(SessionStart::from),
            )
        });
    }

    fn begin_session(&mut self) -> bool {
        if self.initializing {
            log::debug!("session request already pending");
            return false;
        }
        if self.session.is_some() {
            log::debug!("session already active; restart to replace it");
            return false;
        }
        self.initializing = true;
        self.error = None;
        true
    }

    /// Send the input buffer as one chat turn. Returns false (and leaves the buffer alone)
    /// when the text is blank, no session exists, or a turn is already in flight.
    pub fn submit(&mut self) -> bool {
        if self.input.trim().is_empty() {
            return false;
        }
        let Some(run_id) = self.session.clone() else {
            log::debug!("submit ignored: no session");
            return false;
        };
        if self.in_flight {
            log::debug!("submit ignored: turn already in flight");
            return false;
        }
        let message = std::mem::take(&mut self.input);
        self.in_flight = true;
        let transport = Arc::clone(&self.transport);
        self.dispatch(async move { Outcome::Turn(transport.send_message(&run_id, &message).await) });
        true
    }

    /// Discard session, transcript, step, snapshot and error, drop anything still in flight,
    /// then initialize a new session.
    pub fn restart(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.session = None;
        self.transcript.clear();
        self.step = CurrentStep::default();
        self.snapshot = UiData::default();
        self.in_flight = false;
        self.initializing = false;
        self.error = None;
        log::info!("restarting wizard session");
        self.initialize();
    }

    /// Apply every completion that has already arrived. Call once per frame.
    pub fn poll(&mut self) -> Vec<Applied> {
        let mut applied = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            applied.push(self.apply(completion));
        }
        applied
    }

    /// Wait for the next completion and apply it.
    pub async fn next_completion(&mut self) -> Option<Applied> {
        let completion = self.completions_rx.recv().await?;
        Some(self.apply(completion))
    }

    fn dispatch<F>(&self, fut: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let tx = self.completions_tx.clone();
        let generation = self.generation;
        self.runtime.spawn(async move {
            let outcome = fut.await;
            if tx.send(Completion { generation, outcome }).is_err() {
                log::debug!("orchestrator dropped before completion arrived");
            }
        });
    }

    fn apply(&mut self, completion: Completion) -> Applied {
        if completion.generation != self.generation {
            log::debug!("dropping completion from a discarded session");
            return Applied::Stale;
        }
        match completion.outcome {
            Outcome::Session(Ok(start)) if !start.run_id.trim().is_empty() => {
                self.adopt(start);
                Applied::SessionReady
            }
            Outcome::Session(result) => {
                self.initializing = false;
                match result {
                    Err(e) => log::warn!("session initialization failed: {}", e),
                    Ok(_) => log::warn!("session initialization failed: empty run_id"),
                }
                self.error = Some(INIT_FAILED_MESSAGE.to_string());
                Applied::SessionFailed
            }
            Outcome::Turn(Ok(res)) => {
                self.in_flight = false;
                log::debug!(
                    "turn applied: {} messages, step {:?}",
                    res.messages.len(),
                    res.current_step
                );
                self.transcript.replace(res.messages);
                self.step = CurrentStep::from_server(res.current_step);
                self.snapshot = UiData::from_value(res.ui_data);
                Applied::TurnCompleted
            }
            Outcome::Turn(Err(e)) => {
                self.in_flight = false;
                log::warn!("chat turn failed: {}", e);
                self.transcript.push(Turn::assistant_now(TURN_FAILED_MESSAGE));
                Applied::TurnFailed
            }
        }
    }

    fn adopt(&mut self, start: SessionStart) {
        log::info!("wizard session ready: {}", start.run_id);
        self.initializing = false;
        self.error = None;
        self.step = start
            .current_step
            .filter(|s| !s.trim().is_empty())
            .map(CurrentStep::from_server)
            .unwrap_or_default();
        let turns = if start.messages.is_empty() {
            vec![Turn::assistant_now(self.welcome.clone())]
        } else {
            start.messages
        };
        self.transcript.replace(turns);
        self.snapshot = UiData::from_value(start.ui_data);
        self.session = Some(start.run_id);
    }
}
