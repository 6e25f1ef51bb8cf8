//! Run Conversation use case.
//!
//! [`ConversationOrchestrator`] owns one session: the message log, the state
//! machine and the tool loop.
//!
//! ```text
//! user input ─▶ completion ─┬─ Stop ──────────────▶ back to user
//!                           ├─ tool calls ─▶ dispatch (bounded pool) ─▶ completion
//!                           └─ other finish ─▶ warning, back to user
//! ```
//!
//! All calls from one model turn run concurrently, at most
//! `max_parallel_tools` at a time. Results are appended in completion order
//! and every outcome (error, unknown tool, bad arguments, panic) becomes a
//! tool message, so a single tool can never take the session down.

use crate::config::ExecutionParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::progress::ConversationProgress;
use crate::ports::reminder_source::{NoReminders, ReminderSource};
use crate::ports::tool_executor::{RegistryError, ToolExecutorPort};
use crate::ports::tool_schema::ToolSchemaPort;
use futures::FutureExt;
use klaude_domain::core::string::preview;
use klaude_domain::{
    Conversation, DomainError, FinishReason, LlmResponse, OrchestratorState, ToolCall,
    ToolError, ToolInvocationRequest, ToolResult,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that end a turn early.
///
/// Tool failures never show up here; they are tool messages.
#[derive(Error, Debug)]
pub enum RunConversationError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Conversation error: {0}")]
    Domain(#[from] DomainError),

    #[error("Session has ended")]
    SessionEnded,

    #[error("Operation cancelled")]
    Cancelled,
}

/// Why the tool loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStop {
    /// The model signalled a normal stop
    Completed,
    /// The model stopped for a reason the loop does not handle
    UnexpectedFinish(FinishReason),
    /// `max_tool_turns` rounds were dispatched without a final answer
    TurnLimit,
}

/// Result of one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Text of the final assistant message, if it had any
    pub final_text: Option<String>,
    /// Tool-dispatch rounds performed
    pub tool_turns: usize,
    pub stop: TurnStop,
}

/// Stateful driver of one conversation session.
pub struct ConversationOrchestrator {
    gateway: Arc<dyn LlmGateway>,
    tool_executor: Arc<dyn ToolExecutorPort>,
    tool_schema: Arc<dyn ToolSchemaPort>,
    conversation_logger: Arc<dyn ConversationLogger>,
    reminders: Arc<dyn ReminderSource>,
    params: ExecutionParams,
    conversation: Conversation,
    state: OrchestratorState,
    cancellation_token: Option<CancellationToken>,
}

impl ConversationOrchestrator {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tool_executor: Arc<dyn ToolExecutorPort>,
        tool_schema: Arc<dyn ToolSchemaPort>,
        params: ExecutionParams,
    ) -> Self {
        Self {
            gateway,
            tool_executor,
            tool_schema,
            conversation_logger: Arc::new(NoConversationLogger),
            reminders: Arc::new(NoReminders),
            params,
            conversation: Conversation::new(),
            state: OrchestratorState::default(),
            cancellation_token: None,
        }
    }

    /// Start the session with a system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.conversation = Conversation::with_system(prompt);
        self
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Attach a source of `<system-reminder>` annotations for user messages.
    pub fn with_reminder_source(mut self, reminders: Arc<dyn ReminderSource>) -> Self {
        self.reminders = reminders;
        self
    }

    /// Token checked before every completion request.
    ///
    /// Running tools are never interrupted; cancellation takes effect once the
    /// current round's results are in.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        self.cancellation_token = Some(token);
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn model_name(&self) -> &str {
        self.gateway.model_name()
    }

    /// End the session and drop the message log.
    pub fn end_session(&mut self) {
        if !self.state.is_terminal() {
            info!("Ending session after {} messages", self.conversation.len());
        }
        self.state = OrchestratorState::SessionEnded;
        self.conversation.clear();
    }

    /// Handle one user message: run the completion/tool loop until the model
    /// stops, signals something unexpected, or the turn limit is reached.
    pub async fn run_turn(
        &mut self,
        input: &str,
        progress: &dyn ConversationProgress,
    ) -> Result<TurnOutcome, RunConversationError> {
        if self.state.is_terminal() {
            return Err(RunConversationError::SessionEnded);
        }

        info!("Starting turn: {}", preview(input, 100));
        let reminders = self.reminders.take_reminders();
        self.conversation_logger.log(ConversationEvent::new(
            "user_message",
            serde_json::json!({
                "text": input,
                "reminders": reminders.len(),
            }),
        ));
        self.conversation.push_user(input, reminders)?;

        let result = self.tool_loop(progress).await;
        if !self.state.is_terminal() {
            self.state = OrchestratorState::AwaitingUserInput;
        }
        result
    }

    async fn tool_loop(
        &mut self,
        progress: &dyn ConversationProgress,
    ) -> Result<TurnOutcome, RunConversationError> {
        let tools = self
            .tool_schema
            .all_tools_schema(&self.tool_executor.definitions());
        debug!(
            "Using model {}, {} tools available",
            self.gateway.model_name(),
            tools.len()
        );

        let mut tool_turns = 0;
        loop {
            self.check_cancelled()?;
            self.state.transition(OrchestratorState::AwaitingCompletion)?;

            progress.on_completion_start();
            let response = self
                .gateway
                .complete(self.conversation.messages(), &tools)
                .await;
            progress.on_completion_end();
            let response = response?;

            self.log_response(&response);
            let text = response.text_content();
            if !text.is_empty() {
                progress.on_assistant_text(text);
            }

            let LlmResponse {
                content,
                tool_calls,
                finish_reason,
                ..
            } = response;
            let final_text = content.clone().filter(|c| !c.is_empty());
            self.conversation
                .push_assistant(content, tool_calls.clone())?;

            if tool_calls.is_empty() {
                let stop = match finish_reason {
                    FinishReason::Stop => TurnStop::Completed,
                    other => {
                        let message = format!(
                            "Model stopped unexpectedly (finish reason: {}); ending this turn",
                            other
                        );
                        self.warn(progress, &message);
                        TurnStop::UnexpectedFinish(other)
                    }
                };
                info!("Turn completed after {} tool turns", tool_turns);
                return Ok(TurnOutcome {
                    final_text,
                    tool_turns,
                    stop,
                });
            }

            self.state.transition(OrchestratorState::DispatchingTools)?;
            tool_turns += 1;
            self.dispatch_tools(tool_calls, progress).await?;

            if tool_turns >= self.params.max_tool_turns {
                let message = format!(
                    "Reached the tool turn limit ({}); stopping before the model finished",
                    self.params.max_tool_turns
                );
                self.warn(progress, &message);
                return Ok(TurnOutcome {
                    final_text,
                    tool_turns,
                    stop: TurnStop::TurnLimit,
                });
            }
        }
    }

    /// Run every requested call on the bounded pool and append one tool
    /// message per call id, in completion order.
    async fn dispatch_tools(
        &mut self,
        requests: Vec<ToolInvocationRequest>,
        progress: &dyn ConversationProgress,
    ) -> Result<(), RunConversationError> {
        debug!(
            "Dispatching {} tool calls (pool size {})",
            requests.len(),
            self.params.max_parallel_tools
        );

        let semaphore = Arc::new(Semaphore::new(self.params.max_parallel_tools.max(1)));
        let mut join_set = JoinSet::new();

        for request in requests {
            progress.on_tool_call(&request);
            self.conversation_logger.log(ConversationEvent::new(
                "tool_call",
                serde_json::json!({
                    "call_id": request.call_id,
                    "tool": request.tool_name,
                    "arguments": request.arguments,
                }),
            ));

            let call = match ToolCall::from_raw(
                request.call_id.as_str(),
                request.tool_name.as_str(),
                &request.arguments,
            ) {
                Ok(call) => call,
                Err(error) => {
                    warn!(tool = %request.tool_name, call_id = %request.call_id, "Malformed tool arguments");
                    let result = ToolResult::failure(request.call_id, request.tool_name, error);
                    self.record_result(result, progress)?;
                    continue;
                }
            };

            let executor = Arc::clone(&self.tool_executor);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                // The semaphore is never closed, so a failed acquire cannot happen.
                let _permit = semaphore.acquire_owned().await.ok();
                let started = Instant::now();
                let outcome = AssertUnwindSafe(executor.execute_tool(&call))
                    .catch_unwind()
                    .await;
                let elapsed = started.elapsed().as_millis() as u64;
                normalize_outcome(request, outcome).with_duration_ms(elapsed)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => self.record_result(result, progress)?,
                Err(e) => warn!("Tool task did not complete: {}", e),
            }
        }

        // Anything still pending lost its task; answer it so the log stays valid.
        for call_id in self.conversation.pending_call_ids().to_vec() {
            let error = ToolError::execution_failed("Error: Tool execution was aborted");
            self.record_result(ToolResult::failure(call_id, "unknown", error), progress)?;
        }
        Ok(())
    }

    fn record_result(
        &mut self,
        result: ToolResult,
        progress: &dyn ConversationProgress,
    ) -> Result<(), RunConversationError> {
        debug!(
            tool = %result.tool_name,
            call_id = %result.call_id,
            success = result.is_success(),
            "Tool finished"
        );
        progress.on_tool_result(&result);
        self.conversation_logger.log(ConversationEvent::new(
            "tool_result",
            serde_json::json!({
                "call_id": result.call_id,
                "tool": result.tool_name,
                "success": result.is_success(),
                "duration_ms": result.metadata.duration_ms,
                "bytes": result.content().len(),
                "content": result.content(),
            }),
        ));
        self.conversation.push_tool_result(
            result.call_id.as_str(),
            result.content(),
            !result.is_success(),
        )?;
        Ok(())
    }

    fn log_response(&self, response: &LlmResponse) {
        self.conversation_logger.log(ConversationEvent::new(
            "llm_response",
            serde_json::json!({
                "model": response.model.as_deref().unwrap_or(self.gateway.model_name()),
                "finish_reason": response.finish_reason.as_str(),
                "text": response.text_content(),
                "tool_calls": response.tool_calls.len(),
            }),
        ));
    }

    fn warn(&self, progress: &dyn ConversationProgress, message: &str) {
        warn!("{}", message);
        progress.on_warning(message);
        self.conversation_logger.log(ConversationEvent::new(
            "warning",
            serde_json::json!({ "message": message }),
        ));
    }

    fn check_cancelled(&self) -> Result<(), RunConversationError> {
        if let Some(token) = &self.cancellation_token
            && token.is_cancelled()
        {
            return Err(RunConversationError::Cancelled);
        }
        Ok(())
    }
}

/// Turn an executor outcome (or a panic) into a tool result.
fn normalize_outcome(
    request: ToolInvocationRequest,
    outcome: Result<Result<String, RegistryError>, Box<dyn Any + Send>>,
) -> ToolResult {
    let ToolInvocationRequest {
        call_id, tool_name, ..
    } = request;
    match outcome {
        Ok(Ok(output)) => ToolResult::success(call_id, tool_name, output),
        Ok(Err(RegistryError::UnknownTool(name))) => {
            warn!(tool = %name, call_id = %call_id, "Model requested an unregistered tool");
            let error = ToolError::not_found(format!("Error: Tool '{}' not found", name));
            ToolResult::failure(call_id, tool_name, error)
        }
        Ok(Err(RegistryError::Tool(error))) => ToolResult::failure(call_id, tool_name, error),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(tool = %tool_name, call_id = %call_id, "Tool panicked: {}", message);
            let error = ToolError::execution_failed(format!(
                "Error: Tool '{}' failed unexpectedly: {}",
                tool_name, message
            ));
            ToolResult::failure(call_id, tool_name, error)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoProgress;
    use async_trait::async_trait;
    use klaude_domain::{Message, ToolDefinition, ToolParameter};
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // ==================== Test Mocks ====================

    struct MockGateway {
        responses: Mutex<VecDeque<LlmResponse>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl MockGateway {
        fn new(responses: Vec<LlmResponse>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from(responses)),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn last_request(&self) -> Vec<Message> {
            self.seen.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmGateway for MockGateway {
        fn model_name(&self) -> &str {
            "mock-model"
        }

        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[Value],
        ) -> Result<LlmResponse, GatewayError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| GatewayError::Other("No more responses".to_string()))
        }
    }

    /// Tools: `echo` (returns `text`), `sleep` (waits `ms`, tracks overlap),
    /// `fail` (tool error), `boom` (panics).
    struct MockExecutor {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MockExecutor {
        fn new() -> Self {
            Self {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ToolExecutorPort for MockExecutor {
        fn definitions(&self) -> Vec<ToolDefinition> {
            ["echo", "sleep", "fail", "boom"]
                .into_iter()
                .map(|name| {
                    ToolDefinition::new(name, "mock")
                        .with_parameter(ToolParameter::new("text", "text", false))
                })
                .collect()
        }

        async fn execute_tool(&self, call: &ToolCall) -> Result<String, RegistryError> {
            match call.tool_name.as_str() {
                "echo" => Ok(call.get_string("text").unwrap_or_default().to_string()),
                "sleep" => {
                    let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                    self.peak.fetch_max(now, Ordering::SeqCst);
                    let ms = call.get_i64("ms").unwrap_or(10) as u64;
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    self.active.fetch_sub(1, Ordering::SeqCst);
                    Ok(format!("slept {}", ms))
                }
                "fail" => Err(ToolError::invalid_argument("Error: bad input").into()),
                "boom" => panic!("tool exploded"),
                other => Err(RegistryError::UnknownTool(other.to_string())),
            }
        }
    }

    struct PassthroughSchema;

    impl ToolSchemaPort for PassthroughSchema {
        fn tool_to_schema(&self, tool: &ToolDefinition) -> Value {
            serde_json::json!({ "name": tool.name })
        }
    }

    struct RecordingLogger {
        events: Mutex<Vec<&'static str>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push(event.event_type);
        }
    }

    struct RecordingProgress {
        warnings: Mutex<Vec<String>>,
        results: Mutex<Vec<String>>,
    }

    impl RecordingProgress {
        fn new() -> Self {
            Self {
                warnings: Mutex::new(Vec::new()),
                results: Mutex::new(Vec::new()),
            }
        }
    }

    impl ConversationProgress for RecordingProgress {
        fn on_tool_result(&self, result: &ToolResult) {
            self.results.lock().unwrap().push(result.call_id.clone());
        }

        fn on_warning(&self, message: &str) {
            self.warnings.lock().unwrap().push(message.to_string());
        }
    }

    struct OnceReminder(Mutex<Option<String>>);

    impl ReminderSource for OnceReminder {
        fn take_reminders(&self) -> Vec<String> {
            self.0.lock().unwrap().take().into_iter().collect()
        }
    }

    fn call(id: &str, tool: &str, args: &str) -> ToolInvocationRequest {
        ToolInvocationRequest::new(id, tool, args)
    }

    fn tool_turn(calls: Vec<ToolInvocationRequest>) -> LlmResponse {
        LlmResponse::with_tool_calls(calls)
    }

    fn orchestrator(
        gateway: Arc<MockGateway>,
        executor: Arc<MockExecutor>,
    ) -> ConversationOrchestrator {
        ConversationOrchestrator::new(
            gateway,
            executor,
            Arc::new(PassthroughSchema),
            ExecutionParams::default(),
        )
        .with_system_prompt("You are a test.")
    }

    fn tool_messages(orch: &ConversationOrchestrator) -> Vec<(String, String, bool)> {
        orch.conversation()
            .messages()
            .iter()
            .filter_map(|m| match m {
                Message::Tool {
                    call_id,
                    content,
                    is_error,
                } => Some((call_id.clone(), content.clone(), *is_error)),
                _ => None,
            })
            .collect()
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_plain_answer_returns_to_user_input() {
        let gateway = Arc::new(MockGateway::new(vec![LlmResponse::from_text("Hello!")]));
        let mut orch = orchestrator(gateway.clone(), Arc::new(MockExecutor::new()));

        let outcome = orch.run_turn("hi", &NoProgress).await.unwrap();

        assert_eq!(outcome.final_text.as_deref(), Some("Hello!"));
        assert_eq!(outcome.stop, TurnStop::Completed);
        assert_eq!(outcome.tool_turns, 0);
        assert_eq!(orch.state(), OrchestratorState::AwaitingUserInput);
        assert_eq!(orch.conversation().len(), 3);
        assert_eq!(gateway.requests(), 1);
    }

    #[tokio::test]
    async fn test_tool_round_then_answer() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_turn(vec![call("c1", "echo", r#"{"text":"pong"}"#)]),
            LlmResponse::from_text("done"),
        ]));
        let mut orch = orchestrator(gateway.clone(), Arc::new(MockExecutor::new()));

        let outcome = orch.run_turn("ping", &NoProgress).await.unwrap();

        assert_eq!(outcome.tool_turns, 1);
        assert_eq!(outcome.final_text.as_deref(), Some("done"));
        assert_eq!(
            tool_messages(&orch),
            vec![("c1".to_string(), "pong".to_string(), false)]
        );
        // The second request saw the tool result.
        assert!(matches!(
            gateway.last_request().last(),
            Some(Message::Tool { call_id, .. }) if call_id == "c1"
        ));
    }

    #[tokio::test]
    async fn test_results_appended_in_completion_order() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_turn(vec![
                call("slow", "sleep", r#"{"ms":150}"#),
                call("fast", "echo", r#"{"text":"quick"}"#),
            ]),
            LlmResponse::from_text("ok"),
        ]));
        let mut orch = orchestrator(gateway, Arc::new(MockExecutor::new()));

        orch.run_turn("go", &NoProgress).await.unwrap();

        let ids: Vec<String> = tool_messages(&orch).into_iter().map(|t| t.0).collect();
        assert_eq!(ids, vec!["fast".to_string(), "slow".to_string()]);
    }

    #[tokio::test]
    async fn test_pool_bounds_concurrency() {
        let calls = (0..6)
            .map(|i| call(&format!("c{}", i), "sleep", r#"{"ms":30}"#))
            .collect();
        let gateway = Arc::new(MockGateway::new(vec![
            tool_turn(calls),
            LlmResponse::from_text("ok"),
        ]));
        let executor = Arc::new(MockExecutor::new());
        let mut orch = ConversationOrchestrator::new(
            gateway,
            executor.clone(),
            Arc::new(PassthroughSchema),
            ExecutionParams::default().with_max_parallel_tools(2),
        );

        orch.run_turn("go", &NoProgress).await.unwrap();

        assert_eq!(tool_messages(&orch).len(), 6);
        assert_eq!(executor.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_become_error_messages() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_turn(vec![
                call("bad-json", "echo", "{not json"),
                call("missing", "NoSuchTool", "{}"),
                call("err", "fail", "{}"),
                call("panic", "boom", "{}"),
                call("good", "echo", r#"{"text":"fine"}"#),
            ]),
            LlmResponse::from_text("recovered"),
        ]));
        let mut orch = orchestrator(gateway, Arc::new(MockExecutor::new()));

        let outcome = orch.run_turn("go", &NoProgress).await.unwrap();
        assert_eq!(outcome.final_text.as_deref(), Some("recovered"));

        let messages = tool_messages(&orch);
        assert_eq!(messages.len(), 5);
        let by_id = |id: &str| messages.iter().find(|m| m.0 == id).cloned().unwrap();

        let (_, content, is_error) = by_id("bad-json");
        assert!(is_error);
        assert!(content.starts_with("Error: Invalid JSON arguments for tool 'echo'"));

        let (_, content, is_error) = by_id("missing");
        assert!(is_error);
        assert_eq!(content, "Error: Tool 'NoSuchTool' not found");

        assert_eq!(by_id("err").1, "Error: bad input");

        let (_, content, is_error) = by_id("panic");
        assert!(is_error);
        assert!(content.contains("tool exploded"));

        assert_eq!(by_id("good"), ("good".to_string(), "fine".to_string(), false));
    }

    #[tokio::test]
    async fn test_unexpected_finish_reason_warns_and_stops() {
        let mut truncated = LlmResponse::from_text("partial");
        truncated.finish_reason = FinishReason::Length;
        let gateway = Arc::new(MockGateway::new(vec![truncated]));
        let mut orch = orchestrator(gateway.clone(), Arc::new(MockExecutor::new()));
        let progress = RecordingProgress::new();

        let outcome = orch.run_turn("hi", &progress).await.unwrap();

        assert_eq!(outcome.stop, TurnStop::UnexpectedFinish(FinishReason::Length));
        assert_eq!(progress.warnings.lock().unwrap().len(), 1);
        assert_eq!(orch.state(), OrchestratorState::AwaitingUserInput);
        assert_eq!(gateway.requests(), 1);
    }

    #[tokio::test]
    async fn test_tool_turn_limit() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_turn(vec![call("a", "echo", "{}")]),
            tool_turn(vec![call("b", "echo", "{}")]),
            tool_turn(vec![call("c", "echo", "{}")]),
        ]));
        let mut orch = ConversationOrchestrator::new(
            gateway.clone(),
            Arc::new(MockExecutor::new()),
            Arc::new(PassthroughSchema),
            ExecutionParams::default().with_max_tool_turns(2),
        );
        let progress = RecordingProgress::new();

        let outcome = orch.run_turn("loop", &progress).await.unwrap();

        assert_eq!(outcome.stop, TurnStop::TurnLimit);
        assert_eq!(outcome.tool_turns, 2);
        assert_eq!(gateway.requests(), 2);
        assert!(orch.conversation().is_ready_for_completion());
        assert_eq!(progress.warnings.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_error_resets_state() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let mut orch = orchestrator(gateway, Arc::new(MockExecutor::new()));

        let err = orch.run_turn("hi", &NoProgress).await.unwrap_err();
        assert!(matches!(err, RunConversationError::Gateway(_)));
        assert_eq!(orch.state(), OrchestratorState::AwaitingUserInput);
    }

    #[tokio::test]
    async fn test_cancelled_before_completion() {
        let gateway = Arc::new(MockGateway::new(vec![LlmResponse::from_text("never")]));
        let mut orch = orchestrator(gateway.clone(), Arc::new(MockExecutor::new()));
        let token = CancellationToken::new();
        token.cancel();
        orch.set_cancellation_token(token);

        let err = orch.run_turn("hi", &NoProgress).await.unwrap_err();
        assert!(matches!(err, RunConversationError::Cancelled));
        assert_eq!(gateway.requests(), 0);
    }

    #[tokio::test]
    async fn test_reminders_attached_to_next_user_message() {
        let gateway = Arc::new(MockGateway::new(vec![
            LlmResponse::from_text("one"),
            LlmResponse::from_text("two"),
        ]));
        let mut orch = orchestrator(gateway, Arc::new(MockExecutor::new()))
            .with_reminder_source(Arc::new(OnceReminder(Mutex::new(Some(
                "todo changed".to_string(),
            )))));

        orch.run_turn("first", &NoProgress).await.unwrap();
        orch.run_turn("second", &NoProgress).await.unwrap();

        let reminders: Vec<usize> = orch
            .conversation()
            .messages()
            .iter()
            .filter_map(|m| match m {
                Message::User { reminders, .. } => Some(reminders.len()),
                _ => None,
            })
            .collect();
        assert_eq!(reminders, vec![1, 0]);
    }

    #[tokio::test]
    async fn test_transcript_events_logged() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_turn(vec![call("c1", "echo", r#"{"text":"x"}"#)]),
            LlmResponse::from_text("done"),
        ]));
        let logger = Arc::new(RecordingLogger {
            events: Mutex::new(Vec::new()),
        });
        let mut orch = orchestrator(gateway, Arc::new(MockExecutor::new()))
            .with_conversation_logger(logger.clone());

        orch.run_turn("go", &NoProgress).await.unwrap();

        assert_eq!(
            *logger.events.lock().unwrap(),
            vec![
                "user_message",
                "llm_response",
                "tool_call",
                "tool_result",
                "llm_response"
            ]
        );
    }

    #[tokio::test]
    async fn test_ended_session_rejects_input() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let mut orch = orchestrator(gateway, Arc::new(MockExecutor::new()));
        orch.end_session();

        assert_eq!(orch.state(), OrchestratorState::SessionEnded);
        assert!(orch.conversation().is_empty());
        let err = orch.run_turn("hi", &NoProgress).await.unwrap_err();
        assert!(matches!(err, RunConversationError::SessionEnded));
    }
}
