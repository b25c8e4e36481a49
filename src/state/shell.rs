use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tracing::{info, warn};

use super::data::{GeneratedImage, RequestState};
use super::history::HistoryStore;
use crate::gemini::{GenerateError, ImageGenerator};

/// Prompt shown at startup and restored by "Reset Prompt"
pub const DEFAULT_PROMPT: &str = "A 64x64 pixel art sprite of a white Silkie chicken, side view, cute, fluffy texture like cotton, dark beak and face, light blue background, game asset style, crisp pixel edges.";

/// Message used when a failure carries no text of its own
const FALLBACK_ERROR: &str = "Failed to generate image";

/// Change notification emitted by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    StateChanged { from: RequestState, to: RequestState },
}

/// Result of one generation attempt, tagged with the prompt it was made for
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub prompt: String,
    pub result: Result<String, GenerateError>,
}

/// The single in-flight generation; the caller decides where to run it
pub type PendingGeneration = BoxFuture<'static, GenerationOutcome>;

/// Owns the prompt, the request lifecycle and the session history.
///
/// Only one generation may be pending at a time: `submit` refuses while a
/// request is outstanding, so there is nothing to cancel or de-duplicate.
pub struct Shell {
    generator: Arc<dyn ImageGenerator>,
    prompt: String,
    state: RequestState,
    error: Option<String>,
    history: HistoryStore,
    subscribers: Vec<Sender<ShellEvent>>,
}

impl Shell {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            generator,
            prompt: DEFAULT_PROMPT.to_string(),
            state: RequestState::Idle,
            error: None,
            history: HistoryStore::new(),
            subscribers: Vec::new(),
        }
    }

    /// Register for lifecycle notifications
    pub fn subscribe(&mut self) -> Receiver<ShellEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Restore the default prompt without touching state or history
    pub fn reset_prompt(&mut self) {
        self.prompt = DEFAULT_PROMPT.to_string();
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn is_pending(&self) -> bool {
        self.state == RequestState::Pending
    }

    pub fn can_submit(&self) -> bool {
        !self.is_pending() && !self.prompt.trim().is_empty()
    }

    /// Start a generation for the current prompt.
    ///
    /// Returns None, and changes nothing, when the prompt is blank or a
    /// request is already pending. Otherwise the shell moves to `Pending`
    /// and the returned future makes exactly one generator call.
    pub fn submit(&mut self) -> Option<PendingGeneration> {
        if !self.can_submit() {
            return None;
        }

        self.error = None;
        self.transition(RequestState::Pending);

        let prompt = self.prompt.clone();
        let generator = Arc::clone(&self.generator);
        info!("🔨 Generating sprite for prompt ({} chars)", prompt.chars().count());

        Some(
            async move {
                let result = generator.generate(&prompt).await;
                GenerationOutcome { prompt, result }
            }
            .boxed(),
        )
    }

    /// Apply the outcome of the pending generation
    pub fn finish(&mut self, outcome: GenerationOutcome) {
        if !self.is_pending() {
            warn!(
                "Ignoring generation outcome while {}",
                self.state.as_str()
            );
            return;
        }

        match outcome.result {
            Ok(image_data) => {
                self.history
                    .prepend(GeneratedImage::new(image_data, outcome.prompt));
                self.transition(RequestState::Succeeded);
            }
            Err(err) => {
                let message = err.to_string();
                self.error = Some(if message.trim().is_empty() {
                    FALLBACK_ERROR.to_string()
                } else {
                    message
                });
                self.transition(RequestState::Failed);
            }
        }
    }

    /// Remove a record in any state; unknown ids are ignored
    pub fn delete(&mut self, id: &str) {
        self.history.remove(id);
    }

    fn transition(&mut self, to: RequestState) {
        let from = self.state;
        self.state = to;
        info!("Request state: {} -> {}", from.as_str(), to.as_str());
        let event = ShellEvent::StateChanged { from, to };
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("state", &self.state)
            .field("error", &self.error)
            .field("history", &self.history)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every prompt it is called with and replies with a fixed result
    struct FakeGenerator {
        calls: Mutex<Vec<String>>,
        reply: Result<String, GenerateError>,
    }

    impl FakeGenerator {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Ok("data:image/png;base64,iVBORw0KGgo=".to_string()),
            })
        }

        fn failing(err: GenerateError) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Err(err),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
            self.calls.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    async fn run(shell: &mut Shell) {
        let pending = shell.submit().expect("submit should be accepted");
        let outcome = pending.await;
        shell.finish(outcome);
    }

    #[tokio::test]
    async fn test_success_prepends_exact_prompt() {
        let generator = FakeGenerator::ok();
        let mut shell = Shell::new(generator.clone());
        shell.set_prompt("  a tiny dragon\n");

        run(&mut shell).await;

        assert_eq!(shell.state(), RequestState::Succeeded);
        assert_eq!(shell.history().len(), 1);
        let record = shell.history().latest().unwrap();
        assert_eq!(record.prompt, "  a tiny dragon\n");
        assert_eq!(record.image_data, "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(generator.calls(), vec!["  a tiny dragon\n".to_string()]);
    }

    #[tokio::test]
    async fn test_each_success_adds_one_record_at_front() {
        let mut shell = Shell::new(FakeGenerator::ok());

        shell.set_prompt("first");
        run(&mut shell).await;
        shell.set_prompt("second");
        run(&mut shell).await;

        let prompts: Vec<&str> = shell
            .history()
            .records()
            .iter()
            .map(|r| r.prompt.as_str())
            .collect();
        assert_eq!(prompts, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_submit_while_pending_is_ignored() {
        let generator = FakeGenerator::ok();
        let mut shell = Shell::new(generator.clone());

        shell.set_prompt("a");
        let pending = shell.submit().expect("first submit accepted");
        shell.set_prompt("b");
        assert!(shell.submit().is_none());
        assert_eq!(shell.state(), RequestState::Pending);

        shell.finish(pending.await);

        assert_eq!(generator.calls(), vec!["a".to_string()]);
        assert_eq!(shell.history().len(), 1);
        assert_eq!(shell.history().latest().unwrap().prompt, "a");
    }

    #[test]
    fn test_blank_prompt_is_rejected() {
        let generator = FakeGenerator::ok();
        let mut shell = Shell::new(generator.clone());

        for prompt in ["", "   ", "\n\t"] {
            shell.set_prompt(prompt);
            assert!(!shell.can_submit());
            assert!(shell.submit().is_none());
        }

        assert_eq!(shell.state(), RequestState::Idle);
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_records_message_and_keeps_history() {
        let mut shell = Shell::new(FakeGenerator::failing(GenerateError::NoImageData));

        run(&mut shell).await;

        assert_eq!(shell.state(), RequestState::Failed);
        assert_eq!(shell.error(), Some("No image data found in the response."));
        assert!(shell.history().is_empty());
    }

    #[tokio::test]
    async fn test_empty_upstream_message_uses_fallback() {
        let mut shell = Shell::new(FakeGenerator::failing(GenerateError::Upstream(String::new())));

        run(&mut shell).await;

        assert_eq!(shell.error(), Some(FALLBACK_ERROR));
    }

    #[tokio::test]
    async fn test_resubmit_clears_previous_error() {
        let mut shell = Shell::new(FakeGenerator::failing(GenerateError::Upstream("quota".into())));
        run(&mut shell).await;
        assert_eq!(shell.error(), Some("quota"));

        let _pending = shell.submit().expect("retry accepted after failure");

        assert_eq!(shell.error(), None);
        assert_eq!(shell.state(), RequestState::Pending);
    }

    #[test]
    fn test_outcome_outside_pending_is_ignored() {
        let mut shell = Shell::new(FakeGenerator::ok());

        shell.finish(GenerationOutcome {
            prompt: "stray".into(),
            result: Ok("data:image/png;base64,AA==".into()),
        });

        assert_eq!(shell.state(), RequestState::Idle);
        assert!(shell.history().is_empty());
    }

    #[tokio::test]
    async fn test_delete_works_in_any_state() {
        let mut shell = Shell::new(FakeGenerator::ok());
        run(&mut shell).await;
        let id = shell.history().latest().unwrap().id.clone();

        let _pending = shell.submit().expect("submit accepted");
        shell.delete("unknown-id");
        assert_eq!(shell.history().len(), 1);

        shell.delete(&id);
        assert!(shell.history().is_empty());
        assert_eq!(shell.state(), RequestState::Pending);
    }

    #[tokio::test]
    async fn test_reset_prompt_keeps_state() {
        let mut shell = Shell::new(FakeGenerator::failing(GenerateError::NoImageData));
        assert_eq!(shell.prompt(), DEFAULT_PROMPT);

        shell.set_prompt("something else entirely");
        run(&mut shell).await;
        shell.reset_prompt();

        assert_eq!(shell.prompt(), DEFAULT_PROMPT);
        assert_eq!(shell.state(), RequestState::Failed);

        let _pending = shell.submit().expect("submit accepted");
        shell.set_prompt("edited while pending");
        shell.reset_prompt();
        assert_eq!(shell.prompt(), DEFAULT_PROMPT);
        assert_eq!(shell.state(), RequestState::Pending);
    }

    #[tokio::test]
    async fn test_state_changes_are_published() {
        let mut shell = Shell::new(FakeGenerator::ok());
        let rx = shell.subscribe();

        run(&mut shell).await;

        let events: Vec<ShellEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                ShellEvent::StateChanged {
                    from: RequestState::Idle,
                    to: RequestState::Pending
                },
                ShellEvent::StateChanged {
                    from: RequestState::Pending,
                    to: RequestState::Succeeded
                },
            ]
        );
    }
}
