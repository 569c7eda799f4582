use log::{ info, warn };
use std::sync::Arc;

use crate::cli::Args;
use crate::errors::ChatError;
use crate::freshness;
use crate::llm::{ self, CompletionProvider };
use crate::models::chat::{ AnswerSource, ChatRequest, ChatResponse, Role };
use crate::search::{ self, SearchProvider };

/// Sliding context window forwarded upstream. Oldest messages beyond this are
/// discarded. A fixed count, not a token-aware budget.
pub const CONTEXT_WINDOW: usize = 15;

/// Models accepted from the request body; anything else silently becomes the
/// configured default.
pub const ALLOWED_MODELS: &[&str] = &["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo"];

/// Upper bound on a single message's content, in bytes.
pub const MAX_CONTENT_LEN: usize = 32 * 1024;

/// Coordinates a completion call with a conditional live-search fallback.
/// Stateless across requests; both providers are injected so tests can
/// substitute fakes.
pub struct ChatAgent {
    completion: Arc<dyn CompletionProvider>,
    search: Arc<dyn SearchProvider>,
    default_model: String,
}

impl ChatAgent {
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        search: Arc<dyn SearchProvider>,
        default_model: String,
    ) -> Self {
        let default_model = if ALLOWED_MODELS.contains(&default_model.as_str()) {
            default_model
        } else {
            warn!(
                "Configured default model '{}' is not allow-listed, using '{}'",
                default_model, ALLOWED_MODELS[0]
            );
            ALLOWED_MODELS[0].to_string()
        };
        Self {
            completion,
            search,
            default_model,
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, ChatError> {
        let completion = llm::new_provider(args)?;
        let search = search::new_provider(args);
        Ok(Self::new(completion, search, args.chat_model.clone()))
    }

    /// The full request pipeline: validate, window, complete, classify,
    /// conditionally fall back to live search.
    pub async fn handle_chat(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        if request.messages.is_empty() {
            return Err(ChatError::InvalidInput("no messages provided".into()));
        }
        if let Some(oversized) = request.messages.iter().position(|m| m.content.len() > MAX_CONTENT_LEN) {
            return Err(ChatError::InvalidInput(format!(
                "message {} exceeds the {} byte content limit",
                oversized, MAX_CONTENT_LEN
            )));
        }

        let window_start = request.messages.len().saturating_sub(CONTEXT_WINDOW);
        let window = &request.messages[window_start..];
        let model = self.resolve_model(request.model.as_deref());

        let completion = self.completion.complete(window, model).await?;
        if let Some(usage) = &completion.usage {
            info!(
                "Completion from {}: {} prompt + {} completion tokens",
                completion.model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        let last_user = window
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        if freshness::needs_live_data(&completion.reply, last_user) {
            info!("Reply classified stale, falling back to live search for: {}", last_user);
            let answer = self.search.search(last_user).await?;
            info!("Search result: {}", answer);
            return Ok(ChatResponse {
                reply: answer,
                source: AnswerSource::Serpapi,
            });
        }

        Ok(ChatResponse {
            reply: completion.reply,
            source: AnswerSource::Gpt,
        })
    }

    /// Direct search passthrough, used by the standalone search endpoint.
    pub async fn direct_search(&self, query: &str) -> Result<String, ChatError> {
        if query.trim().is_empty() {
            return Err(ChatError::InvalidInput("no query provided".into()));
        }
        self.search.search(query).await
    }

    fn resolve_model<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested {
            Some(model) if ALLOWED_MODELS.contains(&model) => model,
            _ => &self.default_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Completion;
    use crate::models::chat::ChatMessage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every forwarded window so tests can assert on truncation and
    /// model resolution.
    struct FakeCompletion {
        reply: String,
        calls: Mutex<Vec<(Vec<ChatMessage>, String)>>,
        fail_with: Option<(Option<u16>, String)>,
    }

    impl FakeCompletion {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(status: Option<u16>, message: &str) -> Self {
            Self {
                reply: String::new(),
                calls: Mutex::new(Vec::new()),
                fail_with: Some((status, message.to_string())),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for FakeCompletion {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            model: &str,
        ) -> Result<Completion, ChatError> {
            self.calls
                .lock()
                .unwrap()
                .push((messages.to_vec(), model.to_string()));
            if let Some((status, message)) = &self.fail_with {
                return Err(ChatError::upstream("openai", *status, message.clone()));
            }
            Ok(Completion {
                reply: self.reply.clone(),
                model: model.to_string(),
                usage: None,
            })
        }
    }

    struct FakeSearch {
        answer: String,
        queries: Mutex<Vec<String>>,
    }

    impl FakeSearch {
        fn answering(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(&self, query: &str) -> Result<String, ChatError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.answer.clone())
        }
    }

    fn agent(completion: &Arc<FakeCompletion>, search: &Arc<FakeSearch>) -> ChatAgent {
        ChatAgent::new(
            completion.clone() as Arc<dyn CompletionProvider>,
            search.clone() as Arc<dyn SearchProvider>,
            "gpt-3.5-turbo".to_string(),
        )
    }

    fn user(content: &str) -> ChatMessage {
        ChatMessage::new(Role::User, content)
    }

    #[tokio::test]
    async fn empty_message_list_never_reaches_providers() {
        let completion = Arc::new(FakeCompletion::replying("hi"));
        let search = Arc::new(FakeSearch::answering("x"));
        let err = agent(&completion, &search)
            .handle_chat(ChatRequest { messages: vec![], model: None })
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::InvalidInput(_)));
        assert!(completion.calls.lock().unwrap().is_empty());
        assert!(search.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn long_conversations_are_windowed_to_the_last_15() {
        let completion = Arc::new(FakeCompletion::replying("fine"));
        let search = Arc::new(FakeSearch::answering("x"));
        let messages: Vec<ChatMessage> = (0..40).map(|i| user(&format!("msg {}", i))).collect();

        agent(&completion, &search)
            .handle_chat(ChatRequest { messages, model: None })
            .await
            .unwrap();

        let calls = completion.calls.lock().unwrap();
        let (window, _) = &calls[0];
        assert_eq!(window.len(), CONTEXT_WINDOW);
        assert_eq!(window.first().unwrap().content, "msg 25");
        assert_eq!(window.last().unwrap().content, "msg 39");
    }

    #[tokio::test]
    async fn unknown_model_falls_back_to_default() {
        let completion = Arc::new(FakeCompletion::replying("fine"));
        let search = Arc::new(FakeSearch::answering("x"));
        let a = agent(&completion, &search);

        a.handle_chat(ChatRequest {
            messages: vec![user("explain recursion")],
            model: Some("gpt-5-ultra".into()),
        }).await.unwrap();
        a.handle_chat(ChatRequest {
            messages: vec![user("explain recursion")],
            model: Some("gpt-4".into()),
        }).await.unwrap();
        a.handle_chat(ChatRequest {
            messages: vec![user("explain recursion")],
            model: None,
        }).await.unwrap();

        let calls = completion.calls.lock().unwrap();
        assert_eq!(calls[0].1, "gpt-3.5-turbo");
        assert_eq!(calls[1].1, "gpt-4");
        assert_eq!(calls[2].1, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn time_sensitive_question_forces_search_fallback() {
        let completion = Arc::new(FakeCompletion::replying("The 2020 election was won by..."));
        let search = Arc::new(FakeSearch::answering("Candidate X won."));

        let resp = agent(&completion, &search)
            .handle_chat(ChatRequest {
                messages: vec![user("who won the election yesterday")],
                model: None,
            })
            .await
            .unwrap();

        assert_eq!(resp.source, AnswerSource::Serpapi);
        assert_eq!(resp.reply, "Candidate X won.");
        assert_eq!(completion.calls.lock().unwrap().len(), 1);
        assert_eq!(
            search.queries.lock().unwrap().as_slice(),
            ["who won the election yesterday"]
        );
    }

    #[tokio::test]
    async fn refusal_in_reply_forces_search_fallback() {
        let completion = Arc::new(FakeCompletion::replying(
            "I don't have access to real-time information, sorry.",
        ));
        let search = Arc::new(FakeSearch::answering("It is 21 degrees."));

        let resp = agent(&completion, &search)
            .handle_chat(ChatRequest {
                messages: vec![user("what's the weather in Oslo")],
                model: None,
            })
            .await
            .unwrap();

        assert_eq!(resp.source, AnswerSource::Serpapi);
        assert_eq!(resp.reply, "It is 21 degrees.");
    }

    #[tokio::test]
    async fn fresh_reply_passes_through_untouched() {
        let completion = Arc::new(FakeCompletion::replying(
            "Recursion is a function calling itself.",
        ));
        let search = Arc::new(FakeSearch::answering("x"));

        let resp = agent(&completion, &search)
            .handle_chat(ChatRequest {
                messages: vec![user("explain recursion")],
                model: None,
            })
            .await
            .unwrap();

        assert_eq!(resp.source, AnswerSource::Gpt);
        assert_eq!(resp.reply, "Recursion is a function calling itself.");
        assert!(search.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn completion_failure_aborts_before_search() {
        let completion = Arc::new(FakeCompletion::failing(Some(429), "rate limited"));
        let search = Arc::new(FakeSearch::answering("x"));

        let err = agent(&completion, &search)
            .handle_chat(ChatRequest {
                messages: vec![user("who won the cup today")],
                model: None,
            })
            .await
            .unwrap_err();

        match err {
            ChatError::Upstream { status, .. } => assert_eq!(status, Some(429)),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(search.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fallback_without_a_user_message_searches_an_empty_query() {
        // Only assistant messages in the window, the reply itself triggers.
        let completion = Arc::new(FakeCompletion::replying("Check the latest standings online."));
        let search = Arc::new(FakeSearch::answering("standings"));

        let resp = agent(&completion, &search)
            .handle_chat(ChatRequest {
                messages: vec![ChatMessage::new(Role::Assistant, "previous answer")],
                model: None,
            })
            .await
            .unwrap();

        assert_eq!(resp.source, AnswerSource::Serpapi);
        assert_eq!(search.queries.lock().unwrap().as_slice(), [""]);
    }

    #[tokio::test]
    async fn oversized_message_is_rejected() {
        let completion = Arc::new(FakeCompletion::replying("fine"));
        let search = Arc::new(FakeSearch::answering("x"));

        let err = agent(&completion, &search)
            .handle_chat(ChatRequest {
                messages: vec![user(&"a".repeat(MAX_CONTENT_LEN + 1))],
                model: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::InvalidInput(_)));
        assert!(completion.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_direct_search_query_is_rejected() {
        let completion = Arc::new(FakeCompletion::replying("fine"));
        let search = Arc::new(FakeSearch::answering("x"));

        let err = agent(&completion, &search).direct_search("   ").await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidInput(_)));
        assert!(search.queries.lock().unwrap().is_empty());
    }
}
