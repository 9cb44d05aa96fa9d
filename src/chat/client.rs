use crate::chat::{Laptop, Turn};
use crate::error::{check_status, ClientResult};
use crate::event::AppEvent;
use crate::session::SessionId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tokio::runtime::Handle;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub session_id: SessionId,
    pub response: String,
    #[serde(default)]
    pub recommendations: Option<Vec<Laptop>>,
}

#[derive(Debug, Deserialize)]
struct SessionHistory {
    #[serde(default)]
    conversation_history: Vec<Turn>,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(&self, request: &ChatRequest) -> ClientResult<ChatReply>;

    async fn load_session(&self, session_id: &SessionId) -> ClientResult<Vec<Turn>>;
}

pub struct HttpChatBackend {
    base_url: String,
    http: reqwest::Client,
}

impl HttpChatBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("studentdesk/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send_message(&self, request: &ChatRequest) -> ClientResult<ChatReply> {
        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(%url, "posting chat message");
        let response = self.http.post(&url).json(request).send().await?;
        let reply = check_status(response).await?.json::<ChatReply>().await?;
        Ok(reply)
    }

    async fn load_session(&self, session_id: &SessionId) -> ClientResult<Vec<Turn>> {
        let url = format!("{}/api/session/{}", self.base_url, session_id);
        tracing::debug!(%url, "loading chat session");
        let response = self.http.get(&url).send().await?;
        let history = check_status(response).await?.json::<SessionHistory>().await?;
        Ok(history.conversation_history)
    }
}

/// Runs chat round-trips on the tokio runtime and reports back over the UI channel.
#[derive(Clone)]
pub struct LaptopClient {
    backend: Arc<dyn ChatBackend>,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
}

impl LaptopClient {
    pub fn new(backend: Arc<dyn ChatBackend>, tx: mpsc::Sender<AppEvent>, runtime_handle: Handle) -> Self {
        Self {
            backend,
            tx,
            runtime_handle,
        }
    }

    pub fn send(&self, request: ChatRequest) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let result = backend.send_message(&request).await;
            let _ = tx.send(AppEvent::ChatReply(result));
        });
    }

    pub fn resume(&self, session_id: SessionId) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let result = backend.load_session(&session_id).await;
            let _ = tx.send(AppEvent::ChatHistory(result));
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::ClientError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays queued replies and records every request it sees.
    #[derive(Default)]
    pub struct ScriptedChatBackend {
        replies: Mutex<VecDeque<ClientResult<ChatReply>>>,
        history: Mutex<Option<ClientResult<Vec<Turn>>>>,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedChatBackend {
        pub fn reply(self, reply: ClientResult<ChatReply>) -> Self {
            self.replies
                .lock()
                .expect("replies lock should not be poisoned")
                .push_back(reply);
            self
        }

        pub fn history(self, history: ClientResult<Vec<Turn>>) -> Self {
            *self.history.lock().expect("history lock should not be poisoned") = Some(history);
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().expect("requests lock should not be poisoned").len()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedChatBackend {
        async fn send_message(&self, request: &ChatRequest) -> ClientResult<ChatReply> {
            self.requests
                .lock()
                .expect("requests lock should not be poisoned")
                .push(request.clone());
            self.replies
                .lock()
                .expect("replies lock should not be poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Server("no scripted reply".to_string())))
        }

        async fn load_session(&self, _session_id: &SessionId) -> ClientResult<Vec<Turn>> {
            self.history
                .lock()
                .expect("history lock should not be poisoned")
                .take()
                .unwrap_or_else(|| Err(ClientError::Server("no scripted history".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::session::{ChatSession, ResumeState};
    use crate::chat::Role;
    use crate::error::ClientError;
    use testing::ScriptedChatBackend;

    fn next_event(rx: mpsc::Receiver<AppEvent>) -> AppEvent {
        rx.recv_timeout(Duration::from_secs(2))
            .expect("event should arrive")
    }

    #[test]
    fn session_history_decodes_turns_in_order() {
        let raw = r#"{
  "session_id": "s-1",
  "conversation_history": [
    {"role": "user", "content": "budget is 90k", "timestamp": "2024-05-01T10:42:13.123456"},
    {"role": "assistant", "content": "try these", "recommendations": [
      {"id": 7, "name": "G", "brand": "Lenovo", "price_pkr": 90000}
    ]}
  ]
}"#;
        let history: SessionHistory = serde_json::from_str(raw).expect("history should parse");
        let turns = history.conversation_history;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].recommendations()[0].id, 7);
        assert_eq!(turns[1].timestamp, "");
    }

    #[test]
    fn session_history_without_turns_is_empty() {
        let history: SessionHistory =
            serde_json::from_str(r#"{"session_id": "s-1"}"#).expect("history should parse");
        assert!(history.conversation_history.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn resume_delivers_history_to_the_session() {
        let history = vec![Turn::user("old question"), Turn::assistant("old answer")];
        let backend = Arc::new(ScriptedChatBackend::default().history(Ok(history.clone())));
        let (tx, rx) = mpsc::channel();
        let client = LaptopClient::new(backend, tx, Handle::current());
        let id = SessionId::new("s-1").expect("id should be valid");
        let (mut session, _) = ChatSession::start(Some(id.clone()));

        client.resume(id);
        let event = tokio::task::spawn_blocking(move || next_event(rx))
            .await
            .expect("blocking task should join");
        match event {
            AppEvent::ChatHistory(result) => session.apply_history(result),
            other => panic!("unexpected event: {other:?}"),
        }

        assert_eq!(session.resume_state(), ResumeState::Idle);
        assert_eq!(session.log().turns(), history.as_slice());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn resume_failure_leaves_log_empty() {
        let backend = Arc::new(
            ScriptedChatBackend::default()
                .history(Err(ClientError::Server("session expired".to_string()))),
        );
        let (tx, rx) = mpsc::channel();
        let client = LaptopClient::new(backend, tx, Handle::current());
        let id = SessionId::new("s-2").expect("id should be valid");
        let (mut session, _) = ChatSession::start(Some(id.clone()));

        client.resume(id);
        let event = tokio::task::spawn_blocking(move || next_event(rx))
            .await
            .expect("blocking task should join");
        match event {
            AppEvent::ChatHistory(result) => {
                assert!(result.is_err());
                session.apply_history(result);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        assert_eq!(session.resume_state(), ResumeState::Failed);
        assert!(session.log().is_empty());
        assert!(session.can_send());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn send_posts_one_request_and_reports_reply() {
        let backend = Arc::new(ScriptedChatBackend::default().reply(Ok(ChatReply {
            session_id: SessionId::new("s-5").expect("id should be valid"),
            response: "hello".to_string(),
            recommendations: None,
        })));
        let (tx, rx) = mpsc::channel();
        let client = LaptopClient::new(backend.clone(), tx, Handle::current());

        client.send(ChatRequest {
            message: "hi".to_string(),
            session_id: None,
        });
        let event = tokio::task::spawn_blocking(move || next_event(rx))
            .await
            .expect("blocking task should join");
        match event {
            AppEvent::ChatReply(Ok(reply)) => assert_eq!(reply.response, "hello"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(backend.request_count(), 1);
    }

    #[test]
    fn request_without_session_serializes_null_id() {
        let request = ChatRequest {
            message: "hi".to_string(),
            session_id: None,
        };
        let value = serde_json::to_value(&request).expect("request should serialize");
        assert_eq!(value, serde_json::json!({"message": "hi", "session_id": null}));
    }

    #[test]
    fn reply_keeps_recommendation_order() {
        let raw = r#"{
  "session_id": "s-1",
  "response": "Here are some options",
  "recommendations": [
    {"id": 3, "name": "C", "brand": "Acer", "price_pkr": 1},
    {"id": 1, "name": "A", "brand": "HP", "price_pkr": 2}
  ]
}"#;
        let reply: ChatReply = serde_json::from_str(raw).expect("reply should parse");
        let ids: Vec<_> = reply
            .recommendations
            .expect("recommendations should be present")
            .iter()
            .map(|laptop| laptop.id)
            .collect();
        assert_eq!(ids, [3, 1]);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend = HttpChatBackend::new("http://localhost:8000/", Duration::from_secs(1))
            .expect("client should build");
        assert_eq!(backend.base_url, "http://localhost:8000");
    }
}
