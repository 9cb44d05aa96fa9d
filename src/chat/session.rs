#[cfg(test)]
use crate::chat::client::ChatBackend;
use crate::chat::client::{ChatReply, ChatRequest};
use crate::chat::log::ConversationLog;
use crate::chat::selection::SelectionSet;
use crate::chat::{Turn, CHAT_ERROR_MESSAGE, QUICK_REPLIES, WELCOME_MESSAGE};
use crate::error::ClientResult;
use crate::session::store::SessionStore;
use crate::session::SessionId;

/// How the laptop chat starts up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Startup {
    Fresh,
    Resume(SessionId),
}

/// Progress of loading a stored conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResumeState {
    #[default]
    Idle,
    Loading,
    Failed,
}

/// Client-side state of the laptop chat: log, selection and the in-flight guard.
#[derive(Debug, Default)]
pub struct ChatSession {
    log: ConversationLog,
    selection: SelectionSet,
    session_id: Option<SessionId>,
    in_flight: bool,
    resume: ResumeState,
}

impl ChatSession {
    /// A stored id means resume; otherwise the log is seeded with the welcome turn.
    pub fn start(stored: Option<SessionId>) -> (Self, Startup) {
        match stored {
            Some(session_id) => {
                let session = Self {
                    session_id: Some(session_id.clone()),
                    resume: ResumeState::Loading,
                    ..Self::default()
                };
                (session, Startup::Resume(session_id))
            }
            None => {
                let session = Self {
                    log: ConversationLog::welcome(WELCOME_MESSAGE),
                    ..Self::default()
                };
                (session, Startup::Fresh)
            }
        }
    }

    /// Takes the server history as the log. Sends are held back until this
    /// runs, so nothing appended locally can be overwritten.
    pub fn apply_history(&mut self, result: ClientResult<Vec<Turn>>) {
        if self.resume != ResumeState::Loading {
            tracing::debug!("ignoring chat history outside of resume");
            return;
        }
        match result {
            Ok(history) => {
                tracing::info!(turns = history.len(), "resumed chat session");
                self.log.resume_from(history);
                self.resume = ResumeState::Idle;
            }
            Err(err) => {
                tracing::warn!("failed to load chat session: {err}");
                self.resume = ResumeState::Failed;
            }
        }
    }

    /// Appends the user turn and returns the request to issue. Rejects blank
    /// input and any attempt made while a request or the resume is pending.
    pub fn begin_send(&mut self, text: &str) -> Option<ChatRequest> {
        let text = text.trim();
        if text.is_empty() || !self.can_send() {
            return None;
        }

        self.log.append(Turn::user(text));
        self.in_flight = true;
        Some(ChatRequest {
            message: text.to_string(),
            session_id: self.session_id.clone(),
        })
    }

    /// Appends exactly one assistant turn. Returns the session id to persist
    /// when this reply introduced the session.
    pub fn finish_send(&mut self, result: ClientResult<ChatReply>) -> Option<SessionId> {
        self.in_flight = false;
        match result {
            Ok(reply) => {
                self.log
                    .append(Turn::assistant_with(reply.response, reply.recommendations));
                if self.session_id.is_none() {
                    self.session_id = Some(reply.session_id.clone());
                    return Some(reply.session_id);
                }
                None
            }
            Err(err) => {
                tracing::warn!("chat request failed: {err}");
                self.log.append(Turn::assistant(CHAT_ERROR_MESSAGE));
                None
            }
        }
    }

    #[cfg(test)]
    pub async fn send(&mut self, backend: &dyn ChatBackend, store: &SessionStore, text: &str) {
        let Some(request) = self.begin_send(text) else {
            return;
        };
        let result = backend.send_message(&request).await;
        if let Some(session_id) = self.finish_send(result) {
            persist_session(store, &session_id);
        }
    }

    pub fn show_quick_replies(&self) -> bool {
        self.can_send() && self.log.len() <= 2
    }

    pub fn can_send(&self) -> bool {
        !self.in_flight && self.resume != ResumeState::Loading
    }

    pub fn resume_state(&self) -> ResumeState {
        self.resume
    }

    pub fn quick_replies(&self) -> &'static [(&'static str, &'static str)] {
        &QUICK_REPLIES
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ConversationLog {
        &mut self.log
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }
}

pub fn persist_session(store: &SessionStore, session_id: &SessionId) {
    if let Err(err) = store.save(session_id) {
        tracing::warn!("failed to persist chat session: {err}");
    }
}
