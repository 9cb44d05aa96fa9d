use crate::chat::Turn;

/// Append-only, submission-ordered list of turns.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<Turn>,
    scroll_to_end: bool,
}

impl ConversationLog {
    pub fn welcome(text: impl Into<String>) -> Self {
        let mut log = Self::default();
        log.append(Turn::assistant(text));
        log
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.scroll_to_end = true;
    }

    /// Replaces the whole log with server history. Used once, on resume.
    pub fn resume_from(&mut self, history: Vec<Turn>) {
        self.turns = history;
        self.scroll_to_end = true;
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_end)
    }
}
