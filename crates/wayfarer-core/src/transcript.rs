// ABOUTME: Append-only store of finalized conversation messages
// ABOUTME: User messages land optimistically at send time, never rolled back

use crate::types::{Message, Role};

/// The permanent conversation. Messages are immutable once appended and
/// survive timeline resets.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push_user(&mut self, content: String) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: String) {
        self.messages.push(Message::assistant(content));
    }

    pub fn push_system(&mut self, content: String) {
        self.messages.push(Message::system(content));
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}
