use crate::ai::{ChatMessage, Role};

/// Append-only conversation log.
///
/// No deduplication, no size capping; retention policy belongs to the
/// caller.  The planner and executor each own an independent instance.
#[derive(Debug, Default, Clone)]
pub struct Memory {
    messages: Vec<ChatMessage>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn all(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The message list actually sent to the LLM: the latest `system`
    /// message (when one exists) followed by every non-system message in
    /// insertion order.
    pub fn effective(&self) -> Vec<ChatMessage> {
        let latest_system = self
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::System)
            .cloned();
        latest_system
            .into_iter()
            .chain(
                self.messages
                    .iter()
                    .filter(|m| m.role != Role::System)
                    .cloned(),
            )
            .collect()
    }

    /// Undo the most recent in-flight entry after an interruption.
    ///
    /// Pops the tail iff it is a `tool` message preceded by a non-`tool`
    /// entry, else pops iff it is a `user` message; anything else is left
    /// alone.  The narrow shape is load-bearing: it discards an orphaned
    /// tool result or an unanswered user turn without losing assistant
    /// reasoning that already landed.
    pub fn rollback(&mut self) {
        let n = self.messages.len();
        if n > 1
            && self.messages[n - 1].role == Role::Tool
            && self.messages[n - 2].role != Role::Tool
        {
            self.messages.pop();
        } else if n > 0 && self.messages[n - 1].role == Role::User {
            self.messages.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_prefixes_latest_system() {
        let mut memory = Memory::new();
        memory.add(ChatMessage::system("first prompt"));
        memory.add(ChatMessage::user("hi"));
        memory.add(ChatMessage::system("second prompt"));
        memory.add(ChatMessage::assistant("hello"));

        let effective = memory.effective();
        assert_eq!(effective.len(), 3);
        assert_eq!(effective[0].text(), "second prompt");
        assert_eq!(effective[1].text(), "hi");
        assert_eq!(effective[2].text(), "hello");
    }

    #[test]
    fn effective_without_system_has_no_prefix() {
        let mut memory = Memory::new();
        memory.add(ChatMessage::user("hi"));
        let effective = memory.effective();
        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].role, Role::User);
    }

    #[test]
    fn rollback_pops_orphaned_tool_message() {
        let mut memory = Memory::new();
        memory.add(ChatMessage::user("run it"));
        memory.add(ChatMessage::assistant("calling tool"));
        memory.add(ChatMessage::tool("call_1", "{}"));
        memory.rollback();
        assert_eq!(memory.all().len(), 2);
        assert_eq!(memory.all()[1].role, Role::Assistant);
    }

    #[test]
    fn rollback_keeps_consecutive_tool_tail() {
        let mut memory = Memory::new();
        memory.add(ChatMessage::tool("call_1", "{}"));
        memory.add(ChatMessage::tool("call_2", "{}"));
        memory.rollback();
        assert_eq!(memory.all().len(), 2);
    }

    #[test]
    fn rollback_pops_trailing_user() {
        let mut memory = Memory::new();
        memory.add(ChatMessage::assistant("done"));
        memory.add(ChatMessage::user("wait, change of plans"));
        memory.rollback();
        assert_eq!(memory.all().len(), 1);
        assert_eq!(memory.all()[0].role, Role::Assistant);
    }

    #[test]
    fn rollback_is_noop_on_assistant_tail() {
        let mut memory = Memory::new();
        memory.add(ChatMessage::user("hi"));
        memory.add(ChatMessage::assistant("hello"));
        memory.rollback();
        assert_eq!(memory.all().len(), 2);
    }

    #[test]
    fn rollback_on_empty_is_noop() {
        let mut memory = Memory::new();
        memory.rollback();
        assert!(memory.all().is_empty());
    }

    #[test]
    fn rollback_single_tool_entry_is_kept() {
        // A lone tool message has no preceding entry, so the first clause
        // cannot fire and the user clause does not match.
        let mut memory = Memory::new();
        memory.add(ChatMessage::tool("call_1", "{}"));
        memory.rollback();
        assert_eq!(memory.all().len(), 1);
    }
}
