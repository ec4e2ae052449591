use std::sync::Arc;

use crate::events::AgentEvent;

use super::queue::Queue;

/// Raised by [`EventSink::emit`] when a newer inbound message is waiting.
///
/// Flows propagate it with `?`, unwinding out of the current plan so the
/// worker can pick up the new message.  The in-flight LLM or tool call is
/// never cancelled mid-air; preemption only happens between emissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Outbound event channel handed to a flow for one run.
///
/// Every domain event the flow produces goes through `emit`, which also
/// doubles as the cooperative preemption point.
#[derive(Clone)]
pub struct EventSink {
    events: Arc<Queue<AgentEvent>>,
    inbox: Option<Arc<Queue<String>>>,
}

impl EventSink {
    /// A sink that never preempts (tests, one-shot runs).
    pub fn new(events: Arc<Queue<AgentEvent>>) -> Self {
        Self {
            events,
            inbox: None,
        }
    }

    /// A sink that asks the flow to unwind once `inbox` holds a message.
    pub fn with_preemption(events: Arc<Queue<AgentEvent>>, inbox: Arc<Queue<String>>) -> Self {
        Self {
            events,
            inbox: Some(inbox),
        }
    }

    /// Deliver `event` and report whether the flow should keep going.
    ///
    /// The event is always delivered, even when `Interrupted` is returned:
    /// clients see everything produced up to the preemption point.
    pub fn emit(&self, event: AgentEvent) -> Result<(), Interrupted> {
        log::debug!("emitting event: {}", event.kind());
        self.events.push(event);
        match &self.inbox {
            Some(inbox) if !inbox.is_empty() => Err(Interrupted),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_without_inbox_never_interrupts() {
        let events = Arc::new(Queue::new());
        let sink = EventSink::new(events.clone());
        assert!(sink.emit(AgentEvent::Done).is_ok());
        assert_eq!(events.pop().await, AgentEvent::Done);
    }

    #[tokio::test]
    async fn emit_interrupts_once_inbox_is_nonempty() {
        let events = Arc::new(Queue::new());
        let inbox = Arc::new(Queue::new());
        let sink = EventSink::with_preemption(events.clone(), inbox.clone());

        assert!(sink.emit(AgentEvent::Done).is_ok());

        inbox.push("new message".to_owned());
        let result = sink.emit(AgentEvent::Message {
            message: "late".to_owned(),
        });
        assert_eq!(result, Err(Interrupted));

        // Both events were still delivered.
        assert_eq!(events.pop().await, AgentEvent::Done);
        assert!(matches!(events.pop().await, AgentEvent::Message { .. }));
    }
}
