//! Poll events.

use botdesk_models::{BotId, KnowledgeBaseState};

/// Events emitted by the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// A watch was armed.
    WatchStarted {
        /// Bot being watched.
        bot_id: BotId,
    },
    /// A tick reported a different status than the one held.
    StatusChanged {
        bot_id: BotId,
        status: KnowledgeBaseState,
    },
    /// A status query failed; the watch keeps running.
    TickFailed {
        bot_id: BotId,
        /// Error message.
        error: String,
    },
    /// Processing finished and the timer was disarmed.
    Completed {
        bot_id: BotId,
        /// Final status.
        status: KnowledgeBaseState,
    },
    /// The bot could not be re-fetched after processing finished.
    BotRefreshFailed { bot_id: BotId, error: String },
    /// The watch was torn down before processing finished.
    Stopped { bot_id: BotId },
}

impl PollEvent {
    /// Returns the bot the event is about.
    pub fn bot_id(&self) -> BotId {
        match self {
            PollEvent::WatchStarted { bot_id }
            | PollEvent::StatusChanged { bot_id, .. }
            | PollEvent::TickFailed { bot_id, .. }
            | PollEvent::Completed { bot_id, .. }
            | PollEvent::BotRefreshFailed { bot_id, .. }
            | PollEvent::Stopped { bot_id } => *bot_id,
        }
    }

    /// Returns true if this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            PollEvent::TickFailed { .. } | PollEvent::BotRefreshFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bot_id() {
        let bot_id = BotId::new(42);

        let events = [
            PollEvent::WatchStarted { bot_id },
            PollEvent::StatusChanged {
                bot_id,
                status: KnowledgeBaseState::Ready,
            },
            PollEvent::TickFailed {
                bot_id,
                error: "timeout".to_string(),
            },
            PollEvent::Stopped { bot_id },
        ];
        for event in events {
            assert_eq!(event.bot_id(), bot_id);
        }
    }

    #[test]
    fn test_event_is_error() {
        let bot_id = BotId::new(42);

        assert!(!PollEvent::WatchStarted { bot_id }.is_error());
        assert!(PollEvent::TickFailed {
            bot_id,
            error: "timeout".to_string(),
        }
        .is_error());
        assert!(PollEvent::BotRefreshFailed {
            bot_id,
            error: "404".to_string(),
        }
        .is_error());
    }
}
