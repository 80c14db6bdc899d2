use super::{SubmitReason, TimeLeft};

/// Notifications published by a session to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    QuestionChanged {
        index: usize,
    },
    AnswerChanged {
        question: usize,
        answer: Option<usize>,
    },
    ReviewToggled {
        question: usize,
        marked: bool,
    },
    FiftyFiftyUsed {
        question: usize,
        hidden: Vec<usize>,
        answer_cleared: bool,
    },
    TimerTick {
        time_left: TimeLeft,
    },
    TabLeaveWarning {
        count: u32,
        remaining: u32,
    },
    SubmitConfirmationRequested,
    Submitted {
        reason: SubmitReason,
        persisted: bool,
    },
}

pub type SubscriptionId = usize;

type Listener = Box<dyn FnMut(&SessionEvent)>;

/// Explicit subscribe/notify channel between a session and the views that
/// follow it.
#[derive(Default)]
pub struct EventBus {
    next_id: SubscriptionId,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&SessionEvent) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &SessionEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Detach every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
