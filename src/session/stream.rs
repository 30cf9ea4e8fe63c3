use std::collections::HashSet;

use crate::common::{MergePolicy, Message};

pub type Observer = Box<dyn FnMut(&[Message]) + Send>;

/// The ordered messages the chat screen displays.
///
/// Insertion order is display order. Observers run synchronously after every mutation.
pub struct MessageStream {
    messages: Vec<Message>,
    ids: HashSet<i64>,
    policy: MergePolicy,
    observers: Vec<Observer>,
}

impl MessageStream {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            messages: Vec::new(),
            ids: HashSet::new(),
            policy,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn replace_all(&mut self, history: Vec<Message>) {
        let early_live = std::mem::replace(&mut self.messages, history);
        self.ids = self.messages.iter().map(|message| message.id).collect();

        match self.policy {
            MergePolicy::Replace => {
                if !early_live.is_empty() {
                    log::debug!(
                        "History replaced {} live message(s) that arrived first",
                        early_live.len()
                    );
                }
            }
            MergePolicy::MergeById => {
                for message in early_live {
                    if self.ids.insert(message.id) {
                        self.messages.push(message);
                    }
                }
            }
        }

        self.notify();
    }

    pub fn append(&mut self, message: Message) {
        if self.policy == MergePolicy::MergeById && self.ids.contains(&message.id) {
            log::debug!("Skipping duplicate message {}", message.id);
            return;
        }

        self.ids.insert(message.id);
        self.messages.push(message);
        self.notify();
    }

    /// Empties the stream for a fresh activation. Observers stay subscribed.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.ids.clear();
        self.notify();
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer(&self.messages);
        }
    }
}
