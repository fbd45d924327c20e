//! Test doubles shared by the unit tests of this crate.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{port::MessagingPort, types::OutgoingMessage},
    ports::{CounterEntry, CounterStore, Subscriber, SubscriberStore},
    Result,
};

/// A successful outbound call.
#[derive(Clone, Debug, PartialEq)]
pub enum Sent {
    Message {
        chat_id: ChatId,
        msg: OutgoingMessage,
    },
    Edit {
        target: MessageRef,
        msg: OutgoingMessage,
    },
    CallbackAnswer {
        callback_id: String,
        text: Option<String>,
    },
}

#[derive(Default)]
pub struct FakeMessenger {
    next_id: Mutex<i32>,
    log: Mutex<Vec<Sent>>,
    attempts: Mutex<Vec<ChatId>>,
    failing_chats: Mutex<HashSet<ChatId>>,
    fail_edits: AtomicBool,
    fail_answers: AtomicBool,
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1),
            ..Default::default()
        }
    }

    /// Sends to these chats fail as if the bot were blocked.
    pub fn fail_chats(&self, chats: impl IntoIterator<Item = ChatId>) {
        self.failing_chats.lock().unwrap().extend(chats);
    }

    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn fail_answers(&self) {
        self.fail_answers.store(true, Ordering::SeqCst);
    }

    pub fn log(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    /// Every chat a send was attempted to, in order, including failures.
    pub fn send_attempts(&self) -> Vec<ChatId> {
        self.attempts.lock().unwrap().clone()
    }

    /// Successful messages to `chat_id`.
    pub fn messages_to(&self, chat_id: ChatId) -> Vec<OutgoingMessage> {
        self.log()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message { chat_id: c, msg } if c == chat_id => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        let id = *guard;
        *guard += 1;
        MessageRef {
            chat_id,
            message_id: MessageId(id),
        }
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_message(&self, chat_id: ChatId, msg: &OutgoingMessage) -> Result<MessageRef> {
        self.attempts.lock().unwrap().push(chat_id);
        if self.failing_chats.lock().unwrap().contains(&chat_id) {
            return Err(Error::External(
                "telegram error: Forbidden: bot was blocked by the user".to_string(),
            ));
        }
        self.log.lock().unwrap().push(Sent::Message {
            chat_id,
            msg: msg.clone(),
        });
        Ok(self.alloc(chat_id))
    }

    async fn edit_message(&self, target: MessageRef, msg: &OutgoingMessage) -> Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(Error::External(
                "telegram error: message is not modified".to_string(),
            ));
        }
        self.log.lock().unwrap().push(Sent::Edit {
            target,
            msg: msg.clone(),
        });
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        if self.fail_answers.load(Ordering::SeqCst) {
            return Err(Error::External("telegram error: query is too old".to_string()));
        }
        self.log.lock().unwrap().push(Sent::CallbackAnswer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }
}

/// Storage that fails every call.
pub struct FailingStore;

fn unavailable<T>() -> Result<T> {
    Err(Error::External("storage unavailable".to_string()))
}

impl CounterStore for FailingStore {
    fn increment(&self, _label: &str) -> Result<u64> {
        unavailable()
    }

    fn counters(&self) -> Result<Vec<CounterEntry>> {
        unavailable()
    }
}

impl SubscriberStore for FailingStore {
    fn insert_subscriber(&self, _chat_id: ChatId) -> Result<bool> {
        unavailable()
    }

    fn delete_subscriber(&self, _chat_id: ChatId) -> Result<bool> {
        unavailable()
    }

    fn subscriber_count(&self) -> Result<u64> {
        unavailable()
    }

    fn subscribers(&self) -> Result<Vec<Subscriber>> {
        unavailable()
    }
}
