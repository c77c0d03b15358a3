//! Customer support rooms.
//!
//! Rooms are plain broadcast channels: a message reaches whoever is subscribed
//! when it is posted, slow subscribers skip what they missed, nothing is stored.

pub mod chatbot;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

const ROOM_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind { Chat, Bot, Notification }

#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage {
    pub room: String,
    pub sender: String,
    pub kind: MessageKind,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn chat(room: &str, sender: &str, body: &str, at: DateTime<Utc>) -> Self {
        Self { room: room.to_string(), sender: sender.to_string(), kind: MessageKind::Chat, body: body.to_string(), sent_at: at }
    }
    pub fn bot(room: &str, body: &str, at: DateTime<Utc>) -> Self {
        Self { room: room.to_string(), sender: "bot".to_string(), kind: MessageKind::Bot, body: body.to_string(), sent_at: at }
    }
    pub fn notification(room: &str, body: String, at: DateTime<Utc>) -> Self {
        Self { room: room.to_string(), sender: "system".to_string(), kind: MessageKind::Notification, body, sent_at: at }
    }
}

#[derive(Clone, Default)]
pub struct SupportHub { rooms: Arc<Mutex<HashMap<String, broadcast::Sender<ChatMessage>>>> }

impl SupportHub {
    /// Every customer has exactly one support room.
    pub fn room_for(customer_id: &str) -> String { format!("support:{customer_id}") }

    pub fn join(&self, room: &str) -> broadcast::Receiver<ChatMessage> {
        let mut rooms = self.rooms();
        match rooms.get(room) {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(ROOM_CAPACITY);
                rooms.insert(room.to_string(), tx);
                rx
            }
        }
    }

    /// Returns how many subscribers received the message. Rooms nobody listens to are dropped.
    pub fn post(&self, message: ChatMessage) -> usize {
        let mut rooms = self.rooms();
        let Some(tx) = rooms.get(&message.room) else { return 0 };
        let room = message.room.clone();
        match tx.send(message) {
            Ok(delivered) => delivered,
            Err(_) => {
                rooms.remove(&room);
                0
            }
        }
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<ChatMessage>>> {
        self.rooms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
