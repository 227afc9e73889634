//! Per-sender conversation history.

use crate::Message;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keyed storage of conversations. Every method is atomic with respect to the
/// other methods for the same sender.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Snapshot of the sender's conversation, creating an empty one on first contact.
    async fn history(&self, sender: &str) -> Vec<Message>;

    /// Append `message`, then keep only the newest `keep_last` entries if given.
    /// Returns the resulting length.
    async fn append(&self, sender: &str, message: Message, keep_last: Option<usize>) -> usize;

    /// Drop the oldest entries until at most `keep_last` remain. Returns the resulting length.
    async fn truncate(&self, sender: &str, keep_last: usize) -> usize;

    /// Reset the sender's conversation to empty.
    async fn clear(&self, sender: &str);

    /// Current length; zero for senders never seen.
    async fn len(&self, sender: &str) -> usize;
}

/// Process-lifetime store; contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    conversations: Arc<RwLock<HashMap<String, Vec<Message>>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn keep_newest(messages: &mut Vec<Message>, keep_last: usize) {
    if messages.len() > keep_last {
        let excess = messages.len() - keep_last;
        messages.drain(..excess);
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn history(&self, sender: &str) -> Vec<Message> {
        if let Some(messages) = self.conversations.read().await.get(sender) {
            return messages.clone();
        }
        let mut conversations = self.conversations.write().await;
        conversations.entry(sender.to_string()).or_default().clone()
    }

    async fn append(&self, sender: &str, message: Message, keep_last: Option<usize>) -> usize {
        let mut conversations = self.conversations.write().await;
        let messages = conversations.entry(sender.to_string()).or_default();
        messages.push(message);
        if let Some(limit) = keep_last {
            keep_newest(messages, limit);
        }
        messages.len()
    }

    async fn truncate(&self, sender: &str, keep_last: usize) -> usize {
        let mut conversations = self.conversations.write().await;
        match conversations.get_mut(sender) {
            Some(messages) => {
                keep_newest(messages, keep_last);
                messages.len()
            }
            None => 0,
        }
    }

    async fn clear(&self, sender: &str) {
        let mut conversations = self.conversations.write().await;
        conversations.insert(sender.to_string(), Vec::new());
    }

    async fn len(&self, sender: &str) -> usize {
        self.conversations
            .read()
            .await
            .get(sender)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_creates_empty_conversation() {
        let store = InMemoryConversationStore::new();
        assert!(store.history("+15550001").await.is_empty());
        assert_eq!(store.len("+15550001").await, 0);
        store.append("+15550001", Message::user("hi"), None).await;
        assert_eq!(store.history("+15550001").await, vec![Message::user("hi")]);
        assert_eq!(store.len("+15550002").await, 0);
    }

    #[tokio::test]
    async fn append_truncates_oldest_first() {
        let store = InMemoryConversationStore::new();
        for i in 0..25 {
            store.append("s", Message::user(format!("m{i}")), Some(20)).await;
        }
        let history = store.history("s").await;
        assert_eq!(history.len(), 20);
        assert_eq!(history.first().unwrap().content, "m5");
        assert_eq!(history.last().unwrap().content, "m24");
    }

    #[tokio::test]
    async fn append_without_limit_grows() {
        let store = InMemoryConversationStore::new();
        for _ in 0..3 {
            store.append("s", Message::user("x"), None).await;
        }
        assert_eq!(store.len("s").await, 3);
        assert_eq!(store.truncate("s", 2).await, 2);
        assert_eq!(store.truncate("unknown", 2).await, 0);
    }

    #[tokio::test]
    async fn clear_empties_only_that_sender() {
        let store = InMemoryConversationStore::new();
        store.append("a", Message::user("hi"), None).await;
        store.append("b", Message::user("hey"), None).await;
        store.clear("a").await;
        assert_eq!(store.len("a").await, 0);
        assert_eq!(store.len("b").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_senders_do_not_interfere() {
        let store = InMemoryConversationStore::new();
        let tasks = (0..16).map(|i| {
            let store = store.clone();
            async move {
                let sender = format!("+1555000{i:02}");
                for n in 0..10 {
                    store
                        .append(&sender, Message::user(n.to_string()), Some(20))
                        .await;
                }
            }
        });
        futures::future::join_all(tasks).await;

        for i in 0..16 {
            assert_eq!(store.len(&format!("+1555000{i:02}")).await, 10);
        }
    }
}
