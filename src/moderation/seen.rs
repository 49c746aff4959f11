// per-message bookkeeping: a message and its edits are handled one at a time,
// and once one of them got the message removed the rest are ignored

use crate::types::{Message, MessageId};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

// oldest messages are forgotten past this
const CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Removed,
    /// judged safe with this content
    Passed(u64),
}

struct Entry {
    turn: Arc<AsyncMutex<()>>,
    outcome: Option<Outcome>,
}

#[derive(Default)]
struct State {
    entries: HashMap<MessageId, Entry>,
    order: VecDeque<MessageId>,
}

#[derive(Default)]
pub struct SeenMessages {
    state: Mutex<State>,
}

/// Exclusive right to moderate one message id. Dropping it without
/// recording an outcome lets the next copy be looked at again.
pub struct Turn<'a> {
    seen: &'a SeenMessages,
    id: MessageId,
    fingerprint: u64,
    _permit: OwnedMutexGuard<()>,
}

impl SeenMessages {
    /// Waits for any other handler of the same message id, then returns
    /// `None` if the message was already removed or already passed with
    /// the same content and attachments.
    pub async fn begin(&self, message: &Message) -> Option<Turn<'_>> {
        let turn = self.turn_lock(message.id);
        let permit = turn.lock_owned().await;
        let fingerprint = fingerprint(message);

        let outcome = self
            .lock()
            .entries
            .get(&message.id)
            .and_then(|e| e.outcome);

        match outcome {
            Some(Outcome::Removed) => None,
            Some(Outcome::Passed(seen)) if seen == fingerprint => None,
            _ => Some(Turn {
                seen: self,
                id: message.id,
                fingerprint,
                _permit: permit,
            }),
        }
    }

    fn turn_lock(&self, id: MessageId) -> Arc<AsyncMutex<()>> {
        let mut state = self.lock();
        if let Some(entry) = state.entries.get(&id) {
            return entry.turn.clone();
        }

        let turn = Arc::new(AsyncMutex::new(()));
        state.entries.insert(
            id,
            Entry {
                turn: turn.clone(),
                outcome: None,
            },
        );
        state.order.push_back(id);

        while state.order.len() > CAPACITY {
            if let Some(old) = state.order.pop_front() {
                state.entries.remove(&old);
            }
        }

        turn
    }

    fn record(&self, id: MessageId, outcome: Outcome) {
        if let Some(entry) = self.lock().entries.get_mut(&id) {
            entry.outcome = Some(outcome);
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Turn<'_> {
    pub fn removed(self) {
        self.seen.record(self.id, Outcome::Removed);
    }

    pub fn passed(self) {
        self.seen.record(self.id, Outcome::Passed(self.fingerprint));
    }
}

fn fingerprint(message: &Message) -> u64 {
    let mut hasher = DefaultHasher::new();
    message.content.hash(&mut hasher);
    for attachment in &message.attachments {
        attachment.url.hash(&mut hasher);
    }
    hasher.finish()
}
