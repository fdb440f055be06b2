//! Live study session state
//!
//! Folds realtime channel payloads into the chat log and member list of one
//! study group. Payloads addressed to another group are ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: Uuid,
    pub display_name: String,
    pub online_at: DateTime<Utc>,
}

/// A realtime payload for a study group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A chat row was inserted
    MessageInserted { message: ChatMessage },
    /// Full presence snapshot; replaces the member list
    PresenceSync { group_id: Uuid, members: Vec<Member> },
    PresenceJoin { group_id: Uuid, member: Member },
    PresenceLeave { group_id: Uuid, user_id: Uuid },
}

impl SessionEvent {
    pub fn group_id(&self) -> Uuid {
        match self {
            SessionEvent::MessageInserted { message } => message.group_id,
            SessionEvent::PresenceSync { group_id, .. }
            | SessionEvent::PresenceJoin { group_id, .. }
            | SessionEvent::PresenceLeave { group_id, .. } => *group_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    group_id: Uuid,
    messages: Vec<ChatMessage>,
    members: BTreeMap<Uuid, Member>,
}

impl SessionState {
    pub fn new(group_id: Uuid) -> Self {
        Self {
            group_id,
            messages: Vec::new(),
            members: BTreeMap::new(),
        }
    }

    pub fn group_id(&self) -> Uuid {
        self.group_id
    }

    /// Messages ordered by send time.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.members.contains_key(&user_id)
    }

    /// Returns whether the event changed this session.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        if event.group_id() != self.group_id {
            return false;
        }

        match event {
            SessionEvent::MessageInserted { message } => {
                if self.messages.iter().any(|m| m.id == message.id) {
                    return false;
                }
                let position = self
                    .messages
                    .partition_point(|m| m.sent_at <= message.sent_at);
                self.messages.insert(position, message);
                true
            }
            SessionEvent::PresenceSync { members, .. } => {
                self.members = members.into_iter().map(|m| (m.user_id, m)).collect();
                true
            }
            SessionEvent::PresenceJoin { member, .. } => {
                self.members.insert(member.user_id, member);
                true
            }
            SessionEvent::PresenceLeave { user_id, .. } => self.members.remove(&user_id).is_some(),
        }
    }
}
