use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A room participant. The credential is the member's external provider
/// token; it never leaves the process via snapshots or events.
#[derive(Debug, Clone)]
pub struct Member {
    pub user_id: String,
    pub display_name: String,
    pub is_host: bool,
    pub credential: Option<String>,
}

/// Playback state captured from the external provider at sync-request time.
///
/// Track fields are optional because the provider can report an active
/// player with no current item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub track_id: Option<String>,
    pub track_name: Option<String>,
    pub artists: Vec<String>,
    pub uri: Option<String>,
    pub is_playing: bool,
    pub position_ms: u64,
}

/// A synchronized-playback session: one host plus zero or more joiners.
///
/// Invariants enforced by the registry operations:
/// - `host_id` is always a member while the room exists
/// - exactly one member has `is_host = true`, and it is `host_id`
/// - `ready_acks` only ever contains joiner ids, and only while
///   `sync_in_progress` is set
/// - a room with zero members is deleted immediately
#[derive(Debug)]
pub struct Room {
    pub room_id: String,
    pub host_id: String,
    /// Insertion order is preserved; host promotion picks the first
    /// remaining member, which keeps the policy deterministic.
    pub members: Vec<Member>,
    pub playback: Option<PlaybackSnapshot>,
    pub sync_in_progress: bool,
    pub ready_acks: HashSet<String>,
    pub last_sync: Option<DateTime<Utc>>,
    /// Tombstone: set when the last member leaves, so an operation that
    /// raced the registry removal observes RoomNotFound instead of mutating
    /// a detached room.
    pub(crate) deleted: bool,
}

impl Room {
    /// Create a room with the given user as host and sole member.
    pub fn new(room_id: String, mut host: Member) -> Self {
        host.is_host = true;
        Self {
            host_id: host.user_id.clone(),
            members: vec![host],
            room_id,
            playback: None,
            sync_in_progress: false,
            ready_acks: HashSet::new(),
            last_sync: None,
            deleted: false,
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn host(&self) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == self.host_id)
    }

    /// Number of acks required to resolve a handshake: all non-host members.
    pub fn expected_acks(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Wire representation: credentials stripped, ack set sorted so repeated
    /// snapshots of the same state serialize identically.
    pub fn snapshot(&self) -> RoomSnapshot {
        let host_name = self
            .host()
            .map(|h| h.display_name.clone())
            .unwrap_or_default();
        let mut ready_acks: Vec<String> = self.ready_acks.iter().cloned().collect();
        ready_acks.sort();

        RoomSnapshot {
            room_id: self.room_id.clone(),
            host_id: self.host_id.clone(),
            host_name,
            members: self.members.iter().map(MemberInfo::from).collect(),
            playback: self.playback.clone(),
            sync_in_progress: self.sync_in_progress,
            ready_acks,
        }
    }
}

/// Public view of a member (no credential).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInfo {
    pub user_id: String,
    pub display_name: String,
    pub is_host: bool,
}

impl From<&Member> for MemberInfo {
    fn from(m: &Member) -> Self {
        Self {
            user_id: m.user_id.clone(),
            display_name: m.display_name.clone(),
            is_host: m.is_host,
        }
    }
}

/// Public view of a room, returned to command callers and embedded in
/// fan-out events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub host_id: String,
    pub host_name: String,
    pub members: Vec<MemberInfo>,
    pub playback: Option<PlaybackSnapshot>,
    pub sync_in_progress: bool,
    pub ready_acks: Vec<String>,
}

/// Result of a leave command.
#[derive(Debug)]
pub enum LeaveOutcome {
    /// Member removed; the room still exists. Carries the snapshot taken
    /// after removal and, when the host left, the promoted member's id.
    Left {
        room: RoomSnapshot,
        promoted_host: Option<String>,
    },
    /// The leaving member was the last one; the room is gone.
    RoomDeleted,
}

/// Handshake progress reported back to a mark_ready caller.
#[derive(Debug, Clone, Serialize)]
pub struct ReadyProgress {
    pub ready_count: usize,
    pub expected: usize,
    pub all_ready: bool,
}
