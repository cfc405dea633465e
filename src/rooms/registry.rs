use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::events::{EventSink, RoomEvent};
use super::model::{LeaveOutcome, Member, ReadyProgress, Room, RoomSnapshot};
use super::RoomError;
use crate::spotify::PlaybackProvider;

/// In-memory room registry.
///
/// The DashMap gives concurrent lookup across rooms; every room carries its
/// own async Mutex, so all mutations on one room serialize while operations
/// on different rooms never contend. `request_sync` holds the room lock
/// across the provider call: concurrent sync requests on the same room
/// serialize too, and no partially-applied sync state is ever observable.
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Mutex<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    fn room(&self, room_id: &str) -> Result<Arc<Mutex<Room>>, RoomError> {
        self.rooms
            .get(room_id)
            .map(|entry| entry.value().clone())
            .ok_or(RoomError::RoomNotFound)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Create a room with the given user as host and sole member.
    pub fn create_room(&self, host: Member) -> (String, RoomSnapshot) {
        let room_id = Uuid::new_v4().to_string();
        let room = Room::new(room_id.clone(), host);
        let snapshot = room.snapshot();
        self.rooms
            .insert(room_id.clone(), Arc::new(Mutex::new(room)));
        (room_id, snapshot)
    }

    pub async fn snapshot(&self, room_id: &str) -> Result<RoomSnapshot, RoomError> {
        let room = self.room(room_id)?;
        let room = room.lock().await;
        if room.deleted {
            return Err(RoomError::RoomNotFound);
        }
        Ok(room.snapshot())
    }

    /// Add a member (always as non-host) and notify the room topic.
    pub async fn join(
        &self,
        room_id: &str,
        mut member: Member,
        events: &dyn EventSink,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self.room(room_id)?;
        let mut room = room.lock().await;
        if room.deleted {
            return Err(RoomError::RoomNotFound);
        }
        if room.is_member(&member.user_id) {
            return Err(RoomError::AlreadyMember);
        }

        member.is_host = false;
        let user = super::model::MemberInfo::from(&member);
        room.members.push(member);

        let snapshot = room.snapshot();
        events.publish(
            room_id,
            &RoomEvent::UserJoined {
                user,
                room: snapshot.clone(),
            },
        );
        Ok(snapshot)
    }

    /// Remove a member.
    ///
    /// A departing host hands the role to the first remaining member in
    /// insertion order; a departing sole member deletes the room. A
    /// handshake in progress is re-checked afterwards, since the leaver may
    /// have been the only joiner whose ack was still missing.
    pub async fn leave(
        &self,
        room_id: &str,
        user_id: &str,
        events: &dyn EventSink,
    ) -> Result<LeaveOutcome, RoomError> {
        let room = self.room(room_id)?;
        let mut room = room.lock().await;
        if room.deleted {
            return Err(RoomError::RoomNotFound);
        }
        let idx = room
            .members
            .iter()
            .position(|m| m.user_id == user_id)
            .ok_or(RoomError::NotInRoom)?;

        let leaver = room.members.remove(idx);
        room.ready_acks.remove(user_id);

        if room.members.is_empty() {
            room.deleted = true;
            self.rooms.remove(room_id);
            events.publish(
                room_id,
                &RoomEvent::RoomDeleted {
                    room_id: room_id.to_string(),
                },
            );
            tracing::info!(room_id = %room_id, "Last member left, room deleted");
            return Ok(LeaveOutcome::RoomDeleted);
        }

        let mut promoted_host = None;
        if leaver.is_host {
            room.members[0].is_host = true;
            let new_host_id = room.members[0].user_id.clone();
            // The promoted member is no longer a joiner; its pending ack
            // would violate the joiners-only ack set.
            room.ready_acks.remove(&new_host_id);
            room.host_id = new_host_id.clone();
            promoted_host = Some(new_host_id);
        }

        let snapshot = room.snapshot();
        events.publish(
            room_id,
            &RoomEvent::UserLeft {
                user_id: user_id.to_string(),
                room: snapshot.clone(),
            },
        );

        self.check_quorum(&mut room, events);

        Ok(LeaveOutcome::Left {
            room: snapshot,
            promoted_host,
        })
    }

    /// Move the host role to another member. Idempotent when the target is
    /// already the host (the event still fires).
    pub async fn transfer_host(
        &self,
        room_id: &str,
        new_host_id: &str,
        events: &dyn EventSink,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self.room(room_id)?;
        let mut room = room.lock().await;
        if room.deleted {
            return Err(RoomError::RoomNotFound);
        }
        if !room.is_member(new_host_id) {
            return Err(RoomError::NotInRoom);
        }

        let old_host_id = room.host_id.clone();
        for m in room.members.iter_mut() {
            m.is_host = m.user_id == new_host_id;
        }
        room.host_id = new_host_id.to_string();
        // The new host's pending ack would violate the joiners-only ack set.
        room.ready_acks.remove(new_host_id);

        let snapshot = room.snapshot();
        events.publish(
            room_id,
            &RoomEvent::HostTransferred {
                old_host_id,
                new_host_id: new_host_id.to_string(),
                room: snapshot.clone(),
            },
        );
        Ok(snapshot)
    }

    /// Fetch the host's current playback from the provider and start a
    /// readiness handshake.
    ///
    /// Re-entrant: a request while a handshake is already in progress
    /// discards prior acks and restarts it (last-request-wins). On provider
    /// failure the room is left exactly as it was: no snapshot stored, no
    /// handshake started.
    pub async fn request_sync(
        &self,
        room_id: &str,
        provider: &dyn PlaybackProvider,
        events: &dyn EventSink,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self.room(room_id)?;
        let mut room = room.lock().await;
        if room.deleted {
            return Err(RoomError::RoomNotFound);
        }
        let credential = room
            .host()
            .and_then(|h| h.credential.clone())
            .ok_or_else(|| {
                RoomError::InvalidRequest("Host has no playback credential".to_string())
            })?;

        let playback = provider.current_playback(&credential).await?;

        // No active playback keeps the previous snapshot; the handshake
        // still starts so joiners re-align to whatever is stored.
        if playback.is_some() {
            room.playback = playback;
        }
        room.sync_in_progress = true;
        room.ready_acks.clear();
        room.last_sync = Some(Utc::now());

        let snapshot = room.snapshot();
        events.publish(
            room_id,
            &RoomEvent::SyncRequested {
                playback: room.playback.clone(),
                room: snapshot.clone(),
            },
        );
        tracing::debug!(room_id = %room_id, expected = room.expected_acks(), "Sync handshake started");
        Ok(snapshot)
    }

    /// Record a joiner's readiness ack. Idempotent: a repeated ack from the
    /// same user changes nothing. Resolves the handshake once every joiner
    /// has acked.
    ///
    /// Acks from the host are ignored rather than rejected, so a room with
    /// no joiners can never resolve vacuously. Outside a handshake this is a
    /// no-op that just reports current progress.
    pub async fn mark_ready(
        &self,
        room_id: &str,
        user_id: &str,
        events: &dyn EventSink,
    ) -> Result<ReadyProgress, RoomError> {
        let room = self.room(room_id)?;
        let mut room = room.lock().await;
        if room.deleted {
            return Err(RoomError::RoomNotFound);
        }
        if !room.is_member(user_id) {
            return Err(RoomError::NotInRoom);
        }

        let joiner_ack = room.sync_in_progress && user_id != room.host_id;
        if joiner_ack {
            room.ready_acks.insert(user_id.to_string());
        }

        let ready_count = room.ready_acks.len();
        let expected = room.expected_acks();
        let all_ready = if joiner_ack {
            self.check_quorum(&mut room, events)
        } else {
            false
        };

        Ok(ReadyProgress {
            ready_count,
            expected,
            all_ready,
        })
    }

    /// Resolve the handshake if every current joiner has acked. Returns
    /// whether it resolved. Never resolves when there are no joiners: with
    /// nothing to synchronize, the handshake stays pending until a fresh
    /// request or a membership change.
    fn check_quorum(&self, room: &mut Room, events: &dyn EventSink) -> bool {
        if !room.sync_in_progress {
            return false;
        }
        let expected = room.expected_acks();
        if expected == 0 || room.ready_acks.len() < expected {
            return false;
        }

        room.sync_in_progress = false;
        room.ready_acks.clear();
        events.publish(
            &room.room_id.clone(),
            &RoomEvent::AllReady {
                playback: room.playback.clone(),
                room: room.snapshot(),
            },
        );
        tracing::debug!(room_id = %room.room_id, "Sync handshake resolved");
        true
    }
}
