//! Room registry
//!
//! The one piece of shared mutable state in the relay: room name → room.
//! Every read and write goes through a single `Mutex`. Outbound writes
//! never happen while it is held; callers take a snapshot of the members
//! they need and send after the guard is dropped.
//!
//! `room_names`, `member_names`, `contains_room`, `room_count` and
//! `member_count` are a read-only inspection API for embedders and tests;
//! the session loop itself only joins, leaves and broadcasts.

use std::collections::BTreeMap;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::Member;
use crate::message::ServerLine;
use crate::room::Room;
use crate::types::ClientId;

/// Shared registry of active rooms
///
/// A room is present if and only if it has at least one member. Rooms are
/// kept in a `BTreeMap` so the `Rooms:` listing is ordered by name.
#[derive(Debug, Default)]
pub struct Registry {
    rooms: Mutex<BTreeMap<String, Room>>,
}

/// Presence state captured under the registry lock after a join or leave
#[derive(Debug, Clone)]
pub struct PresenceSnapshot {
    /// Room the join/leave happened in
    pub room: String,
    /// Every active room name
    pub room_names: Vec<String>,
    /// Every registered member across all rooms
    pub everyone: Vec<Member>,
    /// Members of `room` after the change, in join order
    pub room_members: Vec<Member>,
}

impl PresenceSnapshot {
    fn capture(rooms: &BTreeMap<String, Room>, room_name: &str) -> Self {
        let room_members = rooms
            .get(room_name)
            .map(|room| room.members().cloned().collect())
            .unwrap_or_default();

        Self {
            room: room_name.to_string(),
            room_names: rooms.keys().cloned().collect(),
            everyone: rooms.values().flat_map(|r| r.members().cloned()).collect(),
            room_members,
        }
    }

    /// Display names in the affected room, in join order
    pub fn member_names(&self) -> Vec<String> {
        self.room_members
            .iter()
            .map(|m| m.display_name.clone())
            .collect()
    }

    /// Deliver the room roster to everyone, then the member roster and
    /// `notice` to the affected room.
    ///
    /// If the room no longer exists only the room roster is sent.
    /// Presence lines never wait on a full queue: that member misses them.
    pub fn announce(&self, notice: ServerLine) {
        notify(&self.everyone, &ServerLine::Rooms(self.room_names.clone()));

        if self.room_members.is_empty() {
            return;
        }

        notify(&self.room_members, &ServerLine::Users(self.member_names()));
        notify(&self.room_members, &notice);
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member to a room, creating the room if absent
    pub async fn join(&self, room_name: &str, member: Member) -> PresenceSnapshot {
        let mut rooms = self.rooms.lock().await;

        debug!("{} ({}) joining '{}'", member.display_name, member.id, room_name);
        let room = rooms.entry(room_name.to_string()).or_insert_with(|| {
            info!("Room '{}' created", room_name);
            Room::new(room_name)
        });
        room.add_member(member);

        PresenceSnapshot::capture(&rooms, room_name)
    }

    /// Remove a connection from a room, deleting the room if it empties
    ///
    /// Returns None if the connection was not registered in that room.
    pub async fn leave(&self, room_name: &str, client_id: ClientId) -> Option<PresenceSnapshot> {
        let mut rooms = self.rooms.lock().await;

        let room = rooms.get_mut(room_name)?;
        let removed = room.remove_member(client_id)?;
        debug!("{} ({}) left '{}'", removed.display_name, client_id, room_name);

        if room.is_empty() {
            rooms.remove(room_name);
            info!("Room '{}' deleted (empty)", room_name);
        }

        Some(PresenceSnapshot::capture(&rooms, room_name))
    }

    /// Snapshot of a room's members in join order
    pub async fn room_members(&self, room_name: &str) -> Vec<Member> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_name)
            .map(|room| room.members().cloned().collect())
            .unwrap_or_default()
    }

    /// Display names currently in a room, in join order
    pub async fn member_names(&self, room_name: &str) -> Vec<String> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_name)
            .map(Room::member_names)
            .unwrap_or_default()
    }

    /// Active room names in ascending order
    pub async fn room_names(&self) -> Vec<String> {
        self.rooms.lock().await.keys().cloned().collect()
    }

    pub async fn contains_room(&self, room_name: &str) -> bool {
        self.rooms.lock().await.contains_key(room_name)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Total members across all rooms
    pub async fn member_count(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.values().map(Room::member_count).sum()
    }

    /// Send a line to every member of a room, sender included
    ///
    /// Returns how many members the line was queued for.
    pub async fn broadcast(&self, room_name: &str, line: &ServerLine) -> usize {
        let members = self.room_members(room_name).await;
        deliver(&members, line).await
    }
}

/// Send `line` to each member in turn
///
/// A closed member is logged and skipped; the rest still receive the line.
pub async fn deliver(members: &[Member], line: &ServerLine) -> usize {
    let mut delivered = 0;
    for member in members {
        match member.send(line.clone()).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!(
                    "Skipping {} ({}) during broadcast: {}",
                    member.display_name, member.id, e
                );
            }
        }
    }
    delivered
}

/// Queue `line` for each member without waiting
///
/// Members whose queue is full or closed are logged and skipped.
pub fn notify(members: &[Member], line: &ServerLine) -> usize {
    let mut delivered = 0;
    for member in members {
        match member.try_send(line.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!(
                    "Skipping {} ({}) for presence update: {}",
                    member.display_name, member.id, e
                );
            }
        }
    }
    delivered
}
