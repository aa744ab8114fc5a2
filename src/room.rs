//! Room struct definition
//!
//! Represents a named chat room holding its members in join order.

use crate::client::Member;
use crate::types::ClientId;

/// Named chat room
///
/// Rooms have no capacity limit. A room only lives in the registry
/// while it has at least one member.
#[derive(Debug)]
pub struct Room {
    /// Room name as supplied by the first member
    pub name: String,
    /// Members in join order
    members: Vec<Member>,
}

impl Room {
    /// Create an empty room with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Append a member to the end of the roster
    pub fn add_member(&mut self, member: Member) {
        self.members.push(member);
    }

    /// Remove the member with the given connection ID
    ///
    /// Returns the removed member, or None if it was not in the room.
    pub fn remove_member(&mut self, client_id: ClientId) -> Option<Member> {
        let index = self.members.iter().position(|m| m.id == client_id)?;
        Some(self.members.remove(index))
    }

    #[cfg(test)]
    fn contains(&self, client_id: ClientId) -> bool {
        self.members.iter().any(|m| m.id == client_id)
    }

    /// Check if the room has no members left
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Display names in join order
    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.display_name.clone()).collect()
    }

    /// Iterate members in join order
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }
}
