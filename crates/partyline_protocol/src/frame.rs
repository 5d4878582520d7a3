#![forbid(unsafe_code)]

use core::fmt;

use partyline_domain::Username;

use crate::tags;

/// Outbound frames produced by the router.
///
/// Field order and trailing `|` artifacts are part of the protocol; connected
/// game clients parse these byte-for-byte, so encoding never normalizes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
	FriendRequest {
		sender: Username,
	},
	/// `peer` is the other side of the new edge from the recipient's point of
	/// view; the trailing `online|` is a protocol artifact kept for client
	/// compatibility.
	FriendAccept {
		peer: Username,
		correlation_id: String,
	},
	FriendStatus {
		username: Username,
		online: bool,
	},
	FriendMessage {
		sender: Username,
		content: String,
	},
	PartyInvite {
		leader: Username,
	},
	/// Sent to the leader when a member joins.
	PartyAccept {
		member: Username,
	},
	/// Sent to pre-existing non-leader members when a member joins.
	PartyMemberJoin {
		member: Username,
	},
	PartyDecline {
		member: Username,
	},
	PartyLeave {
		member: Username,
	},
	PartyDisband {
		leader: Username,
	},
	PartyKick {
		target: Username,
	},
	PartyTransferLeader {
		new_leader: Username,
	},
	PartyWaypoint {
		sender: Username,
		x: String,
		y: String,
		z: String,
	},
	PartyPlayerMarker {
		sender: Username,
		target_label: String,
		duration_ms: String,
	},
}

impl ServerFrame {
	/// Encode to the wire representation.
	pub fn encode(&self) -> String {
		match self {
			Self::FriendRequest { sender } => format!("{}|{sender}", tags::FRIEND_REQUEST),
			Self::FriendAccept { peer, correlation_id } => {
				format!("{}|{peer}|{correlation_id}|online|", tags::FRIEND_ACCEPT)
			}
			Self::FriendStatus { username, online } => {
				let status = if *online { "online" } else { "offline" };
				format!("{}|{username}|{status}|", tags::FRIEND_STATUS)
			}
			Self::FriendMessage { sender, content } => {
				format!("{}|{sender}|{content}", tags::FRIEND_MESSAGE)
			}
			Self::PartyInvite { leader } => format!("{}|{leader}", tags::PARTY_INVITE),
			Self::PartyAccept { member } => format!("{}|{member}", tags::PARTY_ACCEPT),
			Self::PartyMemberJoin { member } => format!("{}|{member}", tags::PARTY_MEMBER_JOIN),
			Self::PartyDecline { member } => format!("{}|{member}", tags::PARTY_DECLINE),
			Self::PartyLeave { member } => format!("{}|{member}", tags::PARTY_LEAVE),
			Self::PartyDisband { leader } => format!("{}|{leader}", tags::PARTY_DISBAND),
			Self::PartyKick { target } => format!("{}|{target}", tags::PARTY_KICK),
			Self::PartyTransferLeader { new_leader } => {
				format!("{}|{new_leader}", tags::PARTY_TRANSFER_LEADER)
			}
			Self::PartyWaypoint { sender, x, y, z } => {
				format!("{}|{sender}|{x}|{y}|{z}", tags::PARTY_WAYPOINT)
			}
			Self::PartyPlayerMarker {
				sender,
				target_label,
				duration_ms,
			} => format!("{}|{sender}|{target_label}|{duration_ms}", tags::PARTY_PLAYER_MARKER),
		}
	}
}

impl fmt::Display for ServerFrame {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.encode())
	}
}
