#![forbid(unsafe_code)]

use partyline_domain::Username;

use crate::tags;

/// Field separator for the text wire protocol.
pub const FIELD_SEPARATOR: char = '|';

/// Typed inbound events recognized by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
	Identify {
		username: Username,
	},
	FriendRequest {
		sender: Username,
		target: Username,
	},
	/// `correlation_id` is a client-chosen token echoed back verbatim so the
	/// client can match the async confirmation to its own action. Empty when
	/// the client omitted it.
	FriendAccept {
		accepter: Username,
		sender: Username,
		correlation_id: String,
	},
	FriendDecline {
		decliner: Username,
		sender: Username,
	},
	/// `content` is rejoined across `|`: the payload may itself contain the
	/// separator.
	FriendMessage {
		sender: Username,
		target: Username,
		content: String,
	},
	FriendCoords {
		sender: Username,
		target: Username,
		x: String,
		y: String,
		z: String,
	},
	PartyCreate {
		leader: Username,
	},
	PartyInvite {
		leader: Username,
		target: Username,
	},
	PartyAccept {
		member: Username,
		leader: Username,
	},
	PartyDecline {
		member: Username,
		leader: Username,
	},
	PartyLeave {
		member: Username,
	},
	PartyKick {
		leader: Username,
		target: Username,
	},
	PartyTransferLeader {
		old_leader: Username,
		new_leader: Username,
	},
	/// Coordinates are forwarded verbatim; the relay never parses them.
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

/// Routing decision for one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
	/// A recognized, structurally valid event.
	Event(ClientEvent),
	/// Unrecognized tag with at least two fields: the undifferentiated chat
	/// channel. The raw frame is relayed verbatim to every other connection;
	/// field 0 doubles as the sender identity for implicit identification.
	Broadcast {
		chat_sender: Username,
	},
	/// Recognized tag with too few fields, or a frame too short to broadcast.
	/// Dropped without feedback to the sender.
	Ignore,
}

impl Dispatch {
	/// Classify a raw frame. Total over (tag, field count): every input maps
	/// to a typed event, the broadcast fallback, or a silent drop.
	pub fn parse(raw: &str) -> Self {
		let parts: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();
		let tag = parts[0];

		if let Some(event) = parse_event(tag, &parts) {
			return Self::Event(event);
		}

		if tags::is_recognized(tag) {
			return Self::Ignore;
		}

		if parts.len() >= 2 {
			return Self::Broadcast {
				chat_sender: parts[0].into(),
			};
		}

		Self::Ignore
	}
}

fn parse_event(tag: &str, parts: &[&str]) -> Option<ClientEvent> {
	let event = match tag {
		tags::IDENTIFY if parts.len() >= 2 => ClientEvent::Identify {
			username: parts[1].into(),
		},
		tags::FRIEND_REQUEST if parts.len() >= 3 => ClientEvent::FriendRequest {
			sender: parts[1].into(),
			target: parts[2].into(),
		},
		tags::FRIEND_ACCEPT if parts.len() >= 3 => ClientEvent::FriendAccept {
			accepter: parts[1].into(),
			sender: parts[2].into(),
			correlation_id: parts.get(3).copied().unwrap_or_default().to_string(),
		},
		tags::FRIEND_DECLINE if parts.len() >= 3 => ClientEvent::FriendDecline {
			decliner: parts[1].into(),
			sender: parts[2].into(),
		},
		tags::FRIEND_MESSAGE if parts.len() >= 4 => ClientEvent::FriendMessage {
			sender: parts[1].into(),
			target: parts[2].into(),
			content: parts[3..].join("|"),
		},
		tags::FRIEND_COORDS if parts.len() >= 6 => ClientEvent::FriendCoords {
			sender: parts[1].into(),
			target: parts[2].into(),
			x: parts[3].to_string(),
			y: parts[4].to_string(),
			z: parts[5].to_string(),
		},
		tags::PARTY_CREATE if parts.len() >= 2 => ClientEvent::PartyCreate {
			leader: parts[1].into(),
		},
		tags::PARTY_INVITE if parts.len() >= 3 => ClientEvent::PartyInvite {
			leader: parts[1].into(),
			target: parts[2].into(),
		},
		tags::PARTY_ACCEPT if parts.len() >= 3 => ClientEvent::PartyAccept {
			member: parts[1].into(),
			leader: parts[2].into(),
		},
		tags::PARTY_DECLINE if parts.len() >= 3 => ClientEvent::PartyDecline {
			member: parts[1].into(),
			leader: parts[2].into(),
		},
		tags::PARTY_LEAVE if parts.len() >= 2 => ClientEvent::PartyLeave {
			member: parts[1].into(),
		},
		tags::PARTY_KICK if parts.len() >= 3 => ClientEvent::PartyKick {
			leader: parts[1].into(),
			target: parts[2].into(),
		},
		tags::PARTY_TRANSFER_LEADER if parts.len() >= 3 => ClientEvent::PartyTransferLeader {
			old_leader: parts[1].into(),
			new_leader: parts[2].into(),
		},
		tags::PARTY_WAYPOINT if parts.len() >= 5 => ClientEvent::PartyWaypoint {
			sender: parts[1].into(),
			x: parts[2].to_string(),
			y: parts[3].to_string(),
			z: parts[4].to_string(),
		},
		tags::PARTY_PLAYER_MARKER if parts.len() >= 4 => ClientEvent::PartyPlayerMarker {
			sender: parts[1].into(),
			target_label: parts[2].to_string(),
			duration_ms: parts[3].to_string(),
		},
		_ => return None,
	};

	Some(event)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identify_parses() {
		let d = Dispatch::parse("IDENTIFY|steve");
		assert_eq!(
			d,
			Dispatch::Event(ClientEvent::Identify {
				username: "steve".into()
			})
		);
	}

	#[test]
	fn identify_without_username_is_ignored() {
		assert_eq!(Dispatch::parse("IDENTIFY"), Dispatch::Ignore);
	}

	#[test]
	fn friend_accept_with_correlation_id() {
		let d = Dispatch::parse("FRIEND_ACCEPT|alex|steve|req-42");
		assert_eq!(
			d,
			Dispatch::Event(ClientEvent::FriendAccept {
				accepter: "alex".into(),
				sender: "steve".into(),
				correlation_id: "req-42".to_string(),
			})
		);
	}

	#[test]
	fn friend_accept_correlation_id_is_optional() {
		let d = Dispatch::parse("FRIEND_ACCEPT|alex|steve");
		assert_eq!(
			d,
			Dispatch::Event(ClientEvent::FriendAccept {
				accepter: "alex".into(),
				sender: "steve".into(),
				correlation_id: String::new(),
			})
		);
	}

	#[test]
	fn friend_message_content_rejoins_separators() {
		let d = Dispatch::parse("FRIEND_MESSAGE|alex|steve|see you|at|spawn");
		assert_eq!(
			d,
			Dispatch::Event(ClientEvent::FriendMessage {
				sender: "alex".into(),
				target: "steve".into(),
				content: "see you|at|spawn".to_string(),
			})
		);
	}

	#[test]
	fn short_recognized_frames_are_ignored_not_broadcast() {
		assert_eq!(Dispatch::parse("FRIEND_REQUEST|alex"), Dispatch::Ignore);
		assert_eq!(Dispatch::parse("PARTY_WAYPOINT|alex|1|2"), Dispatch::Ignore);
		assert_eq!(Dispatch::parse("PARTY_KICK|alex"), Dispatch::Ignore);
	}

	#[test]
	fn unknown_tag_with_two_fields_broadcasts() {
		let d = Dispatch::parse("steve|hello everyone");
		assert_eq!(
			d,
			Dispatch::Broadcast {
				chat_sender: "steve".into()
			}
		);
	}

	#[test]
	fn unknown_tag_with_one_field_is_ignored() {
		assert_eq!(Dispatch::parse("PING"), Dispatch::Ignore);
		assert_eq!(Dispatch::parse(""), Dispatch::Ignore);
	}

	#[test]
	fn party_waypoint_keeps_raw_coordinate_text() {
		let d = Dispatch::parse("PARTY_WAYPOINT|alex|12.50|-64|0.0");
		assert_eq!(
			d,
			Dispatch::Event(ClientEvent::PartyWaypoint {
				sender: "alex".into(),
				x: "12.50".to_string(),
				y: "-64".to_string(),
				z: "0.0".to_string(),
			})
		);
	}
}
