#![forbid(unsafe_code)]

pub mod event;
pub mod frame;

pub use event::{ClientEvent, Dispatch, FIELD_SEPARATOR};
pub use frame::ServerFrame;

/// Wire tag constants (field 0 of every frame).
pub mod tags {
	pub const IDENTIFY: &str = "IDENTIFY";

	pub const FRIEND_REQUEST: &str = "FRIEND_REQUEST";
	pub const FRIEND_ACCEPT: &str = "FRIEND_ACCEPT";
	pub const FRIEND_DECLINE: &str = "FRIEND_DECLINE";
	pub const FRIEND_MESSAGE: &str = "FRIEND_MESSAGE";
	pub const FRIEND_COORDS: &str = "FRIEND_COORDS";
	/// Outbound only: presence change fan-out to friends.
	pub const FRIEND_STATUS: &str = "FRIEND_STATUS";

	pub const PARTY_CREATE: &str = "PARTY_CREATE";
	pub const PARTY_INVITE: &str = "PARTY_INVITE";
	pub const PARTY_ACCEPT: &str = "PARTY_ACCEPT";
	/// Outbound only: join notification to pre-existing members.
	pub const PARTY_MEMBER_JOIN: &str = "PARTY_MEMBER_JOIN";
	pub const PARTY_DECLINE: &str = "PARTY_DECLINE";
	pub const PARTY_LEAVE: &str = "PARTY_LEAVE";
	/// Outbound only: sent to remaining members when the leader leaves.
	pub const PARTY_DISBAND: &str = "PARTY_DISBAND";
	pub const PARTY_KICK: &str = "PARTY_KICK";
	pub const PARTY_TRANSFER_LEADER: &str = "PARTY_TRANSFER_LEADER";
	pub const PARTY_WAYPOINT: &str = "PARTY_WAYPOINT";
	pub const PARTY_PLAYER_MARKER: &str = "PARTY_PLAYER_MARKER";

	/// Inbound tags with a dedicated handler. A frame whose tag is not listed
	/// here falls through to the chat broadcast path when it carries at least
	/// two fields.
	pub fn is_recognized(tag: &str) -> bool {
		matches!(
			tag,
			IDENTIFY
				| FRIEND_REQUEST | FRIEND_ACCEPT
				| FRIEND_DECLINE | FRIEND_MESSAGE
				| FRIEND_COORDS | PARTY_CREATE
				| PARTY_INVITE | PARTY_ACCEPT
				| PARTY_DECLINE | PARTY_LEAVE
				| PARTY_KICK | PARTY_TRANSFER_LEADER
				| PARTY_WAYPOINT | PARTY_PLAYER_MARKER
		)
	}
}
