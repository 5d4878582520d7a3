use partyline_protocol::{ClientEvent, Dispatch, ServerFrame, tags};

#[test]
fn every_inbound_tag_dispatches_to_its_handler() {
	let cases = [
		"IDENTIFY|steve",
		"FRIEND_REQUEST|alex|steve",
		"FRIEND_ACCEPT|alex|steve|req-1",
		"FRIEND_DECLINE|alex|steve",
		"FRIEND_MESSAGE|alex|steve|hi",
		"FRIEND_COORDS|alex|steve|1|2|3",
		"PARTY_CREATE|alex",
		"PARTY_INVITE|alex|steve",
		"PARTY_ACCEPT|steve|alex",
		"PARTY_DECLINE|steve|alex",
		"PARTY_LEAVE|steve",
		"PARTY_KICK|alex|steve",
		"PARTY_TRANSFER_LEADER|alex|steve",
		"PARTY_WAYPOINT|alex|1|2|3",
		"PARTY_PLAYER_MARKER|alex|steve|5000",
	];

	for raw in cases {
		match Dispatch::parse(raw) {
			Dispatch::Event(_) => {}
			other => panic!("expected Event for {raw:?}, got {other:?}"),
		}
	}
}

#[test]
fn recognized_tag_with_missing_fields_never_broadcasts() {
	for raw in [
		"IDENTIFY",
		"FRIEND_REQUEST|alex",
		"FRIEND_ACCEPT|alex",
		"FRIEND_DECLINE|alex",
		"FRIEND_MESSAGE|alex|steve",
		"FRIEND_COORDS|alex|steve|1|2",
		"PARTY_CREATE",
		"PARTY_INVITE|alex",
		"PARTY_ACCEPT|steve",
		"PARTY_DECLINE|steve",
		"PARTY_LEAVE",
		"PARTY_KICK|alex",
		"PARTY_TRANSFER_LEADER|alex",
		"PARTY_WAYPOINT|alex|1|2",
		"PARTY_PLAYER_MARKER|alex|steve",
	] {
		assert_eq!(Dispatch::parse(raw), Dispatch::Ignore, "frame: {raw:?}");
	}
}

#[test]
fn chat_fallback_carries_the_sender_identity() {
	match Dispatch::parse("steve|hello|there") {
		Dispatch::Broadcast { chat_sender } => assert_eq!(chat_sender.as_str(), "steve"),
		other => panic!("expected Broadcast, got {other:?}"),
	}
}

#[test]
fn friend_coords_requires_all_three_axes() {
	match Dispatch::parse("FRIEND_COORDS|alex|steve|100|64|-200") {
		Dispatch::Event(ClientEvent::FriendCoords { x, y, z, .. }) => {
			assert_eq!((x.as_str(), y.as_str(), z.as_str()), ("100", "64", "-200"));
		}
		other => panic!("expected FriendCoords, got {other:?}"),
	}
}

#[test]
fn outbound_frames_reparse_as_their_wire_tag() {
	// Outbound frames are consumed by game clients, not by this server, but
	// every encoded frame must put its tag in field 0 like any other frame.
	let frames = [
		ServerFrame::FriendRequest { sender: "alex".into() },
		ServerFrame::FriendAccept {
			peer: "alex".into(),
			correlation_id: "c1".to_string(),
		},
		ServerFrame::FriendStatus {
			username: "alex".into(),
			online: true,
		},
		ServerFrame::FriendMessage {
			sender: "alex".into(),
			content: "hi".to_string(),
		},
		ServerFrame::PartyInvite { leader: "alex".into() },
		ServerFrame::PartyAccept { member: "alex".into() },
		ServerFrame::PartyMemberJoin { member: "alex".into() },
		ServerFrame::PartyDecline { member: "alex".into() },
		ServerFrame::PartyLeave { member: "alex".into() },
		ServerFrame::PartyDisband { leader: "alex".into() },
		ServerFrame::PartyKick { target: "alex".into() },
		ServerFrame::PartyTransferLeader { new_leader: "alex".into() },
		ServerFrame::PartyWaypoint {
			sender: "alex".into(),
			x: "1".to_string(),
			y: "2".to_string(),
			z: "3".to_string(),
		},
		ServerFrame::PartyPlayerMarker {
			sender: "alex".into(),
			target_label: "steve".to_string(),
			duration_ms: "5000".to_string(),
		},
	];

	let expected_tags = [
		tags::FRIEND_REQUEST,
		tags::FRIEND_ACCEPT,
		tags::FRIEND_STATUS,
		tags::FRIEND_MESSAGE,
		tags::PARTY_INVITE,
		tags::PARTY_ACCEPT,
		tags::PARTY_MEMBER_JOIN,
		tags::PARTY_DECLINE,
		tags::PARTY_LEAVE,
		tags::PARTY_DISBAND,
		tags::PARTY_KICK,
		tags::PARTY_TRANSFER_LEADER,
		tags::PARTY_WAYPOINT,
		tags::PARTY_PLAYER_MARKER,
	];

	for (frame, tag) in frames.iter().zip(expected_tags) {
		let encoded = frame.encode();
		let field0 = encoded.split('|').next().unwrap_or_default();
		assert_eq!(field0, tag, "frame: {encoded:?}");
	}
}

#[test]
fn display_matches_encode() {
	let frame = ServerFrame::PartyDisband { leader: "alex".into() };
	assert_eq!(frame.to_string(), frame.encode());
}
