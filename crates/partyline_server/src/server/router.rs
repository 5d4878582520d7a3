#![forbid(unsafe_code)]

use std::sync::Arc;

use partyline_domain::Username;
use partyline_protocol::{ClientEvent, Dispatch, ServerFrame};
use tracing::{debug, info, warn};

use crate::server::party::LeaveOutcome;
use crate::server::registry::ConnId;
use crate::server::social::SocialGraph;
use crate::server::state::GlobalState;

/// Route one inbound frame.
///
/// `identity` is the connection's identity slot: assigned on the first
/// IDENTIFY or first chat-relay frame (whichever comes first) and immutable
/// afterwards. The router itself owns no state.
pub async fn handle_frame(state: &Arc<GlobalState>, conn_id: ConnId, identity: &mut Option<Username>, raw: &str) {
	metrics::counter!("partyline_server_frames_total").increment(1);

	match Dispatch::parse(raw) {
		Dispatch::Ignore => {
			debug!(conn_id, frame = raw, "dropping malformed frame");
		}
		Dispatch::Broadcast { chat_sender } => {
			if identity.is_none() {
				identify(state, conn_id, identity, chat_sender).await;
			}
			let delivered = state.registry.lock().await.broadcast_except(conn_id, raw);
			metrics::counter!("partyline_server_broadcasts_total").increment(1);
			debug!(conn_id, delivered, "relayed chat frame");
		}
		Dispatch::Event(event) => handle_event(state, conn_id, identity, event).await,
	}
}

/// Transport-level close or error: identical cleanup either way.
pub async fn handle_disconnect(state: &Arc<GlobalState>, conn_id: ConnId, identity: Option<Username>) {
	let owned = {
		let mut registry = state.registry.lock().await;
		registry.remove_conn(conn_id);
		match &identity {
			Some(name) => registry.unregister_if_owner(name, conn_id),
			None => false,
		}
	};

	let Some(name) = identity else {
		debug!(conn_id, "unidentified connection closed");
		return;
	};
	info!(user = %name, conn_id, "disconnected");

	// Presence fan-out only while this connection still owned the identity;
	// a displaced session means the user is still online elsewhere.
	if !owned {
		return;
	}

	let friends = state.social.lock().await.friends_of(&name).to_vec();
	let registry = state.registry.lock().await;
	for friend in friends {
		if registry.is_online(&friend) {
			registry.send(
				&friend,
				ServerFrame::FriendStatus {
					username: name.clone(),
					online: false,
				}
				.encode(),
			);
		}
	}
}

async fn handle_event(state: &Arc<GlobalState>, conn_id: ConnId, identity: &mut Option<Username>, event: ClientEvent) {
	match event {
		ClientEvent::Identify { username } => identify(state, conn_id, identity, username).await,
		ClientEvent::FriendRequest { sender, target } => friend_request(state, sender, target).await,
		ClientEvent::FriendAccept {
			accepter,
			sender,
			correlation_id,
		} => friend_accept(state, accepter, sender, correlation_id).await,
		ClientEvent::FriendDecline { decliner, sender } => friend_decline(state, decliner, sender).await,
		ClientEvent::FriendMessage { sender, target, content } => {
			friend_message(state, sender, target, content).await;
		}
		ClientEvent::FriendCoords { sender, target, x, y, z } => {
			// Coordinates travel as a plain friend message; that is what the
			// game client renders.
			let content = format!("Coordinates: {x}, {y}, {z}");
			friend_message(state, sender, target, content).await;
		}
		ClientEvent::PartyCreate { leader } => {
			state.parties.lock().await.create(leader.clone());
			info!(leader = %leader, "party created");
		}
		ClientEvent::PartyInvite { leader, target } => party_invite(state, leader, target).await,
		ClientEvent::PartyAccept { member, leader } => party_accept(state, member, leader).await,
		ClientEvent::PartyDecline { member, leader } => {
			state
				.registry
				.lock()
				.await
				.send(&leader, ServerFrame::PartyDecline { member }.encode());
		}
		ClientEvent::PartyLeave { member } => party_leave(state, member).await,
		ClientEvent::PartyKick { leader, target } => party_kick(state, leader, target).await,
		ClientEvent::PartyTransferLeader { old_leader, new_leader } => {
			party_transfer(state, old_leader, new_leader).await;
		}
		ClientEvent::PartyWaypoint { sender, x, y, z } => {
			let frame = ServerFrame::PartyWaypoint {
				sender: sender.clone(),
				x,
				y,
				z,
			};
			party_fan_out(state, &sender, frame).await;
		}
		ClientEvent::PartyPlayerMarker {
			sender,
			target_label,
			duration_ms,
		} => {
			let frame = ServerFrame::PartyPlayerMarker {
				sender: sender.clone(),
				target_label,
				duration_ms,
			};
			party_fan_out(state, &sender, frame).await;
		}
	}
}

/// First identification wins; later attempts are no-ops for this connection.
async fn identify(state: &Arc<GlobalState>, conn_id: ConnId, identity: &mut Option<Username>, username: Username) {
	if identity.is_some() {
		return;
	}
	*identity = Some(username.clone());

	state.registry.lock().await.register(username.clone(), conn_id);
	info!(user = %username, conn_id, "identified");

	let (pending, friends) = {
		let social = state.social.lock().await;
		(
			social.pending_for(&username).to_vec(),
			social.friends_of(&username).to_vec(),
		)
	};

	let registry = state.registry.lock().await;

	if !pending.is_empty() {
		debug!(user = %username, count = pending.len(), "flushing pending friend requests");
	}
	for sender in pending {
		registry.send(&username, ServerFrame::FriendRequest { sender }.encode());
	}

	// Presence fan-out: tell online friends this user arrived, and tell the
	// user which friends are already online.
	for friend in friends {
		if registry.is_online(&friend) {
			registry.send(
				&friend,
				ServerFrame::FriendStatus {
					username: username.clone(),
					online: true,
				}
				.encode(),
			);
			registry.send(
				&username,
				ServerFrame::FriendStatus {
					username: friend.clone(),
					online: true,
				}
				.encode(),
			);
		}
	}
}

/// Mirror the social graph to disk. Failures are logged; memory stays
/// authoritative.
fn persist(state: &GlobalState, graph: &SocialGraph) {
	if let Err(e) = state.graph_file.save(graph) {
		warn!(error = %e, path = %state.graph_file.path().display(), "failed to persist social graph");
	}
}

async fn friend_request(state: &Arc<GlobalState>, sender: Username, target: Username) {
	{
		let mut social = state.social.lock().await;
		if social.request(sender.clone(), target.clone()) {
			persist(state, &social);
		}
	}

	// The notification is attempted whether or not the queue changed; only
	// reachability decides delivery.
	let delivered = state
		.registry
		.lock()
		.await
		.send(&target, ServerFrame::FriendRequest { sender: sender.clone() }.encode());
	if delivered {
		debug!(sender = %sender, target = %target, "friend request delivered");
	} else {
		debug!(sender = %sender, target = %target, "target offline, friend request queued");
	}
}

async fn friend_accept(state: &Arc<GlobalState>, accepter: Username, sender: Username, correlation_id: String) {
	{
		let mut social = state.social.lock().await;
		social.accept(&accepter, &sender);
		persist(state, &social);
	}
	info!(accepter = %accepter, sender = %sender, "friend request accepted");

	let registry = state.registry.lock().await;
	registry.send(
		&sender,
		ServerFrame::FriendAccept {
			peer: accepter.clone(),
			correlation_id: correlation_id.clone(),
		}
		.encode(),
	);
	registry.send(
		&accepter,
		ServerFrame::FriendAccept {
			peer: sender,
			correlation_id,
		}
		.encode(),
	);
}

async fn friend_decline(state: &Arc<GlobalState>, decliner: Username, sender: Username) {
	let mut social = state.social.lock().await;
	social.decline(&decliner, &sender);
	persist(state, &social);
	debug!(decliner = %decliner, sender = %sender, "friend request declined");
}

async fn friend_message(state: &Arc<GlobalState>, sender: Username, target: Username, content: String) {
	state
		.registry
		.lock()
		.await
		.send(&target, ServerFrame::FriendMessage { sender, content }.encode());
}

async fn party_invite(state: &Arc<GlobalState>, leader: Username, target: Username) {
	if !state.parties.lock().await.exists(&leader) {
		debug!(leader = %leader, "invite for nonexistent party dropped");
		return;
	}
	state
		.registry
		.lock()
		.await
		.send(&target, ServerFrame::PartyInvite { leader }.encode());
}

async fn party_accept(state: &Arc<GlobalState>, member: Username, leader: Username) {
	let Some(prior) = state.parties.lock().await.accept(member.clone(), &leader) else {
		debug!(member = %member, leader = %leader, "accept for nonexistent party dropped");
		return;
	};
	info!(member = %member, leader = %leader, "joined party");

	let registry = state.registry.lock().await;
	for existing in prior {
		if existing == leader {
			registry.send(&existing, ServerFrame::PartyAccept { member: member.clone() }.encode());
		} else {
			registry.send(
				&existing,
				ServerFrame::PartyMemberJoin { member: member.clone() }.encode(),
			);
		}
	}
}

async fn party_leave(state: &Arc<GlobalState>, member: Username) {
	match state.parties.lock().await.leave(&member) {
		None => {
			debug!(member = %member, "leave ignored, not in any party");
		}
		Some(LeaveOutcome::Disbanded { leader, remaining }) => {
			info!(leader = %leader, "party disbanded");
			let frame = ServerFrame::PartyDisband { leader }.encode();
			let registry = state.registry.lock().await;
			for m in remaining {
				registry.send(&m, frame.clone());
			}
		}
		Some(LeaveOutcome::Left { remaining }) => {
			let frame = ServerFrame::PartyLeave { member }.encode();
			let registry = state.registry.lock().await;
			for m in remaining {
				registry.send(&m, frame.clone());
			}
		}
	}
}

async fn party_kick(state: &Arc<GlobalState>, leader: Username, target: Username) {
	let Some(remaining) = state.parties.lock().await.kick(&leader, &target) else {
		debug!(leader = %leader, target = %target, "kick dropped, no matching party member");
		return;
	};
	info!(leader = %leader, target = %target, "kicked from party");

	let frame = ServerFrame::PartyKick { target: target.clone() }.encode();
	let registry = state.registry.lock().await;
	registry.send(&target, frame.clone());
	for m in remaining {
		registry.send(&m, frame.clone());
	}
}

async fn party_transfer(state: &Arc<GlobalState>, old_leader: Username, new_leader: Username) {
	let Some(roster) = state.parties.lock().await.transfer(&old_leader, &new_leader) else {
		debug!(old_leader = %old_leader, new_leader = %new_leader, "transfer dropped, not a member or no party");
		return;
	};
	info!(old_leader = %old_leader, new_leader = %new_leader, "party leadership transferred");

	let frame = ServerFrame::PartyTransferLeader { new_leader }.encode();
	let registry = state.registry.lock().await;
	for m in roster {
		registry.send(&m, frame.clone());
	}
}

async fn party_fan_out(state: &Arc<GlobalState>, sender: &Username, frame: ServerFrame) {
	let Some(targets) = state.parties.lock().await.broadcast_targets(sender) else {
		return;
	};
	let frame = frame.encode();
	let registry = state.registry.lock().await;
	for m in targets {
		registry.send(&m, frame.clone());
	}
}
