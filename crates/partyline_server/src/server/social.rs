#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use partyline_domain::Username;

/// Undirected friendship edges plus a pending-request queue per target.
///
/// Backed by ordered maps so persisted snapshots serialize deterministically.
/// Edges are written in both directions on acceptance; the symmetry invariant
/// holds because both writes happen in one call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SocialGraph {
	pending: BTreeMap<Username, Vec<Username>>,
	friends: BTreeMap<Username, Vec<Username>>,
}

impl SocialGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Rebuild the store from a persisted snapshot.
	pub fn from_parts(
		pending: BTreeMap<Username, Vec<Username>>,
		friends: BTreeMap<Username, Vec<Username>>,
	) -> Self {
		Self { pending, friends }
	}

	/// Queue a friend request. Returns true when the store changed (the
	/// sender was not already queued for this target).
	pub fn request(&mut self, sender: Username, target: Username) -> bool {
		let queue = self.pending.entry(target).or_default();
		if queue.contains(&sender) {
			return false;
		}
		queue.push(sender);
		true
	}

	/// Accept a request: drop it from the accepter's queue (accepting a
	/// request that was never recorded is not an error) and write the edge in
	/// both directions. The edge list is deduped, so a double-accept leaves
	/// the graph unchanged.
	pub fn accept(&mut self, accepter: &Username, sender: &Username) {
		self.remove_pending(accepter, sender);
		self.link(accepter, sender);
		self.link(sender, accepter);
	}

	/// Decline silently: the request disappears and the sender never hears
	/// back.
	pub fn decline(&mut self, decliner: &Username, sender: &Username) {
		self.remove_pending(decliner, sender);
	}

	/// Requests that accumulated for `target`, oldest first.
	pub fn pending_for(&self, target: &Username) -> &[Username] {
		self.pending.get(target).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn friends_of(&self, user: &Username) -> &[Username] {
		self.friends.get(user).map(Vec::as_slice).unwrap_or_default()
	}

	/// Snapshot accessor used by persistence.
	pub fn pending_map(&self) -> &BTreeMap<Username, Vec<Username>> {
		&self.pending
	}

	/// Snapshot accessor used by persistence.
	pub fn friends_map(&self) -> &BTreeMap<Username, Vec<Username>> {
		&self.friends
	}

	fn link(&mut self, from: &Username, to: &Username) {
		let list = self.friends.entry(from.clone()).or_default();
		if !list.contains(to) {
			list.push(to.clone());
		}
	}

	fn remove_pending(&mut self, target: &Username, sender: &Username) {
		if let Some(queue) = self.pending.get_mut(target)
			&& let Some(idx) = queue.iter().position(|s| s == sender)
		{
			queue.remove(idx);
		}
	}
}
