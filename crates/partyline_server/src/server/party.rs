#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use partyline_domain::Username;

/// What `leave` did, so the router can notify the right recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
	/// The leader left: the party is gone and every remaining member is told.
	Disbanded {
		leader: Username,
		remaining: Vec<Username>,
	},
	/// A regular member left; the remaining roster (leader included) is told.
	Left {
		remaining: Vec<Username>,
	},
}

/// Forest of leader-keyed parties.
///
/// "Leader" is purely the key a party is stored under; no role flag is ever
/// stored, so leadership must always be derived from key membership. The map
/// is ordered so first-match scans are deterministic.
///
/// A member is not prevented from joining several parties; scans affect only
/// the first party found containing them.
#[derive(Debug, Default)]
pub struct PartyStore {
	parties: BTreeMap<Username, Vec<Username>>,
}

impl PartyStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Start a fresh singleton party, silently replacing any party already
	/// keyed by this leader.
	pub fn create(&mut self, leader: Username) {
		self.parties.insert(leader.clone(), vec![leader]);
	}

	pub fn exists(&self, leader: &Username) -> bool {
		self.parties.contains_key(leader)
	}

	/// Join the party keyed by `leader`. Returns the roster as it was before
	/// the join (leader included) so the router can notify it. The joiner is
	/// appended without a duplicate check.
	pub fn accept(&mut self, member: Username, leader: &Username) -> Option<Vec<Username>> {
		let roster = self.parties.get_mut(leader)?;
		let prior = roster.clone();
		roster.push(member);
		Some(prior)
	}

	/// Remove `member` from the first party containing it. The leader leaving
	/// disbands the party; an emptied roster is dropped.
	pub fn leave(&mut self, member: &Username) -> Option<LeaveOutcome> {
		let leader = self
			.parties
			.iter()
			.find(|(_, roster)| roster.contains(member))
			.map(|(leader, _)| leader.clone())?;

		if leader == *member {
			let roster = self.parties.remove(&leader).unwrap_or_default();
			let remaining = roster.into_iter().filter(|m| m != member).collect();
			return Some(LeaveOutcome::Disbanded { leader, remaining });
		}

		let roster = self.parties.get_mut(&leader)?;
		if let Some(idx) = roster.iter().position(|m| m == member) {
			roster.remove(idx);
		}
		if roster.is_empty() {
			self.parties.remove(&leader);
			return Some(LeaveOutcome::Left { remaining: Vec::new() });
		}
		Some(LeaveOutcome::Left {
			remaining: roster.clone(),
		})
	}

	/// Kick `target` out of the party keyed by `leader`. The requester is
	/// trusted to be that leader; only key existence is checked. Returns the
	/// remaining roster when the target was actually removed.
	pub fn kick(&mut self, leader: &Username, target: &Username) -> Option<Vec<Username>> {
		let roster = self.parties.get_mut(leader)?;
		let idx = roster.iter().position(|m| m == target)?;
		roster.remove(idx);
		if roster.is_empty() {
			self.parties.remove(leader);
			return Some(Vec::new());
		}
		Some(roster.clone())
	}

	/// Re-key the party under a new leader. Valid only when a party exists
	/// under `old_leader` and `new_leader` is already on its roster. Returns
	/// the full roster to notify.
	pub fn transfer(&mut self, old_leader: &Username, new_leader: &Username) -> Option<Vec<Username>> {
		if !self.parties.get(old_leader)?.contains(new_leader) {
			return None;
		}
		let roster = self.parties.remove(old_leader)?;
		self.parties.insert(new_leader.clone(), roster.clone());
		Some(roster)
	}

	/// Fan-out targets for waypoints and markers: everyone else in the first
	/// party containing `sender`.
	pub fn broadcast_targets(&self, sender: &Username) -> Option<Vec<Username>> {
		let (_, roster) = self.parties.iter().find(|(_, roster)| roster.contains(sender))?;
		Some(roster.iter().filter(|m| *m != sender).cloned().collect())
	}

	/// Roster under a leader key.
	pub fn members_of(&self, leader: &Username) -> Option<&[Username]> {
		self.parties.get(leader).map(Vec::as_slice)
	}
}
