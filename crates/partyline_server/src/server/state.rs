#![forbid(unsafe_code)]

use tokio::sync::Mutex;

use crate::server::party::PartyStore;
use crate::server::persistence::GraphFile;
use crate::server::registry::Registry;
use crate::server::social::SocialGraph;

/// Shared server state.
///
/// Each store sits behind its own lock: friend and party operations are
/// independent, so a single global lock would serialize unrelated traffic.
/// Handlers never hold a lock across an await and never take two store locks
/// at once.
#[derive(Debug)]
pub struct GlobalState {
	pub registry: Mutex<Registry>,
	pub social: Mutex<SocialGraph>,
	pub parties: Mutex<PartyStore>,
	pub graph_file: GraphFile,
}

impl GlobalState {
	pub fn new(social: SocialGraph, graph_file: GraphFile) -> Self {
		Self {
			registry: Mutex::new(Registry::new()),
			social: Mutex::new(social),
			parties: Mutex::new(PartyStore::new()),
			graph_file,
		}
	}
}
