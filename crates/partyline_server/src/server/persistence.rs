#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use partyline_domain::Username;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::server::social::SocialGraph;

#[derive(Debug, Error)]
pub enum PersistError {
	#[error("social graph file i/o: {0}")]
	Io(#[from] io::Error),

	#[error("social graph file format: {0}")]
	Format(#[from] serde_json::Error),
}

/// On-disk snapshot layout. The camel-case field names are part of the
/// deployed data format; an existing `friend-data.json` must load unchanged.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DiskSnapshot {
	#[serde(rename = "friendRequests", default)]
	friend_requests: BTreeMap<Username, Vec<Username>>,

	#[serde(default)]
	friends: BTreeMap<Username, Vec<Username>>,
}

/// Best-effort mirror of the social graph in a flat JSON file.
///
/// The in-memory store stays authoritative: the file is read once at startup
/// and rewritten in full after each mutation.
#[derive(Debug, Clone)]
pub struct GraphFile {
	path: PathBuf,
}

impl GraphFile {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Load the persisted graph. A missing file is a fresh start, not an
	/// error.
	pub fn load(&self) -> Result<Option<SocialGraph>, PersistError> {
		let raw = match fs::read_to_string(&self.path) {
			Ok(raw) => raw,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};

		let snapshot: DiskSnapshot = serde_json::from_str(&raw)?;
		Ok(Some(SocialGraph::from_parts(snapshot.friend_requests, snapshot.friends)))
	}

	/// Rewrite the file from current in-memory state. Synchronous and
	/// best-effort; callers log failures and carry on.
	pub fn save(&self, graph: &SocialGraph) -> Result<(), PersistError> {
		let snapshot = DiskSnapshot {
			friend_requests: graph.pending_map().clone(),
			friends: graph.friends_map().clone(),
		};
		let json = serde_json::to_string_pretty(&snapshot)?;
		fs::write(&self.path, json)?;
		Ok(())
	}
}
