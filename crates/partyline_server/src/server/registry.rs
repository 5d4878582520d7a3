#![forbid(unsafe_code)]

use std::collections::HashMap;

use partyline_domain::Username;
use tokio::sync::mpsc;
use tracing::trace;

/// Process-unique id for one open transport connection.
pub type ConnId = u64;

/// Outbound half of a connection: raw frames pushed here are drained by the
/// connection's writer task. Unbounded: the protocol has no backpressure, so
/// a slow recipient backlogs indefinitely.
pub type OutboundTx = mpsc::UnboundedSender<String>;

/// Bidirectional mapping between client identities and live connections.
///
/// The single source of truth for "is user X reachable now". Absence is the
/// normal offline case, never an error.
#[derive(Debug, Default)]
pub struct Registry {
	conns: HashMap<ConnId, OutboundTx>,
	by_name: HashMap<Username, ConnId>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Track a newly opened connection before it has an identity.
	pub fn insert_conn(&mut self, conn_id: ConnId, tx: OutboundTx) {
		self.conns.insert(conn_id, tx);
	}

	/// Drop transport bookkeeping for a closed connection.
	pub fn remove_conn(&mut self, conn_id: ConnId) {
		self.conns.remove(&conn_id);
	}

	/// Unconditional upsert: a second identification under the same name
	/// displaces the previous connection without closing it. The displaced
	/// connection keeps receiving identity-less broadcasts only.
	pub fn register(&mut self, name: Username, conn_id: ConnId) {
		self.by_name.insert(name, conn_id);
	}

	/// Remove the identity mapping only if this connection still owns it, so
	/// a displaced connection's close cannot evict its successor.
	pub fn unregister_if_owner(&mut self, name: &Username, conn_id: ConnId) -> bool {
		match self.by_name.get(name) {
			Some(owner) if *owner == conn_id => {
				self.by_name.remove(name);
				true
			}
			_ => false,
		}
	}

	pub fn is_online(&self, name: &Username) -> bool {
		self.by_name.get(name).is_some_and(|id| self.conns.contains_key(id))
	}

	/// Deliver one frame to the named identity. Returns false when the
	/// recipient is offline or its writer is gone; the frame is dropped
	/// either way.
	pub fn send(&self, name: &Username, frame: String) -> bool {
		let Some(conn_id) = self.by_name.get(name) else {
			trace!(user = %name, "recipient offline, frame dropped");
			return false;
		};
		self.send_to_conn(*conn_id, frame)
	}

	pub fn send_to_conn(&self, conn_id: ConnId, frame: String) -> bool {
		match self.conns.get(&conn_id) {
			Some(tx) => tx.send(frame).is_ok(),
			None => false,
		}
	}

	/// Forward a raw frame to every connection except the originator,
	/// identified or not. This is the undifferentiated chat channel.
	pub fn broadcast_except(&self, sender: ConnId, frame: &str) -> usize {
		let mut delivered = 0;
		for (conn_id, tx) in &self.conns {
			if *conn_id == sender {
				continue;
			}
			if tx.send(frame.to_string()).is_ok() {
				delivered += 1;
			}
		}
		delivered
	}

	pub fn connection_count(&self) -> usize {
		self.conns.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn u(name: &str) -> Username {
		name.into()
	}

	#[test]
	fn register_is_last_writer_wins() {
		let mut reg = Registry::new();
		let (tx1, mut rx1) = mpsc::unbounded_channel();
		let (tx2, mut rx2) = mpsc::unbounded_channel();
		reg.insert_conn(1, tx1);
		reg.insert_conn(2, tx2);

		reg.register(u("alice"), 1);
		reg.register(u("alice"), 2);

		assert!(reg.send(&u("alice"), "hi".to_string()));
		assert!(rx1.try_recv().is_err());
		assert_eq!(rx2.try_recv().expect("frame"), "hi");
	}

	#[test]
	fn displaced_connection_cannot_unregister_successor() {
		let mut reg = Registry::new();
		let (tx1, _rx1) = mpsc::unbounded_channel();
		let (tx2, _rx2) = mpsc::unbounded_channel();
		reg.insert_conn(1, tx1);
		reg.insert_conn(2, tx2);

		reg.register(u("alice"), 1);
		reg.register(u("alice"), 2);

		assert!(!reg.unregister_if_owner(&u("alice"), 1));
		assert!(reg.is_online(&u("alice")));

		assert!(reg.unregister_if_owner(&u("alice"), 2));
		assert!(!reg.is_online(&u("alice")));
	}

	#[test]
	fn broadcast_skips_the_sender() {
		let mut reg = Registry::new();
		let (tx1, mut rx1) = mpsc::unbounded_channel();
		let (tx2, mut rx2) = mpsc::unbounded_channel();
		let (tx3, mut rx3) = mpsc::unbounded_channel();
		reg.insert_conn(1, tx1);
		reg.insert_conn(2, tx2);
		reg.insert_conn(3, tx3);

		let delivered = reg.broadcast_except(2, "FOO|a|b");
		assert_eq!(delivered, 2);
		assert_eq!(rx1.try_recv().expect("frame"), "FOO|a|b");
		assert!(rx2.try_recv().is_err());
		assert_eq!(rx3.try_recv().expect("frame"), "FOO|a|b");
	}
}
