//! Readiness barrier and per-recipient snapshot construction.
//!
//! The simulation advances in lockstep. An epoch stays in
//! [`Phase::Collecting`] until every registered player has reported a move,
//! then a personalised [`Snapshot`] is built for each player and all
//! readiness flags are cleared. The engine reports [`Phase::Broadcasting`]
//! until its owner calls [`SynchronizationEngine::finish_broadcast`].

use crate::session::SessionRegistry;
use log::debug;
use shared::Snapshot;
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Collecting,
    Broadcasting,
}

/// A snapshot addressed to one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub addr: SocketAddr,
    pub snapshot: Snapshot,
}

#[derive(Debug, Default)]
pub struct SynchronizationEngine {
    phase: Phase,
    epochs: u64,
}

impl SynchronizationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of broadcasts sent so far.
    pub fn epochs(&self) -> u64 {
        self.epochs
    }

    /// Checks the barrier and, if it is satisfied, returns one snapshot per
    /// player and starts a new epoch.
    ///
    /// An empty registry never broadcasts.
    pub fn poll(&mut self, registry: &mut SessionRegistry, map_index: usize) -> Vec<Outgoing> {
        if registry.is_empty() || !registry.all_ready() {
            return Vec::new();
        }

        self.phase = Phase::Broadcasting;
        let outgoing: Vec<Outgoing> = registry
            .endpoints()
            .into_iter()
            .map(|addr| Outgoing {
                addr,
                snapshot: Self::snapshot_for(registry, addr, map_index),
            })
            .collect();

        registry.clear_ready();
        self.epochs += 1;
        debug!(
            "Epoch {} complete, broadcasting to {} players on map {}",
            self.epochs,
            outgoing.len(),
            map_index
        );

        outgoing
    }

    /// Marks the snapshots from the last [`poll`](Self::poll) as sent.
    pub fn finish_broadcast(&mut self) {
        self.phase = Phase::Collecting;
    }

    /// Builds the view `recipient` receives: its own actor first, then
    /// everyone else.
    pub fn snapshot_for(registry: &SessionRegistry, recipient: SocketAddr, map_index: usize) -> Snapshot {
        let mut actors = Vec::with_capacity(registry.len());
        if let Some(own) = registry.get(&recipient) {
            actors.push(own.actor());
        }
        for addr in registry.endpoints() {
            if addr == recipient {
                continue;
            }
            if let Some(player) = registry.get(&addr) {
                actors.push(player.actor());
            }
        }
        Snapshot { actors, map_index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ClassTag, Pose};

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn registry_with(players: &[(u16, ClassTag, f32)]) -> SessionRegistry {
        let mut registry = SessionRegistry::new();
        for &(port, class, x) in players {
            registry.connect(addr(port), class);
            registry.get_mut(&addr(port)).unwrap().pose = Pose::new(x, 1.0, 0.0);
        }
        registry
    }

    #[test]
    fn test_empty_registry_never_broadcasts() {
        let mut engine = SynchronizationEngine::new();
        let mut registry = SessionRegistry::new();
        assert!(engine.poll(&mut registry, 0).is_empty());
        assert_eq!(engine.epochs(), 0);
    }

    #[test]
    fn test_broadcast_fires_only_when_all_ready() {
        let mut engine = SynchronizationEngine::new();
        let mut registry = registry_with(&[(1, ClassTag::Agent, 1.0), (2, ClassTag::Bot, 2.0), (3, ClassTag::Bot, 3.0)]);
        registry.clear_ready();

        for port in [1, 2] {
            registry.get_mut(&addr(port)).unwrap().ready = true;
            assert!(engine.poll(&mut registry, 0).is_empty());
            assert_eq!(engine.phase(), Phase::Collecting);
        }

        registry.get_mut(&addr(3)).unwrap().ready = true;
        let outgoing = engine.poll(&mut registry, 0);
        assert_eq!(outgoing.len(), 3);
        assert_eq!(engine.epochs(), 1);
        assert_eq!(engine.phase(), Phase::Broadcasting);
        assert!(registry.iter().all(|(_, p)| !p.ready));

        engine.finish_broadcast();
        assert_eq!(engine.phase(), Phase::Collecting);

        // the next epoch starts empty-handed
        assert!(engine.poll(&mut registry, 0).is_empty());
    }

    #[test]
    fn test_each_recipient_sees_itself_first() {
        let mut engine = SynchronizationEngine::new();
        let mut registry = registry_with(&[(1, ClassTag::Agent, 1.0), (2, ClassTag::Bot, 2.0), (3, ClassTag::Agent, 3.0)]);

        let outgoing = engine.poll(&mut registry, 4);
        assert_eq!(outgoing.len(), 3);
        for message in &outgoing {
            let expected = registry.get(&message.addr).unwrap().actor();
            assert_eq!(message.snapshot.own(), Some(&expected));
            assert_eq!(message.snapshot.actors.len(), 3);
            assert_eq!(message.snapshot.map_index, 4);

            let mut xs: Vec<f32> = message.snapshot.actors.iter().map(|a| a.pose.x).collect();
            xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        }
    }

    #[test]
    fn test_newcomer_does_not_block_epoch() {
        let mut engine = SynchronizationEngine::new();
        let mut registry = registry_with(&[(1, ClassTag::Agent, 1.0)]);
        registry.clear_ready();

        registry.connect(addr(2), ClassTag::Bot);
        registry.get_mut(&addr(1)).unwrap().ready = true;
        let outgoing = engine.poll(&mut registry, 0);
        assert_eq!(outgoing.len(), 2);
    }

    #[test]
    fn test_snapshot_for_unknown_recipient() {
        let registry = registry_with(&[(1, ClassTag::Agent, 1.0)]);
        let snapshot = SynchronizationEngine::snapshot_for(&registry, addr(9), 0);
        assert_eq!(snapshot.actors.len(), 1);
        assert_eq!(snapshot.actors[0].class, ClassTag::Agent);
    }
}
