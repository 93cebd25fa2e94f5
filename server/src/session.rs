//! Endpoint-keyed player roster for the simulation server
//!
//! The UDP source address is the only identity a client has, so every
//! player is stored under its endpoint. The registry owns:
//! - Player lifecycle (connect, disconnect, idle eviction)
//! - Per-player readiness for the current epoch
//! - The last reward an agent reported, for visualisation
//!
//! Collaborators (movement validation, spawn planning, the readiness
//! barrier) borrow the registry from the single loop that owns it.

use crate::movement::MovementValidator;
use crate::spawn::{PlacementError, SpawnPlanner};
use log::info;
use rand::Rng;
use shared::{Actor, ClassTag, GridWorld, MoveCommand, Pose};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// State kept for one connected endpoint
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub class: ClassTag,
    pub pose: Pose,
    /// Whether the player has moved since the last broadcast
    pub ready: bool,
    /// Most recent reward reported by an agent-class client
    pub reward: Option<f32>,
    /// Last time any command arrived from this endpoint
    pub last_seen: Instant,
}

impl PlayerSession {
    /// Creates a player at the origin, already marked ready so that it
    /// does not hold back an epoch that is in progress.
    pub fn new(class: ClassTag) -> Self {
        Self {
            class,
            pose: Pose::default(),
            ready: true,
            reward: None,
            last_seen: Instant::now(),
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.pose, self.class)
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Owns every connected player, keyed by endpoint.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    players: HashMap<SocketAddr, PlayerSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new endpoint.
    ///
    /// Returns false without touching anything if the endpoint is already
    /// connected. The caller is responsible for re-spawning everyone.
    pub fn connect(&mut self, addr: SocketAddr, class: ClassTag) -> bool {
        if self.players.contains_key(&addr) {
            return false;
        }
        info!("{:?} connected from {}", class, addr);
        self.players.insert(addr, PlayerSession::new(class));
        true
    }

    /// Removes an endpoint together with its readiness and reward.
    /// Unknown endpoints are ignored.
    pub fn disconnect(&mut self, addr: &SocketAddr) -> bool {
        if let Some(player) = self.players.remove(addr) {
            info!("{:?} at {} disconnected", player.class, addr);
            true
        } else {
            false
        }
    }

    /// Applies a move, marks the player ready and stores any reported reward.
    ///
    /// Returns false for unknown endpoints.
    pub fn report_move(
        &mut self,
        addr: &SocketAddr,
        command: &MoveCommand,
        validator: &MovementValidator,
        world: &GridWorld,
    ) -> bool {
        let Some(player) = self.players.get_mut(addr) else {
            return false;
        };
        player.pose = validator.apply(&player.pose, player.class, command, world);
        player.ready = true;
        if let Some(reward) = command.reward {
            player.reward = Some(reward);
        }
        true
    }

    /// Re-places every player and returns the map the placement chose.
    ///
    /// On failure nobody is moved.
    pub fn respawn_all<R: Rng + ?Sized>(
        &mut self,
        planner: &SpawnPlanner,
        maps: &[GridWorld],
        rng: &mut R,
    ) -> Result<usize, PlacementError> {
        let endpoints = self.endpoints();
        let placement = planner.place_all(endpoints.len(), maps, rng)?;
        for (addr, pose) in endpoints.iter().zip(placement.poses) {
            if let Some(player) = self.players.get_mut(addr) {
                player.pose = pose;
            }
        }
        Ok(placement.map_index)
    }

    /// Refreshes the liveness timestamp of a known endpoint.
    pub fn touch(&mut self, addr: &SocketAddr) {
        if let Some(player) = self.players.get_mut(addr) {
            player.last_seen = Instant::now();
        }
    }

    /// Removes players that have been silent for longer than `timeout`.
    pub fn evict_idle(&mut self, timeout: Duration) -> Vec<SocketAddr> {
        let idle: Vec<SocketAddr> = self
            .players
            .iter()
            .filter(|(_, player)| player.is_timed_out(timeout))
            .map(|(addr, _)| *addr)
            .collect();

        for addr in &idle {
            info!("Evicting {} after {:?} of silence", addr, timeout);
            self.players.remove(addr);
        }

        idle
    }

    pub fn all_ready(&self) -> bool {
        self.players.values().all(|player| player.ready)
    }

    /// Marks a known endpoint ready without moving it. Returns false for
    /// unknown endpoints.
    pub fn mark_ready(&mut self, addr: &SocketAddr) -> bool {
        match self.players.get_mut(addr) {
            Some(player) => {
                player.ready = true;
                true
            }
            None => false,
        }
    }

    pub fn clear_ready(&mut self) {
        for player in self.players.values_mut() {
            player.ready = false;
        }
    }

    /// Connected endpoints in a stable order.
    pub fn endpoints(&self) -> Vec<SocketAddr> {
        let mut endpoints: Vec<SocketAddr> = self.players.keys().copied().collect();
        endpoints.sort();
        endpoints
    }

    pub fn get(&self, addr: &SocketAddr) -> Option<&PlayerSession> {
        self.players.get(addr)
    }

    pub fn get_mut(&mut self, addr: &SocketAddr) -> Option<&mut PlayerSession> {
        self.players.get_mut(addr)
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.players.contains_key(addr)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SocketAddr, &PlayerSession)> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
