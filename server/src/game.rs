use crate::error::{Result, ServerError};
use crate::movement::{MovementValidator, SpeedProfile};
use crate::session::SessionRegistry;
use crate::spawn::SpawnPlanner;
use crate::sync::{Outgoing, SynchronizationEngine};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use shared::{ClassTag, Command, GridWorld, Pose, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Loads `map_0.csv` .. `map_<count-1>.csv` from `dir`.
pub fn load_maps(dir: &Path, count: usize) -> Result<Vec<GridWorld>> {
    if count == 0 {
        return Err(ServerError::NoMaps);
    }

    (0..count)
        .map(|index| {
            let path = dir.join(format!("map_{}.csv", index));
            let world = GridWorld::load(&path).map_err(|source| ServerError::Map {
                path: path.clone(),
                source,
            })?;
            info!(
                "Loaded map {} ({}x{} cells) from {}",
                index,
                world.cols(),
                world.rows(),
                path.display()
            );
            Ok(world)
        })
        .collect()
}

/// Everything the owning loop mutates: the loaded maps, the player roster and
/// the epoch barrier.
#[derive(Debug)]
pub struct GameState {
    maps: Vec<GridWorld>,
    map_index: usize,
    sessions: SessionRegistry,
    movement: MovementValidator,
    planner: SpawnPlanner,
    sync: SynchronizationEngine,
    rng: StdRng,
    datagram_limit: usize,
}

impl GameState {
    pub fn new(maps: Vec<GridWorld>, profile: SpeedProfile, rng: StdRng) -> Result<Self> {
        if maps.is_empty() {
            return Err(ServerError::NoMaps);
        }

        Ok(Self {
            maps,
            map_index: 0,
            sessions: SessionRegistry::new(),
            movement: MovementValidator::new(profile),
            planner: SpawnPlanner::default(),
            sync: SynchronizationEngine::new(),
            rng,
            datagram_limit: MAX_DATAGRAM_SIZE,
        })
    }

    pub fn with_planner(mut self, planner: SpawnPlanner) -> Self {
        self.planner = planner;
        self
    }

    /// Caps the encoded snapshot size; connections that would exceed it are
    /// refused.
    pub fn with_datagram_limit(mut self, limit: usize) -> Self {
        self.datagram_limit = limit;
        self
    }

    pub fn map_index(&self) -> usize {
        self.map_index
    }

    /// The map players currently move on.
    pub fn world(&self) -> &GridWorld {
        &self.maps[self.map_index]
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionRegistry {
        &mut self.sessions
    }

    pub fn sync(&self) -> &SynchronizationEngine {
        &self.sync
    }

    /// Applies one decoded command from `addr` and returns whatever the
    /// barrier decides to send as a result.
    pub fn handle(&mut self, addr: SocketAddr, command: Command) -> Vec<Outgoing> {
        self.sessions.touch(&addr);

        match command {
            Command::Connect { class } => self.connect(addr, class),
            Command::Move(mv) => {
                let world = &self.maps[self.map_index];
                if !self.sessions.report_move(&addr, &mv, &self.movement, world) {
                    debug!("Ignoring move from unknown endpoint {}", addr);
                }
            }
            Command::Disconnect => {
                self.sessions.disconnect(&addr);
            }
            Command::Reset => {
                if self.sessions.contains(&addr) {
                    info!("Reset requested by {}", addr);
                    self.respawn();
                    // the requester waits for its new pose like a newcomer does
                    self.sessions.mark_ready(&addr);
                } else {
                    debug!("Ignoring reset from unknown endpoint {}", addr);
                }
            }
        }

        self.sync.poll(&mut self.sessions, self.map_index)
    }

    /// Drops players that have gone quiet. Removing them can release the
    /// barrier, in which case the resulting broadcast is returned.
    pub fn evict_idle(&mut self, timeout: Duration) -> Vec<Outgoing> {
        if self.sessions.evict_idle(timeout).is_empty() {
            return Vec::new();
        }
        self.sync.poll(&mut self.sessions, self.map_index)
    }

    /// Tells the barrier that the snapshots returned by the last broadcast
    /// have been handed to the socket.
    pub fn broadcast_sent(&mut self) {
        self.sync.finish_broadcast();
    }

    fn connect(&mut self, addr: SocketAddr, class: ClassTag) {
        if !self.sessions.connect(addr, class) {
            debug!("Duplicate connect from {} ignored", addr);
            return;
        }

        let previous_map = self.map_index;
        let previous_poses: Vec<(SocketAddr, Pose)> =
            self.sessions.iter().map(|(a, player)| (*a, player.pose)).collect();

        if !self.respawn() {
            error!("No room for {}, dropping the connection", addr);
            self.sessions.disconnect(&addr);
            return;
        }

        let size = SynchronizationEngine::snapshot_for(&self.sessions, addr, self.map_index)
            .encode()
            .len();
        if size > self.datagram_limit {
            warn!(
                "Refusing {}: a snapshot for {} players is {} bytes, limit is {}",
                addr,
                self.sessions.len(),
                size,
                self.datagram_limit
            );
            self.sessions.disconnect(&addr);
            self.map_index = previous_map;
            for (other, pose) in previous_poses {
                if let Some(player) = self.sessions.get_mut(&other) {
                    player.pose = pose;
                }
            }
        }
    }

    /// Re-places every player. Poses are untouched when placement fails.
    fn respawn(&mut self) -> bool {
        match self.sessions.respawn_all(&self.planner, &self.maps, &mut self.rng) {
            Ok(map_index) => {
                if map_index != self.map_index {
                    info!("Switching to map {}", map_index);
                    self.map_index = map_index;
                }
                true
            }
            Err(e) => {
                error!("Spawn placement failed for {} players: {}", self.sessions.len(), e);
                false
            }
        }
    }
}
