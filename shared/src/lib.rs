pub mod perception;
pub mod protocol;
pub mod world;

pub use perception::{LocalGrid, RadarObservation};
pub use protocol::{Command, Direction, MoveCommand, ProtocolError, Snapshot};
pub use world::{GridWorld, MapFormatError, Occupancy};

/// How many world units one map cell spans along each axis.
pub const GRID_SCALE: f32 = 2.0;
/// How far, in world units, an actor can sense.
pub const PERCEPTION_RADIUS: i32 = 15;
pub const RADAR_SECTORS: usize = 24;
pub const RAY_STEP: f32 = 0.5;
pub const RAY_MAX_DISTANCE: f32 = 15.0;
/// Returned by ray casts that never hit a wall.
pub const NO_HIT: f32 = 99999.0;

/// Receive buffer size on both ends; larger datagrams would be truncated.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

pub const CODE_FREE: u8 = 0;
pub const CODE_WALL: u8 = 1;

/// Which kind of actor controls a player.
///
/// The wire tag is `0` for learning agents and `1` for heuristic bots.
/// Perception outputs encode an actor as `2 + tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassTag {
    Agent,
    Bot,
}

impl ClassTag {
    pub fn tag(self) -> u8 {
        match self {
            ClassTag::Agent => 0,
            ClassTag::Bot => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ClassTag::Agent),
            1 => Some(ClassTag::Bot),
            _ => None,
        }
    }

    /// Cell code used by the dense grid and radar observations.
    pub fn code(self) -> u8 {
        2 + self.tag()
    }
}

/// Position in world units plus heading in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, heading: f32) -> Self {
        Self { x, y, heading }
    }

    pub fn distance_to(&self, other: &Pose) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    pub fn manhattan_to(&self, other: &Pose) -> f32 {
        (other.x - self.x).abs() + (other.y - self.y).abs()
    }
}

/// Another actor as seen from an observer: where it is and what it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actor {
    pub pose: Pose,
    pub class: ClassTag,
}

impl Actor {
    pub fn new(pose: Pose, class: ClassTag) -> Self {
        Self { pose, class }
    }
}

/// Wraps an angle in radians into `[0, 2π)`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(std::f32::consts::TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= std::f32::consts::TAU {
        0.0
    } else {
        wrapped
    }
}

/// Index of the radar sector whose centre heading is nearest to `degrees`.
pub fn sector_index(degrees: f32) -> usize {
    let width = 360.0 / RADAR_SECTORS as f32;
    let index = (degrees.rem_euclid(360.0) / width).round() as usize;
    index % RADAR_SECTORS
}
