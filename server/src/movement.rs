//! Applies a single move command to a player's pose.
//!
//! Only walls block movement. Players pass through each other; the spawn
//! planner is what keeps them apart at the start of a round.

use shared::{wrap_angle, ClassTag, Direction, GridWorld, MoveCommand, Pose};

/// Rotation applied by a turn without an explicit magnitude, in radians.
pub const ROTATION_STEP: f32 = 0.1;

/// Default forward step lengths per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SpeedProfile {
    /// Agents step 1 unit, bots 0.5.
    Classic,
    /// Agents step 2 units, bots 1.
    #[default]
    Differentiated,
}

impl SpeedProfile {
    pub fn forward_step(self, class: ClassTag) -> f32 {
        match (self, class) {
            (SpeedProfile::Classic, ClassTag::Agent) => 1.0,
            (SpeedProfile::Classic, ClassTag::Bot) => 0.5,
            (SpeedProfile::Differentiated, ClassTag::Agent) => 2.0,
            (SpeedProfile::Differentiated, ClassTag::Bot) => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MovementValidator {
    profile: SpeedProfile,
}

impl MovementValidator {
    pub fn new(profile: SpeedProfile) -> Self {
        Self { profile }
    }

    /// Returns the pose after `command`, or `pose` itself if the move is blocked.
    pub fn apply(&self, pose: &Pose, class: ClassTag, command: &MoveCommand, world: &GridWorld) -> Pose {
        match command.direction {
            Direction::Forward => {
                let step = command
                    .magnitude
                    .unwrap_or_else(|| self.profile.forward_step(class));
                let (sin, cos) = pose.heading.sin_cos();
                let x = (pose.x + step * cos).clamp(0.0, world.width());
                let y = (pose.y + step * sin).clamp(0.0, world.length());

                if world.is_wall(x, y) {
                    *pose
                } else {
                    Pose::new(x, y, pose.heading)
                }
            }
            Direction::TurnLeft => {
                let rotation = command.magnitude.unwrap_or(ROTATION_STEP);
                Pose::new(pose.x, pose.y, wrap_angle(pose.heading + rotation))
            }
            Direction::TurnRight => {
                let rotation = command.magnitude.unwrap_or(ROTATION_STEP);
                Pose::new(pose.x, pose.y, wrap_angle(pose.heading - rotation))
            }
            Direction::Idle => *pose,
        }
    }
}
