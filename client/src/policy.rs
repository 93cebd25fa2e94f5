//! Heuristic escape policy for bot-class clients.
//!
//! The horizon is split into the same 24 sectors the radar uses. Every
//! nearby agent pushes the score of the sectors facing it down, with the
//! strongest penalty on its own bearing and a falloff with sector distance
//! and squared range. Sectors with a wall close ahead are ruled out. The bot
//! runs forward when it already faces the best sector and otherwise turns
//! the short way round towards it.

use shared::{sector_index, Actor, ClassTag, Direction, GridWorld, Pose, Snapshot, RADAR_SECTORS};

/// Pursuers further away than this are ignored and the bot stays idle.
pub const ALERT_RADIUS: f32 = 6.0;
/// Sectors whose wall is closer than this are never chosen.
pub const MIN_WALL_CLEARANCE: f32 = 2.0;
const BLOCKED: f32 = -99999.0;
/// Sectors on each side of a pursuer's bearing that receive a penalty.
const PENALTY_SPREAD: i32 = 11;

#[derive(Debug, Clone, Copy)]
pub struct EscapePolicy {
    alert_radius: f32,
}

impl Default for EscapePolicy {
    fn default() -> Self {
        Self {
            alert_radius: ALERT_RADIUS,
        }
    }
}

impl EscapePolicy {
    pub fn new(alert_radius: f32) -> Self {
        Self { alert_radius }
    }

    /// Picks a move from a snapshot, where the first actor is the bot itself.
    pub fn decide(&self, world: &GridWorld, snapshot: &Snapshot) -> Option<Direction> {
        let own = snapshot.own()?;
        Some(self.choose(world, &own.pose, snapshot.others()))
    }

    pub fn choose(&self, world: &GridWorld, own: &Pose, others: &[Actor]) -> Direction {
        let pursuers: Vec<Pose> = others
            .iter()
            .filter(|actor| actor.class == ClassTag::Agent)
            .map(|actor| actor.pose)
            .collect();

        let alert = self.alert_radius * self.alert_radius;
        let threatened = pursuers
            .iter()
            .any(|p| (p.x - own.x).powi(2) + (p.y - own.y).powi(2) < alert);
        if !threatened {
            return Direction::Idle;
        }

        let scores = self.sector_scores(world, own, &pursuers);
        let best = best_sector(&scores);
        let heading = sector_index(own.heading.to_degrees());

        if scores[heading] == scores[best] {
            return Direction::Forward;
        }

        let delta = best as i32 - heading as i32;
        let half = RADAR_SECTORS as i32 / 2;
        if delta < -half || (0 < delta && delta < half) {
            Direction::TurnLeft
        } else {
            Direction::TurnRight
        }
    }

    /// Score of every sector; higher is safer.
    pub fn sector_scores(&self, world: &GridWorld, own: &Pose, pursuers: &[Pose]) -> [f32; RADAR_SECTORS] {
        let mut scores = [0.0f32; RADAR_SECTORS];
        let sectors = RADAR_SECTORS as i32;
        let width = 360.0 / RADAR_SECTORS as f32;

        for pursuer in pursuers {
            let dx = pursuer.x - own.x;
            let dy = pursuer.y - own.y;
            let distance_sq = (dx * dx + dy * dy).max(f32::EPSILON);
            let bearing = dy.atan2(dx).to_degrees().rem_euclid(360.0);
            let center = (bearing / width).round() as i32;

            for sector in center - PENALTY_SPREAD..center + PENALTY_SPREAD {
                let spread = ((sector - center).abs() + 1) as f32;
                scores[sector.rem_euclid(sectors) as usize] -= 1.0 / (spread * distance_sq);
            }
        }

        for (sector, score) in scores.iter_mut().enumerate() {
            let wall = world.ray_cast_default((own.x, own.y), sector as f32 * width);
            if wall < MIN_WALL_CLEARANCE {
                *score = BLOCKED;
            } else {
                *score -= 1.0 / (wall * wall);
            }
        }

        scores
    }
}

/// First sector with the highest score.
fn best_sector(scores: &[f32; RADAR_SECTORS]) -> usize {
    let mut best = 0;
    for (index, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = index;
        }
    }
    best
}
