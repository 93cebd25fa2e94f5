//! Collision-free starting poses.
//!
//! Each attempt picks a map and one quadrant of it, then draws integer
//! positions inside that quadrant for every player in turn. A player that
//! cannot be placed within [`PLACEMENT_RETRIES`] draws abandons the whole
//! attempt and a fresh map/quadrant is chosen. Attempts are capped so a
//! crowded map fails with [`PlacementError`] instead of spinning forever.

use log::debug;
use rand::Rng;
use shared::{GridWorld, Pose};
use std::f32::consts::TAU;
use thiserror::Error;

/// Minimum Manhattan distance between any two starting positions.
pub const MIN_SEPARATION: f32 = 8.0;
/// Draws per player before the current attempt is abandoned.
pub const PLACEMENT_RETRIES: usize = 5;
/// Whole-attempt restarts before giving up.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum PlacementError {
    #[error("no maps available for placement")]
    NoMaps,

    #[error("could not place {players} players after {attempts} attempts")]
    Exhausted { players: usize, attempts: usize },
}

/// Result of a successful placement: the map to switch to and one pose per player.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub map_index: usize,
    pub poses: Vec<Pose>,
}

#[derive(Debug, Clone, Copy)]
pub struct SpawnPlanner {
    retries: usize,
    max_attempts: usize,
    min_separation: f32,
}

impl Default for SpawnPlanner {
    fn default() -> Self {
        Self {
            retries: PLACEMENT_RETRIES,
            max_attempts: MAX_PLACEMENT_ATTEMPTS,
            min_separation: MIN_SEPARATION,
        }
    }
}

impl SpawnPlanner {
    pub fn new(retries: usize, max_attempts: usize, min_separation: f32) -> Self {
        Self {
            retries,
            max_attempts,
            min_separation,
        }
    }

    /// Places `players` actors on one of `maps`.
    pub fn place_all<R: Rng + ?Sized>(
        &self,
        players: usize,
        maps: &[GridWorld],
        rng: &mut R,
    ) -> Result<Placement, PlacementError> {
        if maps.is_empty() {
            return Err(PlacementError::NoMaps);
        }

        for attempt in 1..=self.max_attempts {
            let map_index = rng.gen_range(0..maps.len());
            let quadrant = (rng.gen_range(0..2), rng.gen_range(0..2));

            if let Some(positions) = self.try_quadrant(players, &maps[map_index], quadrant, rng) {
                debug!(
                    "Placed {} players on map {} quadrant {:?} after {} attempts",
                    players, map_index, quadrant, attempt
                );
                let poses = positions
                    .into_iter()
                    .map(|(x, y)| Pose::new(x, y, rng.gen_range(0.0..TAU)))
                    .collect();
                return Ok(Placement { map_index, poses });
            }
        }

        Err(PlacementError::Exhausted {
            players,
            attempts: self.max_attempts,
        })
    }

    fn try_quadrant<R: Rng + ?Sized>(
        &self,
        players: usize,
        world: &GridWorld,
        (qx, qy): (i64, i64),
        rng: &mut R,
    ) -> Option<Vec<(f32, f32)>> {
        let half_width = (world.width() / 2.0).floor() as i64;
        let half_length = (world.length() / 2.0).floor() as i64;
        if half_width == 0 || half_length == 0 {
            return None;
        }
        let x_range = qx * half_width..(qx + 1) * half_width;
        let y_range = qy * half_length..(qy + 1) * half_length;

        let mut placed: Vec<(f32, f32)> = Vec::with_capacity(players);
        for _ in 0..players {
            let found = (0..self.retries).find_map(|_| {
                let x = rng.gen_range(x_range.clone()) as f32;
                let y = rng.gen_range(y_range.clone()) as f32;
                let clear = !world.is_wall(x, y)
                    && placed
                        .iter()
                        .all(|&(px, py)| (px - x).abs() + (py - y).abs() >= self.min_separation);
                clear.then_some((x, y))
            });
            placed.push(found?);
        }
        Some(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::Occupancy;

    fn open_world(cells: usize) -> GridWorld {
        let rows: Vec<String> = (0..cells).map(|_| ".".repeat(cells)).collect();
        GridWorld::parse(&rows.join("\n")).unwrap()
    }

    fn checkerboard(cells: usize) -> GridWorld {
        let rows: Vec<String> = (0..cells)
            .map(|r| {
                (0..cells)
                    .map(|c| if (r + c) % 3 == 0 { '#' } else { '.' })
                    .collect()
            })
            .collect();
        GridWorld::parse(&rows.join("\n")).unwrap()
    }

    fn assert_valid(placement: &Placement, world: &GridWorld) {
        for (i, a) in placement.poses.iter().enumerate() {
            assert_eq!(world.occupancy(a.x, a.y), Occupancy::Free);
            assert!(a.heading >= 0.0 && a.heading < TAU);
            for b in &placement.poses[i + 1..] {
                assert!(a.manhattan_to(b) >= MIN_SEPARATION, "{:?} too close to {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_places_players_apart_on_free_cells() {
        let maps = vec![checkerboard(40)];
        let planner = SpawnPlanner::default();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let placement = planner.place_all(4, &maps, &mut rng).unwrap();
            assert_eq!(placement.map_index, 0);
            assert_eq!(placement.poses.len(), 4);
            assert_valid(&placement, &maps[0]);
        }
    }

    #[test]
    fn test_poses_share_one_quadrant() {
        let maps = vec![open_world(40)];
        let planner = SpawnPlanner::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let placement = planner.place_all(3, &maps, &mut rng).unwrap();
            let first = &placement.poses[0];
            let quadrant = |x: f32, y: f32| ((x >= 40.0) as u8, (y >= 40.0) as u8);
            for pose in &placement.poses {
                assert_eq!(quadrant(pose.x, pose.y), quadrant(first.x, first.y));
            }
        }
    }

    #[test]
    fn test_zero_players() {
        let maps = vec![open_world(10)];
        let mut rng = StdRng::seed_from_u64(1);
        let placement = SpawnPlanner::default().place_all(0, &maps, &mut rng).unwrap();
        assert!(placement.poses.is_empty());
    }

    #[test]
    fn test_no_maps() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = SpawnPlanner::default().place_all(1, &[], &mut rng);
        assert_eq!(result, Err(PlacementError::NoMaps));
    }

    #[test]
    fn test_walled_map_fails_instead_of_hanging() {
        let maps = vec![GridWorld::parse("####\n####\n####\n####\n").unwrap()];
        let planner = SpawnPlanner::new(PLACEMENT_RETRIES, 50, MIN_SEPARATION);
        let mut rng = StdRng::seed_from_u64(3);
        let result = planner.place_all(1, &maps, &mut rng);
        assert_eq!(
            result,
            Err(PlacementError::Exhausted {
                players: 1,
                attempts: 50
            })
        );
    }

    #[test]
    fn test_crowded_map_fails() {
        // each quadrant is 4x4 world units, too small for two players 8 apart
        let maps = vec![open_world(4)];
        let mut rng = StdRng::seed_from_u64(5);
        let result = SpawnPlanner::default().place_all(2, &maps, &mut rng);
        assert!(matches!(result, Err(PlacementError::Exhausted { players: 2, .. })));
    }

    #[test]
    fn test_skips_unusable_maps() {
        let walled = GridWorld::parse("##########\n##########\n").unwrap();
        let maps = vec![walled, open_world(30)];
        let planner = SpawnPlanner::default();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let placement = planner.place_all(2, &maps, &mut rng).unwrap();
            assert_eq!(placement.map_index, 1);
            assert_valid(&placement, &maps[1]);
        }
    }
}
