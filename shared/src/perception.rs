//! Agent-centric observations extracted from a [`GridWorld`].
//!
//! Both observations use the same local basis: forward is
//! `(cos θ, sin θ)` and right is `(sin θ, -cos θ)`.

use crate::world::GridWorld;
use crate::{sector_index, Actor, Pose, CODE_FREE, CODE_WALL, NO_HIT, PERCEPTION_RADIUS, RADAR_SECTORS, RAY_STEP};

/// Square window of cell codes centred on the observer.
///
/// Codes: `0` free, `1` wall, `2` agent, `3` bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalGrid {
    radius: i32,
    cells: Vec<u8>,
}

impl LocalGrid {
    fn empty(radius: i32) -> Self {
        let side = (2 * radius + 1) as usize;
        Self {
            radius,
            cells: vec![CODE_FREE; side * side],
        }
    }

    pub fn side(&self) -> usize {
        (2 * self.radius + 1) as usize
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Cell at array position `(i, j)`, where `i = lx + r` and `j = r - ly`.
    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.cells[i * self.side() + j]
    }

    /// Cell at local offset `lx` (right) and `ly` (forward).
    pub fn at_offset(&self, lx: i32, ly: i32) -> Option<u8> {
        if lx.abs() > self.radius || ly.abs() > self.radius {
            return None;
        }
        Some(self.get((lx + self.radius) as usize, (self.radius - ly) as usize))
    }

    fn set_offset(&mut self, lx: i32, ly: i32, code: u8) {
        let side = self.side();
        let i = (lx + self.radius) as usize;
        let j = (self.radius - ly) as usize;
        self.cells[i * side + j] = code;
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Builds the dense window around `pose` with the default perception radius.
    pub fn observe(world: &GridWorld, pose: &Pose, others: &[Actor]) -> Self {
        Self::observe_with_radius(world, pose, others, PERCEPTION_RADIUS)
    }

    pub fn observe_with_radius(world: &GridWorld, pose: &Pose, others: &[Actor], radius: i32) -> Self {
        let mut grid = Self::empty(radius);
        let (sin, cos) = pose.heading.sin_cos();

        for lx in -radius..=radius {
            for ly in -radius..=radius {
                let (lx_f, ly_f) = (lx as f32, ly as f32);
                let wx = pose.x + ly_f * cos + lx_f * sin;
                let wy = pose.y + ly_f * sin - lx_f * cos;
                if world.is_wall(wx, wy) {
                    grid.set_offset(lx, ly, CODE_WALL);
                }
            }
        }

        for other in others {
            let dx = other.pose.x - pose.x;
            let dy = other.pose.y - pose.y;
            // truncation toward zero, not floor
            let lx = (sin * dx - cos * dy) as i32;
            let ly = (cos * dx + sin * dy) as i32;
            if lx.abs() <= radius && ly.abs() <= radius {
                grid.set_offset(lx, ly, other.class.code());
            }
        }

        grid
    }
}

/// 24-sector summary of the surroundings, rotated so index 0 faces forward.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarObservation {
    pub codes: [u8; RADAR_SECTORS],
    /// Distances divided by the perception radius, clamped to 1.
    pub depths: [f32; RADAR_SECTORS],
}

impl RadarObservation {
    pub fn observe(world: &GridWorld, pose: &Pose, others: &[Actor]) -> Self {
        Self::observe_with_radius(world, pose, others, PERCEPTION_RADIUS)
    }

    pub fn observe_with_radius(world: &GridWorld, pose: &Pose, others: &[Actor], radius: i32) -> Self {
        let range = radius as f32;
        let mut codes = [CODE_FREE; RADAR_SECTORS];
        let mut depths = [NO_HIT; RADAR_SECTORS];

        for other in others {
            let distance = pose.distance_to(&other.pose);
            if distance > range {
                continue;
            }
            let bearing = (other.pose.y - pose.y).atan2(other.pose.x - pose.x).to_degrees();
            let sector = sector_index(bearing);
            if distance < depths[sector] {
                codes[sector] = other.class.code();
                depths[sector] = distance;
            }
        }

        let sector_width = 360.0 / RADAR_SECTORS as f32;
        for sector in 0..RADAR_SECTORS {
            let wall = world.ray_cast((pose.x, pose.y), sector as f32 * sector_width, range, RAY_STEP);
            if wall < depths[sector] {
                codes[sector] = CODE_WALL;
                depths[sector] = wall;
            }
        }

        for depth in depths.iter_mut() {
            *depth = (*depth / range).min(1.0);
        }

        let heading_sector = sector_index(pose.heading.to_degrees());
        Self { codes, depths }.rotated(heading_sector)
    }

    /// Circularly shifts both halves so that sector `shift` lands at index 0.
    pub fn rotated(&self, shift: usize) -> Self {
        let mut codes = self.codes;
        let mut depths = self.depths;
        codes.rotate_left(shift % RADAR_SECTORS);
        depths.rotate_left(shift % RADAR_SECTORS);
        Self { codes, depths }
    }

    /// Flattened 48-value vector: codes first, then depths.
    pub fn to_vec(&self) -> Vec<f32> {
        self.codes
            .iter()
            .map(|&c| c as f32)
            .chain(self.depths.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClassTag;
    use assert_approx_eq::assert_approx_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn open_world(cells: usize) -> GridWorld {
        let rows: Vec<String> = (0..cells).map(|_| ".".repeat(cells)).collect();
        GridWorld::parse(&rows.join("\n")).unwrap()
    }

    /// Open room with a wall column at col 25 (x in [50, 52)).
    fn walled_world() -> GridWorld {
        let rows: Vec<String> = (0..40)
            .map(|_| {
                let mut row = ".".repeat(40);
                row.replace_range(25..26, "#");
                row
            })
            .collect();
        GridWorld::parse(&rows.join("\n")).unwrap()
    }

    #[test]
    fn test_local_grid_dimensions() {
        let world = open_world(40);
        let grid = LocalGrid::observe(&world, &Pose::new(40.0, 40.0, 0.0), &[]);
        assert_eq!(grid.side(), 31);
        assert_eq!(grid.cells().len(), 31 * 31);
        assert!(grid.cells().iter().all(|&c| c == CODE_FREE));
        assert_eq!(grid.at_offset(16, 0), None);
    }

    #[test]
    fn test_local_grid_sees_wall_ahead() {
        let world = walled_world();
        // facing +x, the wall is 10 units ahead
        let pose = Pose::new(40.5, 40.5, 0.0);
        let grid = LocalGrid::observe(&world, &pose, &[]);
        assert_eq!(grid.at_offset(0, 9), Some(CODE_FREE));
        assert_eq!(grid.at_offset(0, 10), Some(CODE_WALL));
        assert_eq!(grid.at_offset(0, 11), Some(CODE_WALL));
        assert_eq!(grid.at_offset(0, 12), Some(CODE_FREE));
        // behind and to the side is open
        assert_eq!(grid.at_offset(0, -10), Some(CODE_FREE));
        assert_eq!(grid.at_offset(5, 0), Some(CODE_FREE));
    }

    #[test]
    fn test_local_grid_rotates_with_heading() {
        let world = walled_world();
        // facing +y, the wall sits to the right (right = (sin, -cos) = (1, 0))
        let pose = Pose::new(40.5, 40.5, FRAC_PI_2);
        let grid = LocalGrid::observe(&world, &pose, &[]);
        assert_eq!(grid.at_offset(10, 0), Some(CODE_WALL));
        assert_eq!(grid.at_offset(0, 10), Some(CODE_FREE));
    }

    #[test]
    fn test_local_grid_places_actors() {
        let world = walled_world();
        let pose = Pose::new(40.5, 40.5, 0.0);
        let others = [
            Actor::new(Pose::new(43.5, 40.5, 0.0), ClassTag::Agent),
            Actor::new(Pose::new(40.5, 35.5, 1.0), ClassTag::Bot),
            // on top of the wall column
            Actor::new(Pose::new(50.6, 40.5, 0.0), ClassTag::Bot),
            // out of the window
            Actor::new(Pose::new(40.5, 70.5, 0.0), ClassTag::Agent),
        ];
        let grid = LocalGrid::observe(&world, &pose, &others);
        assert_eq!(grid.at_offset(0, 3), Some(ClassTag::Agent.code()));
        // 5 units in -y is 5 units to the right when facing +x
        assert_eq!(grid.at_offset(5, 0), Some(ClassTag::Bot.code()));
        assert_eq!(grid.at_offset(0, 10), Some(ClassTag::Bot.code()));
        let actors = grid.cells().iter().filter(|&&c| c >= 2).count();
        assert_eq!(actors, 3);
    }

    #[test]
    fn test_local_grid_array_layout() {
        let world = open_world(40);
        let pose = Pose::new(40.0, 40.0, 0.0);
        let others = [Actor::new(Pose::new(42.0, 40.0, 0.0), ClassTag::Agent)];
        let grid = LocalGrid::observe_with_radius(&world, &pose, &others, 3);
        // forward offset 2 lives at column r - ly
        assert_eq!(grid.get(3, 1), 2);
    }

    #[test]
    fn test_radar_empty_open_world() {
        let world = open_world(60);
        let radar = RadarObservation::observe(&world, &Pose::new(60.0, 60.0, 0.0), &[]);
        assert!(radar.codes.iter().all(|&c| c == CODE_FREE));
        assert!(radar.depths.iter().all(|&d| d == 1.0));
        assert_eq!(radar.to_vec().len(), 48);
    }

    #[test]
    fn test_radar_wall_sector() {
        let world = walled_world();
        let radar = RadarObservation::observe(&world, &Pose::new(40.5, 40.5, 0.0), &[]);
        assert_eq!(radar.codes[0], CODE_WALL);
        // first sample inside x >= 50 is at 9.5
        assert_approx_eq!(radar.depths[0], 9.5 / 15.0, 1e-6);
        assert_eq!(radar.codes[12], CODE_FREE);
        assert_eq!(radar.depths[12], 1.0);
    }

    #[test]
    fn test_radar_closest_actor_wins() {
        let world = open_world(60);
        let pose = Pose::new(60.0, 60.0, 0.0);
        let others = [
            Actor::new(Pose::new(60.0, 70.0, 0.0), ClassTag::Agent),
            Actor::new(Pose::new(60.0, 64.0, 0.0), ClassTag::Bot),
            Actor::new(Pose::new(60.0, 40.0, 0.0), ClassTag::Bot),
        ];
        let radar = RadarObservation::observe(&world, &pose, &others);
        // due north is sector 6
        assert_eq!(radar.codes[6], ClassTag::Bot.code());
        assert_approx_eq!(radar.depths[6], 4.0 / 15.0, 1e-6);
        // the actor to the south is beyond perception range
        assert_eq!(radar.codes[18], CODE_FREE);
    }

    #[test]
    fn test_radar_wall_overrides_farther_actor() {
        let world = walled_world();
        let pose = Pose::new(40.5, 40.5, 0.0);
        let behind_wall = [Actor::new(Pose::new(53.5, 40.5, 0.0), ClassTag::Bot)];
        let radar = RadarObservation::observe(&world, &pose, &behind_wall);
        assert_eq!(radar.codes[0], CODE_WALL);

        let before_wall = [Actor::new(Pose::new(45.5, 40.5, 0.0), ClassTag::Agent)];
        let radar = RadarObservation::observe(&world, &pose, &before_wall);
        assert_eq!(radar.codes[0], ClassTag::Agent.code());
        assert_approx_eq!(radar.depths[0], 5.0 / 15.0, 1e-6);
    }

    #[test]
    fn test_radar_rotation_is_circular_shift() {
        let world = walled_world();
        let others = [
            Actor::new(Pose::new(45.5, 44.5, 0.0), ClassTag::Agent),
            Actor::new(Pose::new(33.0, 38.0, 0.0), ClassTag::Bot),
        ];
        let base = RadarObservation::observe(&world, &Pose::new(40.5, 40.5, 0.0), &others);
        assert_eq!(base.rotated(0), base);

        for step in 0..48 {
            let heading = step as f32 * PI / 24.0;
            let pose = Pose::new(40.5, 40.5, heading);
            let radar = RadarObservation::observe(&world, &pose, &others);
            let shift = sector_index(heading.to_degrees());
            assert_eq!(radar, base.rotated(shift), "heading {}", heading);
        }
    }

    #[test]
    fn test_radar_forward_alignment() {
        let world = walled_world();
        // facing +y the wall column is at sector 0 of the world, i.e. 90° clockwise
        let pose = Pose::new(40.5, 40.5, FRAC_PI_2);
        let radar = RadarObservation::observe(&world, &pose, &[]);
        assert_eq!(radar.codes[18], CODE_WALL);
        assert_eq!(radar.codes[0], CODE_FREE);
    }
}
