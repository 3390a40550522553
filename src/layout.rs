//! Random round layouts
//!
//! Points are scattered with rejection sampling so no two centres are closer
//! than `MIN_POINT_DISTANCE`. Special kinds and bonus points are handed out
//! by level, each to a distinct normal point.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{Obstacle, Point, PointKind, RoundLayout};

/// Give up on a point after this many rejected positions
const MAX_PLACEMENT_ATTEMPTS: u32 = 2_000;

/// Parameters for one layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub count: usize,
    pub level: u32,
    pub width: f32,
    pub height: f32,
    pub point_radius: f32,
    /// Add drifting obstacles
    pub moving_obstacles: bool,
}

impl LayoutRequest {
    pub fn bounds(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Produces points, obstacles and bonus set at round start
pub trait LayoutGenerator {
    fn generate(&mut self, request: &LayoutRequest) -> RoundLayout;
}

/// Seeded generator (same seed, same sequence of layouts)
#[derive(Debug, Clone)]
pub struct RandomLayout {
    rng: Pcg32,
}

impl RandomLayout {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn scatter_points(&mut self, request: &LayoutRequest) -> Vec<Point> {
        let margin = request.point_radius * 2.0;
        let max = Vec2::new(request.width - margin, request.height - margin);
        let mut points: Vec<Point> = Vec::with_capacity(request.count);

        if max.x <= margin || max.y <= margin {
            log::warn!(
                "Canvas {}x{} too small for points of radius {}",
                request.width,
                request.height,
                request.point_radius
            );
            return points;
        }

        for _ in 0..request.count {
            let placed = (0..MAX_PLACEMENT_ATTEMPTS).find_map(|_| {
                let pos = Vec2::new(
                    self.rng.random_range(margin..max.x),
                    self.rng.random_range(margin..max.y),
                );
                let clear = points
                    .iter()
                    .all(|p| p.pos.distance(pos) >= MIN_POINT_DISTANCE);
                clear.then_some(pos)
            });

            match placed {
                Some(pos) => points.push(Point::new(pos)),
                None => {
                    log::warn!(
                        "Only {} of {} points fit on the canvas",
                        points.len(),
                        request.count
                    );
                    break;
                }
            }
        }

        points
    }

    fn spawn_obstacles(&mut self, request: &LayoutRequest) -> Vec<Obstacle> {
        (0..request.level)
            .map(|_| {
                let size = Vec2::new(
                    self.rng.random_range(30.0..60.0),
                    self.rng.random_range(30.0..60.0),
                );
                let pos = Vec2::new(
                    self.rng.random_range(0.0..(request.width - size.x).max(1.0)),
                    self.rng.random_range(0.0..(request.height - size.y).max(1.0)),
                );
                let speed: f32 = self.rng.random_range(60.0..180.0);
                let angle: f32 = self.rng.random_range(0.0..std::f32::consts::TAU);
                Obstacle {
                    pos,
                    size,
                    vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                }
            })
            .collect()
    }
}

impl LayoutGenerator for RandomLayout {
    fn generate(&mut self, request: &LayoutRequest) -> RoundLayout {
        let mut points = self.scatter_points(request);
        let mut bonus = BTreeSet::new();
        let level = request.level;

        if level >= 2 {
            // Normal points not yet given a role, in random order
            let mut free: Vec<usize> = (0..points.len()).collect();
            free.shuffle(&mut self.rng);

            if level >= 3 {
                let pairs = (level / 3).min(2) as usize;
                for _ in 0..pairs {
                    let (Some(a), Some(b)) = (free.pop(), free.pop()) else {
                        break;
                    };
                    points[a].kind = PointKind::Teleport { paired: b };
                    points[b].kind = PointKind::Teleport { paired: a };
                }
            }

            if level >= 4 {
                let splits = ((level - 3) / 2).min(2) as usize;
                for index in free.split_off(free.len().saturating_sub(splits)) {
                    points[index].kind = PointKind::Split;
                }
            }

            if level >= 5 {
                let timers = ((level - 4) / 2).min(2) as usize;
                for index in free.split_off(free.len().saturating_sub(timers)) {
                    points[index].kind = PointKind::Time;
                }
            }

            let bonus_count = (level / 2).min(3) as usize;
            bonus.extend(free.iter().rev().take(bonus_count));
        }

        let obstacles = if request.moving_obstacles {
            self.spawn_obstacles(request)
        } else {
            Vec::new()
        };

        log::info!(
            "Level {} layout: {} points, {} bonus, {} obstacles",
            level,
            points.len(),
            bonus.len(),
            obstacles.len()
        );

        RoundLayout {
            points,
            obstacles,
            bonus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(count: usize, level: u32) -> LayoutRequest {
        LayoutRequest {
            count,
            level,
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            point_radius: POINT_RADIUS,
            moving_obstacles: false,
        }
    }

    #[test]
    fn test_points_are_spaced() {
        let layout = RandomLayout::new(42).generate(&request(20, 1));
        assert_eq!(layout.points.len(), 20);
        for (i, a) in layout.points.iter().enumerate() {
            for b in &layout.points[i + 1..] {
                assert!(a.pos.distance(b.pos) >= MIN_POINT_DISTANCE);
            }
        }
    }

    #[test]
    fn test_points_stay_inside_margin() {
        let layout = RandomLayout::new(7).generate(&request(15, 1));
        let margin = POINT_RADIUS * 2.0;
        for p in &layout.points {
            assert!(p.pos.x >= margin && p.pos.x <= DEFAULT_CANVAS_WIDTH - margin);
            assert!(p.pos.y >= margin && p.pos.y <= DEFAULT_CANVAS_HEIGHT - margin);
        }
    }

    #[test]
    fn test_level_one_has_no_specials() {
        let layout = RandomLayout::new(1).generate(&request(10, 1));
        assert!(layout.points.iter().all(|p| p.kind == PointKind::Normal));
        assert!(layout.bonus.is_empty());
        assert!(layout.obstacles.is_empty());
    }

    #[test]
    fn test_teleports_are_paired() {
        let layout = RandomLayout::new(99).generate(&request(12, 3));
        let teleports: Vec<(usize, usize)> = layout
            .points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| match p.kind {
                PointKind::Teleport { paired } => Some((i, paired)),
                _ => None,
            })
            .collect();
        assert_eq!(teleports.len(), 2);
        for (i, paired) in teleports {
            assert_ne!(i, paired);
            assert_eq!(
                layout.points[paired].kind,
                PointKind::Teleport { paired: i }
            );
        }
    }

    #[test]
    fn test_level_five_roles() {
        let layout = RandomLayout::new(5).generate(&request(12, 5));
        let splits = layout
            .points
            .iter()
            .filter(|p| p.kind == PointKind::Split)
            .count();
        assert_eq!(splits, 1);
        assert_eq!(layout.bonus.len(), 2);
        // Bonus points are always plain points
        for &i in &layout.bonus {
            assert_eq!(layout.points[i].kind, PointKind::Normal);
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = RandomLayout::new(1234).generate(&request(10, 4));
        let b = RandomLayout::new(1234).generate(&request(10, 4));
        assert_eq!(a.points, b.points);
        assert_eq!(a.bonus, b.bonus);
    }

    #[test]
    fn test_obstacles_follow_level() {
        let req = LayoutRequest {
            moving_obstacles: true,
            ..request(8, 3)
        };
        let layout = RandomLayout::new(3).generate(&req);
        assert_eq!(layout.obstacles.len(), 3);
        for o in &layout.obstacles {
            assert!(o.vel.length() > 0.0);
        }
    }

    #[test]
    fn test_crowded_canvas_returns_fewer_points() {
        let req = LayoutRequest {
            width: 120.0,
            height: 120.0,
            ..request(20, 1)
        };
        let layout = RandomLayout::new(8).generate(&req);
        assert!(layout.points.len() < 20);
        assert!(!layout.points.is_empty());
    }
}
