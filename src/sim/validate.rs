//! Move validation
//!
//! Decides whether a clicked point may extend the path. Rules run in a fixed
//! order and the first one that fails names the rejection.

use serde::{Deserialize, Serialize};

use super::geometry::segments_intersect;
use super::state::{Point, RoundConfig};

/// Why a move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum MoveRejection {
    #[error("Point {index} does not exist")]
    UnknownPoint { index: usize },

    #[error("Maximum path length of {max} reached!")]
    MaxLengthExceeded { max: usize },

    #[error("Points must be connected in order! Next is {}", .expected + 1)]
    OutOfOrder { expected: usize },

    #[error("Point {} is already on the path", .index + 1)]
    AlreadyVisited { index: usize },

    #[error("Path collision! Game over")]
    SelfCollision,
}

impl MoveRejection {
    /// Rejection also ends the round
    pub fn is_terminal(&self) -> bool {
        matches!(self, MoveRejection::SelfCollision)
    }
}

/// Check whether `candidate` may be appended to `path`
///
/// The first click of a round is always allowed unless ordering demands a
/// different starting point. Re-entering the first point is allowed only as
/// the closing move, once every point is on the path; the closing move is
/// not collision-checked.
pub fn validate(
    path: &[usize],
    candidate: usize,
    points: &[Point],
    config: &RoundConfig,
) -> Result<(), MoveRejection> {
    if candidate >= points.len() {
        return Err(MoveRejection::UnknownPoint { index: candidate });
    }

    if let Some(max) = config.max_path_length {
        if !path.is_empty() && path.len() >= max {
            return Err(MoveRejection::MaxLengthExceeded { max });
        }
    }

    if config.required_order && path.len() < points.len() && candidate != path.len() {
        return Err(MoveRejection::OutOfOrder {
            expected: path.len(),
        });
    }

    if path.is_empty() {
        return Ok(());
    }

    if path.contains(&candidate) {
        let closes_loop = path.first() == Some(&candidate) && path.len() == points.len();
        return if closes_loop {
            Ok(())
        } else {
            Err(MoveRejection::AlreadyVisited { index: candidate })
        };
    }

    if crosses_path(path, candidate, points) {
        return Err(MoveRejection::SelfCollision);
    }

    Ok(())
}

/// Does the segment from the path's last point to `candidate` properly cross
/// any earlier segment of the path?
///
/// Only the newest segment is tested against the existing ones.
pub fn crosses_path(path: &[usize], candidate: usize, points: &[Point]) -> bool {
    let Some(&last) = path.last() else {
        return false;
    };
    if path.len() < 2 {
        return false;
    }

    let from = points[last].pos;
    let to = points[candidate].pos;

    path.windows(2)
        .any(|seg| segments_intersect(from, to, points[seg[0]].pos, points[seg[1]].pos))
}
