//! Special point effects
//!
//! Applied once, right after a move onto the point is accepted.

use serde::{Deserialize, Serialize};

use super::state::{PointKind, RoundState};
use crate::consts::*;

/// What a special point did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialEffect {
    /// Path jumped on to the paired point
    Teleported { from: usize, to: usize },
    /// Paired point was already on the path, so the jump was skipped
    TeleportBlocked { from: usize, to: usize },
    /// Path cap raised (None when the round has no cap)
    PathExtended { max_path_length: Option<usize> },
    /// Countdown topped up
    TimeAdded { time_left: u32 },
}

/// Apply the effect of the point at `index`, which was just appended to the path
///
/// The teleport target is appended without validation and without triggering
/// its own effect. A target that is already on the path is only appended when
/// it closes the loop, so the path never gains a duplicate entry.
pub fn apply_special(state: &mut RoundState, index: usize) -> Option<SpecialEffect> {
    match state.points.get(index)?.kind {
        PointKind::Normal => None,
        PointKind::Teleport { paired } => {
            if paired >= state.points.len() {
                log::warn!("Teleport {} paired with missing point {}", index, paired);
                return None;
            }
            let closes_loop =
                state.path.first() == Some(&paired) && state.path.len() == state.points.len();
            if state.path.contains(&paired) && !closes_loop {
                log::debug!("Teleport {} -> {} skipped, target already visited", index, paired);
                return Some(SpecialEffect::TeleportBlocked {
                    from: index,
                    to: paired,
                });
            }
            state.path.push(paired);
            Some(SpecialEffect::Teleported {
                from: index,
                to: paired,
            })
        }
        PointKind::Split => {
            if let Some(max) = state.config.max_path_length.as_mut() {
                *max += SPLIT_EXTENSION;
            }
            Some(SpecialEffect::PathExtended {
                max_path_length: state.config.max_path_length,
            })
        }
        PointKind::Time => {
            state.time_left = (state.time_left + TIME_POINT_BONUS).min(MAX_TIME_LEFT);
            Some(SpecialEffect::TimeAdded {
                time_left: state.time_left,
            })
        }
    }
}
