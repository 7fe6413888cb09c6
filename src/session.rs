use tracing::{debug, info, warn};

use crate::error::{InitError, StateError};
use crate::trajectory::Trajectory;
use crate::{Frame, Region, TrackPoint, Tracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Tracking,
    Lost,
}

/// Outcome of one tracked frame; losing the object is not an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackResult {
    Found(Region),
    Lost,
}

impl TrackResult {
    #[inline]
    pub fn region(&self) -> Option<Region> {
        match self {
            TrackResult::Found(region) => Some(*region),
            TrackResult::Lost => None,
        }
    }

    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, TrackResult::Found(_))
    }
}

/// Single-object tracking run: one tracker, one trajectory
pub struct TrackingSession<T: Tracker> {
    tracker: T,
    state: SessionState,
    region: Option<Region>,
    trajectory: Trajectory,
    next_index: u64,
}

impl<T: Tracker> TrackingSession<T> {
    pub fn new(tracker: T) -> Self {
        Self {
            tracker,
            state: SessionState::Uninitialized,
            region: None,
            trajectory: Trajectory::new(),
            next_index: 0,
        }
    }

    /// Binds the tracker to `seed` on `frame` and starts a fresh trajectory.
    ///
    /// An invalid seed leaves the session as it was. A backend refusal
    /// leaves it uninitialized.
    pub fn initialize(&mut self, frame: &Frame, seed: Region) -> Result<(), InitError> {
        if !frame.contains(&seed) {
            warn!(
                "seed region {} does not fit a {}x{} frame",
                seed,
                frame.width(),
                frame.height()
            );
            return Err(InitError::InvalidRegion);
        }

        if !self.tracker.init(frame, seed) {
            self.state = SessionState::Uninitialized;
            self.region = None;
            return Err(InitError::BackendFailure);
        }

        info!("tracking started at {}", seed);

        self.state = SessionState::Tracking;
        self.region = Some(seed);
        self.trajectory.clear();
        self.next_index = 0;

        Ok(())
    }

    /// Feeds the next frame to the tracker
    pub fn step(&mut self, frame: &Frame) -> Result<TrackResult, StateError> {
        if self.state == SessionState::Uninitialized {
            return Err(StateError::NotInitialized);
        }

        let frame_index = self.next_index;
        self.next_index += 1;

        match self.tracker.update(frame) {
            Some(region) => {
                if self.state == SessionState::Lost {
                    info!("frame {}: object recovered at {}", frame_index, region);
                }

                let appended = self
                    .trajectory
                    .push(TrackPoint::centroid(frame_index, &region));
                debug_assert!(appended, "frame indices only grow within a run");
                self.region = Some(region);
                self.state = SessionState::Tracking;

                debug!("frame {}: found {}", frame_index, region);

                Ok(TrackResult::Found(region))
            }
            None => {
                if self.state == SessionState::Tracking {
                    warn!("frame {}: object lost", frame_index);
                }

                self.state = SessionState::Lost;

                Ok(TrackResult::Lost)
            }
        }
    }

    #[inline]
    pub fn current_trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Last region reported by the tracker (or the seed)
    #[inline]
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    /// Number of frames stepped since the last successful initialization
    #[inline]
    pub fn frames_seen(&self) -> u64 {
        self.next_index
    }

    #[inline]
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    #[inline]
    pub fn into_tracker(self) -> T {
        self.tracker
    }
}
