use crate::region::Region;
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Position of the tracked object at a given frame
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackPoint {
    pub frame_index: u64,
    pub x: i32,
    pub y: i32,
}

impl TrackPoint {
    #[inline]
    pub fn new(frame_index: u64, x: i32, y: i32) -> Self {
        Self { frame_index, x, y }
    }

    /// Point at the centroid of `region`
    #[inline]
    pub fn centroid(frame_index: u64, region: &Region) -> Self {
        let (x, y) = region.centroid();

        Self::new(frame_index, x, y)
    }

    #[inline]
    pub fn position(&self) -> na::Point2<f32> {
        na::Point2::new(self.x as f32, self.y as f32)
    }
}
