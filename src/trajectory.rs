use crate::track::TrackPoint;
use nalgebra as na;
use std::{fmt, ops::Index, slice};

/// Append-only history of tracked positions, ordered by frame index
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Trajectory {
    points: Vec<TrackPoint>,
}

impl fmt::Debug for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.points.fmt(f)
    }
}

impl Trajectory {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `point`, refusing it unless its frame index is past the last one
    #[must_use]
    pub(crate) fn push(&mut self, point: TrackPoint) -> bool {
        if let Some(last) = self.points.last() {
            if point.frame_index <= last.frame_index {
                return false;
            }
        }

        self.points.push(point);

        true
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.points.clear()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    #[inline]
    pub fn first(&self) -> Option<&TrackPoint> {
        self.points.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, TrackPoint> {
        self.points.iter()
    }

    /// Consecutive point pairs, i.e. the polyline drawn over the frame
    #[inline]
    pub fn segments(&self) -> impl Iterator<Item = (&TrackPoint, &TrackPoint)> {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }

    /// Total distance travelled along the polyline, in pixels
    pub fn path_length(&self) -> f32 {
        self.segments()
            .map(|(a, b)| na::distance(&a.position(), &b.position()))
            .sum()
    }

    /// Straight-line distance between the first and the last point
    pub fn displacement(&self) -> f32 {
        match (self.first(), self.last()) {
            (Some(a), Some(b)) => na::distance(&a.position(), &b.position()),
            _ => 0.0,
        }
    }
}

impl Index<usize> for Trajectory {
    type Output = TrackPoint;

    #[inline]
    fn index(&self, idx: usize) -> &TrackPoint {
        &self.points[idx]
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrackPoint;
    type IntoIter = slice::Iter<'a, TrackPoint>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_stale_frames() {
        let mut t = Trajectory::new();
        assert!(t.push(TrackPoint::new(0, 1, 1)));
        assert!(t.push(TrackPoint::new(3, 2, 2)));
        assert!(!t.push(TrackPoint::new(3, 5, 5)));
        assert!(!t.push(TrackPoint::new(1, 5, 5)));
        assert_eq!(t.len(), 2);
        assert_eq!(t[1], TrackPoint::new(3, 2, 2));
    }

    #[test]
    fn path_length_sums_segments() {
        let mut t = Trajectory::new();
        assert!(t.push(TrackPoint::new(0, 0, 0)));
        assert!(t.push(TrackPoint::new(1, 3, 4)));
        assert!(t.push(TrackPoint::new(2, 3, 0)));

        assert_eq!(t.segments().count(), 2);
        assert!((t.path_length() - 9.0).abs() < 1e-5);
        assert!((t.displacement() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn empty_has_no_length() {
        let t = Trajectory::new();
        assert_eq!(t.segments().count(), 0);
        assert_eq!(t.path_length(), 0.0);
        assert_eq!(t.displacement(), 0.0);
    }
}
