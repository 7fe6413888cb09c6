use serde_derive::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Axis-aligned box in left-top-width-height format, frame pixel coordinates
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    #[inline]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a region from left-top and right-bottom corners
    #[inline]
    pub fn ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Right edge, saturating at the `i32` range
    #[inline(always)]
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    #[inline(always)]
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    #[inline(always)]
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Center of the box, truncated to whole pixels and clamped to the `i32` range
    #[inline]
    pub fn centroid(&self) -> (i32, i32) {
        (
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }

    /// True when the box is non-empty and lies entirely inside a `width`x`height` frame
    pub fn fits(&self, width: u32, height: u32) -> bool {
        !self.is_empty()
            && self.x >= 0
            && self.y >= 0
            && self.x as i64 + self.width as i64 <= width as i64
            && self.y as i64 + self.height as i64 <= height as i64
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseRegionError {
    #[error("expected four comma separated values `x,y,w,h`, got {0}")]
    Arity(usize),
    #[error("invalid coordinate `{0}`")]
    Coordinate(String),
}

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(ParseRegionError::Arity(parts.len()));
        }

        let mut vals = [0i32; 4];
        for (val, part) in vals.iter_mut().zip(&parts) {
            *val = part
                .parse()
                .map_err(|_| ParseRegionError::Coordinate(part.to_string()))?;
        }

        Ok(Region::new(vals[0], vals[1], vals[2], vals[3]))
    }
}

#[cfg(feature = "opencv")]
impl From<opencv::core::Rect> for Region {
    #[inline]
    fn from(r: opencv::core::Rect) -> Self {
        Region::new(r.x, r.y, r.width, r.height)
    }
}

#[cfg(feature = "opencv")]
impl From<Region> for opencv::core::Rect {
    #[inline]
    fn from(r: Region) -> Self {
        opencv::core::Rect::new(r.x, r.y, r.width, r.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_truncates() {
        assert_eq!(Region::new(12, 11, 50, 50).centroid(), (37, 36));
        assert_eq!(Region::new(0, 0, 5, 3).centroid(), (2, 1));
    }

    #[test]
    fn fits_inside_frame() {
        assert!(Region::new(10, 10, 50, 50).fits(100, 100));
        assert!(Region::new(0, 0, 100, 100).fits(100, 100));
        assert!(!Region::new(60, 10, 50, 50).fits(100, 100));
        assert!(!Region::new(-1, 10, 5, 5).fits(100, 100));
        assert!(!Region::new(10, 10, 0, 5).fits(100, 100));
        assert!(!Region::new(10, 10, 5, -5).fits(100, 100));
    }

    #[test]
    fn edges_near_i32_max_do_not_wrap() {
        let far = "2147483000,0,1000,10".parse::<Region>().unwrap();
        assert!(!far.fits(100, 100));
        assert_eq!(far.right(), i32::MAX);
        assert_eq!(far.centroid(), (2147483500, 5));

        let tall = Region::new(0, i32::MAX - 1, 10, i32::MAX);
        assert!(!tall.fits(100, 100));
        assert_eq!(tall.centroid(), (5, i32::MAX));

        let low = Region::new(i32::MIN, i32::MIN, -10, -10);
        assert_eq!(low.centroid(), (i32::MIN, i32::MIN));
    }

    #[test]
    fn ltrb_corners() {
        let r = Region::ltrb(10, 20, 40, 60);
        assert_eq!(r, Region::new(10, 20, 30, 40));
        assert_eq!((r.right(), r.bottom()), (40, 60));
    }

    #[test]
    fn parse_from_cli() {
        assert_eq!("10, 10,50,50".parse::<Region>(), Ok(Region::new(10, 10, 50, 50)));
        assert_eq!("1,2,3".parse::<Region>(), Err(ParseRegionError::Arity(3)));
        assert_eq!(
            "1,2,x,4".parse::<Region>(),
            Err(ParseRegionError::Coordinate("x".into()))
        );
        assert_eq!(Region::new(1, 2, 3, 4).to_string(), "1,2,3,4");
    }
}
