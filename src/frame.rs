use ndarray::{Array3, ArrayView3, ShapeError};

use crate::region::Region;

/// Captured image, stored as `(height, width, channels)` bytes
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: Array3<u8>,
}

impl Frame {
    #[inline]
    pub fn new(pixels: Array3<u8>) -> Self {
        Self { pixels }
    }

    pub fn from_raw(
        width: u32,
        height: u32,
        channels: u32,
        data: Vec<u8>,
    ) -> Result<Self, ShapeError> {
        let shape = (height as usize, width as usize, channels as usize);

        Ok(Self::new(Array3::from_shape_vec(shape, data)?))
    }

    /// Zero-filled frame, mostly useful for synthetic sources
    pub fn blank(width: u32, height: u32, channels: u32) -> Self {
        Self::new(Array3::zeros((
            height as usize,
            width as usize,
            channels as usize,
        )))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.dim().1 as u32
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.dim().0 as u32
    }

    #[inline]
    pub fn channels(&self) -> u32 {
        self.pixels.dim().2 as u32
    }

    /// (width, height)
    #[inline]
    pub fn dims(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn contains(&self, region: &Region) -> bool {
        region.fits(self.width(), self.height())
    }

    #[inline]
    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// Row-major interleaved bytes, `None` if the buffer is not contiguous
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.pixels.as_slice()
    }

    #[inline]
    pub fn into_inner(self) -> Array3<u8> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dims_follow_layout() {
        let frame = Frame::blank(100, 60, 3);
        assert_eq!(frame.dims(), (100, 60));
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.as_bytes().map(<[u8]>::len), Some(100 * 60 * 3));
        assert!(frame.contains(&Region::new(0, 0, 100, 60)));
        assert!(!frame.contains(&Region::new(0, 0, 60, 100)));
    }

    #[test]
    fn raw_buffer_must_match_shape() {
        assert!(Frame::from_raw(2, 2, 1, vec![0, 1, 2, 3]).is_ok());
        assert!(Frame::from_raw(2, 2, 3, vec![0, 1, 2, 3]).is_err());
    }
}
