//! OpenCV camera capture and tracker adapters.

use opencv::{
    core::{self, Mat, Ptr, Rect},
    prelude::*,
    tracking, videoio,
};
use tracing::{info, warn};

use crate::config::{SourceConfig, TrackerKind};
use crate::error::Error;
use crate::{Frame, FrameSource, Region, Tracker};

/// Copies an 8-bit OpenCV image into a [`Frame`]
pub fn mat_to_frame(mat: &Mat) -> Result<Frame, Error> {
    if mat.depth() != core::CV_8U {
        return Err(Error::UnsupportedFrame(format!("depth {}", mat.depth())));
    }

    let owned;
    let mat = if mat.is_continuous() {
        mat
    } else {
        owned = mat.try_clone()?;
        &owned
    };

    let bytes = mat.data_bytes()?.to_vec();

    Ok(Frame::from_raw(
        mat.cols() as u32,
        mat.rows() as u32,
        mat.channels() as u32,
        bytes,
    )?)
}

/// Copies a [`Frame`] into a freshly allocated OpenCV image
pub fn frame_to_mat(frame: &Frame) -> Result<Mat, Error> {
    let typ = match frame.channels() {
        1 => core::CV_8UC1,
        3 => core::CV_8UC3,
        4 => core::CV_8UC4,
        n => return Err(Error::UnsupportedFrame(format!("{} channels", n))),
    };

    let mut mat = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        typ,
        core::Scalar::all(0.0),
    )?;

    let dst = mat.data_bytes_mut()?;
    match frame.as_bytes() {
        Some(src) => dst.copy_from_slice(src),
        None => dst
            .iter_mut()
            .zip(frame.view().iter())
            .for_each(|(d, s)| *d = *s),
    }

    Ok(mat)
}

/// Camera device or video file opened through `VideoCapture`.
///
/// The capture handle is released when the camera is dropped.
pub struct Camera {
    cap: videoio::VideoCapture,
    name: String,
}

impl Camera {
    pub fn open(config: &SourceConfig) -> Result<Self, Error> {
        let name = config.describe();
        let cap = match &config.file {
            Some(path) => videoio::VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?,
            None => videoio::VideoCapture::new(config.camera, videoio::CAP_ANY)?,
        };

        if !cap.is_opened()? {
            return Err(Error::CameraUnavailable(name));
        }

        let width = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
        info!("opened {} at {}x{}", name, width, height);

        Ok(Self { cap, name })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grabs the next image as an OpenCV matrix, `None` once the stream ends
    pub fn read_mat(&mut self) -> Option<Mat> {
        let mut mat = Mat::default();

        match self.cap.read(&mut mat) {
            Ok(true) if !mat.empty() => Some(mat),
            Ok(_) => None,
            Err(err) => {
                warn!("{}: read failed: {}", self.name, err);
                None
            }
        }
    }
}

impl FrameSource for Camera {
    fn next_frame(&mut self) -> Option<Frame> {
        let mat = self.read_mat()?;

        match mat_to_frame(&mat) {
            Ok(frame) => Some(frame),
            Err(err) => {
                warn!("{}: dropping unreadable frame: {}", self.name, err);
                None
            }
        }
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Err(err) = self.cap.release() {
            warn!("{}: release failed: {}", self.name, err);
        }
    }
}

enum Backend {
    Csrt(Ptr<tracking::TrackerCSRT>),
    Kcf(Ptr<tracking::TrackerKCF>),
}

/// OpenCV single-object tracker behind the [`Tracker`] capability
pub struct OpenCvTracker {
    backend: Backend,
    kind: TrackerKind,
}

impl OpenCvTracker {
    pub fn new(kind: TrackerKind) -> Result<Self, Error> {
        let backend = match kind {
            TrackerKind::Csrt => Backend::Csrt(tracking::TrackerCSRT::create_def()?),
            TrackerKind::Kcf => {
                let params = tracking::TrackerKCF_Params::default()?;
                Backend::Kcf(tracking::TrackerKCF::create(params)?)
            }
        };

        Ok(Self { backend, kind })
    }

    #[inline]
    pub fn kind(&self) -> TrackerKind {
        self.kind
    }

    fn try_init(&mut self, frame: &Frame, region: Region) -> Result<(), Error> {
        let mat = frame_to_mat(frame)?;
        let rect = Rect::from(region);

        match &mut self.backend {
            Backend::Csrt(t) => t.init(&mat, rect)?,
            Backend::Kcf(t) => t.init(&mat, rect)?,
        }

        Ok(())
    }

    fn try_update(&mut self, frame: &Frame) -> Result<Option<Region>, Error> {
        let mat = frame_to_mat(frame)?;
        let mut rect = Rect::default();

        let ok = match &mut self.backend {
            Backend::Csrt(t) => t.update(&mat, &mut rect)?,
            Backend::Kcf(t) => t.update(&mat, &mut rect)?,
        };

        let region = Region::from(rect);

        Ok((ok && !region.is_empty()).then_some(region))
    }
}

impl Tracker for OpenCvTracker {
    fn init(&mut self, frame: &Frame, region: Region) -> bool {
        match self.try_init(frame, region) {
            Ok(()) => true,
            Err(err) => {
                warn!("{:?} tracker init failed: {}", self.kind, err);
                false
            }
        }
    }

    fn update(&mut self, frame: &Frame) -> Option<Region> {
        self.try_update(frame).unwrap_or_else(|err| {
            warn!("{:?} tracker update failed: {}", self.kind, err);
            None
        })
    }
}

/// Builds the tracker named by `kind`
pub fn create_tracker(kind: TrackerKind) -> Result<Box<dyn Tracker>, Error> {
    Ok(Box::new(OpenCvTracker::new(kind)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mat_round_trip_keeps_pixels() {
        let mut frame_data = vec![0u8; 4 * 3 * 3];
        frame_data[3 * 5 + 1] = 200;
        let frame = Frame::from_raw(4, 3, 3, frame_data).unwrap();

        let mat = frame_to_mat(&frame).unwrap();
        assert_eq!((mat.cols(), mat.rows(), mat.channels()), (4, 3, 3));

        let back = mat_to_frame(&mat).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn two_channel_frames_are_refused() {
        let frame = Frame::blank(4, 4, 2);
        assert!(matches!(frame_to_mat(&frame), Err(Error::UnsupportedFrame(_))));
    }
}
