//! Presentation of tracked frames: overlays, interactive window, JPEG feed.

use axum::body::Bytes;
use opencv::{
    core::{self, Mat, Point, Scalar, Vector},
    highgui, imgcodecs, imgproc,
    prelude::*,
};

use crate::backend::{self, Camera};
use crate::config::{SourceConfig, TrackerKind};
use crate::error::Error;
use crate::stream::{EncodedFeed, FeedFactory};
use crate::{pipeline, Frame, FrameSource, Region, TrackResult, Tracker, TrackingSession, Trajectory};

/// Text drawn at (100, 80) on frames where the object was lost
pub const LOST_LABEL: &str = "Lost";

/// What gets drawn over a tracked frame
#[derive(Debug, Clone, Copy)]
pub struct Overlay {
    pub box_color: Scalar,
    pub path_color: Scalar,
    pub label_color: Scalar,
    pub trajectory: bool,
    pub lost_label: bool,
}

impl Overlay {
    /// Box, trajectory and a "Lost" label, for the desktop window
    pub fn interactive() -> Self {
        Self {
            box_color: Scalar::new(0.0, 255.0, 0.0, 0.0),
            path_color: Scalar::new(255.0, 0.0, 0.0, 0.0),
            label_color: Scalar::new(0.0, 0.0, 255.0, 0.0),
            trajectory: true,
            lost_label: true,
        }
    }

    /// Box only; lost frames go out untouched
    pub fn stream() -> Self {
        Self {
            trajectory: false,
            lost_label: false,
            ..Self::interactive()
        }
    }

    pub fn draw(&self, frame: &mut Mat, result: TrackResult, trajectory: &Trajectory) -> opencv::Result<()> {
        match result {
            TrackResult::Found(region) => {
                imgproc::rectangle(
                    frame,
                    core::Rect::from(region),
                    self.box_color,
                    2,
                    imgproc::LINE_8,
                    0,
                )?;

                if self.trajectory {
                    for (a, b) in trajectory.segments() {
                        imgproc::line(
                            frame,
                            Point::new(a.x, a.y),
                            Point::new(b.x, b.y),
                            self.path_color,
                            2,
                            imgproc::LINE_8,
                            0,
                        )?;
                    }
                }
            }
            TrackResult::Lost if self.lost_label => {
                imgproc::put_text(
                    frame,
                    LOST_LABEL,
                    Point::new(100, 80),
                    imgproc::FONT_HERSHEY_SIMPLEX,
                    0.75,
                    self.label_color,
                    2,
                    imgproc::LINE_8,
                    false,
                )?;
            }
            TrackResult::Lost => {}
        }

        Ok(())
    }
}

pub fn encode_jpeg(frame: &Mat, quality: i32) -> Result<Bytes, Error> {
    let mut buf = Vector::<u8>::new();
    let params = Vector::<i32>::from_slice(&[imgcodecs::IMWRITE_JPEG_QUALITY, quality]);

    if !imgcodecs::imencode(".jpg", frame, &mut buf, &params)? {
        return Err(Error::Encode);
    }

    Ok(Bytes::from(buf.to_vec()))
}

/// Blocking rectangle selection on `frame`; an empty selection means cancelled
pub fn select_region(window: &str, frame: &Frame) -> Result<Region, Error> {
    let mat = backend::frame_to_mat(frame)?;
    let rect = highgui::select_roi(window, &mat, true, false, true)?;
    highgui::destroy_window(window)?;

    Ok(Region::from(rect))
}

/// Opens the camera once and lets the user pick the seed region
pub fn select_seed(source: &SourceConfig, window: &str) -> Result<Region, Error> {
    let mut camera = Camera::open(source)?;
    let frame = camera.next_frame().ok_or(Error::NoFrame)?;

    select_region(window, &frame)
}

/// Opens a camera plus tracking session for every feed it hands out
#[derive(Debug, Clone)]
pub struct CameraFeedFactory {
    pub source: SourceConfig,
    pub tracker: TrackerKind,
    pub seed: Region,
    pub overlay: Overlay,
    pub jpeg_quality: i32,
}

impl FeedFactory for CameraFeedFactory {
    fn open(&self) -> Result<Box<dyn EncodedFeed>, Error> {
        let mut camera = Camera::open(&self.source)?;
        let tracker = backend::create_tracker(self.tracker)?;
        let (session, _) = pipeline::seed(&mut camera, tracker, |_| Ok(self.seed))?;

        Ok(Box::new(CameraFeed {
            camera,
            session,
            overlay: self.overlay,
            jpeg_quality: self.jpeg_quality,
        }))
    }
}

struct CameraFeed {
    camera: Camera,
    session: TrackingSession<Box<dyn Tracker>>,
    overlay: Overlay,
    jpeg_quality: i32,
}

impl EncodedFeed for CameraFeed {
    fn next_jpeg(&mut self) -> Result<Option<Bytes>, Error> {
        let frame = match self.camera.next_frame() {
            Some(frame) => frame,
            None => return Ok(None),
        };

        let result = self.session.step(&frame)?;
        let mut mat = backend::frame_to_mat(&frame)?;
        self.overlay
            .draw(&mut mat, result, self.session.current_trajectory())?;

        encode_jpeg(&mat, self.jpeg_quality).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink(mat: &Mat) -> f64 {
        let sum = core::sum_elems(mat).unwrap();
        sum[0] + sum[1] + sum[2]
    }

    #[test]
    fn lost_label_is_interactive_only() {
        let blank = Frame::blank(320, 240, 3);
        let trajectory = Trajectory::new();

        let mut mat = backend::frame_to_mat(&blank).unwrap();
        Overlay::interactive()
            .draw(&mut mat, TrackResult::Lost, &trajectory)
            .unwrap();
        assert!(ink(&mat) > 0.0);

        let mut mat = backend::frame_to_mat(&blank).unwrap();
        Overlay::stream()
            .draw(&mut mat, TrackResult::Lost, &trajectory)
            .unwrap();
        assert_eq!(ink(&mat), 0.0);
        assert_eq!(LOST_LABEL, "Lost");
    }

    #[test]
    fn found_box_is_drawn_in_both_presets() {
        let blank = Frame::blank(320, 240, 3);
        let found = TrackResult::Found(Region::new(10, 10, 50, 50));

        for overlay in [Overlay::interactive(), Overlay::stream()] {
            let mut mat = backend::frame_to_mat(&blank).unwrap();
            overlay.draw(&mut mat, found, &Trajectory::new()).unwrap();
            assert!(ink(&mat) > 0.0);
        }
    }
}
