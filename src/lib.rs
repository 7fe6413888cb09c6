pub mod config;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod recorder;
pub mod region;
pub mod sensor;
pub mod server;
pub mod session;
pub mod source;
pub mod stream;
pub mod trajectory;

#[cfg(feature = "opencv")]
pub mod backend;
#[cfg(feature = "opencv")]
pub mod render;

mod track;

pub use frame::Frame;
pub use region::Region;
pub use session::{SessionState, TrackResult, TrackingSession};
pub use track::TrackPoint;
pub use trajectory::Trajectory;

/// Single-object visual tracker backend
pub trait Tracker {
    /// Binds the tracker to `region` on `frame`, returns false if the backend refuses
    fn init(&mut self, frame: &Frame, region: Region) -> bool;

    /// Locates the object on the next frame, `None` when it is lost
    fn update(&mut self, frame: &Frame) -> Option<Region>;
}

impl<T: Tracker + ?Sized> Tracker for Box<T> {
    #[inline]
    fn init(&mut self, frame: &Frame, region: Region) -> bool {
        (**self).init(frame, region)
    }

    #[inline]
    fn update(&mut self, frame: &Frame) -> Option<Region> {
        (**self).update(frame)
    }
}

/// Sequential image supplier; `None` ends the stream for good
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    #[inline]
    fn next_frame(&mut self) -> Option<Frame> {
        (**self).next_frame()
    }
}
