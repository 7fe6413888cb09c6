//! Pull loop tying a frame source, a tracking session and an optional
//! trajectory sink together.

use std::ops::ControlFlow;

use tracing::{info, warn};

use crate::error::{Error, StateError};
use crate::recorder::PointSink;
use crate::{Frame, FrameSource, Region, TrackResult, Tracker, TrackingSession, Trajectory};

/// What the presentation layer gets to see for each frame
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub frame_index: u64,
    pub result: TrackResult,
    pub trajectory: &'a Trajectory,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub found: u64,
    pub lost: u64,
    pub recorded: u64,
    /// Loop was stopped by the frame callback rather than by source exhaustion
    pub stopped: bool,
    /// First recorder failure, after which recording was switched off
    pub recorder_error: Option<String>,
}

/// Reads the first frame, asks `select` for the seed region and starts a session.
///
/// The seed frame itself is returned alongside the session so that callers
/// can display it.
pub fn seed<S, T, F>(source: &mut S, tracker: T, select: F) -> Result<(TrackingSession<T>, Frame), Error>
where
    S: FrameSource + ?Sized,
    T: Tracker,
    F: FnOnce(&Frame) -> Result<Region, Error>,
{
    let first = source.next_frame().ok_or(Error::NoFrame)?;
    let region = select(&first)?;

    let mut session = TrackingSession::new(tracker);
    session.initialize(&first, region)?;

    Ok((session, first))
}

/// Drives `session` until `source` is exhausted or `on_frame` breaks.
///
/// Recorder failures never abort tracking: the first one is logged, stored
/// in the summary and recording stops.
pub fn run<S, T, F>(
    source: &mut S,
    session: &mut TrackingSession<T>,
    mut sink: Option<&mut dyn PointSink>,
    mut on_frame: F,
) -> Result<RunSummary, StateError>
where
    S: FrameSource + ?Sized,
    T: Tracker,
    F: FnMut(&Frame, &Observation<'_>) -> ControlFlow<()>,
{
    let mut summary = RunSummary::default();

    while let Some(frame) = source.next_frame() {
        let frame_index = session.frames_seen();
        let result = session.step(&frame)?;

        summary.frames += 1;
        match result {
            TrackResult::Found(_) => {
                summary.found += 1;

                let recorded = match (sink.as_mut(), session.current_trajectory().last()) {
                    (Some(rec), Some(point)) => Some(rec.record(point)),
                    _ => None,
                };

                match recorded {
                    Some(Ok(())) => summary.recorded += 1,
                    Some(Err(err)) => {
                        warn!("trajectory recording disabled: {}", err);
                        summary.recorder_error = Some(err.to_string());
                        sink = None;
                    }
                    None => {}
                }
            }
            TrackResult::Lost => summary.lost += 1,
        }

        let obs = Observation {
            frame_index,
            result,
            trajectory: session.current_trajectory(),
        };

        if on_frame(&frame, &obs).is_break() {
            summary.stopped = true;
            break;
        }
    }

    info!(
        "tracking finished: {} frames, {} found, {} lost, {:.1}px travelled",
        summary.frames,
        summary.found,
        summary.lost,
        session.current_trajectory().path_length()
    );

    Ok(summary)
}
