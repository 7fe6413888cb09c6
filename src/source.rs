use std::collections::VecDeque;

use crate::{Frame, FrameSource};

/// In-memory frame source, handy for replays and tests
#[derive(Debug, Default, Clone)]
pub struct Replay {
    frames: VecDeque<Frame>,
}

impl Replay {
    pub fn new<I: IntoIterator<Item = Frame>>(frames: I) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for Replay {
    #[inline]
    fn next_frame(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }
}
