//! Encoded frame feeds for HTTP viewers.
//!
//! Camera pipelines block, so they run on their own threads and hand JPEG
//! buffers over channels. In shared mode one pipeline broadcasts to every
//! viewer; in per-consumer mode each viewer owns a pipeline that stops when
//! the viewer goes away.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use axum::body::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use crate::config::FeedMode;
use crate::error::Error;

pub const BOUNDARY: &str = "frame";
pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Wraps one JPEG image into a multipart part
pub fn multipart_chunk(jpeg: &[u8]) -> Bytes {
    let head = format!("--{}\r\nContent-Type: image/jpeg\r\n\r\n", BOUNDARY);
    let mut buf = Vec::with_capacity(head.len() + jpeg.len() + 2);
    buf.extend_from_slice(head.as_bytes());
    buf.extend_from_slice(jpeg);
    buf.extend_from_slice(b"\r\n");

    buf.into()
}

/// Producer of encoded frames, driven from a blocking thread
pub trait EncodedFeed {
    /// Next JPEG, `Ok(None)` once the underlying source is exhausted
    fn next_jpeg(&mut self) -> Result<Option<Bytes>, Error>;
}

/// Opens feeds on demand. `open` is called on the worker thread that will
/// drive the feed, so the feed itself does not have to be `Send`.
pub trait FeedFactory: Send + Sync + 'static {
    fn open(&self) -> Result<Box<dyn EncodedFeed>, Error>;
}

/// Runs `feed` until it ends, fails or `emit` reports that nobody listens
fn pump<F>(feed: &mut dyn EncodedFeed, mut emit: F) -> u64
where
    F: FnMut(Bytes) -> bool,
{
    let mut sent = 0;

    loop {
        match feed.next_jpeg() {
            Ok(Some(jpeg)) => {
                if !emit(jpeg) {
                    break;
                }
                sent += 1;
            }
            Ok(None) => break,
            Err(err) => {
                warn!("feed stopped: {}", err);
                break;
            }
        }
    }

    sent
}

/// Sender of the shared feed. Cleared by the worker once its source ends,
/// which closes the channel for every viewer.
type SharedSlot = Arc<Mutex<Option<broadcast::Sender<Bytes>>>>;

enum Mode {
    Shared(SharedSlot),
    PerConsumer,
}

/// Hands out frame streams to viewers according to a [`FeedMode`]
pub struct FeedHub {
    factory: Arc<dyn FeedFactory>,
    mode: Mode,
}

impl FeedHub {
    pub fn new(factory: Arc<dyn FeedFactory>, mode: FeedMode, capacity: usize) -> Self {
        let mode = match mode {
            FeedMode::Shared => {
                let (tx, _) = broadcast::channel(capacity.max(1));
                Mode::Shared(Arc::new(Mutex::new(Some(tx))))
            }
            FeedMode::PerConsumer => Mode::PerConsumer,
        };

        Self { factory, mode }
    }

    pub fn mode(&self) -> FeedMode {
        match self.mode {
            Mode::Shared(_) => FeedMode::Shared,
            Mode::PerConsumer => FeedMode::PerConsumer,
        }
    }

    /// Starts the shared pipeline; does nothing in per-consumer mode or once
    /// the shared pipeline has ended.
    ///
    /// Viewer streams end once the pipeline stops, and later viewers get an
    /// empty stream.
    pub fn start(&self) -> Option<thread::JoinHandle<()>> {
        let slot = match &self.mode {
            Mode::Shared(slot) => slot.clone(),
            Mode::PerConsumer => return None,
        };
        let tx = slot.lock().unwrap_or_else(PoisonError::into_inner).clone()?;
        let factory = self.factory.clone();

        Some(thread::spawn(move || {
            match factory.open() {
                Ok(mut feed) => {
                    info!("shared feed started");
                    // a send only fails while nobody is watching, keep tracking regardless
                    let sent = pump(feed.as_mut(), |jpeg| {
                        let _ = tx.send(jpeg);
                        true
                    });
                    info!("shared feed ended after {} frames", sent);
                }
                Err(err) => warn!("unable to open shared feed: {}", err),
            }

            slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        }))
    }

    /// Stream of JPEG images for one viewer
    pub fn subscribe(&self) -> BoxStream<'static, Bytes> {
        match &self.mode {
            Mode::Shared(slot) => {
                let rx = match slot.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
                    Some(tx) => tx.subscribe(),
                    None => return stream::empty().boxed(),
                };

                stream::unfold(rx, |mut rx| async move {
                    loop {
                        match rx.recv().await {
                            Ok(jpeg) => return Some((jpeg, rx)),
                            Err(broadcast::error::RecvError::Lagged(_)) => continue,
                            Err(broadcast::error::RecvError::Closed) => return None,
                        }
                    }
                })
                .boxed()
            }
            Mode::PerConsumer => {
                let (tx, rx) = mpsc::channel(2);
                let factory = self.factory.clone();

                tokio::task::spawn_blocking(move || match factory.open() {
                    Ok(mut feed) => {
                        let sent = pump(feed.as_mut(), |jpeg| tx.blocking_send(jpeg).is_ok());
                        info!("viewer feed closed after {} frames", sent);
                    }
                    Err(err) => warn!("unable to open viewer feed: {}", err),
                });

                stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|jpeg| (jpeg, rx)) })
                    .boxed()
            }
        }
    }
}
