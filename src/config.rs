use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::Region;

/// Where frames come from
#[derive(Args, Debug, Clone)]
pub struct SourceConfig {
    /// Camera device index
    #[arg(long, default_value_t = 0, conflicts_with = "file")]
    pub camera: i32,

    /// Read frames from a video file instead of a camera
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

impl SourceConfig {
    /// Human readable name of the source, used in logs and errors
    pub fn describe(&self) -> String {
        match &self.file {
            Some(path) => path.display().to_string(),
            None => format!("camera {}", self.camera),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerKind {
    /// Discriminative correlation filter with channel and spatial reliability
    #[default]
    Csrt,
    /// Kernelized correlation filter, faster and less precise
    Kcf,
}

#[derive(Args, Debug, Clone)]
pub struct TrackingConfig {
    #[arg(long, value_enum, default_value_t = TrackerKind::Csrt)]
    pub tracker: TrackerKind,

    /// Seed region `x,y,w,h` on the first frame
    #[arg(long, value_name = "X,Y,W,H")]
    pub roi: Option<Region>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedMode {
    /// One camera and tracking session shared by every viewer
    #[default]
    Shared,
    /// Every viewer gets its own camera handle and tracking session
    PerConsumer,
}

#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    #[arg(long, value_enum, default_value_t = FeedMode::Shared)]
    pub feed_mode: FeedMode,

    /// Encoded frames buffered per viewer in shared mode
    #[arg(long, default_value_t = 4)]
    pub broadcast_capacity: usize,

    #[arg(long, default_value_t = 80)]
    pub jpeg_quality: i32,
}

#[derive(Args, Debug, Clone)]
pub struct SensorConfig {
    /// IIO device directory of the barometer, e.g. /sys/bus/iio/devices/iio:device0
    #[arg(long, value_name = "DIR")]
    pub iio_device: Option<PathBuf>,

    /// Temperature reported when no device is configured
    #[arg(long, default_value_t = 20.0)]
    pub fixed_temperature: f64,

    /// Pressure (hPa) reported when no device is configured
    #[arg(long, default_value_t = 1013.25)]
    pub fixed_pressure: f64,
}
