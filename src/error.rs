use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    #[error("seed region is empty or lies outside the frame")]
    InvalidRegion,
    #[error("tracker backend refused initialization")]
    BackendFailure,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("tracking session has not been initialized")]
    NotInitialized,
}

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame {got} recorded after frame {last}")]
    OutOfOrder { last: u64, got: u64 },
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unexpected trajectory header `{0}`")]
    Header(String),
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("sensor returned `{0}`")]
    Parse(String),
    #[error("sensor is unavailable")]
    Unavailable,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Init Error: {0}")]
    Init(#[from] InitError),

    #[error("State Error: {0}")]
    State(#[from] StateError),

    #[error("Recorder Error: {0}")]
    Recorder(#[from] RecorderError),

    #[error("Sensor Error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame source produced no frame")]
    NoFrame,

    #[error("unable to open camera `{0}`")]
    CameraUnavailable(String),

    #[error("Shape Error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("unsupported frame format: {0}")]
    UnsupportedFrame(String),

    #[error("jpeg encoding failed")]
    Encode,

    #[cfg(feature = "opencv")]
    #[error("OpenCV Error: {0}")]
    OpenCvError(#[from] opencv::Error),
}
