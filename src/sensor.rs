use std::fs;
use std::path::{Path, PathBuf};

use serde_derive::Serialize;

use crate::config::SensorConfig;
use crate::error::SensorError;

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// degrees Celsius
    pub temperature: f64,
    /// hPa
    pub pressure: f64,
}

impl SensorReading {
    #[inline]
    pub fn new(temperature: f64, pressure: f64) -> Self {
        Self {
            temperature,
            pressure,
        }
    }

    /// Both values rounded to two decimals
    pub fn rounded(&self) -> Self {
        Self::new(round2(self.temperature), round2(self.pressure))
    }
}

#[inline]
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub trait SensorReader {
    fn read(&mut self) -> Result<SensorReading, SensorError>;
}

/// Always reports the same values; stands in when no hardware is attached
#[derive(Debug, Clone, Copy)]
pub struct FixedSensor(pub SensorReading);

impl SensorReader for FixedSensor {
    #[inline]
    fn read(&mut self) -> Result<SensorReading, SensorError> {
        Ok(self.0)
    }
}

/// Barometer exposed by the Linux IIO subsystem (e.g. the `bmp280` driver)
#[derive(Debug, Clone)]
pub struct IioBarometer {
    dir: PathBuf,
}

impl IioBarometer {
    const TEMPERATURE: &'static str = "in_temp_input";
    const PRESSURE: &'static str = "in_pressure_input";

    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn read_value(&self, name: &str) -> Result<f64, SensorError> {
        let raw = fs::read_to_string(self.dir.join(name))?;
        let raw = raw.trim();

        raw.parse()
            .map_err(|_| SensorError::Parse(format!("{}: {}", name, raw)))
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SensorReader for IioBarometer {
    fn read(&mut self) -> Result<SensorReading, SensorError> {
        // milli-degrees and kPa
        let temperature = self.read_value(Self::TEMPERATURE)? / 1000.0;
        let pressure = self.read_value(Self::PRESSURE)? * 10.0;

        Ok(SensorReading::new(temperature, pressure))
    }
}

/// Picks the reader described by `config`
pub fn from_config(config: &SensorConfig) -> Box<dyn SensorReader + Send> {
    match &config.iio_device {
        Some(dir) => Box::new(IioBarometer::new(dir.clone())),
        None => Box::new(FixedSensor(SensorReading::new(
            config.fixed_temperature,
            config.fixed_pressure,
        ))),
    }
}
