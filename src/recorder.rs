use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde_derive::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::RecorderError;
use crate::TrackPoint;

pub const HEADER: [&str; 3] = ["Frame", "X", "Y"];

/// Anything that accepts tracked points as they are produced
pub trait PointSink {
    fn record(&mut self, point: &TrackPoint) -> Result<(), RecorderError>;
}

impl PointSink for Vec<TrackPoint> {
    fn record(&mut self, point: &TrackPoint) -> Result<(), RecorderError> {
        self.push(*point);
        Ok(())
    }
}

/// One row of the table, named after the header columns
#[derive(Serialize, Deserialize)]
struct Row {
    #[serde(rename = "Frame")]
    frame: u64,
    #[serde(rename = "X")]
    x: i32,
    #[serde(rename = "Y")]
    y: i32,
}

impl From<&TrackPoint> for Row {
    fn from(p: &TrackPoint) -> Self {
        Row {
            frame: p.frame_index,
            x: p.x,
            y: p.y,
        }
    }
}

/// Writes a `Frame,X,Y` table, one row per tracked frame.
///
/// Every row is flushed as soon as it is written so that a crash loses at
/// most the row in flight. Dropping the recorder flushes whatever is left.
pub struct TrajectoryRecorder<W: Write> {
    writer: Option<csv::Writer<W>>,
    last_frame: Option<u64>,
    rows: u64,
}

impl TrajectoryRecorder<File> {
    /// Creates (or truncates) `path` and writes the header row
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RecorderError> {
        let path = path.as_ref();
        let file = File::create(path)?;

        info!("recording trajectory to {}", path.display());

        Self::from_writer(file)
    }
}

impl<W: Write> TrajectoryRecorder<W> {
    pub fn from_writer(writer: W) -> Result<Self, RecorderError> {
        // header goes out explicitly so that an empty run still leaves one
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(HEADER)?;
        writer.flush()?;

        Ok(Self {
            writer: Some(writer),
            last_frame: None,
            rows: 0,
        })
    }

    /// Number of data rows written so far
    #[inline]
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes and hands back the underlying writer
    pub fn finish(mut self) -> Result<W, RecorderError> {
        match self.writer.take() {
            Some(writer) => writer
                .into_inner()
                .map_err(|err| RecorderError::Io(err.into_error())),
            None => unreachable!("writer is only taken by finish or drop"),
        }
    }

    fn writer(&mut self) -> &mut csv::Writer<W> {
        self.writer
            .as_mut()
            .unwrap_or_else(|| unreachable!("writer is only taken by finish or drop"))
    }
}

impl<W: Write> PointSink for TrajectoryRecorder<W> {
    fn record(&mut self, point: &TrackPoint) -> Result<(), RecorderError> {
        if let Some(last) = self.last_frame {
            if point.frame_index <= last {
                return Err(RecorderError::OutOfOrder {
                    last,
                    got: point.frame_index,
                });
            }
        }

        let writer = self.writer();
        writer.serialize(Row::from(point))?;
        writer.flush()?;

        self.last_frame = Some(point.frame_index);
        self.rows += 1;

        Ok(())
    }
}

impl<W: Write> Drop for TrajectoryRecorder<W> {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(err) = writer.flush() {
                warn!("failed to flush trajectory log: {}", err);
            }
        }
    }
}

/// Parses a table produced by [`TrajectoryRecorder`]
pub fn read_trajectory<R: Read>(reader: R) -> Result<Vec<TrackPoint>, RecorderError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers()?;
    if headers.iter().ne(HEADER) {
        return Err(RecorderError::Header(
            headers.iter().collect::<Vec<_>>().join(","),
        ));
    }

    rdr.deserialize::<Row>()
        .map(|row| -> Result<TrackPoint, RecorderError> {
            let row = row?;
            Ok(TrackPoint::new(row.frame, row.x, row.y))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn csv_line(err: &RecorderError) -> Option<u64> {
        match err {
            RecorderError::Csv(err) => err.position().map(|pos| pos.line()),
            _ => None,
        }
    }

    #[test]
    fn header_is_written_on_open() {
        let rec = TrajectoryRecorder::from_writer(Vec::new()).unwrap();
        let out = rec.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Frame,X,Y\n");
    }

    #[test]
    fn rows_read_back() {
        let points = [
            TrackPoint::new(0, 37, 36),
            TrackPoint::new(2, -4, 10),
            TrackPoint::new(7, 640, 480),
        ];

        let mut rec = TrajectoryRecorder::from_writer(Vec::new()).unwrap();
        for p in &points {
            rec.record(p).unwrap();
        }
        assert_eq!(rec.rows(), 3);

        let out = rec.finish().unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert_eq!(text.lines().count(), points.len() + 1);
        assert_eq!(text, "Frame,X,Y\n0,37,36\n2,-4,10\n7,640,480\n");

        let back = read_trajectory(Cursor::new(out)).unwrap();
        assert_eq!(back, points);
    }

    #[test]
    fn out_of_order_rows_are_refused() {
        let mut rec = TrajectoryRecorder::from_writer(Vec::new()).unwrap();
        rec.record(&TrackPoint::new(5, 1, 1)).unwrap();

        let err = rec.record(&TrackPoint::new(5, 2, 2)).unwrap_err();
        assert!(matches!(err, RecorderError::OutOfOrder { last: 5, got: 5 }));
        assert!(rec.record(&TrackPoint::new(3, 2, 2)).is_err());
        assert_eq!(rec.rows(), 1);

        let text = String::from_utf8(rec.finish().unwrap()).unwrap();
        assert_eq!(text, "Frame,X,Y\n5,1,1\n");
    }

    #[test]
    fn malformed_tables() {
        assert!(matches!(
            read_trajectory(Cursor::new("")),
            Err(RecorderError::Header(h)) if h.is_empty()
        ));
        assert!(matches!(
            read_trajectory(Cursor::new("a,b,c\n")),
            Err(RecorderError::Header(h)) if h == "a,b,c"
        ));

        let short = read_trajectory(Cursor::new("Frame,X,Y\n1,2\n")).unwrap_err();
        assert!(matches!(short, RecorderError::Csv(_)));

        let bad = read_trajectory(Cursor::new("Frame,X,Y\n1,2,3\nx,2,3\n")).unwrap_err();
        assert_eq!(csv_line(&bad), Some(3));
    }

    #[test]
    fn open_creates_file() {
        let path = std::env::temp_dir().join(format!(
            "snailtrack-recorder-{}.csv",
            std::process::id()
        ));

        {
            let mut rec = TrajectoryRecorder::open(&path).unwrap();
            rec.record(&TrackPoint::new(0, 1, 2)).unwrap();
            rec.record(&TrackPoint::new(1, 3, 4)).unwrap();
        }

        let file = std::io::BufReader::new(File::open(&path).unwrap());
        let back = read_trajectory(file).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(back, vec![TrackPoint::new(0, 1, 2), TrackPoint::new(1, 3, 4)]);
    }
}
