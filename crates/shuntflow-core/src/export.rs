use std::io::Write;

use csv::Writer;

use crate::error::Result;
use crate::sectors::SectorResult;
use crate::series::TimeSeriesSample;

pub const SECTOR_CSV_HEADER: [&str; 6] = ["Angle", "TAWSS", "OSI", "RRT", "MaxWSS", "MaxFrame"];

pub const TIME_SERIES_CSV_HEADER: [&str; 5] = ["Frame", "TimeSec", "AvgWSS", "Area", "PressureProxy"];

/// Whole angles print as integers, fractional ones with two decimals.
fn format_angle(angle: f64) -> String {
    if angle.fract() == 0.0 && angle.is_finite() {
        format!("{}", angle as i64)
    } else {
        format!("{angle:.2}")
    }
}

/// One row per sector, in angle order.
pub fn write_sector_csv<W: Write>(writer: W, results: &[SectorResult]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(SECTOR_CSV_HEADER)?;

    for r in results {
        wtr.write_record(&[
            format_angle(r.angle),
            format!("{:.2}", r.tawss),
            format!("{:.3}", r.osi),
            format!("{:.3}", r.rrt),
            format!("{:.2}", r.max_wss),
            r.max_frame.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn sector_csv_string(results: &[SectorResult]) -> Result<String> {
    let mut buf = Vec::new();
    write_sector_csv(&mut buf, results)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// One row per retained sample. `TimeSec` is empty when the source had no timestamps.
pub fn write_time_series_csv<W: Write>(writer: W, samples: &[TimeSeriesSample]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(TIME_SERIES_CSV_HEADER)?;

    for s in samples {
        wtr.write_record(&[
            s.frame_index.to_string(),
            s.time_sec.map_or(String::new(), |t| format!("{t:.3}")),
            format!("{:.2}", s.avg_wss),
            format!("{:.4}", s.area),
            format!("{:.2}", s.pressure_proxy),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
