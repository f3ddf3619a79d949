//! Fixed-format EPW serialization
//!
//! Emits the 8-line header followed by one comma-separated line per hourly
//! record. The table is validated before any byte is written, and output
//! goes through a temporary file that is only renamed into place on full
//! success, so a failed run never leaves a truncated weather file behind.

use crate::generator::hours_in_year;
use crate::models::{EpwFile, EpwRecord};
use crate::{EpwGenError, Result};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// Serialize a validated EPW table to `path`
#[instrument(skip(epw), fields(path = %path.display()))]
pub fn write_epw(path: &Path, epw: &EpwFile) -> Result<()> {
    validate(epw)?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new()?,
    };

    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        for line in header_lines(epw) {
            writeln!(out, "{line}")?;
        }
        for record in &epw.records {
            writeln!(out, "{}", record.csv_row())?;
        }
        out.flush()?;
    }

    tmp.persist(path).map_err(|e| EpwGenError::Io {
        source: e.error,
    })?;

    info!(
        "Wrote {} header lines and {} records to {}",
        HEADER_LINE_COUNT,
        epw.records.len(),
        path.display()
    );
    Ok(())
}

/// Number of header lines preceding the record body
pub const HEADER_LINE_COUNT: usize = 8;

/// Check the table invariants that must hold before serialization
fn validate(epw: &EpwFile) -> Result<()> {
    let Some(first) = epw.records.first() else {
        return Err(EpwGenError::format("record table is empty"));
    };

    let expected = hours_in_year(first.year);
    if epw.records.len() != expected {
        return Err(EpwGenError::format(format!(
            "expected {} records for {}, table holds {}",
            expected,
            first.year,
            epw.records.len()
        )));
    }

    for pair in epw.records.windows(2) {
        if record_key(&pair[1]) <= record_key(&pair[0]) {
            return Err(EpwGenError::format(format!(
                "records are not in strictly increasing hour order around {}-{:02}-{:02} hour {}",
                pair[1].year, pair[1].month, pair[1].day, pair[1].hour
            )));
        }
    }

    debug!("Validated {} records", epw.records.len());
    Ok(())
}

fn record_key(record: &EpwRecord) -> (i32, u32, u32, u32) {
    (record.year, record.month, record.day, record.hour)
}

/// The fixed 8-line EPW header
fn header_lines(epw: &EpwFile) -> [String; HEADER_LINE_COUNT] {
    let location = &epw.header.location;
    [
        format!(
            "LOCATION,{},{},{},ERA5 (ECMWF),n/a,{},{},{},{}",
            location.city,
            location.state,
            location.country,
            location.latitude,
            location.longitude,
            location.utc_offset,
            location.elevation
        ),
        "DESIGN CONDITIONS, 0".to_string(),
        "TYPICAL/EXTREME PERIODS, 0".to_string(),
        format!(
            "GROUND TEMPERATURES,2,.5,,,,{},2,,,,{}",
            monthly_values(&epw.header.soil_monthly_shallow),
            monthly_values(&epw.header.soil_monthly_deep)
        ),
        format!(
            "HOLIDAYS/DAYLIGHT SAVINGS,{},0,0,0",
            if epw.header.leap_year { "Yes" } else { "No" }
        ),
        "COMMENTS 1, EPW file generated from the ECMWF ERA5 reanalysis dataset".to_string(),
        "COMMENTS 2, Hourly illuminance derived with the Perez (1990) luminous efficacy model"
            .to_string(),
        format!(
            "DATA PERIODS,1,1,Data,{}, 1/ 1,12/31",
            epw.header.first_weekday
        ),
    ]
}

/// Twelve monthly values, one decimal place, comma-joined with no spaces
fn monthly_values(values: &[f64; 12]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.1}"))
        .collect::<Vec<_>>()
        .join(",")
}
