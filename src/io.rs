//! Binary and CSV file formats.
//!
//! Binary layout: the ten-value device header (see [`DeviceParams::to_header`])
//! followed by the sample sequence, every value a little-endian f64. Input
//! files carry expected photons per timestep, output files carry charge.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SimError};
use crate::sipm::{DeviceParams, HEADER_LEN};

const VALUE_BYTES: usize = std::mem::size_of::<f64>();

/// Decode a header + samples byte buffer.
pub fn parse_binary(bytes: &[u8]) -> Result<(DeviceParams, Vec<f64>)> {
    if bytes.len() % VALUE_BYTES != 0 {
        return Err(SimError::format(format!(
            "{} bytes is not a whole number of f64 values",
            bytes.len()
        )));
    }
    let values: Vec<f64> = bytes
        .chunks_exact(VALUE_BYTES)
        .map(|chunk| {
            let mut raw = [0u8; VALUE_BYTES];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect();
    if values.len() < HEADER_LEN {
        return Err(SimError::format(format!(
            "file holds {} values, the parameter header alone needs {HEADER_LEN}",
            values.len()
        )));
    }
    let params = DeviceParams::from_header(&values[..HEADER_LEN])?;
    Ok((params, values[HEADER_LEN..].to_vec()))
}

/// Encode a header + samples byte buffer.
pub fn encode_binary(params: &DeviceParams, samples: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((HEADER_LEN + samples.len()) * VALUE_BYTES);
    for value in params.to_header().iter().chain(samples) {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

pub fn read_binary(path: &Path) -> Result<(DeviceParams, Vec<f64>)> {
    let bytes = std::fs::read(path)?;
    let (params, samples) = parse_binary(&bytes)?;
    log::info!(
        "Loaded {} samples from {}",
        samples.len(),
        path.display()
    );
    Ok((params, samples))
}

pub fn write_binary(path: &Path, params: &DeviceParams, samples: &[f64]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&encode_binary(params, samples))?;
    out.flush()?;
    Ok(())
}

/// Write `time, qOut` rows, one per timestep.
pub fn write_csv(path: &Path, dt: f64, charges: &[f64]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "time, qOut")?;
    for (i, q) in charges.iter().enumerate() {
        writeln!(out, "{},{}", i as f64 * dt, q)?;
    }
    out.flush()?;
    Ok(())
}

/// Read a two-column `time, photons` CSV with a header row. Returns the
/// photon samples and the timestep estimated from the time column.
pub fn read_csv(path: &Path) -> Result<(Vec<f64>, f64)> {
    let reader = BufReader::new(File::open(path)?);
    let mut times = Vec::new();
    let mut photons = Vec::new();
    for (line_no, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split(',').map(str::trim);
        let mut next = |name: &str| -> Result<f64> {
            let field = fields.next().ok_or_else(|| {
                SimError::format(format!("line {}: missing {name} column", line_no + 1))
            })?;
            field.parse::<f64>().map_err(|e| {
                SimError::format(format!("line {}: bad {name} `{field}`: {e}", line_no + 1))
            })
        };
        times.push(next("time")?);
        photons.push(next("photons")?);
    }

    let dt = estimate_dt(&times)?;
    Ok((photons, dt))
}

/// Average spacing over rows 10..20 when available, otherwise the first gap.
fn estimate_dt(times: &[f64]) -> Result<f64> {
    let dt = if times.len() > 20 {
        (times[20] - times[10]) / 10.0
    } else if times.len() >= 2 {
        times[1] - times[0]
    } else {
        return Err(SimError::format("need at least two rows to infer the timestep"));
    };
    if dt > 0.0 {
        Ok(dt)
    } else {
        Err(SimError::format(format!("time column is not increasing (dt = {dt})")))
    }
}
