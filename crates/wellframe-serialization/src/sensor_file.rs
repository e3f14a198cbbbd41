//! Containers for assembled composite sensors: the millis/values pair of
//! a time-dependent sensor, and the downsampled microphone waveform.
//!
//! Both use the same discipline as the `.arr` container: a magic tag, a
//! version byte, fixed-width little-endian headers, then the data.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array1;
use std::io::Cursor;
use wellframe_structures::{
    BatteryWindow, Result, RunId, TimeDepSensor, Waveform, WellframeError,
};

pub const TIME_DEP_MAGIC: &[u8; 4] = b"WFTD";
pub const TIME_DEP_VERSION: u8 = 1;

pub const WAVEFORM_MAGIC: &[u8; 4] = b"WFWV";
pub const WAVEFORM_VERSION: u8 = 1;

fn truncated(container: &str, what: &str) -> WellframeError {
    WellframeError::Integrity(format!("truncated {container} container while reading {what}"))
}

fn check_header(cursor: &mut Cursor<&[u8]>, magic: &[u8; 4], version: u8, name: &str) -> Result<()> {
    let mut found = [0u8; 4];
    std::io::Read::read_exact(cursor, &mut found).map_err(|_| truncated(name, "magic"))?;
    if &found != magic {
        return Err(WellframeError::Integrity(format!(
            "bad magic in {name} container"
        )));
    }
    let found_version = cursor.read_u8().map_err(|_| truncated(name, "version"))?;
    if found_version != version {
        return Err(WellframeError::Integrity(format!(
            "unsupported {name} container version {found_version}"
        )));
    }
    Ok(())
}

pub fn write_time_dep(sensor: &TimeDepSensor) -> Vec<u8> {
    let n = sensor.millis.len().min(sensor.values.len());
    let mut out = Vec::with_capacity(46 + n * 16);
    out.extend_from_slice(TIME_DEP_MAGIC);
    out.push(TIME_DEP_VERSION);
    let _ = out.write_u64::<LittleEndian>(sensor.run.0);
    let _ = out.write_i64::<LittleEndian>(sensor.window.start_ms);
    let _ = out.write_i64::<LittleEndian>(sensor.window.end_ms);
    let _ = out.write_f64::<LittleEndian>(sensor.samples_per_sec.unwrap_or(f64::NAN));
    let _ = out.write_u64::<LittleEndian>(n as u64);
    for ms in sensor.millis.iter().take(n) {
        let _ = out.write_i64::<LittleEndian>(*ms);
    }
    for v in sensor.values.iter().take(n) {
        let _ = out.write_f64::<LittleEndian>(*v);
    }
    out
}

pub fn read_time_dep(bytes: &[u8]) -> Result<TimeDepSensor> {
    let mut cursor = Cursor::new(bytes);
    check_header(&mut cursor, TIME_DEP_MAGIC, TIME_DEP_VERSION, "time-dep")?;
    let run = RunId(
        cursor
            .read_u64::<LittleEndian>()
            .map_err(|_| truncated("time-dep", "run"))?,
    );
    let start_ms = cursor
        .read_i64::<LittleEndian>()
        .map_err(|_| truncated("time-dep", "window start"))?;
    let end_ms = cursor
        .read_i64::<LittleEndian>()
        .map_err(|_| truncated("time-dep", "window end"))?;
    let rate = cursor
        .read_f64::<LittleEndian>()
        .map_err(|_| truncated("time-dep", "sample rate"))?;
    let n = cursor
        .read_u64::<LittleEndian>()
        .map_err(|_| truncated("time-dep", "length"))? as usize;
    let mut millis = Vec::with_capacity(n);
    for _ in 0..n {
        millis.push(
            cursor
                .read_i64::<LittleEndian>()
                .map_err(|_| truncated("time-dep", "millis"))?,
        );
    }
    let mut values = Vec::with_capacity(n);
    for _ in 0..n {
        values.push(
            cursor
                .read_f64::<LittleEndian>()
                .map_err(|_| truncated("time-dep", "values"))?,
        );
    }
    Ok(TimeDepSensor::new(
        run,
        Array1::from(millis),
        Array1::from(values),
        BatteryWindow {
            run,
            start_ms,
            end_ms,
        },
        if rate.is_nan() { None } else { Some(rate) },
    ))
}

pub fn write_waveform(waveform: &Waveform) -> Vec<u8> {
    let mut out = Vec::with_capacity(45 + waveform.data.len() * 8);
    out.extend_from_slice(WAVEFORM_MAGIC);
    out.push(WAVEFORM_VERSION);
    let _ = out.write_u64::<LittleEndian>(waveform.run.0);
    let _ = out.write_f64::<LittleEndian>(waveform.sampling_hz);
    let _ = out.write_f64::<LittleEndian>(waveform.minimum.unwrap_or(f64::NAN));
    let _ = out.write_f64::<LittleEndian>(waveform.maximum.unwrap_or(f64::NAN));
    let _ = out.write_u64::<LittleEndian>(waveform.data.len() as u64);
    for v in &waveform.data {
        let _ = out.write_f64::<LittleEndian>(*v);
    }
    out
}

pub fn read_waveform(bytes: &[u8]) -> Result<Waveform> {
    let mut cursor = Cursor::new(bytes);
    check_header(&mut cursor, WAVEFORM_MAGIC, WAVEFORM_VERSION, "waveform")?;
    let run = RunId(
        cursor
            .read_u64::<LittleEndian>()
            .map_err(|_| truncated("waveform", "run"))?,
    );
    let sampling_hz = cursor
        .read_f64::<LittleEndian>()
        .map_err(|_| truncated("waveform", "sampling rate"))?;
    let minimum = cursor
        .read_f64::<LittleEndian>()
        .map_err(|_| truncated("waveform", "minimum"))?;
    let maximum = cursor
        .read_f64::<LittleEndian>()
        .map_err(|_| truncated("waveform", "maximum"))?;
    let n = cursor
        .read_u64::<LittleEndian>()
        .map_err(|_| truncated("waveform", "length"))? as usize;
    let mut data = Vec::with_capacity(n);
    for _ in 0..n {
        data.push(
            cursor
                .read_f64::<LittleEndian>()
                .map_err(|_| truncated("waveform", "data"))?,
        );
    }
    Ok(Waveform {
        run,
        data: Array1::from(data),
        sampling_hz,
        minimum: if minimum.is_nan() { None } else { Some(minimum) },
        maximum: if maximum.is_nan() { None } else { Some(maximum) },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_time_dep_round_trip() {
        let sensor = TimeDepSensor::new(
            RunId(7),
            array![10_i64, 20, 30],
            array![0.5, 1.5, 2.5],
            BatteryWindow {
                run: RunId(7),
                start_ms: 10,
                end_ms: 30,
            },
            Some(44100.0),
        );
        let decoded = read_time_dep(&write_time_dep(&sensor)).unwrap();
        assert_eq!(decoded, sensor);
    }

    #[test]
    fn test_time_dep_none_rate_survives() {
        let sensor = TimeDepSensor::new(
            RunId(7),
            array![10_i64],
            array![0.5],
            BatteryWindow {
                run: RunId(7),
                start_ms: 10,
                end_ms: 10,
            },
            None,
        );
        let decoded = read_time_dep(&write_time_dep(&sensor)).unwrap();
        assert_eq!(decoded.samples_per_sec, None);
    }

    #[test]
    fn test_waveform_round_trip() {
        let waveform = Waveform {
            run: RunId(3),
            data: array![-1.0, 0.0, 1.0],
            sampling_hz: 1000.0,
            minimum: Some(-1.0),
            maximum: Some(1.0),
        };
        let decoded = read_waveform(&write_waveform(&waveform)).unwrap();
        assert_eq!(decoded, waveform);
    }

    #[test]
    fn test_wrong_container_rejected() {
        let sensor = TimeDepSensor::new(
            RunId(7),
            array![10_i64],
            array![0.5],
            BatteryWindow {
                run: RunId(7),
                start_ms: 10,
                end_ms: 10,
            },
            None,
        );
        assert!(read_waveform(&write_time_dep(&sensor)).is_err());
    }
}
