//! The `.arr` numeric array container: a minimal little-endian format
//! with a magic/version/dtype header, used for every cached numeric
//! sensor entry.
//!
//! # Format
//! - magic `WFAR` (4 bytes)
//! - version (1 byte)
//! - dtype tag (1 byte): 1 = i64, 2 = f32, 3 = f64
//! - element count (8 bytes, little-endian)
//! - element data, little-endian

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array1;
use std::io::Cursor;
use wellframe_structures::{Result, WellframeError};

pub const ARRAY_MAGIC: &[u8; 4] = b"WFAR";
pub const ARRAY_VERSION: u8 = 1;

const DTYPE_I64: u8 = 1;
const DTYPE_F32: u8 = 2;
const DTYPE_F64: u8 = 3;

/// A numeric array as stored in an `.arr` container.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    I64(Array1<i64>),
    F32(Array1<f32>),
    F64(Array1<f64>),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::I64(a) => a.len(),
            ArrayData::F32(a) => a.len(),
            ArrayData::F64(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_i64(&self) -> Result<&Array1<i64>> {
        match self {
            ArrayData::I64(a) => Ok(a),
            _ => Err(WellframeError::Integrity(
                "cached array is not an i64 series".into(),
            )),
        }
    }

    pub fn to_f64(&self) -> Array1<f64> {
        match self {
            ArrayData::I64(a) => a.mapv(|v| v as f64),
            ArrayData::F32(a) => a.mapv(|v| v as f64),
            ArrayData::F64(a) => a.clone(),
        }
    }
}

fn truncated(what: &str) -> WellframeError {
    WellframeError::Integrity(format!("truncated array container while reading {what}"))
}

pub fn write_array(data: &ArrayData) -> Vec<u8> {
    let mut out = Vec::with_capacity(14 + data.len() * 8);
    out.extend_from_slice(ARRAY_MAGIC);
    out.push(ARRAY_VERSION);
    match data {
        ArrayData::I64(a) => {
            out.push(DTYPE_I64);
            let _ = out.write_u64::<LittleEndian>(a.len() as u64);
            for v in a {
                let _ = out.write_i64::<LittleEndian>(*v);
            }
        }
        ArrayData::F32(a) => {
            out.push(DTYPE_F32);
            let _ = out.write_u64::<LittleEndian>(a.len() as u64);
            for v in a {
                let _ = out.write_f32::<LittleEndian>(*v);
            }
        }
        ArrayData::F64(a) => {
            out.push(DTYPE_F64);
            let _ = out.write_u64::<LittleEndian>(a.len() as u64);
            for v in a {
                let _ = out.write_f64::<LittleEndian>(*v);
            }
        }
    }
    out
}

pub fn read_array(bytes: &[u8]) -> Result<ArrayData> {
    let mut cursor = Cursor::new(bytes);
    let mut magic = [0u8; 4];
    std::io::Read::read_exact(&mut cursor, &mut magic).map_err(|_| truncated("magic"))?;
    if &magic != ARRAY_MAGIC {
        return Err(WellframeError::Integrity(
            "bad magic in array container".into(),
        ));
    }
    let version = cursor.read_u8().map_err(|_| truncated("version"))?;
    if version != ARRAY_VERSION {
        return Err(WellframeError::Integrity(format!(
            "unsupported array container version {version}"
        )));
    }
    let dtype = cursor.read_u8().map_err(|_| truncated("dtype"))?;
    let len = cursor
        .read_u64::<LittleEndian>()
        .map_err(|_| truncated("length"))? as usize;
    match dtype {
        DTYPE_I64 => {
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(
                    cursor
                        .read_i64::<LittleEndian>()
                        .map_err(|_| truncated("i64 data"))?,
                );
            }
            Ok(ArrayData::I64(Array1::from(values)))
        }
        DTYPE_F32 => {
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(
                    cursor
                        .read_f32::<LittleEndian>()
                        .map_err(|_| truncated("f32 data"))?,
                );
            }
            Ok(ArrayData::F32(Array1::from(values)))
        }
        DTYPE_F64 => {
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(
                    cursor
                        .read_f64::<LittleEndian>()
                        .map_err(|_| truncated("f64 data"))?,
                );
            }
            Ok(ArrayData::F64(Array1::from(values)))
        }
        other => Err(WellframeError::Integrity(format!(
            "unknown array dtype tag {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_round_trip_i64() {
        let data = ArrayData::I64(array![1_i64, -5, i64::MAX]);
        assert_eq!(read_array(&write_array(&data)).unwrap(), data);
    }

    #[test]
    fn test_round_trip_f32_and_f64() {
        let f32s = ArrayData::F32(array![0.5_f32, -1.25]);
        assert_eq!(read_array(&write_array(&f32s)).unwrap(), f32s);
        let f64s = ArrayData::F64(array![0.1_f64]);
        assert_eq!(read_array(&write_array(&f64s)).unwrap(), f64s);
    }

    #[test]
    fn test_round_trip_empty() {
        let data = ArrayData::F32(Array1::zeros(0));
        assert_eq!(read_array(&write_array(&data)).unwrap(), data);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = write_array(&ArrayData::I64(array![1_i64]));
        bytes[0] = b'X';
        assert!(matches!(
            read_array(&bytes).unwrap_err(),
            WellframeError::Integrity(_)
        ));
    }

    #[test]
    fn test_truncation_rejected() {
        let bytes = write_array(&ArrayData::I64(array![1_i64, 2]));
        assert!(read_array(&bytes[..bytes.len() - 3]).is_err());
    }
}
