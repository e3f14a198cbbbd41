//! Decoding of raw sensor blobs as stored by the acquisition hardware.
//!
//! Multi-byte numeric formats are big-endian on the wire. Everything is
//! widened on decode (integers to i64, floats to f64) so that bias
//! corrections and later arithmetic cannot overflow the storage type.

use byteorder::{BigEndian, ByteOrder};
use ndarray::Array1;
use wellframe_structures::{Result, WellframeError, WireFormat};

/// A decoded raw blob: integer series, float series, or untouched bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Ints(Array1<i64>),
    Floats(Array1<f64>),
    Bytes(Vec<u8>),
}

impl WireValue {
    pub fn len(&self) -> usize {
        match self {
            WireValue::Ints(a) => a.len(),
            WireValue::Floats(a) => a.len(),
            WireValue::Bytes(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The series as i64, if it is an integer series.
    pub fn as_ints(&self) -> Result<&Array1<i64>> {
        match self {
            WireValue::Ints(a) => Ok(a),
            other => Err(WellframeError::Integrity(format!(
                "expected an integer series, got {}",
                other.kind_name()
            ))),
        }
    }

    /// The series as f64, converting integer series on the fly.
    pub fn to_floats(&self) -> Result<Array1<f64>> {
        match self {
            WireValue::Ints(a) => Ok(a.mapv(|v| v as f64)),
            WireValue::Floats(a) => Ok(a.clone()),
            WireValue::Bytes(_) => Err(WellframeError::Integrity(
                "expected a numeric series, got verbatim bytes".into(),
            )),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            WireValue::Bytes(b) => Ok(b),
            other => Err(WellframeError::Integrity(format!(
                "expected verbatim bytes, got {}",
                other.kind_name()
            ))),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            WireValue::Ints(_) => "an integer series",
            WireValue::Floats(_) => "a float series",
            WireValue::Bytes(_) => "verbatim bytes",
        }
    }
}

fn check_stride(format: WireFormat, data: &[u8], stride: usize) -> Result<()> {
    if data.len() % stride != 0 {
        return Err(WellframeError::Integrity(format!(
            "blob of {} bytes is not a multiple of the {}-byte stride for {:?}",
            data.len(),
            stride,
            format
        )));
    }
    Ok(())
}

/// Decodes a raw blob according to its wire format.
///
/// The squashed unsigned byte stores `unsigned - 128` in a signed byte;
/// the signed value is widened before the bias is re-added, yielding the
/// original 0..=255 range. The other unsigned formats are biased the
/// same way at their own widths.
pub fn decode_wire(format: WireFormat, data: &[u8]) -> Result<WireValue> {
    let value = match format {
        WireFormat::SignedByte => {
            WireValue::Ints(data.iter().map(|b| *b as i8 as i64).collect())
        }
        WireFormat::SquashedUnsignedByte => {
            WireValue::Ints(data.iter().map(|b| (*b as i8 as i64) + (1 << 7)).collect())
        }
        WireFormat::SignedShortBe => {
            check_stride(format, data, 2)?;
            WireValue::Ints(
                data.chunks_exact(2)
                    .map(|c| BigEndian::read_i16(c) as i64)
                    .collect(),
            )
        }
        WireFormat::UnsignedShortBe => {
            check_stride(format, data, 2)?;
            WireValue::Ints(
                data.chunks_exact(2)
                    .map(|c| BigEndian::read_i16(c) as i64 + (1 << 15))
                    .collect(),
            )
        }
        WireFormat::SignedIntBe => {
            check_stride(format, data, 4)?;
            WireValue::Ints(
                data.chunks_exact(4)
                    .map(|c| BigEndian::read_i32(c) as i64)
                    .collect(),
            )
        }
        WireFormat::UnsignedIntBe => {
            check_stride(format, data, 4)?;
            WireValue::Ints(
                data.chunks_exact(4)
                    .map(|c| BigEndian::read_i32(c) as i64 + (1 << 31))
                    .collect(),
            )
        }
        WireFormat::FloatBe => {
            check_stride(format, data, 4)?;
            WireValue::Floats(
                data.chunks_exact(4)
                    .map(|c| BigEndian::read_f32(c) as f64)
                    .collect(),
            )
        }
        WireFormat::DoubleBe => {
            check_stride(format, data, 8)?;
            WireValue::Floats(data.chunks_exact(8).map(BigEndian::read_f64).collect())
        }
        WireFormat::Verbatim => WireValue::Bytes(data.to_vec()),
    };
    Ok(value)
}
