//! The `.wft` per-run well-table container.
//!
//! One file holds the complete table for one run: every well's metadata
//! row plus the f32 feature matrix. The feature's internal name is part
//! of the header so a file can never be read back as the wrong feature.
//!
//! # Format
//! - magic `WFTB` (4 bytes), version (1 byte)
//! - feature internal name: u16 length + UTF-8 bytes
//! - row count (4 bytes), frame count (4 bytes)
//! - per row: well id u64, run id u64, well index u32,
//!   label u16 length + UTF-8 bytes
//! - feature matrix, f32 little-endian, row-major

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array2;
use std::io::Cursor;
use wellframe_structures::{Result, RunId, WellFrame, WellId, WellRow, WellframeError};

pub const TABLE_MAGIC: &[u8; 4] = b"WFTB";
pub const TABLE_VERSION: u8 = 1;

fn truncated(what: &str) -> WellframeError {
    WellframeError::Integrity(format!("truncated well-table container while reading {what}"))
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(u16::MAX as usize);
    let _ = out.write_u16::<LittleEndian>(len as u16);
    out.extend_from_slice(&bytes[..len]);
}

fn read_string(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<String> {
    let len = cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| truncated(what))? as usize;
    let mut buf = vec![0u8; len];
    std::io::Read::read_exact(cursor, &mut buf).map_err(|_| truncated(what))?;
    String::from_utf8(buf)
        .map_err(|_| WellframeError::Integrity(format!("non-UTF-8 {what} in well-table container")))
}

pub fn write_table(feature_name: &str, frame: &WellFrame) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(TABLE_MAGIC);
    out.push(TABLE_VERSION);
    write_string(&mut out, feature_name);
    let _ = out.write_u32::<LittleEndian>(frame.n_wells() as u32);
    let _ = out.write_u32::<LittleEndian>(frame.n_frames() as u32);
    for row in frame.rows() {
        let _ = out.write_u64::<LittleEndian>(row.well.0);
        let _ = out.write_u64::<LittleEndian>(row.run.0);
        let _ = out.write_u32::<LittleEndian>(row.index);
        write_string(&mut out, &row.label);
    }
    for v in frame.features() {
        let _ = out.write_f32::<LittleEndian>(*v);
    }
    out
}

pub fn read_table(expected_feature: &str, bytes: &[u8]) -> Result<WellFrame> {
    let mut cursor = Cursor::new(bytes);
    let mut magic = [0u8; 4];
    std::io::Read::read_exact(&mut cursor, &mut magic).map_err(|_| truncated("magic"))?;
    if &magic != TABLE_MAGIC {
        return Err(WellframeError::Integrity(
            "bad magic in well-table container".into(),
        ));
    }
    let version = cursor.read_u8().map_err(|_| truncated("version"))?;
    if version != TABLE_VERSION {
        return Err(WellframeError::Integrity(format!(
            "unsupported well-table container version {version}"
        )));
    }
    let feature_name = read_string(&mut cursor, "feature name")?;
    if feature_name != expected_feature {
        return Err(WellframeError::ContradictoryRequest(format!(
            "well-table container holds feature {feature_name}, expected {expected_feature}"
        )));
    }
    let n_rows = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| truncated("row count"))? as usize;
    let n_frames = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| truncated("frame count"))? as usize;
    let mut rows = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let well = WellId(
            cursor
                .read_u64::<LittleEndian>()
                .map_err(|_| truncated("well id"))?,
        );
        let run = RunId(
            cursor
                .read_u64::<LittleEndian>()
                .map_err(|_| truncated("run id"))?,
        );
        let index = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| truncated("well index"))?;
        let label = read_string(&mut cursor, "label")?;
        rows.push(WellRow {
            well,
            run,
            index,
            label,
        });
    }
    let mut matrix = Vec::with_capacity(n_rows * n_frames);
    for _ in 0..n_rows * n_frames {
        matrix.push(
            cursor
                .read_f32::<LittleEndian>()
                .map_err(|_| truncated("feature matrix"))?,
        );
    }
    let features = Array2::from_shape_vec((n_rows, n_frames), matrix)
        .map_err(|e| WellframeError::Integrity(format!("bad well-table matrix shape: {e}")))?;
    WellFrame::new(rows, features)
}
