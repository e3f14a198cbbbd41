//! Byte-level formats for wellframe: decoding of raw sensor blobs as the
//! acquisition hardware stored them, and the little-endian container
//! files the caches write (`.arr` arrays, assembled sensors, waveforms,
//! and per-run well tables).

mod array_file;
mod feature_blob;
mod sensor_file;
mod table_file;
mod wire;

pub use array_file::{read_array, write_array, ArrayData, ARRAY_MAGIC, ARRAY_VERSION};
pub use feature_blob::{finalize, from_blob, to_blob};
pub use sensor_file::{
    read_time_dep, read_waveform, write_time_dep, write_waveform, TIME_DEP_MAGIC, WAVEFORM_MAGIC,
};
pub use table_file::{read_table, write_table, TABLE_MAGIC, TABLE_VERSION};
pub use wire::{decode_wire, WireValue};
