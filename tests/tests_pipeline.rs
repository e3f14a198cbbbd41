//! End-to-end tests of the full pipeline through the umbrella crate:
//! builder -> well cache -> feature calculation -> alignment -> sensor
//! cache -> raw store.

use byteorder::{BigEndian, ByteOrder};
use std::sync::Arc;
use wellframe::caching::{CachingWellFrameBuilder, InMemoryRawStore, WellCache};
use wellframe::config::WellframeConfig;
use wellframe::structures::{
    FeatureType, HardwareGeneration, RunId, RunMetadata, SensorKind, WellId, WellInfo,
};
use wellframe::{alignment_settings, well_cache_from_config};

fn encode_millis(clock: &[i64]) -> Vec<u8> {
    let mut blob = vec![0u8; clock.len() * 4];
    for (chunk, ms) in blob.chunks_exact_mut(4).zip(clock) {
        BigEndian::write_i32(chunk, (*ms - (1_i64 << 31)) as i32);
    }
    blob
}

fn encode_feature(values: &[f32]) -> Vec<u8> {
    let mut blob = vec![0u8; values.len() * 4];
    for (chunk, v) in blob.chunks_exact_mut(4).zip(values) {
        BigEndian::write_f32(chunk, *v);
    }
    blob
}

/// Two runs of a 5-second, 100 fps battery with interpolated MI data.
fn fixture_store() -> InMemoryRawStore {
    let mut store = InMemoryRawStore::new();
    for (run, well_ids) in [(1_u64, vec![101_u64, 102]), (2, vec![201, 202, 203])] {
        let run_id = RunId(run);
        let clock: Vec<i64> = (0..500).map(|i| 1000 + i * 10).collect();
        store.insert_metadata(RunMetadata {
            run: run_id,
            wells: well_ids
                .iter()
                .enumerate()
                .map(|(i, id)| WellInfo {
                    id: WellId(*id),
                    index: i as u32,
                    label: format!("A{:02}", i + 1),
                })
                .collect(),
            generation: HardwareGeneration::Pointgrey,
            battery_length_ms: 5000,
            ideal_framerate: 100.0,
        });
        store.insert_sensor(SensorKind::RawStimulusMillis, run_id, encode_millis(&clock));
        store.insert_sensor(SensorKind::RawCameraMillis, run_id, encode_millis(&clock));
        for well in &well_ids {
            let values: Vec<f32> = (0..500).map(|k| (k % 32) as f32).collect();
            store.insert_well_feature(WellId(*well), FeatureType::MI_I, encode_feature(&values));
        }
    }
    store
}

#[test]
fn test_single_well_query_caches_whole_runs_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(fixture_store());
    let cache = WellCache::new(dir.path(), FeatureType::MI_I, Arc::clone(&store)).unwrap();

    let frame = CachingWellFrameBuilder::wells([WellId(202)], &cache)
        .build()
        .unwrap();
    assert_eq!(frame.n_wells(), 1);
    assert_eq!(frame.n_frames(), 500);

    // The whole owning run was cached, including never-requested wells
    assert!(cache.contains(RunId(2)));
    assert!(!cache.contains(RunId(1)));
    assert_eq!(cache.load(RunId(2)).unwrap().n_wells(), 3);

    // A second, overlapping query fetches nothing new
    let fetches = store.total_fetches();
    let wider = CachingWellFrameBuilder::wells([WellId(201), WellId(202)], &cache)
        .build()
        .unwrap();
    assert_eq!(wider.n_wells(), 2);
    assert_eq!(store.total_fetches(), fetches);
}

#[test]
fn test_cross_run_query_concatenates_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let cache = WellCache::new(dir.path(), FeatureType::MI_I, Arc::new(fixture_store())).unwrap();

    let frame = CachingWellFrameBuilder::wells([WellId(203), WellId(101)], &cache)
        .build()
        .unwrap();
    assert_eq!(frame.n_wells(), 2);
    assert_eq!(frame.rows()[0].well, WellId(101));
    assert_eq!(frame.rows()[1].well, WellId(203));
    assert_eq!(frame.runs().len(), 2);
}

#[test]
fn test_out_of_band_deletion_forces_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let cache = WellCache::new(dir.path(), FeatureType::MI_I, Arc::new(fixture_store())).unwrap();

    let first = cache.load(RunId(1)).unwrap();
    std::fs::remove_file(cache.path_of(RunId(1))).unwrap();
    let rebuilt = cache.load(RunId(1)).unwrap();
    assert_eq!(first, rebuilt);
}

#[test]
fn test_config_wiring() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = WellframeConfig::default();
    config.cache.root = dir.path().to_path_buf();
    config.alignment.stringent = true;

    let settings = alignment_settings(&config);
    assert!(settings.stringent);

    let cache =
        well_cache_from_config(&config, FeatureType::MI_I, Arc::new(fixture_store())).unwrap();
    // Fixture drift is 10ms, under the 2-frame (20ms) threshold, so
    // stringent mode still passes
    let frame = cache.load(RunId(1)).unwrap();
    assert_eq!(frame.n_wells(), 2);
    assert!(cache.cache_dir().starts_with(dir.path()));
}
