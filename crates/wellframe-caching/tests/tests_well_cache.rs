//! Tests for the whole-run well-table cache and the query builder.

use byteorder::{BigEndian, ByteOrder};
use std::collections::BTreeSet;
use std::sync::Arc;
use wellframe_caching::{CachingWellFrameBuilder, InMemoryRawStore, WellCache};
use wellframe_structures::{
    FeatureType, HardwareGeneration, RunId, RunMetadata, SensorKind, WellId, WellInfo,
    WellframeError,
};

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

fn wells_of(run: u64, ids: &[u64]) -> Vec<WellInfo> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| WellInfo {
            id: WellId(*id),
            index: i as u32,
            label: format!("A{:02}", i + 1),
        })
        .collect()
}

/// A run with a 5-second battery at 100 fps and a well feature blob of
/// one sample per frame.
fn add_run(store: &mut InMemoryRawStore, run: u64, well_ids: &[u64], feature: FeatureType) {
    let run_id = RunId(run);
    let clock: Vec<i64> = (0..500).map(|i| 1000 + i * 10).collect();
    store.insert_metadata(RunMetadata {
        run: run_id,
        wells: wells_of(run, well_ids),
        generation: HardwareGeneration::Pointgrey,
        battery_length_ms: 5000,
        ideal_framerate: 100.0,
    });
    store.insert_sensor(SensorKind::RawStimulusMillis, run_id, encode_millis(&clock));
    store.insert_sensor(SensorKind::RawCameraMillis, run_id, encode_millis(&clock));
    for (i, well) in well_ids.iter().enumerate() {
        let values: Vec<f32> = (0..500).map(|k| (k + i * 1000) as f32 / 4.0).collect();
        store.insert_well_feature(WellId(*well), feature, encode_feature(&values));
    }
}

#[test]
fn test_requesting_one_well_caches_the_whole_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101, 102, 103], FeatureType::MI);
    let cache = WellCache::new(dir.path(), FeatureType::MI, Arc::new(store)).unwrap();

    let frame = CachingWellFrameBuilder::wells([WellId(102)], &cache)
        .build()
        .unwrap();
    assert_eq!(frame.n_wells(), 1);
    assert_eq!(frame.rows()[0].well, WellId(102));

    // The run's cached table still holds every well, requested or not
    let cached = cache.load(RunId(1)).unwrap();
    assert_eq!(cached.n_wells(), 3);
    let expected: BTreeSet<WellId> = [WellId(101), WellId(102), WellId(103)].into_iter().collect();
    assert_eq!(cached.wells(), expected);
}

#[test]
fn test_include_full_runs_returns_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101, 102], FeatureType::MI);
    let cache = WellCache::new(dir.path(), FeatureType::MI, Arc::new(store)).unwrap();

    let frame = CachingWellFrameBuilder::wells([WellId(101)], &cache)
        .include_full_runs()
        .build()
        .unwrap();
    assert_eq!(frame.n_wells(), 2);
}

#[test]
fn test_noninterpolated_values_are_quantized_with_first_zero() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101], FeatureType::MI);
    let cache = WellCache::new(dir.path(), FeatureType::MI, Arc::new(store)).unwrap();

    let frame = cache.load(RunId(1)).unwrap();
    assert_eq!(frame.n_frames(), 500);
    assert_eq!(frame.features()[[0, 0]], 0.0);
    // Values pass through the half-precision-div-8 storage quantization
    let raw = 1.0_f32 / 4.0;
    let stored = frame.features()[[0, 1]];
    assert!((stored - raw).abs() <= 0.125);
}

#[test]
fn test_interpolated_feature_aligns_to_ideal_timeline() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101], FeatureType::MI_I);
    let cache = WellCache::new(dir.path(), FeatureType::MI_I, Arc::new(store)).unwrap();

    let frame = cache.load(RunId(1)).unwrap();
    // ceil(5000 / 10) ideal frames
    assert_eq!(frame.n_frames(), 500);
    assert_eq!(frame.features()[[0, 0]], 0.0);
}

#[test]
fn test_interpolated_feature_rejects_pike_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101], FeatureType::MI_I);
    // Rewrite the metadata as Pike-generation
    store.insert_metadata(RunMetadata {
        run: RunId(1),
        wells: wells_of(1, &[101]),
        generation: HardwareGeneration::Pike,
        battery_length_ms: 5000,
        ideal_framerate: 100.0,
    });
    let cache = WellCache::new(dir.path(), FeatureType::MI_I, Arc::new(store)).unwrap();
    let err = cache.load(RunId(1)).unwrap_err();
    assert!(matches!(err, WellframeError::ContradictoryRequest(_)));
}

#[test]
fn test_zero_well_run_does_not_poison_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101], FeatureType::MI);
    store.insert_metadata(RunMetadata {
        run: RunId(2),
        wells: vec![],
        generation: HardwareGeneration::Pointgrey,
        battery_length_ms: 5000,
        ideal_framerate: 100.0,
    });
    let cache = WellCache::new(dir.path(), FeatureType::MI, Arc::new(store)).unwrap();

    let failures = cache
        .download(&BTreeSet::from([RunId(1), RunId(2)]))
        .unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, RunId(2));
    assert!(matches!(failures[0].1, WellframeError::EmptyCollection(_)));
    assert!(cache.contains(RunId(1)));
}

#[test]
fn test_load_multiple_surfaces_typed_error_not_partial_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101], FeatureType::MI);
    let cache = WellCache::new(dir.path(), FeatureType::MI, Arc::new(store)).unwrap();

    let err = cache
        .load_multiple(&BTreeSet::from([RunId(1), RunId(9)]))
        .unwrap_err();
    assert!(matches!(err, WellframeError::Lookup(_)));
}

#[test]
fn test_builder_feature_must_match_cache() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101], FeatureType::MI);
    let cache = WellCache::new(dir.path(), FeatureType::MI, Arc::new(store)).unwrap();

    assert!(CachingWellFrameBuilder::wells([WellId(101)], &cache)
        .with_feature(FeatureType::MI)
        .is_ok());
    let err = CachingWellFrameBuilder::wells([WellId(101)], &cache)
        .with_feature(FeatureType::MI_I)
        .err()
        .unwrap();
    assert!(matches!(err, WellframeError::ContradictoryRequest(_)));
}

#[test]
fn test_builder_runs_entry_point_and_relabel() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101, 102], FeatureType::MI);
    add_run(&mut store, 2, &[201], FeatureType::MI);
    let cache = WellCache::new(dir.path(), FeatureType::MI, Arc::new(store)).unwrap();

    let frame = CachingWellFrameBuilder::runs([RunId(1), RunId(2)], &cache)
        .with_labeler(|row| format!("{}:{}", row.run, row.well))
        .build()
        .unwrap();
    assert_eq!(frame.n_wells(), 3);
    assert_eq!(frame.rows()[0].label, "r1:w101");
    // Sorted by run, then well index
    assert_eq!(frame.rows()[2].run, RunId(2));
}

#[test]
fn test_empty_well_set_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101], FeatureType::MI);
    let cache = WellCache::new(dir.path(), FeatureType::MI, Arc::new(store)).unwrap();
    let err = CachingWellFrameBuilder::wells([], &cache).build().unwrap_err();
    assert!(matches!(err, WellframeError::EmptyCollection(_)));
}

#[test]
fn test_second_download_skips_cached_runs() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101], FeatureType::MI_I);
    let store = Arc::new(store);
    let cache = WellCache::new(dir.path(), FeatureType::MI_I, Arc::clone(&store)).unwrap();

    cache.load(RunId(1)).unwrap();
    let fetches = store.total_fetches();
    cache.load(RunId(1)).unwrap();
    // Already cached: no new sensor traffic
    assert_eq!(store.total_fetches(), fetches);
}

#[test]
fn test_missing_feature_blob_is_lookup_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = InMemoryRawStore::new();
    add_run(&mut store, 1, &[101], FeatureType::MI);
    // Well 999 exists in metadata but has no feature blob
    store.insert_metadata(RunMetadata {
        run: RunId(1),
        wells: wells_of(1, &[101, 999]),
        generation: HardwareGeneration::Pointgrey,
        battery_length_ms: 5000,
        ideal_framerate: 100.0,
    });
    let cache = WellCache::new(dir.path(), FeatureType::MI, Arc::new(store)).unwrap();
    let err = cache.load(RunId(1)).unwrap_err();
    assert!(matches!(err, WellframeError::Lookup(_)));
}
