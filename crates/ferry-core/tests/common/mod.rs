//! Common test utilities for `Ferry` integration tests.
//!
//! This module provides shared functionality for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use ferry_core::progress::{EventReceiver, TransferEvent};
use ferry_core::transfer::TransferConfig;

/// Create a temporary directory for test files.
///
/// The directory will be automatically cleaned up when the returned
/// `TempDir` is dropped.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test file with the given content.
pub fn create_test_file(dir: &std::path::Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Generate random bytes for testing.
pub fn random_bytes(size: usize) -> Vec<u8> {
    use rand::RngCore;
    let mut bytes = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Assert that two files have identical content.
pub fn assert_files_equal(path1: &std::path::Path, path2: &std::path::Path) {
    let content1 = std::fs::read(path1).expect("Failed to read first file");
    let content2 = std::fs::read(path2).expect("Failed to read second file");
    assert_eq!(content1.len(), content2.len(), "File lengths differ");
    assert_eq!(content1, content2, "File contents differ");
}

/// Transfer settings bound to loopback so tests never touch real interfaces.
pub fn loopback_config() -> TransferConfig {
    TransferConfig {
        bind_address: "127.0.0.1".to_string(),
        ..Default::default()
    }
}

/// Take every event already queued on the channel.
pub fn drain_events(rx: &mut EventReceiver) -> Vec<TransferEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Progress fractions in the order they were reported.
pub fn fractions(events: &[TransferEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|event| match event {
            TransferEvent::Progress(p) => Some(p.fraction),
            TransferEvent::Status(_) => None,
        })
        .collect()
}

/// Assert that fractions never go backwards and stay within `[0, 1]`.
pub fn assert_non_decreasing(fractions: &[f64]) {
    for pair in fractions.windows(2) {
        assert!(pair[0] <= pair[1], "fraction went backwards: {pair:?}");
    }
    assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));
}
