//! End-to-end pipelines: a real file (or stream) in, listener fan-out.

use crate::*;

use futures::{stream, SinkExt, StreamExt};
use strait::{BridgeConfig, BridgeError, FileSource, SinkAdapter, SourceConfig, StreamState};

/// Patterned test content so reordering or loss shows up as a byte diff.
fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn file_round_trips_through_the_bridge() {
    init_tracing();
    let dir = scratch_dir("pipeline-roundtrip");
    let path = dir.join("input.bin");
    let content = patterned(200 * 1024);
    std::fs::write(&path, &content).unwrap();

    // Queue far smaller than the file: 8 chunks of 4 KiB covers 32 KiB
    // of the 200 KiB in flight at most.
    let bridge = Bridge::new(BridgeConfig {
        capacity: 8,
        high_water: 6,
        low_water: 2,
    })
    .unwrap();
    let recorder = Recorder::attach(&bridge);
    let pump = tokio::spawn(SinkAdapter::new(bridge.clone()).run());

    let source = FileSource::new(&path).with_config(&SourceConfig {
        read_chunk_bytes: 4096,
    });
    source.run(bridge.clone()).await.unwrap();
    pump.await.unwrap().unwrap();

    assert_eq!(bridge.state(), StreamState::Ended);
    assert_eq!(recorder.assembled(), content);
    recorder.assert_seqs_contiguous();
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 1);
    assert!(recorder.errors.lock().unwrap().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn writer_pipes_a_stream_end_to_end() {
    init_tracing();
    let bridge = Bridge::new(BridgeConfig {
        capacity: 4,
        high_water: 3,
        low_water: 1,
    })
    .unwrap();
    let recorder = Recorder::attach(&bridge);
    let pump = tokio::spawn(SinkAdapter::new(bridge.clone()).run());

    let content = patterned(64 * 1024);
    let chunks: Vec<Result<Bytes, BridgeError>> = content
        .chunks(1024)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();

    let mut upstream = stream::iter(chunks).boxed();
    let mut writer = bridge.writer();
    writer.send_all(&mut upstream).await.unwrap();
    writer.close().await.unwrap();
    pump.await.unwrap().unwrap();

    assert_eq!(bridge.state(), StreamState::Ended);
    assert_eq!(recorder.assembled(), content);
    recorder.assert_seqs_contiguous();
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn multiple_listeners_see_the_same_chunks_in_order() {
    init_tracing();
    // Capacity above the total chunk count — this test is about fan-out,
    // not backpressure, so pushes must never be rejected.
    let bridge = Bridge::new(BridgeConfig {
        capacity: 16,
        high_water: 12,
        low_water: 4,
    })
    .unwrap();
    let first = Recorder::attach(&bridge);
    let second = Recorder::attach(&bridge);
    let pump = tokio::spawn(SinkAdapter::new(bridge.clone()).run());

    for byte in 0..10u8 {
        bridge.on_data(Bytes::from(vec![byte; 32])).unwrap();
        tokio::task::yield_now().await;
    }
    bridge.on_end();
    pump.await.unwrap().unwrap();

    assert_eq!(first.assembled(), second.assembled());
    assert_eq!(first.payloads.lock().unwrap().len(), 10);
    first.assert_seqs_contiguous();
    second.assert_seqs_contiguous();
}
