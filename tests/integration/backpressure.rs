//! Backpressure: pause at high-water, resume at low-water, no loss.

use crate::*;

use strait::{BridgeConfig, BridgeError, FileSource, SinkAdapter, SourceConfig, StreamState};

fn small_bridge() -> Bridge {
    Bridge::new(BridgeConfig {
        capacity: 4,
        high_water: 3,
        low_water: 1,
    })
    .unwrap()
}

#[tokio::test]
async fn producer_is_paused_at_high_water_and_rejected_at_capacity() {
    init_tracing();
    let bridge = small_bridge();
    let flow = bridge.flow();

    bridge.on_data(Bytes::from_static(b"0")).unwrap();
    bridge.on_data(Bytes::from_static(b"1")).unwrap();
    assert!(!flow.is_paused());

    // Third push reaches high_water: pause requested, push still accepted.
    bridge.on_data(Bytes::from_static(b"2")).unwrap();
    assert!(flow.is_paused());

    // The gap between high_water and capacity absorbs an in-flight push.
    bridge.on_data(Bytes::from_static(b"3")).unwrap();

    // At capacity the push is rejected and occupancy is untouched.
    let err = bridge.on_data(Bytes::from_static(b"4")).unwrap_err();
    assert!(matches!(err, BridgeError::QueueFull { occupancy: 4 }));
    assert_eq!(bridge.queued(), 4);
}

#[tokio::test]
async fn draining_resumes_the_producer_and_emits_drain() {
    init_tracing();
    let bridge = small_bridge();
    let recorder = Recorder::attach(&bridge);

    for byte in 0..3u8 {
        bridge.on_data(Bytes::from(vec![byte; 16])).unwrap();
    }
    assert!(bridge.is_paused());

    let pump = tokio::spawn(SinkAdapter::new(bridge.clone()).run());
    assert!(
        wait_until(Duration::from_secs(2), || !bridge.is_paused()).await,
        "pump never released backpressure"
    );
    assert!(recorder.drains.load(Ordering::SeqCst) >= 1);

    // Stream continues normally after the pause/resume cycle.
    for byte in 3..6u8 {
        bridge.on_data(Bytes::from(vec![byte; 16])).unwrap();
        tokio::task::yield_now().await;
    }
    bridge.on_end();
    pump.await.unwrap().unwrap();

    assert_eq!(bridge.state(), StreamState::Ended);
    assert_eq!(recorder.payloads.lock().unwrap().len(), 6);
    recorder.assert_seqs_contiguous();
}

#[tokio::test]
async fn file_source_blocks_on_the_pause_signal() {
    init_tracing();
    let dir = scratch_dir("bp-filesource");
    let path = dir.join("input.bin");
    let content: Vec<u8> = (0..40 * 1024u32).map(|i| (i % 199) as u8).collect();
    std::fs::write(&path, &content).unwrap();

    let bridge = small_bridge();
    let recorder = Recorder::attach(&bridge);

    // No sink yet: the source must stall at high_water, well short of EOF.
    let source = FileSource::new(&path).with_config(&SourceConfig {
        read_chunk_bytes: 1024,
    });
    let reader = tokio::spawn(source.run(bridge.clone()));

    assert!(
        wait_until(Duration::from_secs(2), || bridge.is_paused()).await,
        "source never hit the high-water mark"
    );
    assert_eq!(bridge.state(), StreamState::Open);
    assert!(bridge.queued() >= 3);
    assert!(bridge.queued() <= 4);

    // Attach the sink; the whole file drains through the tiny queue.
    let pump = tokio::spawn(SinkAdapter::new(bridge.clone()).run());
    reader.await.unwrap().unwrap();
    pump.await.unwrap().unwrap();

    assert_eq!(bridge.state(), StreamState::Ended);
    assert_eq!(recorder.assembled(), content);
    recorder.assert_seqs_contiguous();
    assert!(recorder.drains.load(Ordering::SeqCst) >= 1);
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 1);

    let _ = std::fs::remove_dir_all(&dir);
}
