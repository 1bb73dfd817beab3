//! Lifecycle ordering: end, error, close, and contract violations.

use crate::*;

use strait::{BridgeConfig, BridgeError, SinkAdapter, SourceError, StreamState};

fn bridge() -> Bridge {
    Bridge::new(BridgeConfig {
        capacity: 8,
        high_water: 6,
        low_water: 2,
    })
    .unwrap()
}

#[tokio::test]
async fn end_with_buffered_chunks_drains_then_ends() {
    init_tracing();
    let bridge = bridge();
    let recorder = Recorder::attach(&bridge);

    bridge.on_open();
    bridge.on_data(Bytes::from_static(b"a")).unwrap();
    bridge.on_data(Bytes::from_static(b"b")).unwrap();
    bridge.on_end();
    assert_eq!(bridge.state(), StreamState::Draining);
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 0);

    SinkAdapter::new(bridge.clone()).run().await.unwrap();

    assert_eq!(bridge.state(), StreamState::Ended);
    assert_eq!(recorder.assembled(), b"ab");
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn error_discards_buffered_chunks_and_reports_once() {
    init_tracing();
    let bridge = bridge();
    let recorder = Recorder::attach(&bridge);

    bridge.on_open();
    bridge.on_data(Bytes::from_static(b"a")).unwrap();
    bridge.on_data(Bytes::from_static(b"b")).unwrap();
    bridge.on_error(SourceError::msg("socket reset"));

    assert_eq!(bridge.state(), StreamState::Errored);
    assert_eq!(bridge.queued(), 0);
    assert_eq!(*recorder.errors.lock().unwrap(), vec!["socket reset"]);

    // The pump finds a terminal bridge and delivers nothing.
    SinkAdapter::new(bridge.clone()).run().await.unwrap();
    assert!(recorder.payloads.lock().unwrap().is_empty());
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn close_while_draining_discards_without_delivering() {
    init_tracing();
    let bridge = bridge();
    let recorder = Recorder::attach(&bridge);

    for byte in 0..3u8 {
        bridge.on_data(Bytes::from(vec![byte])).unwrap();
    }
    bridge.on_end();
    assert_eq!(bridge.state(), StreamState::Draining);

    bridge.close();
    assert_eq!(bridge.state(), StreamState::Ended);
    assert_eq!(bridge.queued(), 0);

    SinkAdapter::new(bridge.clone()).run().await.unwrap();
    assert!(recorder.payloads.lock().unwrap().is_empty());
    assert_eq!(recorder.closes.load(Ordering::SeqCst), 1);
    // Close is not End: the stream did not deliver everything.
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn late_subscriber_receives_still_buffered_chunks() {
    init_tracing();
    let bridge = bridge();

    for byte in 0..4u8 {
        bridge.on_data(Bytes::from(vec![byte])).unwrap();
    }
    bridge.on_end();

    // Subscribed after the data arrived, before the pump ran: nothing
    // buffered is lost.
    let recorder = Recorder::attach(&bridge);
    SinkAdapter::new(bridge.clone()).run().await.unwrap();

    assert_eq!(recorder.payloads.lock().unwrap().len(), 4);
    recorder.assert_seqs_contiguous();
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn push_after_terminal_fails_without_panicking() {
    init_tracing();
    let bridge = bridge();
    bridge.close();

    let err = bridge.on_data(Bytes::from_static(b"late")).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Closed {
            state: StreamState::Ended
        }
    ));
    // The bridge stays queryable after the rejected push.
    assert_eq!(bridge.state(), StreamState::Ended);
    assert_eq!(bridge.queued(), 0);
}

#[tokio::test]
async fn shim_contract_violations_are_tolerated() {
    init_tracing();
    let bridge = bridge();

    bridge.on_open();
    bridge.on_open(); // duplicate open
    bridge.on_end();
    bridge.on_end(); // duplicate end
    bridge.on_error(SourceError::msg("too late")); // error after end

    assert_eq!(bridge.state(), StreamState::Ended);

    let recorder = Recorder::attach(&bridge);
    assert!(recorder.errors.lock().unwrap().is_empty());
}
