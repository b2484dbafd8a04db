//! Multi-producer behaviour of the dispatcher
//!
//! Run with: cargo test -p hermes-dispatcher --test concurrent_dispatch

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use hermes_dispatcher::{Dispatcher, DispatcherConfig, DispatcherError};

fn encode(producer: u32, index: u32) -> Vec<u8> {
    let mut bytes = producer.to_le_bytes().to_vec();
    bytes.extend_from_slice(&index.to_le_bytes());
    bytes
}

fn decode(payload: &[u8]) -> (u32, u32) {
    let producer = u32::from_le_bytes(payload[0..4].try_into().unwrap());
    let index = u32::from_le_bytes(payload[4..8].try_into().unwrap());
    (producer, index)
}

#[test]
fn test_many_producers_each_stream_in_order() {
    let _ = env_logger::try_init();

    const PRODUCERS: u32 = 4;
    const PER_PRODUCER: u32 = 5_000;

    let (tx, rx) = mpsc::channel();
    let dispatcher = Arc::new(
        Dispatcher::start(DispatcherConfig::with_capacity(64), move |request| {
            tx.send(decode(request.payload())).map_err(|e| e.to_string())
        })
        .unwrap(),
    );

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                for index in 0..PER_PRODUCER {
                    dispatcher
                        .dispatch("rk.ticks", &encode(producer, index))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    dispatcher.shutdown();

    let mut last_seen: HashMap<u32, u32> = HashMap::new();
    let mut total = 0;
    for (producer, index) in rx.try_iter() {
        if let Some(previous) = last_seen.insert(producer, index) {
            assert_eq!(index, previous + 1, "producer {producer} reordered");
        } else {
            assert_eq!(index, 0);
        }
        total += 1;
    }

    assert_eq!(total, PRODUCERS * PER_PRODUCER);
    assert_eq!(dispatcher.stats().dispatched, u64::from(PRODUCERS * PER_PRODUCER));
}

#[test]
fn test_out_of_order_publish_is_delivered_in_sequence() {
    let (tx, rx) = mpsc::channel();
    let dispatcher = Dispatcher::start(DispatcherConfig::with_capacity(8), move |request| {
        tx.send(request.destination().to_string())
            .map_err(|e| e.to_string())
    })
    .unwrap();

    let mut first = dispatcher.claim_next().unwrap();
    let mut second = dispatcher.claim_next().unwrap();
    first.set("rk.first", b"1");
    second.set("rk.second", b"2");

    second.publish();
    thread::sleep(Duration::from_millis(20));
    assert!(rx.try_recv().is_err(), "sequence 1 delivered before 0");

    first.publish();
    assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), "rk.first");
    assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), "rk.second");

    dispatcher.shutdown();
}

#[test]
fn test_full_ring_blocks_producer_without_overwriting() {
    const CAPACITY: usize = 4;
    const TOTAL: u32 = 6;

    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let (out_tx, out_rx) = mpsc::channel();
    let dispatcher = Arc::new(
        Dispatcher::start(DispatcherConfig::with_capacity(CAPACITY), move |request| {
            gate_rx.recv().map_err(|e| e.to_string())?;
            out_tx
                .send(u32::from_le_bytes(request.payload().try_into().unwrap()))
                .map_err(|e| e.to_string())
        })
        .unwrap(),
    );

    let completed = Arc::new(AtomicUsize::new(0));
    let producer = {
        let dispatcher = Arc::clone(&dispatcher);
        let completed = Arc::clone(&completed);
        thread::spawn(move || {
            for i in 0..TOTAL {
                dispatcher.dispatch("rk.bars", &i.to_le_bytes()).unwrap();
                completed.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert_eq!(completed.load(Ordering::SeqCst), CAPACITY);

    for _ in 0..TOTAL {
        gate_tx.send(()).unwrap();
    }
    producer.join().unwrap();
    dispatcher.shutdown();

    let delivered: Vec<u32> = out_rx.try_iter().collect();
    assert_eq!(delivered, (0..TOTAL).collect::<Vec<_>>());
}

#[test]
fn test_shutdown_drains_concurrent_producers() {
    let delivered = Arc::new(AtomicUsize::new(0));
    let dispatcher = {
        let delivered = Arc::clone(&delivered);
        Arc::new(
            Dispatcher::start(DispatcherConfig::with_capacity(32), move |_| {
                delivered.fetch_add(1, Ordering::SeqCst);
                Ok::<(), String>(())
            })
            .unwrap(),
        )
    };

    let accepted = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dispatcher = Arc::clone(&dispatcher);
            let accepted = Arc::clone(&accepted);
            thread::spawn(move || {
                for _ in 0..10_000 {
                    match dispatcher.dispatch("rk", b"x") {
                        Ok(_) => {
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(DispatcherError::ShutDown) => break,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(5));
    dispatcher.shutdown();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        delivered.load(Ordering::SeqCst),
        accepted.load(Ordering::SeqCst)
    );
}
