//! Read/write gate discipline checks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use emu_fs::gate::RwGate;

#[test]
fn readers_overlap() {
    let gate = Arc::new(RwGate::new());
    let peak = Arc::new(AtomicUsize::new(0));
    let active = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let gate = gate.clone();
            let peak = peak.clone();
            let active = active.clone();
            thread::spawn(move || {
                let _turn = gate.read();
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(50));
                active.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) > 1, "readers never overlapped");
}

#[test]
fn writer_is_exclusive() {
    let gate = Arc::new(RwGate::new());
    let counter = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let gate = gate.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    let _turn = gate.write();
                    // non-atomic read-modify-write; only exclusivity
                    // keeps the count exact
                    let seen = counter.load(Ordering::Relaxed);
                    thread::yield_now();
                    counter.store(seen + 1, Ordering::Relaxed);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(counter.load(Ordering::SeqCst), 400);
}

#[test]
fn queued_writer_stalls_new_readers() {
    let gate = Arc::new(RwGate::new());
    let order = Arc::new(AtomicUsize::new(0));

    let first_read = gate.read();

    let writer = {
        let gate = gate.clone();
        let order = order.clone();
        thread::spawn(move || {
            let _turn = gate.write();
            order.compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                .ok();
        })
    };
    // let the writer queue up behind the active reader
    thread::sleep(Duration::from_millis(50));

    let late_reader = {
        let gate = gate.clone();
        let order = order.clone();
        thread::spawn(move || {
            let _turn = gate.read();
            order.compare_exchange(0, 2, Ordering::SeqCst, Ordering::SeqCst)
                .ok();
        })
    };
    thread::sleep(Duration::from_millis(50));

    drop(first_read);
    writer.join().unwrap();
    late_reader.join().unwrap();

    // the queued writer went before the late reader
    assert_eq!(order.load(Ordering::SeqCst), 1);
}
