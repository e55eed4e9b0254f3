//! # 读写门闩
//!
//! The engine itself carries no locks; callers running concurrent
//! operations against one mount wrap them in an [`RwGate`]. Per gate,
//! either any number of read turns or exactly one write turn is
//! active. Writers are preferred: a queued writer stalls new readers,
//! so a stream of readers cannot starve it.

use std::sync::{Condvar, Mutex};

#[derive(Debug, Default)]
struct GateState {
    active_readers: usize,
    active_writers: usize,
    waiting_writers: usize,
}

/// Writer-preferring read/write gate.
///
/// Turns are guards; dropping one releases it.
#[derive(Debug, Default)]
pub struct RwGate {
    state: Mutex<GateState>,
    readers_proceed: Condvar,
    writers_proceed: Condvar,
}

/// An active read turn.
pub struct ReadTurn<'a> {
    gate: &'a RwGate,
}

/// The active write turn.
pub struct WriteTurn<'a> {
    gate: &'a RwGate,
}

impl RwGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until no writer is active or queued.
    pub fn read(&self) -> ReadTurn<'_> {
        let mut state = self.state.lock().unwrap();
        while state.active_writers > 0 || state.waiting_writers > 0 {
            state = self.readers_proceed.wait(state).unwrap();
        }
        state.active_readers += 1;

        ReadTurn { gate: self }
    }

    /// Blocks until exclusive; queuing already stalls new readers.
    pub fn write(&self) -> WriteTurn<'_> {
        let mut state = self.state.lock().unwrap();
        state.waiting_writers += 1;
        while state.active_writers > 0 || state.active_readers > 0 {
            state = self.writers_proceed.wait(state).unwrap();
        }
        state.waiting_writers -= 1;
        state.active_writers = 1;

        WriteTurn { gate: self }
    }
}

impl Drop for ReadTurn<'_> {
    fn drop(&mut self) {
        let mut state = self.gate.state.lock().unwrap();
        state.active_readers -= 1;
        if state.active_readers == 0 {
            self.gate.writers_proceed.notify_one();
        }
    }
}

impl Drop for WriteTurn<'_> {
    fn drop(&mut self) {
        let mut state = self.gate.state.lock().unwrap();
        state.active_writers = 0;
        if state.waiting_writers > 0 {
            self.gate.writers_proceed.notify_one();
        } else {
            self.gate.readers_proceed.notify_all();
        }
    }
}
