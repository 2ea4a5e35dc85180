use crate::traits::{HalError, LineBackend, LineId};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct SimState {
    inputs: HashMap<LineId, bool>,
    outputs: HashMap<LineId, bool>,
    faulted: HashSet<LineId>,
}

/// In-memory line backend. The engine owns the backend during a run, so
/// the state sits behind a shared handle: keep a [`SimHandle`] before
/// boxing the backend and drive inputs (or inject faults) from outside.
pub struct SimBackend {
    state: Arc<Mutex<SimState>>,
}

/// External view onto a [`SimBackend`]'s lines.
#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    pub fn handle(&self) -> SimHandle {
        SimHandle {
            state: Arc::clone(&self.state),
        }
    }

    pub fn set_input(&mut self, line: LineId, value: bool) {
        if let Ok(mut s) = self.state.lock() {
            s.inputs.insert(line, value);
        }
    }

    pub fn get_output(&self, line: LineId) -> Option<bool> {
        self.state.lock().ok()?.outputs.get(&line).copied()
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBackend for SimBackend {
    fn read_line(&mut self, line: LineId) -> Result<bool, HalError> {
        let Ok(s) = self.state.lock() else {
            return Err(HalError::HardwareFault(line));
        };
        if s.faulted.contains(&line) {
            return Err(HalError::HardwareFault(line));
        }
        Ok(s.inputs.get(&line).copied().unwrap_or(false))
    }

    fn write_line(&mut self, line: LineId, value: bool) {
        if let Ok(mut s) = self.state.lock() {
            s.outputs.insert(line, value);
        }
    }
}

impl SimHandle {
    pub fn set_input(&self, line: LineId, value: bool) {
        if let Ok(mut s) = self.state.lock() {
            s.inputs.insert(line, value);
        }
    }

    /// Make `read_line` on this line fail with `HardwareFault` until cleared.
    pub fn set_fault(&self, line: LineId, faulted: bool) {
        debug!("sim: line {line} fault injection set to {faulted}");
        if let Ok(mut s) = self.state.lock() {
            if faulted {
                s.faulted.insert(line);
            } else {
                s.faulted.remove(&line);
            }
        }
    }

    pub fn output(&self, line: LineId) -> Option<bool> {
        self.state.lock().ok()?.outputs.get(&line).copied()
    }
}
