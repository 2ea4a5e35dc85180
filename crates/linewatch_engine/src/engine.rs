use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use linewatch_hal::clock::Clock;
use linewatch_hal::traits::{LineBackend, LineId, Tick};
use log::{debug, trace, warn};

use crate::debounce::{Edge, EdgeSelect};
use crate::dispatch::{EventContext, EventKind, Handler, QueuedEvent};
use crate::pattern::Pattern;
use crate::slot::{EngineError, LineMode, MAX_LINES, SlotTable};

/// Snapshot of the engine-level counters. Every tick-time error condition
/// is counted here rather than halting the sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStatus {
    pub cycle_count: u64,
    pub hardware_faults: u32,
    pub queue_overflows: u32,
    pub dropped_dispatches: u32,
}

/// Snapshot of one line's runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStatus {
    pub mode: LineMode,
    pub state: bool,
    pub bounce_count: u32,
    pub match_count: u16,
    pub priority: u8,
    pub enabled: bool,
    pub queued_events: usize,
}

/// The tick loop. Owns the slot table, the I/O backend, and the clock;
/// one `step` is one tick: sample every configured line in ascending id
/// order, debounce, pattern-check, then dispatch raised events in
/// priority order. This is the only place per-line state is mutated.
/// Handlers run to completion inside the sweep, so a slow handler delays
/// every later line in that tick.
pub struct ScanEngine<H: LineBackend, C: Clock, const CAP: usize = MAX_LINES> {
    pub hal: H,
    pub clock: C,
    pub cycle_time: Duration,
    pub cycle_count: u64,
    pub(crate) table: SlotTable<CAP>,
    hardware_faults: u32,
    queue_overflows: u32,
    dropped_dispatches: u32,
}

impl<H: LineBackend, C: Clock, const CAP: usize> ScanEngine<H, C, CAP> {
    pub fn new(hal: H, clock: C, cycle_time_ms: u64) -> Self {
        Self {
            hal,
            clock,
            cycle_time: Duration::from_millis(cycle_time_ms),
            cycle_count: 0,
            table: SlotTable::new(),
            hardware_faults: 0,
            queue_overflows: 0,
            dropped_dispatches: 0,
        }
    }

    // --- configuration ---------------------------------------------------

    pub fn configure_line(&mut self, id: LineId, mode: LineMode) -> Result<(), EngineError> {
        self.table.configure(id, mode).map(|_| ())
    }

    pub fn set_debounce(&mut self, id: LineId, ticks: Tick) -> Result<(), EngineError> {
        self.table.slot_mut(id)?.edge.set_interval(ticks);
        Ok(())
    }

    pub fn set_edge_select(&mut self, id: LineId, select: EdgeSelect) -> Result<(), EngineError> {
        self.table.slot_mut(id)?.edge_select = select;
        Ok(())
    }

    /// Attach a pattern to a line. A composite pattern may only reference
    /// configured lines.
    pub fn set_pattern(&mut self, id: LineId, pattern: Pattern) -> Result<(), EngineError> {
        self.table.lookup(id)?;
        if pattern.is_composite() {
            for line in 0..16u8 {
                if pattern.pin_mask & (1 << line) != 0 {
                    self.table.lookup(line)?;
                }
            }
        }
        let slot = self.table.slot_mut(id)?;
        slot.pattern = Some(pattern);
        slot.matched = false;
        Ok(())
    }

    pub fn clear_pattern(&mut self, id: LineId) -> Result<(), EngineError> {
        let slot = self.table.slot_mut(id)?;
        slot.pattern = None;
        slot.matched = false;
        Ok(())
    }

    pub fn enable_handler(
        &mut self,
        id: LineId,
        handler: Handler,
        priority: u8,
    ) -> Result<(), EngineError> {
        let slot = self.table.slot_mut(id)?;
        slot.dispatch.handler = Some(handler);
        slot.dispatch.priority = priority;
        slot.dispatch.enabled = true;
        Ok(())
    }

    pub fn disable_handler(&mut self, id: LineId) -> Result<(), EngineError> {
        self.table.slot_mut(id)?.dispatch.enabled = false;
        Ok(())
    }

    pub fn set_priority(&mut self, id: LineId, priority: u8) -> Result<(), EngineError> {
        self.table.slot_mut(id)?.dispatch.priority = priority;
        Ok(())
    }

    /// Reset the whole engine (table, queues, counters) in one step.
    pub fn reset(&mut self) {
        self.table.reset();
        self.cycle_count = 0;
        self.hardware_faults = 0;
        self.queue_overflows = 0;
        self.dropped_dispatches = 0;
    }

    // --- queries ----------------------------------------------------------

    /// Committed logic level of a line.
    pub fn state(&self, id: LineId) -> Result<bool, EngineError> {
        Ok(self.table.slot(id)?.level())
    }

    /// Set a line's state; drives the output capability when the line is an
    /// output.
    pub fn write(&mut self, id: LineId, value: bool) -> Result<(), EngineError> {
        let slot = self.table.slot_mut(id)?;
        slot.state = value;
        if slot.mode == LineMode::Output {
            self.hal.write_line(id, value);
        }
        Ok(())
    }

    /// Queued events on a line, oldest first.
    pub fn events(
        &self,
        id: LineId,
    ) -> Result<impl Iterator<Item = QueuedEvent> + '_, EngineError> {
        Ok(self.table.slot(id)?.dispatch.queue.iter())
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            cycle_count: self.cycle_count,
            hardware_faults: self.hardware_faults,
            queue_overflows: self.queue_overflows,
            dropped_dispatches: self.dropped_dispatches,
        }
    }

    pub fn slot_status(&self, id: LineId) -> Result<SlotStatus, EngineError> {
        let slot = self.table.slot(id)?;
        Ok(SlotStatus {
            mode: slot.mode,
            state: slot.level(),
            bounce_count: slot.edge.bounce_count(),
            match_count: slot.match_count,
            priority: slot.dispatch.priority,
            enabled: slot.dispatch.enabled,
            queued_events: slot.dispatch.queue.len(),
        })
    }

    // --- the tick loop ----------------------------------------------------

    /// One tick: sample → debounce → pattern-check in ascending id order,
    /// then dispatch in (priority, id) order.
    pub fn step(&mut self) {
        let tick = self.clock.now();

        if let Err(e) = self.hal.refresh_inputs() {
            self.hardware_faults = self.hardware_faults.saturating_add(1);
            warn!("input refresh failed: {e}");
        }

        let (order, n) = self.table.sweep_order();
        let mut edge_ev: [Option<EventKind>; CAP] = [None; CAP];
        let mut pattern_ev = [false; CAP];

        // classify
        for &idx in &order[..n] {
            let slot = self.table.get_mut(idx);
            if slot.mode != LineMode::Input {
                continue;
            }
            let id = slot.id;
            let sample = match self.hal.read_line(id) {
                Ok(v) => v,
                Err(e) => {
                    // degrade to a stale-low sample and keep sweeping
                    self.hardware_faults = self.hardware_faults.saturating_add(1);
                    warn!("line {id}: {e}, sampling as low");
                    false
                }
            };
            slot.history.push(sample, tick);
            if let Some(edge) = slot.edge.sample(tick, sample) {
                slot.state = slot.edge.last_valid();
                debug!("line {id}: {edge:?} committed at tick {tick}");
                if slot.edge_select.accepts(edge) {
                    edge_ev[idx] = Some(match edge {
                        Edge::Rising => EventKind::Rising,
                        Edge::Falling => EventKind::Falling,
                    });
                }
            }
        }

        // pattern check, after all of this tick's commits are in
        for &idx in &order[..n] {
            let matched = {
                let slot = self.table.get(idx);
                match slot.pattern {
                    None => continue,
                    Some(p) if p.is_composite() => match self.table.composite_word(p.pin_mask) {
                        Ok(word) => word == u16::from(p.target_bits),
                        Err(_) => false,
                    },
                    Some(p) if slot.mode == LineMode::Input => {
                        p.matches_window(slot.history.window(), slot.history.oldest_tick(), tick)
                    }
                    Some(_) => false,
                }
            };
            let slot = self.table.get_mut(idx);
            if matched && !slot.matched {
                slot.match_count = slot.match_count.saturating_add(1);
                pattern_ev[idx] = true;
                debug!("line {}: pattern matched at tick {tick}", slot.id);
            }
            slot.matched = matched;
        }

        // dispatch: lower priority value first, ties by ascending id
        let mut dorder = order;
        dorder[..n].sort_unstable_by_key(|&idx| {
            let slot = self.table.get(idx);
            (slot.dispatch.priority, slot.id)
        });
        for &idx in &dorder[..n] {
            if let Some(kind) = edge_ev[idx] {
                self.raise_at(idx, kind, tick);
            }
            if pattern_ev[idx] {
                self.raise_at(idx, EventKind::PatternMatched, tick);
            }
        }

        if let Err(e) = self.hal.flush_outputs() {
            self.hardware_faults = self.hardware_faults.saturating_add(1);
            warn!("output flush failed: {e}");
        }
        self.cycle_count += 1;
    }

    /// Raise an event on a configured line: enqueue, then invoke the
    /// handler synchronously if one is enabled.
    pub fn raise(&mut self, id: LineId, kind: EventKind) -> Result<(), EngineError> {
        let idx = self.table.lookup(id)?;
        let tick = self.clock.now();
        self.raise_at(idx, kind, tick);
        Ok(())
    }

    fn raise_at(&mut self, idx: usize, kind: EventKind, tick: Tick) {
        let slot = self.table.get_mut(idx);
        let id = slot.id;
        if slot.dispatch.queue.push(QueuedEvent { kind, tick }) {
            self.queue_overflows = self.queue_overflows.saturating_add(1);
            debug!("line {id}: event queue full, oldest entry dropped");
        }
        if slot.dispatch.enabled {
            if let Some(handler) = slot.dispatch.handler.as_mut() {
                trace!("line {id}: dispatching {kind:?} at tick {tick}");
                handler(EventContext { line: id, kind, tick });
                return;
            }
        }
        self.dropped_dispatches = self.dropped_dispatches.saturating_add(1);
        debug!("line {id}: no enabled handler for {kind:?}, dispatch dropped");
    }

    pub fn run_cycles(&mut self, count: u64) {
        for _ in 0..count {
            self.step();
        }
    }

    /// Run until `stop` is set, pacing sweeps to `cycle_time`. The flag is
    /// checked once per tick.
    pub fn run_realtime(&mut self, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            let t0 = Instant::now();
            self.step();
            let elapsed = t0.elapsed();
            if elapsed < self.cycle_time {
                std::thread::sleep(self.cycle_time - elapsed);
            }
        }
    }
}
