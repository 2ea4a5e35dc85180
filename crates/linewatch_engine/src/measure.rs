//! Blocking single-line measurement.
//!
//! These routines busy-wait on one line outside the normal sweep: while a
//! measurement runs, no other line is serviced and debounce timing on
//! other lines is not maintained. Callers opt into that trade for
//! measurement accuracy. All routines return `Ok(None)` on timeout.

use linewatch_hal::clock::Clock;
use linewatch_hal::traits::{LineBackend, LineId, Tick};
use log::warn;

use crate::engine::ScanEngine;
use crate::slot::EngineError;

impl<H: LineBackend, C: Clock, const CAP: usize> ScanEngine<H, C, CAP> {
    /// Width in ticks of the next pulse at `level` on `id`. Waits out any
    /// pulse already in progress first.
    pub fn measure_pulse(
        &mut self,
        id: LineId,
        level: bool,
        timeout_ticks: Tick,
    ) -> Result<Option<Tick>, EngineError> {
        self.assert_configured(id)?;
        let entered = self.clock.now();
        if self.wait_for(id, !level, entered, timeout_ticks).is_none() {
            return Ok(None);
        }
        let Some(start) = self.wait_for(id, level, entered, timeout_ticks) else {
            return Ok(None);
        };
        let Some(end) = self.wait_for(id, !level, entered, timeout_ticks) else {
            return Ok(None);
        };
        Ok(Some(end.wrapping_sub(start)))
    }

    /// Period in ticks of one full cycle on `id`, rising edge to rising
    /// edge.
    pub fn measure_period(
        &mut self,
        id: LineId,
        timeout_ticks: Tick,
    ) -> Result<Option<Tick>, EngineError> {
        self.assert_configured(id)?;
        let entered = self.clock.now();
        if self.wait_for(id, false, entered, timeout_ticks).is_none() {
            return Ok(None);
        }
        let Some(first_rise) = self.wait_for(id, true, entered, timeout_ticks) else {
            return Ok(None);
        };
        if self.wait_for(id, false, entered, timeout_ticks).is_none() {
            return Ok(None);
        }
        let Some(second_rise) = self.wait_for(id, true, entered, timeout_ticks) else {
            return Ok(None);
        };
        Ok(Some(second_rise.wrapping_sub(first_rise)))
    }

    /// Duty cycle of `id` as a percentage over one full cycle, rounded to
    /// the nearest percent.
    pub fn duty_cycle(
        &mut self,
        id: LineId,
        timeout_ticks: Tick,
    ) -> Result<Option<u8>, EngineError> {
        self.assert_configured(id)?;
        let entered = self.clock.now();
        if self.wait_for(id, false, entered, timeout_ticks).is_none() {
            return Ok(None);
        }
        let Some(rise) = self.wait_for(id, true, entered, timeout_ticks) else {
            return Ok(None);
        };
        let Some(fall) = self.wait_for(id, false, entered, timeout_ticks) else {
            return Ok(None);
        };
        let Some(next_rise) = self.wait_for(id, true, entered, timeout_ticks) else {
            return Ok(None);
        };
        let high = fall.wrapping_sub(rise) as u64;
        let total = next_rise.wrapping_sub(rise) as u64;
        if total == 0 {
            return Ok(None);
        }
        Ok(Some(((high * 100 + total / 2) / total) as u8))
    }

    fn assert_configured(&self, id: LineId) -> Result<(), EngineError> {
        self.table.lookup(id).map(|_| ())
    }

    /// Busy-wait until the line reads `level`; returns the tick it did, or
    /// `None` once `timeout_ticks` have elapsed since `entered`.
    fn wait_for(&mut self, id: LineId, level: bool, entered: Tick, timeout_ticks: Tick) -> Option<Tick> {
        loop {
            let now = self.clock.now();
            if now.wrapping_sub(entered) > timeout_ticks {
                return None;
            }
            let sample = match self.hal.read_line(id) {
                Ok(v) => v,
                Err(e) => {
                    warn!("line {id}: {e} during measurement, sampling as low");
                    false
                }
            };
            if sample == level {
                return Some(now);
            }
            std::hint::spin_loop();
        }
    }
}
