use crate::debounce::{EdgeDetector, EdgeSelect};
use crate::dispatch::DispatchSlot;
use crate::history::History;
use crate::pattern::Pattern;
use linewatch_hal::traits::LineId;
use thiserror::Error;

/// Default slot table capacity used by the monitor layer.
pub const MAX_LINES: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("slot table full ({capacity} lines)")]
    CapacityExceeded { capacity: usize },
    #[error("line {0} not configured")]
    NotConfigured(LineId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    Input,
    Output,
    Special,
}

/// Full configuration and runtime state of one addressable line.
///
/// `configured = false` means every other field is semantically undefined;
/// the table never hands out a reference to a vacant slot. `id` is
/// immutable once the slot is claimed.
pub struct Slot {
    pub(crate) id: LineId,
    pub(crate) mode: LineMode,
    pub(crate) state: bool,
    pub(crate) configured: bool,
    pub(crate) history: History,
    pub(crate) edge: EdgeDetector,
    pub(crate) edge_select: EdgeSelect,
    pub(crate) pattern: Option<Pattern>,
    pub(crate) match_count: u16,
    pub(crate) matched: bool,
    pub(crate) dispatch: DispatchSlot,
}

impl Slot {
    fn vacant() -> Self {
        Self {
            id: 0,
            mode: LineMode::Input,
            state: false,
            configured: false,
            history: History::new(),
            edge: EdgeDetector::new(),
            edge_select: EdgeSelect::Both,
            pattern: None,
            match_count: 0,
            matched: false,
            dispatch: DispatchSlot::new(),
        }
    }

    /// Current logic level: the committed input state for inputs, the last
    /// written state otherwise.
    pub(crate) fn level(&self) -> bool {
        match self.mode {
            LineMode::Input => self.edge.last_valid(),
            LineMode::Output | LineMode::Special => self.state,
        }
    }
}

/// Open-addressed table of `CAP` line slots, keyed by line id. The hash is
/// `id % CAP` with linear probing, wrapping, bounded to `CAP` attempts; a
/// full probe chain on `configure` is a capacity error, never a silent
/// overwrite.
pub struct SlotTable<const CAP: usize> {
    slots: [Slot; CAP],
}

impl<const CAP: usize> SlotTable<CAP> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Slot::vacant()),
        }
    }

    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// Claim (or re-configure) the slot for `id`. Idempotent per id: a
    /// repeat call updates the mode in place and leaves runtime state alone.
    pub fn configure(&mut self, id: LineId, mode: LineMode) -> Result<usize, EngineError> {
        let mut idx = id as usize % CAP;
        for _ in 0..CAP {
            let slot = &mut self.slots[idx];
            if slot.configured && slot.id == id {
                slot.mode = mode;
                return Ok(idx);
            }
            if !slot.configured {
                slot.configured = true;
                slot.id = id;
                slot.mode = mode;
                return Ok(idx);
            }
            idx = (idx + 1) % CAP;
        }
        Err(EngineError::CapacityExceeded { capacity: CAP })
    }

    pub fn lookup(&self, id: LineId) -> Result<usize, EngineError> {
        let mut idx = id as usize % CAP;
        for _ in 0..CAP {
            let slot = &self.slots[idx];
            if !slot.configured {
                // no deletion in this design, so an empty slot ends the chain
                break;
            }
            if slot.id == id {
                return Ok(idx);
            }
            idx = (idx + 1) % CAP;
        }
        Err(EngineError::NotConfigured(id))
    }

    pub(crate) fn get(&self, idx: usize) -> &Slot {
        &self.slots[idx]
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> &mut Slot {
        &mut self.slots[idx]
    }

    pub(crate) fn slot(&self, id: LineId) -> Result<&Slot, EngineError> {
        self.lookup(id).map(|idx| &self.slots[idx])
    }

    pub(crate) fn slot_mut(&mut self, id: LineId) -> Result<&mut Slot, EngineError> {
        self.lookup(id).map(|idx| &mut self.slots[idx])
    }

    /// Indices of all configured slots, sorted by ascending line id: the
    /// sweep order of the tick loop.
    pub(crate) fn sweep_order(&self) -> ([usize; CAP], usize) {
        let mut order = [0usize; CAP];
        let mut n = 0;
        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.configured {
                order[n] = idx;
                n += 1;
            }
        }
        order[..n].sort_unstable_by_key(|&idx| self.slots[idx].id);
        (order, n)
    }

    /// Gather one current bit per line in `mask` (ascending line id, lowest
    /// masked id at bit 0) into a composite word. Every referenced line
    /// must be configured.
    pub(crate) fn composite_word(&self, mask: u16) -> Result<u16, EngineError> {
        let mut word = 0u16;
        let mut bit = 0;
        for id in 0..16u8 {
            if mask & (1 << id) == 0 {
                continue;
            }
            if self.slot(id)?.level() {
                word |= 1 << bit;
            }
            bit += 1;
        }
        Ok(word)
    }

    /// Reset every slot to its vacant default in one step.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl<const CAP: usize> Default for SlotTable<CAP> {
    fn default() -> Self {
        Self::new()
    }
}
