use linewatch_hal::traits::{LineId, Tick};

/// Bounded event queue depth per line.
pub const QUEUE_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Rising,
    Falling,
    PatternMatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedEvent {
    pub kind: EventKind,
    pub tick: Tick,
}

/// Context handed to a line's handler on dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext {
    pub line: LineId,
    pub kind: EventKind,
    pub tick: Tick,
}

/// Handler capability registered per line. Invoked synchronously from the
/// tick sweep; must be short or defer its own work.
pub type Handler = Box<dyn FnMut(EventContext) + Send>;

/// Circular queue of the most recent events on one line. Overwrites the
/// oldest entry when full; never blocks.
#[derive(Debug, Clone, Copy)]
pub struct EventQueue {
    entries: [QueuedEvent; QUEUE_DEPTH],
    head: usize,
    len: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            entries: [QueuedEvent {
                kind: EventKind::Rising,
                tick: 0,
            }; QUEUE_DEPTH],
            head: 0,
            len: 0,
        }
    }

    /// Returns true when the oldest entry was overwritten to make room.
    pub fn push(&mut self, event: QueuedEvent) -> bool {
        if self.len == QUEUE_DEPTH {
            self.entries[self.head] = event;
            self.head = (self.head + 1) % QUEUE_DEPTH;
            true
        } else {
            self.entries[(self.head + self.len) % QUEUE_DEPTH] = event;
            self.len += 1;
            false
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Oldest-to-newest.
    pub fn iter(&self) -> impl Iterator<Item = QueuedEvent> + '_ {
        (0..self.len).map(move |i| self.entries[(self.head + i) % QUEUE_DEPTH])
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-line dispatch registration: a priority (0 = highest, ordering
/// handler invocation across lines within one sweep), an enable flag, the
/// registered handler, and the event queue.
pub struct DispatchSlot {
    pub(crate) priority: u8,
    pub(crate) enabled: bool,
    pub(crate) handler: Option<Handler>,
    pub(crate) queue: EventQueue,
}

impl DispatchSlot {
    pub fn new() -> Self {
        Self {
            priority: 0,
            enabled: false,
            handler: None,
            queue: EventQueue::new(),
        }
    }
}

impl Default for DispatchSlot {
    fn default() -> Self {
        Self::new()
    }
}
