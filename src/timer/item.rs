/// Identifier for an event scheduled on a [`Timer`](super::Timer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) u64);

impl ItemId {
    /// The raw id, unique within one timer.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Handle returned when an event is added to a timer, used to cancel it or
/// query its status.
///
/// A handle is only meaningful to the timer that issued it; other timers
/// treat it as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    pub(crate) timer: u64,
    pub(crate) id: ItemId,
}

impl Item {
    /// This item's id within its timer.
    pub fn id(&self) -> ItemId {
        self.id
    }
}

/// Where an item is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Waiting for its due time.
    Queued,
    /// Being invoked, or selected in the current batch and about to be.
    Firing,
    /// Fired, cancelled, discarded by `stop`, or never known to this timer.
    Complete,
}

/// Outcome of [`Timer::cancel`](super::Timer::cancel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelStatus {
    /// Removed before it was selected; it will not fire.
    Cancelled,
    /// Already fired, already cancelled, or already selected for firing.
    Failed,
}
