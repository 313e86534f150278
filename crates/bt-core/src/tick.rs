/// Per-frame data handed down by the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickContext {
    pub tick: u64,
}

impl TickContext {
    pub fn new(tick: u64) -> Self {
        Self { tick }
    }

    pub fn next(self) -> Self {
        Self {
            tick: self.tick.wrapping_add(1),
        }
    }
}
