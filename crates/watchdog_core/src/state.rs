#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Scanning,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchState {
    phase: Phase,
    cycles: u64,
    last_new_count: usize,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of scans started so far; the scan in progress counts.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// How many new names the last completed scan found.
    pub fn last_new_count(&self) -> usize {
        self.last_new_count
    }

    pub(crate) fn begin_scan(&mut self) {
        self.phase = Phase::Scanning;
        self.cycles += 1;
    }

    pub(crate) fn finish_scan(&mut self, new_count: usize) {
        self.phase = Phase::Idle;
        self.last_new_count = new_count;
    }
}
