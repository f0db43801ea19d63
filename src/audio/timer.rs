/// Elapsed playback time, advanced at 1 Hz while playing.
///
/// A plain monotonic seconds counter formatted as zero-padded MM:SS. The
/// minutes field is uncapped; an hour-long track reads "60:00".
#[derive(Debug, Clone, Default)]
pub struct TimerModel {
    seconds: u64,
}

impl TimerModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one second. Callers gate this on the playing state.
    pub fn tick(&mut self) {
        self.seconds += 1;
    }

    pub fn reset(&mut self) {
        self.seconds = 0;
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.seconds
    }

    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.seconds / 60, self.seconds % 60)
    }
}
