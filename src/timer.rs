use std::time::Duration;

/// Elapsed-time counter advanced by ticks. Purely informational.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwatch {
    elapsed: Duration,
    paused: bool,
}

impl Stopwatch {
    pub fn tick(&mut self, dt: Duration) {
        if !self.paused {
            self.elapsed += dt;
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle(&mut self) {
        self.paused = !self.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// `mm:ss`, rolling over to `h:mm:ss` past the hour
    pub fn format(&self) -> String {
        let secs = self.elapsed.as_secs();
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if h > 0 {
            format!("{h}:{m:02}:{s:02}")
        } else {
            format!("{m:02}:{s:02}")
        }
    }
}
