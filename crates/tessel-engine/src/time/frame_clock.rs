use std::time::{Duration, Instant};

const DT_MIN: Duration = Duration::from_micros(100);
const DT_MAX: Duration = Duration::from_millis(250);

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Clamped time since the previous tick.
    pub delta: Duration,

    /// `delta` in seconds.
    pub dt: f32,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped to `[100us, 250ms]`. Dear ImGui asserts on a zero
/// delta, and a debugger pause or minimized window should not produce a
/// multi-second step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frame_index: 0,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let delta = now.saturating_duration_since(self.last).clamp(DT_MIN, DT_MAX);
        self.last = now;

        let ft = FrameTime {
            delta,
            dt: delta.as_secs_f32(),
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_counts_ticks() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick().frame_index, 0);
        assert_eq!(clock.tick().frame_index, 1);
        assert_eq!(clock.tick().frame_index, 2);
    }

    #[test]
    fn back_to_back_ticks_are_never_zero() {
        let mut clock = FrameClock::new();
        clock.tick();
        let ft = clock.tick();
        assert!(ft.delta >= DT_MIN);
        assert!(ft.dt > 0.0);
    }

    #[test]
    fn delta_is_capped() {
        let Some(past) = Instant::now().checked_sub(Duration::from_secs(5)) else {
            return;
        };
        let mut clock = FrameClock::new();
        clock.last = past;
        assert_eq!(clock.tick().delta, DT_MAX);
    }
}
