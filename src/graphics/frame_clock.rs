use std::time::Instant;

use crate::particles::FrameState;

/// Drives the per-frame time and pixel ratio of one render session. Ticked once per redraw;
/// the redraw itself is paced by the surface's vsync.
pub struct FrameClock {
    started: Instant,
    last_tick: Instant,
}

impl FrameClock {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_tick: now,
        }
    }

    /// Reads the time since the session started and clamps `scale_factor`.
    pub fn tick(&mut self, scale_factor: f64) -> FrameState {
        self.tick_at(Instant::now(), scale_factor)
    }

    fn tick_at(&mut self, now: Instant, scale_factor: f64) -> FrameState {
        let now = now.max(self.last_tick);
        self.last_tick = now;
        FrameState::new(now - self.started, scale_factor)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn time_never_goes_backwards() {
        let mut clock = FrameClock::start();
        let later = clock.started + Duration::from_millis(40);
        let first = clock.tick_at(later, 1.0);
        let second = clock.tick_at(clock.started, 1.0);
        assert_eq!(first.time, second.time);
        let third = clock.tick_at(later + Duration::from_millis(16), 1.0);
        assert!(third.time > second.time);
    }

    #[test]
    fn tick_clamps_pixel_ratio() {
        let mut clock = FrameClock::start();
        assert_eq!(clock.tick(3.0).pixel_ratio, 2.0);
        assert_eq!(clock.tick(1.25).pixel_ratio, 1.25);
    }
}
