use std::time::Instant;

use super::constants::physics as consts;

/// Frame timing with a clamped delta.
///
/// `tick` samples the wall clock; `advance` feeds a delta directly for
/// headless and scripted runs. Either way the delta handed to the simulation
/// lies in `[0, max_delta]`.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    elapsed: f64,
    delta: f32,
    max_delta: f32,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_max_delta(consts::MAX_FRAME_DELTA)
    }

    pub fn with_max_delta(max_delta: f32) -> Self {
        Self {
            last: None,
            elapsed: 0.0,
            delta: 0.0,
            max_delta: max_delta.max(0.0),
            frames: 0,
        }
    }

    /// Samples the wall clock. The first tick yields a zero delta.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw = match self.last {
            Some(last) => now.duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        self.advance(raw)
    }

    /// Advances by `raw` seconds, clamped. Non-finite input counts as zero.
    pub fn advance(&mut self, raw: f32) -> f32 {
        self.delta = if raw.is_finite() {
            raw.clamp(0.0, self.max_delta)
        } else {
            0.0
        };
        self.elapsed += f64::from(self.delta);
        self.frames += 1;
        self.delta
    }

    /// Seconds of simulated time so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Delta of the most recent frame.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    pub fn frames(&self) -> u64 {
        self.frames
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
    fn test_advance_clamps_delta() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(0.016), 0.016);
        assert_eq!(clock.advance(2.5), 0.1);
        assert_eq!(clock.advance(-1.0), 0.0);
        assert_eq!(clock.advance(f32::NAN), 0.0);
        assert_eq!(clock.frames(), 4);
        assert!((clock.elapsed() - 0.116).abs() < 1.0e-6);
    }

    #[test]
    fn test_first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(), 0.0);
        let second = clock.tick();
        assert!((0.0..=0.1).contains(&second));
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let mut clock = FrameClock::with_max_delta(0.05);
        let mut last = clock.elapsed();
        for raw in [0.01, 0.0, 0.2, f32::INFINITY, 0.03] {
            clock.advance(raw);
            assert!(clock.elapsed() >= last);
            assert!(clock.delta() <= 0.05);
            last = clock.elapsed();
        }
    }
}
