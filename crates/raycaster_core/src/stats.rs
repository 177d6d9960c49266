//! # Frame Timing
//!
//! Measures the time between frames and keeps an FPS figure steady enough to
//! read: samples are averaged over a fixed window instead of shown raw.

use std::time::{Duration, Instant};

/// Mean of the samples seen during the last completed window.
#[derive(Clone, Copy, Debug)]
pub struct RollingAverage {
    /// Window length in seconds.
    window: f64,
    /// Sum of samples in the open window.
    sum: f64,
    /// Number of samples in the open window.
    count: u32,
    /// Time covered by the open window.
    elapsed: f64,
    /// Mean of the last closed window.
    current: f64,
}

impl RollingAverage {
    /// Creates an average over `window` seconds.
    #[must_use]
    pub const fn new(window: f64) -> Self {
        Self {
            window,
            sum: 0.0,
            count: 0,
            elapsed: 0.0,
            current: 0.0,
        }
    }

    /// Adds a sample that covers `dt` seconds.
    ///
    /// The published value only changes when a window closes.
    pub fn update(&mut self, value: f64, dt: f64) {
        self.sum += value;
        self.count += 1;
        self.elapsed += dt;

        if self.elapsed >= self.window {
            self.current = self.sum / f64::from(self.count);
            self.sum = 0.0;
            self.count = 0;
            self.elapsed = 0.0;
        }
    }

    /// Mean of the last completed window, zero before the first one closes.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> f64 {
        self.current
    }
}

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Shortest frame observed.
    pub min_frame_us: u64,
    /// Longest frame observed.
    pub max_frame_us: u64,
    /// Rolling average frame duration.
    pub avg_frame_us: u64,
    /// Frames measured.
    pub total_frames: u64,
}

/// Frame-to-frame clock for the render loop.
pub struct FrameClock {
    last: Instant,
    fps: RollingAverage,
    stats: FrameStats,
}

impl FrameClock {
    /// FPS averaging window in seconds.
    pub const FPS_WINDOW: f64 = 1.0;

    /// Starts the clock now.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Starts the clock at a given instant.
    #[must_use]
    pub fn starting_at(start: Instant) -> Self {
        Self {
            last: start,
            fps: RollingAverage::new(Self::FPS_WINDOW),
            stats: FrameStats {
                min_frame_us: u64::MAX,
                ..FrameStats::default()
            },
        }
    }

    /// Closes the current frame and returns its duration in seconds.
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Closes the current frame at `now` and returns its duration in seconds.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        self.record(elapsed);

        let frame_time = elapsed.as_secs_f64();
        if frame_time > 0.0 {
            self.fps.update(1.0 / frame_time, frame_time);
        }
        frame_time
    }

    /// Averaged frames per second.
    #[inline]
    #[must_use]
    pub const fn fps(&self) -> f64 {
        self.fps.get()
    }

    /// Returns statistics.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }

    fn record(&mut self, elapsed: Duration) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        let stats = &mut self.stats;
        stats.total_frames += 1;
        stats.min_frame_us = stats.min_frame_us.min(us);
        stats.max_frame_us = stats.max_frame_us.max(us);
        stats.avg_frame_us = if stats.total_frames == 1 {
            us
        } else {
            (stats.avg_frame_us * 15 + us) / 16
        };
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
