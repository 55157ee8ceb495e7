use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct LoopStatsReport {
    pub(crate) fps: f32,
    pub(crate) tps: f32,
    pub(crate) worst_frame_ms: f32,
    pub(crate) clamped_frames: u32,
}

/// Frame and tick counters over a rolling reporting window.
#[derive(Debug)]
pub(crate) struct LoopStats {
    window_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    clamped_frames: u32,
    worst_frame: Duration,
}

impl LoopStats {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            window_start: now,
            interval,
            frames: 0,
            ticks: 0,
            clamped_frames: 0,
            worst_frame: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.worst_frame = self.worst_frame.max(frame_dt);
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub(crate) fn record_clamp(&mut self) {
        self.clamped_frames = self.clamped_frames.saturating_add(1);
    }

    /// Closes the window and returns its report once `interval` has elapsed.
    pub(crate) fn report_if_due(&mut self, now: Instant) -> Option<LoopStatsReport> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let report = LoopStatsReport {
            fps: self.frames as f32 / elapsed_seconds,
            tps: self.ticks as f32 / elapsed_seconds,
            worst_frame_ms: self.worst_frame.as_secs_f32() * 1000.0,
            clamped_frames: self.clamped_frames,
        };

        *self = Self::new(self.interval, now);
        Some(report)
    }
}
