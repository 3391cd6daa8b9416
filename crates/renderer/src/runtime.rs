use std::time::{Duration, Instant};

/// Paces redraws. Without a cap every `AboutToWait` asks for a frame and
/// presentation is throttled by vsync; with a cap frames are spaced at
/// `1 / fps`.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    frame_interval: Option<Duration>,
    last_frame: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(target_fps: Option<f32>) -> Self {
        let frame_interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map(|fps| Duration::from_secs_f32(1.0 / fps));
        Self {
            frame_interval,
            last_frame: None,
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match (self.frame_interval, self.last_frame) {
            (Some(interval), Some(last)) => now >= last + interval,
            _ => true,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.frame_interval, self.last_frame) {
            (Some(interval), Some(last)) => Some(last + interval),
            _ => None,
        }
    }
}
