use std::time::{Duration, Instant};

use crate::types::CrossfadeCurve;

impl CrossfadeCurve {
    fn sample(self, t: f32) -> f32 {
        let clamped = t.clamp(0.0, 1.0);
        match self {
            CrossfadeCurve::Linear => clamped,
            CrossfadeCurve::Smoothstep => clamped * clamped * (3.0 - 2.0 * clamped),
            CrossfadeCurve::EaseInOut => {
                if clamped < 0.5 {
                    2.0 * clamped * clamped
                } else {
                    -1.0 + (4.0 - 2.0 * clamped) * clamped
                }
            }
        }
    }
}

/// Opacity ramp for a model switch: the outgoing model goes from 1 to 0 while
/// the incoming one goes from 0 to 1.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FadeEnvelope {
    start: Instant,
    duration: Duration,
    curve: CrossfadeCurve,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FadeMix {
    pub outgoing: f32,
    pub incoming: f32,
    pub finished: bool,
}

impl FadeEnvelope {
    pub fn new(duration: Duration, curve: CrossfadeCurve, now: Instant) -> Option<Self> {
        if duration.is_zero() {
            None
        } else {
            Some(Self {
                start: now,
                duration,
                curve,
            })
        }
    }

    pub fn mix(&self, now: Instant) -> FadeMix {
        let elapsed = now.saturating_duration_since(self.start);
        let progress = elapsed.as_secs_f32() / self.duration.as_secs_f32().max(f32::EPSILON);
        let incoming = self.curve.sample(progress);
        FadeMix {
            outgoing: 1.0 - incoming,
            incoming,
            finished: progress >= 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_curve_increases_monotonically() {
        let curve = CrossfadeCurve::Linear;
        let mut last = 0.0;
        for step in 0..=10 {
            let sample = curve.sample(step as f32 / 10.0);
            assert!(sample >= last - f32::EPSILON);
            last = sample;
        }
    }

    #[test]
    fn smoothstep_hits_endpoints_and_midpoint() {
        let curve = CrossfadeCurve::Smoothstep;
        assert!(curve.sample(0.0).abs() < 1e-6);
        assert!((curve.sample(0.5) - 0.5).abs() < 1e-6);
        assert!((curve.sample(1.0) - 1.0).abs() < 1e-6);
        assert!((curve.sample(4.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ease_in_out_accelerates_then_decelerates() {
        let curve = CrossfadeCurve::EaseInOut;
        assert!(curve.sample(0.25) < curve.sample(0.5));
        assert!(curve.sample(0.75) > curve.sample(0.5));
        assert!((curve.sample(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn envelope_reports_progress() {
        let start = Instant::now();
        let envelope =
            FadeEnvelope::new(Duration::from_millis(100), CrossfadeCurve::Linear, start).unwrap();
        let halfway = envelope.mix(start + Duration::from_millis(50));
        assert!((halfway.incoming - 0.5).abs() < 0.05);
        assert!((halfway.outgoing + halfway.incoming - 1.0).abs() < 1e-6);
        assert!(!halfway.finished);
        assert!(envelope.mix(start + Duration::from_millis(100)).finished);
    }

    #[test]
    fn zero_duration_has_no_envelope() {
        assert!(FadeEnvelope::new(Duration::ZERO, CrossfadeCurve::Linear, Instant::now()).is_none());
    }
}
