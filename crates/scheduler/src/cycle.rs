use std::time::{Duration, Instant};

use crate::SchedulerError;

pub const MIN_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_INTERVAL: Duration = Duration::from_secs(8);
pub const MIN_TRANSITION: Duration = Duration::from_millis(100);
pub const MAX_TRANSITION: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSettings {
    pub auto_cycle: bool,
    pub interval: Duration,
    pub transition: Duration,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            auto_cycle: true,
            interval: Duration::from_secs(3),
            transition: Duration::from_millis(500),
        }
    }
}

/// Walks an asset list on a timer.
///
/// The timer is a single deadline anchored at the last index change, toggle,
/// or interval change. Manual navigation re-anchors it, so a `next()` right
/// before the deadline does not get followed by an immediate automatic step.
#[derive(Debug, Clone)]
pub struct CycleController {
    count: usize,
    index: usize,
    auto_cycle: bool,
    interval: Duration,
    transition: Duration,
    anchor: Instant,
}

impl CycleController {
    pub fn new(count: usize, settings: CycleSettings, now: Instant) -> Result<Self, SchedulerError> {
        if count == 0 {
            return Err(SchedulerError::EmptyCycle);
        }
        let interval = clamp_interval(settings.interval);
        if interval != settings.interval {
            tracing::warn!(
                requested_ms = settings.interval.as_millis() as u64,
                clamped_ms = interval.as_millis() as u64,
                "cycle interval outside supported range; clamping"
            );
        }
        Ok(Self {
            count,
            index: 0,
            auto_cycle: settings.auto_cycle,
            interval,
            transition: clamp_transition(settings.transition),
            anchor: now,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn auto_cycle(&self) -> bool {
        self.auto_cycle
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn transition(&self) -> Duration {
        self.transition
    }

    /// When the automatic timer will next fire, if it is armed at all.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.auto_cycle && self.count > 1 {
            Some(self.anchor + self.interval)
        } else {
            None
        }
    }

    /// Re-anchors the timer without moving the selection.
    pub fn restart(&mut self, now: Instant) {
        self.anchor = now;
    }

    /// Fires the automatic timer if it is due. Returns the new index when the
    /// selection moved.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        let deadline = self.next_deadline()?;
        if now < deadline {
            return None;
        }
        self.index = (self.index + 1) % self.count;
        self.anchor = now;
        Some(self.index)
    }

    pub fn next(&mut self, now: Instant) -> usize {
        self.index = (self.index + 1) % self.count;
        self.anchor = now;
        self.index
    }

    pub fn previous(&mut self, now: Instant) -> usize {
        self.index = (self.index + self.count - 1) % self.count;
        self.anchor = now;
        self.index
    }

    /// Flips auto-cycling. The current index is left alone.
    pub fn toggle_auto_cycle(&mut self, now: Instant) -> bool {
        self.auto_cycle = !self.auto_cycle;
        self.anchor = now;
        self.auto_cycle
    }

    pub fn set_interval(&mut self, interval: Duration, now: Instant) -> Duration {
        self.interval = clamp_interval(interval);
        self.anchor = now;
        self.interval
    }

    pub fn set_transition(&mut self, transition: Duration) -> Duration {
        self.transition = clamp_transition(transition);
        self.transition
    }
}

fn clamp_interval(interval: Duration) -> Duration {
    interval.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

fn clamp_transition(transition: Duration) -> Duration {
    transition.clamp(MIN_TRANSITION, MAX_TRANSITION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(count: usize, now: Instant) -> CycleController {
        CycleController::new(count, CycleSettings::default(), now).unwrap()
    }

    #[test]
    fn rejects_empty_list() {
        let err = CycleController::new(0, CycleSettings::default(), Instant::now()).unwrap_err();
        assert_eq!(err, SchedulerError::EmptyCycle);
    }

    #[test]
    fn forward_cycle_returns_to_start() {
        let now = Instant::now();
        for count in 1..=6 {
            for start in 0..count {
                let mut cycle = controller(count, now);
                while cycle.index() != start {
                    cycle.next(now);
                }
                for _ in 0..count {
                    cycle.next(now);
                }
                assert_eq!(cycle.index(), start, "count={count} start={start}");
            }
        }
    }

    #[test]
    fn previous_from_zero_wraps_to_last() {
        let now = Instant::now();
        let mut cycle = controller(5, now);
        assert_eq!(cycle.previous(now), 4);
        assert_eq!(cycle.previous(now), 3);
    }

    #[test]
    fn toggling_keeps_index() {
        let now = Instant::now();
        let mut cycle = controller(4, now);
        cycle.next(now);
        cycle.next(now);
        assert!(!cycle.toggle_auto_cycle(now));
        assert_eq!(cycle.index(), 2);
        assert!(cycle.toggle_auto_cycle(now));
        assert_eq!(cycle.index(), 2);
    }

    #[test]
    fn timer_then_manual_next() {
        let start = Instant::now();
        let mut cycle = controller(3, start);
        assert_eq!(cycle.tick(start + Duration::from_millis(2999)), None);
        assert_eq!(cycle.tick(start + Duration::from_millis(3000)), Some(1));
        assert_eq!(cycle.next(start + Duration::from_millis(4200)), 2);
        assert_eq!(cycle.index(), 2);
    }

    #[test]
    fn manual_navigation_reschedules_timer() {
        let start = Instant::now();
        let mut cycle = controller(3, start);
        let late = start + Duration::from_millis(2900);
        cycle.next(late);
        assert_eq!(cycle.tick(start + Duration::from_millis(3100)), None);
        assert_eq!(cycle.next_deadline(), Some(late + Duration::from_secs(3)));
        assert_eq!(cycle.tick(late + Duration::from_secs(3)), Some(2));
    }

    #[test]
    fn paused_cycle_does_not_advance() {
        let start = Instant::now();
        let mut cycle = controller(3, start);
        cycle.toggle_auto_cycle(start);
        assert_eq!(cycle.next_deadline(), None);
        assert_eq!(cycle.tick(start + Duration::from_secs(60)), None);
        assert_eq!(cycle.next(start), 1);
    }

    #[test]
    fn single_asset_never_advances() {
        let start = Instant::now();
        let mut cycle = controller(1, start);
        assert_eq!(cycle.next_deadline(), None);
        assert_eq!(cycle.tick(start + Duration::from_secs(10)), None);
        assert_eq!(cycle.next(start), 0);
        assert_eq!(cycle.previous(start), 0);
    }

    #[test]
    fn interval_and_transition_are_clamped() {
        let start = Instant::now();
        let mut cycle = controller(3, start);
        assert_eq!(cycle.set_interval(Duration::from_millis(200), start), MIN_INTERVAL);
        assert_eq!(cycle.set_interval(Duration::from_secs(30), start), MAX_INTERVAL);
        assert_eq!(cycle.set_transition(Duration::ZERO), MIN_TRANSITION);
        assert_eq!(cycle.set_transition(Duration::from_secs(3)), MAX_TRANSITION);
    }

    #[test]
    fn changing_interval_restarts_timer() {
        let start = Instant::now();
        let mut cycle = controller(3, start);
        let later = start + Duration::from_secs(2);
        cycle.set_interval(Duration::from_secs(5), later);
        assert_eq!(cycle.tick(start + Duration::from_secs(6)), None);
        assert_eq!(cycle.tick(later + Duration::from_secs(5)), Some(1));
    }

    #[test]
    fn restart_reanchors_without_moving_selection() {
        let start = Instant::now();
        let mut cycle = controller(3, start);
        let ready = start + Duration::from_millis(1200);
        cycle.restart(ready);
        assert_eq!(cycle.index(), 0);
        assert_eq!(cycle.next_deadline(), Some(ready + Duration::from_secs(3)));
        assert_eq!(cycle.tick(start + Duration::from_secs(3)), None);
        assert_eq!(cycle.tick(ready + Duration::from_secs(3)), Some(1));
    }
}
