use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadSettings {
    /// Wait before the first deferred asset is warmed.
    pub delay: Duration,
    /// Extra offset added per deferred asset.
    pub stagger: Duration,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(400),
            stagger: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadTask {
    /// Position of the asset in the catalog.
    pub position: usize,
    pub url: String,
    pub due: Instant,
}

/// Plans cache warms for a catalog: the hero asset right away, the rest on a
/// staggered schedule so they do not compete with the hero download.
///
/// Pending warms live in a list owned by the scheduler rather than in detached
/// timers, so a shutdown mid-preload can drop them with [`cancel`].
///
/// [`cancel`]: PreloadScheduler::cancel
#[derive(Debug)]
pub struct PreloadScheduler {
    urls: Vec<String>,
    settings: PreloadSettings,
    queued: bool,
    pending: VecDeque<PreloadTask>,
}

impl PreloadScheduler {
    pub fn new(urls: Vec<String>, settings: PreloadSettings) -> Self {
        Self {
            urls,
            settings,
            queued: false,
            pending: VecDeque::new(),
        }
    }

    pub fn hero(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }

    /// Queues the deferred pass. Only the first call with something to load
    /// does any work; later calls return `false`.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.queued || self.urls.len() <= 1 {
            return false;
        }
        self.queued = true;

        let base = now + self.settings.delay;
        for (offset, url) in self.urls.iter().skip(1).enumerate() {
            let due = base + self.settings.stagger * offset as u32;
            self.pending.push_back(PreloadTask {
                position: offset + 1,
                url: url.clone(),
                due,
            });
        }
        tracing::debug!(
            deferred = self.pending.len(),
            delay_ms = self.settings.delay.as_millis() as u64,
            stagger_ms = self.settings.stagger.as_millis() as u64,
            "queued deferred asset preloads"
        );
        true
    }

    pub fn is_queued(&self) -> bool {
        self.queued
    }

    /// Removes and returns every task whose deadline has passed.
    pub fn due(&mut self, now: Instant) -> Vec<PreloadTask> {
        let mut ready = Vec::new();
        while let Some(task) = self.pending.front() {
            if task.due > now {
                break;
            }
            if let Some(task) = self.pending.pop_front() {
                ready.push(task);
            }
        }
        ready
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.front().map(|task| task.due)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drops every warm that has not fired yet.
    pub fn cancel(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        if cancelled > 0 {
            tracing::debug!(cancelled, "cancelled pending asset preloads");
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(count: usize) -> Vec<String> {
        (0..count).map(|n| format!("model{n}.glb")).collect()
    }

    #[test]
    fn hero_is_first_url() {
        let scheduler = PreloadScheduler::new(urls(3), PreloadSettings::default());
        assert_eq!(scheduler.hero(), Some("model0.glb"));
        assert_eq!(PreloadScheduler::new(Vec::new(), PreloadSettings::default()).hero(), None);
    }

    #[test]
    fn staggers_remaining_assets() {
        let now = Instant::now();
        let mut scheduler = PreloadScheduler::new(urls(4), PreloadSettings::default());
        assert!(scheduler.start(now));
        assert_eq!(scheduler.pending(), 3);

        assert!(scheduler.due(now + Duration::from_millis(399)).is_empty());
        let first = scheduler.due(now + Duration::from_millis(400));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].url, "model1.glb");
        assert_eq!(first[0].position, 1);

        assert_eq!(
            scheduler.next_deadline(),
            Some(now + Duration::from_millis(600))
        );
        let rest = scheduler.due(now + Duration::from_millis(800));
        let positions: Vec<_> = rest.iter().map(|task| task.position).collect();
        assert_eq!(positions, vec![2, 3]);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn second_start_is_a_no_op() {
        let now = Instant::now();
        let mut scheduler = PreloadScheduler::new(urls(3), PreloadSettings::default());
        assert!(scheduler.start(now));
        assert!(!scheduler.start(now + Duration::from_millis(10)));
        assert_eq!(scheduler.pending(), 2);

        scheduler.due(now + Duration::from_secs(5));
        assert!(!scheduler.start(now + Duration::from_secs(6)));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn single_asset_has_nothing_to_defer() {
        let mut scheduler = PreloadScheduler::new(urls(1), PreloadSettings::default());
        assert!(!scheduler.start(Instant::now()));
        assert!(!scheduler.is_queued());
    }

    #[test]
    fn cancel_drops_pending_tasks() {
        let now = Instant::now();
        let mut scheduler = PreloadScheduler::new(urls(5), PreloadSettings::default());
        scheduler.start(now);
        scheduler.due(now + Duration::from_millis(400));
        assert_eq!(scheduler.cancel(), 3);
        assert!(scheduler.due(now + Duration::from_secs(10)).is_empty());
        assert_eq!(scheduler.next_deadline(), None);
    }
}
