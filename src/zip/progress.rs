//! Progress reporting while local headers are scanned.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum time between two progress callbacks
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(20);

/// Progress of archive initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Position of the scan within the archive, 0..=100
    pub percent: u32,
}

/// Callback receiving [`Progress`] updates during `init`
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Wall-clock gate that opens at most once per interval.
pub struct Throttle {
    interval: Duration,
    last: Instant,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    /// True when at least one interval passed since the last time this
    /// returned true (or since creation).
    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Throttled, de-duplicated percentage reporter.
///
/// Without a callback nothing is allocated and every call is a no-op.
pub(crate) struct ProgressReporter<'c> {
    active: Option<(&'c ProgressCallback, Throttle)>,
    total: u64,
    last: u32,
}

impl<'c> ProgressReporter<'c> {
    pub fn new(callback: Option<&'c ProgressCallback>, total: u64) -> Self {
        Self::with_interval(callback, total, PROGRESS_INTERVAL)
    }

    pub fn with_interval(
        callback: Option<&'c ProgressCallback>,
        total: u64,
        interval: Duration,
    ) -> Self {
        Self {
            active: callback.map(|cb| (cb, Throttle::new(interval))),
            total,
            last: 0,
        }
    }

    /// Report the scan position, subject to throttling.
    pub fn tick(&mut self, offset: u64) {
        let Some((callback, throttle)) = self.active.as_mut() else {
            return;
        };
        if !throttle.ready() {
            return;
        }
        let percent = percent(offset, self.total);
        if percent == self.last {
            return;
        }
        callback(Progress { percent });
        self.last = percent;
    }

    /// Report the terminal position unconditionally.
    pub fn finish(self, offset: u64) {
        if let Some((callback, _)) = self.active {
            callback(Progress {
                percent: percent(offset, self.total),
            });
        }
    }
}

impl fmt::Debug for ProgressReporter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("active", &self.active.is_some())
            .field("total", &self.total)
            .field("last", &self.last)
            .finish()
    }
}

fn percent(offset: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (offset as u128 * 100 / total as u128) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<u32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback = Arc::new(move |p: Progress| {
            sink.lock().unwrap().push(p.percent);
        });
        (callback, seen)
    }

    #[test]
    fn test_percent_floor() {
        assert_eq!(percent(0, 200), 0);
        assert_eq!(percent(199, 200), 99);
        assert_eq!(percent(200, 200), 100);
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn test_suppresses_repeated_percentages() {
        let (callback, seen) = recorder();
        let mut reporter = ProgressReporter::with_interval(Some(&callback), 1000, Duration::ZERO);
        for offset in [0, 5, 10, 15, 500, 501, 990] {
            reporter.tick(offset);
        }
        reporter.finish(990);

        assert_eq!(*seen.lock().unwrap(), vec![1, 50, 99, 99]);
    }

    #[test]
    fn test_throttle_suppresses_fast_updates() {
        let (callback, seen) = recorder();
        let mut reporter =
            ProgressReporter::with_interval(Some(&callback), 100, Duration::from_secs(3600));
        for offset in 0..100 {
            reporter.tick(offset);
        }
        reporter.finish(100);

        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }

    #[test]
    fn test_without_callback() {
        let mut reporter = ProgressReporter::new(None, 100);
        reporter.tick(50);
        assert!(reporter.active.is_none());
        reporter.finish(100);
    }

    #[test]
    fn test_throttle_interval() {
        let mut throttle = Throttle::new(Duration::ZERO);
        assert!(throttle.ready());
        let mut throttle = Throttle::new(Duration::from_secs(3600));
        assert!(!throttle.ready());
    }
}
