//! In-process request accounting
//!
//! Counts every inbound request and keeps a smoothed estimate of the recent
//! request rate using two fixed windows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Window duration used when none (or zero) is configured
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    start: Instant,
}

impl Window {
    fn starting_at(start: Instant) -> Self {
        Self { count: 0, start }
    }
}

#[derive(Debug)]
struct Windows {
    current: Window,
    previous: Window,
}

/// Snapshot of the request counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RequestStats {
    pub total: u64,
    pub current_rate: f64,
}

/// Process-wide request counter
///
/// The lifetime total is a lock-free atomic. The current/previous window pair
/// sits behind one lock shared by increments, reads and rotation.
#[derive(Debug)]
pub struct RequestCounter {
    total: AtomicU64,
    windows: RwLock<Windows>,
    window: Duration,
}

impl RequestCounter {
    /// Create a counter rotating every `window`; zero falls back to 60 seconds
    pub fn new(window: Duration) -> Self {
        let window = if window.is_zero() {
            DEFAULT_WINDOW
        } else {
            window
        };
        let now = Instant::now();

        Self {
            total: AtomicU64::new(0),
            windows: RwLock::new(Windows {
                current: Window::starting_at(now),
                previous: Window::starting_at(now),
            }),
            window,
        }
    }

    /// Create a counter from a window length in seconds
    pub fn with_window_seconds(seconds: u64) -> Self {
        Self::new(Duration::from_secs(seconds))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record one request
    pub fn increment(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.windows.write().current.count += 1;
    }

    /// Requests observed since the counter was created
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Requests per second, blended with the previous window while the
    /// current one is younger than the window duration
    pub fn current_rate(&self) -> f64 {
        let windows = self.windows.read();
        blended_rate(&windows, Instant::now(), self.window)
    }

    /// Both counters in one snapshot
    pub fn stats(&self) -> RequestStats {
        RequestStats {
            total: self.total(),
            current_rate: self.current_rate(),
        }
    }

    /// Retire the current window into `previous` and start an empty one
    pub fn rotate(&self) {
        let now = Instant::now();
        let mut windows = self.windows.write();
        windows.previous = windows.current;
        windows.current = Window::starting_at(now);
    }

    /// Spawn the background task rotating windows once per window duration.
    ///
    /// The task runs until [`RotationHandle::stop`] is called or the handle
    /// is dropped.
    pub fn spawn_rotation(self: &Arc<Self>) -> RotationHandle {
        let counter = Arc::clone(self);
        let period = self.window;
        let first_tick = Instant::now() + period;
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        counter.rotate();
                        debug!(total = counter.total(), "Rotated request window");
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            debug!("Request window rotation stopped");
        });

        info!(window_secs = period.as_secs(), "Request window rotation started");

        RotationHandle { shutdown, task }
    }
}

impl Default for RequestCounter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

fn blended_rate(windows: &Windows, now: Instant, window: Duration) -> f64 {
    let duration = window.as_secs_f64();
    let elapsed = now
        .saturating_duration_since(windows.current.start)
        .as_secs_f64()
        .max(1.0);

    let rate_now = windows.current.count as f64 / elapsed;

    if elapsed >= duration {
        return rate_now;
    }

    let previous_weight = (duration - elapsed) / duration;
    let previous_rate = windows.previous.count as f64 / duration;

    rate_now * (1.0 - previous_weight) + previous_rate * previous_weight
}

/// Handle to the window rotation task
#[derive(Debug)]
pub struct RotationHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RotationHandle {
    /// Signal the rotation task to stop and wait for it to finish
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_counts(counter: &RequestCounter) -> (u64, u64) {
        let windows = counter.windows.read();
        (windows.current.count, windows.previous.count)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_zero_window_defaults_to_sixty_seconds() {
        assert_eq!(RequestCounter::new(Duration::ZERO).window(), DEFAULT_WINDOW);
        assert_eq!(RequestCounter::with_window_seconds(0).window(), DEFAULT_WINDOW);
        assert_eq!(
            RequestCounter::with_window_seconds(5).window(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_new_counter_is_empty() {
        let counter = RequestCounter::default();

        assert_eq!(counter.total(), 0);
        assert_eq!(counter.current_rate(), 0.0);
        assert_eq!(
            counter.stats(),
            RequestStats {
                total: 0,
                current_rate: 0.0
            }
        );
    }

    #[test]
    fn test_increment_counts_total_and_window() {
        let counter = RequestCounter::default();

        for _ in 0..10 {
            counter.increment();
        }

        assert_eq!(counter.total(), 10);
        assert_eq!(window_counts(&counter), (10, 0));
        assert!(counter.current_rate() > 0.0);
    }

    #[test]
    fn test_concurrent_increments_from_threads() {
        let counter = Arc::new(RequestCounter::default());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.increment();
                    }
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(counter.total(), 8000);
        assert_eq!(window_counts(&counter).0, 8000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_from_tasks() {
        let counter = Arc::new(RequestCounter::default());
        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    for _ in 0..100 {
                        counter.increment();
                        assert!(counter.current_rate() >= 0.0);
                    }
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(counter.total(), 5000);
    }

    #[test]
    fn test_rotate_moves_current_into_previous() {
        let counter = RequestCounter::default();

        for _ in 0..30 {
            counter.increment();
        }
        counter.rotate();

        assert_eq!(window_counts(&counter), (0, 30));
        assert_eq!(counter.total(), 30);
        assert!(counter.current_rate() > 0.0);

        counter.rotate();
        assert_eq!(window_counts(&counter), (0, 0));
        assert_eq!(counter.current_rate(), 0.0);
        assert_eq!(counter.total(), 30);
    }

    #[test]
    fn test_blended_rate_formula() {
        let start = Instant::now();
        let window = Duration::from_secs(60);
        let windows = Windows {
            current: Window { count: 30, start },
            previous: Window { count: 120, start },
        };

        // Floor at one second for a brand-new window
        let rate = blended_rate(&windows, start, window);
        assert_close(rate, 30.0 * (1.0 / 60.0) + 2.0 * (59.0 / 60.0));

        // Half way through: equal weights
        let rate = blended_rate(&windows, start + Duration::from_secs(30), window);
        assert_close(rate, 1.0 * 0.5 + 2.0 * 0.5);

        // Past the window: previous no longer contributes
        let rate = blended_rate(&windows, start + Duration::from_secs(90), window);
        assert_close(rate, 30.0 / 90.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_without_rotation_after_full_window() {
        let counter = RequestCounter::new(Duration::from_secs(60));

        for _ in 0..120 {
            counter.increment();
        }

        time::advance(Duration::from_secs(120)).await;

        assert_close(counter.current_rate(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_rotation() {
        let counter = Arc::new(RequestCounter::new(Duration::from_secs(60)));
        let handle = counter.spawn_rotation();

        for _ in 0..120 {
            counter.increment();
        }

        time::sleep(Duration::from_secs(61)).await;

        assert_eq!(window_counts(&counter), (0, 120));
        assert_eq!(counter.total(), 120);
        assert_close(counter.current_rate(), 2.0 * (59.0 / 60.0));

        counter.increment();
        assert_eq!(window_counts(&counter), (1, 120));

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_rotation_no_longer_fires() {
        let counter = Arc::new(RequestCounter::new(Duration::from_secs(10)));
        let handle = counter.spawn_rotation();
        handle.stop().await;

        for _ in 0..5 {
            counter.increment();
        }

        time::sleep(Duration::from_secs(35)).await;

        assert_eq!(window_counts(&counter), (5, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_counters() {
        let a = RequestCounter::new(Duration::from_secs(60));
        let b = RequestCounter::new(Duration::from_secs(60));

        a.increment();
        a.increment();
        b.increment();

        assert_eq!(a.total(), 2);
        assert_eq!(b.total(), 1);
    }
}
