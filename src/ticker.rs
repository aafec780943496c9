//! Background volume ticker. Re-resolves the scheduled volume on an interval
//! so gradients ramp and hourly slots take effect without operator input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Default seconds between ticks.
pub const TICK_INTERVAL_SECS: u64 = 10;

/// Handle to the ticker thread. `stop()` joins; dropping stops.
pub struct VolumeTicker {
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl VolumeTicker {
    /// Spawn the ticker. `on_tick` is called once per interval; a panicking
    /// tick is caught and the loop keeps going.
    pub fn spawn<F>(interval: Duration, on_tick: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let running_flag = running.clone();

        let handle = thread::spawn(move || {
            while running_flag.load(Ordering::Relaxed) {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    on_tick();
                }));
                if result.is_err() {
                    eprintln!("[VolumeTicker] Error in tick, continuing");
                }

                // Sleep in short slices so stop() returns promptly.
                let mut remaining = interval;
                while running_flag.load(Ordering::Relaxed) && remaining > Duration::ZERO {
                    let slice = remaining.min(Duration::from_millis(250));
                    thread::sleep(slice);
                    remaining = remaining.saturating_sub(slice);
                }
            }
        });

        VolumeTicker {
            running,
            thread_handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the ticker and wait for the thread to finish.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for VolumeTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn ticker_calls_back_and_stops() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let mut ticker = VolumeTicker::spawn(Duration::from_millis(10), move || {
            count_clone.fetch_add(1, Ordering::Relaxed);
        });
        assert!(ticker.is_running());

        thread::sleep(Duration::from_millis(60));
        ticker.stop();
        assert!(!ticker.is_running());
        assert!(count.load(Ordering::Relaxed) >= 2);
    }

    #[test]
    fn panicking_tick_does_not_kill_loop() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let mut ticker = VolumeTicker::spawn(Duration::from_millis(5), move || {
            let n = count_clone.fetch_add(1, Ordering::Relaxed);
            if n == 0 {
                panic!("first tick blows up");
            }
        });
        thread::sleep(Duration::from_millis(50));
        ticker.stop();
        assert!(count.load(Ordering::Relaxed) >= 2);
    }
}
