use std::collections::VecDeque;
use std::time::{Duration, Instant};

const DEFAULT_MAX_SAMPLES: usize = 1000;

/// Monotonic time source with frame bookkeeping.
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration);
    fn record_frame(&mut self, d: Duration);
    fn frame_count(&self) -> usize;
    fn timing_stats(&self) -> TimingStats;
}

/// Frame-time statistics over the recorded sample window.
#[derive(Debug, Clone, Default)]
pub struct TimingStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    start: Instant,
    frame_times: VecDeque<Duration>,
    max_samples: usize,
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self::with_max_samples(DEFAULT_MAX_SAMPLES)
    }

    pub fn with_max_samples(max_samples: usize) -> Self {
        Self {
            start: Instant::now(),
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(target_os = "windows")]
        self.windows_sleep(duration);
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(target_os = "macos")]
        self.macos_sleep(duration);
        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "windows")]
    fn windows_sleep(&self, duration: Duration) {
        use windows::Win32::Foundation::{CloseHandle, BOOL};
        use windows::Win32::System::Threading::{
            CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject, INFINITE,
        };

        unsafe {
            let Ok(timer) = CreateWaitableTimerW(None, BOOL::from(true), None) else {
                std::thread::sleep(duration);
                return;
            };

            // Negative due time = relative, in 100 ns intervals.
            let due_time = -(duration.as_nanos() as i64 / 100);
            if SetWaitableTimer(timer, &due_time, 0, None, None, BOOL::from(false)).is_ok() {
                WaitForSingleObject(timer, INFINITE);
            } else {
                std::thread::sleep(duration);
            }

            let _ = CloseHandle(timer);
        }
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    #[cfg(target_os = "macos")]
    fn macos_sleep(&self, duration: Duration) {
        use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

        // Spin only for sub-100 us waits; the scheduler is fine above that.
        if duration.as_nanos() < 100_000 {
            unsafe {
                let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
                mach_timebase_info(&mut timebase);
                let start = mach_absolute_time();
                let target_ticks =
                    duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;
                while mach_absolute_time() - start < target_ticks {
                    std::hint::spin_loop();
                }
            }
        } else {
            std::thread::sleep(duration);
        }
    }
}

impl Timer for HighPrecisionTimer {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }

    fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(d);
    }

    fn frame_count(&self) -> usize {
        self.frame_times.len()
    }

    fn timing_stats(&self) -> TimingStats {
        if self.frame_times.is_empty() {
            return TimingStats::default();
        }
        let times: Vec<f64> = self
            .frame_times
            .iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        let sum: f64 = times.iter().sum();
        let avg = sum / times.len() as f64;
        let var = times.iter().map(|t| (t - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        TimingStats {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_monotonic() {
        let timer = HighPrecisionTimer::new();
        let first = timer.now();
        let second = timer.now();
        assert!(second >= first);
    }

    #[test]
    fn stats_over_known_samples() {
        let mut timer = HighPrecisionTimer::new();
        timer.record_frame(Duration::from_millis(10));
        timer.record_frame(Duration::from_millis(20));
        let stats = timer.timing_stats();
        assert_eq!(stats.average_frame_time_ns, 15e6);
        assert_eq!(stats.jitter_ns, 5e6);
        assert_eq!(stats.min_frame_time_ns, 10e6);
        assert_eq!(stats.max_frame_time_ns, 20e6);
        assert!((stats.effective_fps - 1000.0 / 15.0).abs() < 1e-6);
    }

    #[test]
    fn empty_sample_window_yields_zeroed_stats() {
        let timer = HighPrecisionTimer::new();
        let stats = timer.timing_stats();
        assert_eq!(stats.average_frame_time_ns, 0.0);
        assert_eq!(stats.effective_fps, 0.0);
    }

    #[test]
    fn sample_window_is_bounded() {
        let mut timer = HighPrecisionTimer::with_max_samples(4);
        for ms in 1..=10 {
            timer.record_frame(Duration::from_millis(ms));
        }
        assert_eq!(timer.frame_count(), 4);
        // Only the newest four samples remain.
        assert_eq!(timer.timing_stats().min_frame_time_ns, 7e6);
    }

    #[test]
    fn sleep_waits_at_least_most_of_the_request() {
        let timer = HighPrecisionTimer::new();
        let before = Instant::now();
        timer.sleep(Duration::from_millis(5));
        assert!(before.elapsed() >= Duration::from_millis(4));
    }
}
