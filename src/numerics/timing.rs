#![allow(unused)]
use std::cell::RefCell;
use std::time::Duration;

/// Wall-clock breakdown of one run, collected only with the `timing` feature.
#[derive(Default, Clone)]
pub struct TimingStats {
    pub assembly_time: Duration,
    pub operator_time: Duration,
    pub step_times: Vec<Duration>,
    pub total_time: Duration,
}

impl TimingStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "timing")]
    pub fn print_summary(&self) {
        let stepping: Duration = self.step_times.iter().sum();
        let accounted = self.assembly_time + self.operator_time + stepping;
        let overhead = self.total_time.saturating_sub(accounted);
        let avg_step_ms = if self.step_times.is_empty() {
            0.0
        } else {
            stepping.as_secs_f64() * 1000.0 / self.step_times.len() as f64
        };

        println!("\n{}", "=".repeat(60));
        println!("{:^60}", "GFD RUN TIMING SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "Total run time:                {:.3}s",
            self.total_time.as_secs_f64()
        );
        println!("{}", "-".repeat(60));
        println!(
            "  Stencil assembly:          {:>9.3}ms",
            self.assembly_time.as_secs_f64() * 1000.0
        );
        println!(
            "  Evolution operator:        {:>9.3}ms",
            self.operator_time.as_secs_f64() * 1000.0
        );
        println!(
            "  Time stepping:             {:>9.3}ms  (avg: {:>9.4}ms)",
            stepping.as_secs_f64() * 1000.0,
            avg_step_ms
        );
        println!("{}", "=".repeat(60));
        println!(
            "Overhead/Other:                {:>9.3}ms",
            overhead.as_secs_f64() * 1000.0
        );
        println!("Steps:                         {}\n", self.step_times.len());
    }

    #[cfg(not(feature = "timing"))]
    pub fn print_summary(&self) {}
}

#[cfg(feature = "timing")]
thread_local! {
    static TIMING_STATS: RefCell<TimingStats> = RefCell::new(TimingStats::new());
}

#[cfg(feature = "timing")]
fn timed<F, R>(f: F, store: impl FnOnce(&mut TimingStats, Duration)) -> R
where
    F: FnOnce() -> R,
{
    let start = std::time::Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    TIMING_STATS.with(|stats| store(&mut stats.borrow_mut(), elapsed));
    result
}

#[cfg(feature = "timing")]
pub fn reset_timing() {
    TIMING_STATS.with(|stats| {
        *stats.borrow_mut() = TimingStats::new();
    });
}

#[cfg(not(feature = "timing"))]
pub fn reset_timing() {}

#[cfg(feature = "timing")]
pub fn record_assembly<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    timed(f, |s, d| s.assembly_time += d)
}

#[cfg(not(feature = "timing"))]
pub fn record_assembly<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn record_operator<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    timed(f, |s, d| s.operator_time += d)
}

#[cfg(not(feature = "timing"))]
pub fn record_operator<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn record_step<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    timed(f, |s, d| s.step_times.push(d))
}

#[cfg(not(feature = "timing"))]
pub fn record_step<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn finalize_timing(total_time: Duration) -> TimingStats {
    TIMING_STATS.with(|stats| {
        let mut s = stats.borrow_mut();
        s.total_time = total_time;
        s.clone()
    })
}

#[cfg(not(feature = "timing"))]
pub fn finalize_timing(_total_time: Duration) -> TimingStats {
    TimingStats::new()
}

#[cfg(feature = "timing")]
pub fn finalize_and_print(total_time: Duration) {
    finalize_timing(total_time).print_summary();
}

#[cfg(not(feature = "timing"))]
pub fn finalize_and_print(_total_time: Duration) {}
