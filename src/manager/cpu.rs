use std::time::Duration;

use crate::error::MetricError;
use crate::manager::context::SystemContext;
use crate::process::record::CpuTicks;

/// Average CPU utilization of a process over the host's uptime, in percent of
/// one core per core (`100 * cores` at most).
///
/// `((user + system) / hz) / (uptime * cores) * 100`
///
/// This is not a live rate: there is no previous sample, so a long-lived
/// process that is idle now still reports whatever it burned earlier, and the
/// value drifts toward zero as uptime grows. See `interval_utilization` for a
/// rate over a measured window.
pub fn average_utilization(ticks: CpuTicks, ctx: &SystemContext) -> Result<f64, MetricError> {
    ctx.validate()?;

    let cpu_seconds = ticks.total() as f64 / ctx.clock_ticks_per_second as f64;
    let percent = cpu_seconds / (ctx.uptime_seconds * ctx.num_logical_cores as f64) * 100.0;
    finite(percent)
}

/// CPU utilization between two tick samples of the same process taken
/// `elapsed` apart, normalized by core count.
pub fn interval_utilization(
    earlier: CpuTicks,
    later: CpuTicks,
    elapsed: Duration,
    ctx: &SystemContext,
) -> Result<f64, MetricError> {
    ctx.validate()?;
    if elapsed.is_zero() {
        return Err(MetricError::ZeroInterval);
    }

    // Tick counters never go backwards unless the PID was reused in between
    let delta = later.total().saturating_sub(earlier.total());
    let cpu_seconds = delta as f64 / ctx.clock_ticks_per_second as f64;
    let percent = (cpu_seconds / elapsed.as_secs_f64()) * 100.0 / ctx.num_logical_cores as f64;
    finite(percent)
}

fn finite(percent: f64) -> Result<f64, MetricError> {
    if percent.is_finite() && percent >= 0.0 {
        Ok(percent)
    } else {
        Err(MetricError::NotFinite(percent))
    }
}
