use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::{ControlError, MetricError, ProviderError};
use crate::process::{Pid, ProcessSnapshot};
use crate::provider::ProcessInfoProvider;

pub mod context;
pub mod cpu;
pub mod monitoring;
pub mod operations;

use context::SystemContext;
use monitoring::Processes;
use operations::{Priority, ProcessController};

/// Entry point for listing, metrics and control commands.
///
/// Holds no process state between calls: every method reads fresh from the
/// provider or issues one command through the controller.
#[derive(Debug)]
pub struct Manager<P, C> {
    provider: P,
    controller: C,
}

impl<P: ProcessInfoProvider, C: ProcessController> Manager<P, C> {
    pub fn new(provider: P, controller: C) -> Self {
        Manager {
            provider,
            controller,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Lazy walk of the live process set, without CPU utilization attached.
    pub fn processes(&self) -> Result<Processes<'_, P>, ProviderError> {
        monitoring::processes(&self.provider)
    }

    /// All readable processes, ordered by PID.
    pub fn list(&self) -> Result<Vec<ProcessSnapshot>, ProviderError> {
        let mut snapshots: Vec<_> = self.processes()?.collect();
        snapshots.sort_by_key(|s| s.pid());
        Ok(snapshots)
    }

    /// Like `list`, with average CPU utilization attached to every row.
    ///
    /// The host context is read once so all rows share one uptime and core
    /// count. If it cannot be read, rows come back without CPU values. A row
    /// whose own tick record fails is dropped like any other unreadable row.
    pub fn list_with_cpu(&self) -> Result<Vec<ProcessSnapshot>, ProviderError> {
        let snapshots = self.list()?;
        let ctx = match SystemContext::read(&self.provider) {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("CPU utilization unavailable for this listing: {e}");
                return Ok(snapshots);
            }
        };

        Ok(snapshots
            .into_iter()
            .filter_map(|snap| {
                let pid = snap.pid();
                let pct = monitoring::read_cpu_ticks(&self.provider, pid)
                    .map_err(MetricError::from)
                    .and_then(|ticks| cpu::average_utilization(ticks, &ctx));
                match pct {
                    Ok(pct) => Some(snap.with_cpu_percent(pct)),
                    Err(e) if e.is_absent() => {
                        debug!("PID {pid} exited during CPU listing: {e}");
                        None
                    }
                    Err(e) => {
                        warn!("Dropping PID {pid} from CPU listing: {e}");
                        None
                    }
                }
            })
            .collect())
    }

    /// Average utilization of `pid` since boot; see `cpu::average_utilization`.
    pub fn cpu_usage(&self, pid: Pid) -> Result<f64, MetricError> {
        let ticks = monitoring::read_cpu_ticks(&self.provider, pid)?;
        let ctx = SystemContext::read(&self.provider)?;
        cpu::average_utilization(ticks, &ctx)
    }

    /// Utilization of `pid` over a `window` it blocks for.
    pub fn cpu_usage_over(&self, pid: Pid, window: Duration) -> Result<f64, MetricError> {
        let earlier = monitoring::read_cpu_ticks(&self.provider, pid)?;
        let started = Instant::now();
        thread::sleep(window);
        let later = monitoring::read_cpu_ticks(&self.provider, pid)?;
        let elapsed = started.elapsed();

        let ctx = SystemContext::read(&self.provider)?;
        cpu::interval_utilization(earlier, later, elapsed, &ctx)
    }

    pub fn num_cpus(&self) -> Result<usize, MetricError> {
        match context::read_num_logical_cores(&self.provider)? {
            0 => Err(MetricError::NoCores),
            n => Ok(n),
        }
    }

    pub fn kill(&self, pid: Pid) -> Result<(), ControlError> {
        let result = self.controller.terminate(pid);
        match &result {
            Ok(()) => info!("Sent SIGKILL to PID {pid}"),
            Err(e) => warn!("Failed to kill PID {pid}: {e}"),
        }
        result
    }

    /// Validates `nice_value` before anything reaches the OS.
    pub fn set_priority(&self, pid: Pid, nice_value: i32) -> Result<(), ControlError> {
        let result = Priority::new(nice_value)
            .and_then(|priority| self.controller.set_priority(pid, priority));
        match &result {
            Ok(()) => info!("Set priority of PID {pid} to {nice_value}"),
            Err(e) => warn!("Failed to set priority of PID {pid}: {e}"),
        }
        result
    }

    pub fn get_priority(&self, pid: Pid) -> Result<Priority, ControlError> {
        self.controller.get_priority(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Record;
    use crate::testing::{FakeController, FakeProcess, FakeProvider};

    fn pid(raw: u32) -> Pid {
        Pid::new(raw).unwrap()
    }

    fn manager(provider: FakeProvider) -> Manager<FakeProvider, FakeController> {
        Manager::new(provider, FakeController::new().with_process(1, 0).with_protected(2))
    }

    #[test]
    fn list_is_sorted_by_pid() {
        let man = manager(
            FakeProvider::new()
                .with_process(FakeProcess::new(300, "c"))
                .with_process(FakeProcess::new(5, "a"))
                .with_process(FakeProcess::new(40, "b")),
        );
        let pids: Vec<u32> = man.list().unwrap().iter().map(|s| s.pid().as_u32()).collect();
        assert_eq!(pids, vec![5, 40, 300]);
    }

    #[test]
    fn cpu_usage_uses_fresh_context() {
        // 150 ticks at 100 Hz over 10 s on 1 core
        let man = manager(
            FakeProvider::new()
                .with_process(FakeProcess::new(7, "busy").ticks(100, 50))
                .with_uptime("10.00 1.00\n")
                .with_cpuinfo("processor : 0\n"),
        );
        let pct = man.cpu_usage(pid(7)).unwrap();
        assert!((pct - 15.0).abs() < 1e-9);
    }

    #[test]
    fn cpu_usage_unavailable_without_host_context() {
        let man = manager(
            FakeProvider::new()
                .with_process(FakeProcess::new(7, "busy").ticks(100, 50))
                .without_cpuinfo(),
        );
        assert!(man.cpu_usage(pid(7)).is_err());

        let man = manager(
            FakeProvider::new()
                .with_process(FakeProcess::new(7, "busy").ticks(100, 50))
                .with_uptime("0 0\n"),
        );
        assert!(matches!(man.cpu_usage(pid(7)), Err(MetricError::NonPositiveUptime(_))));
    }

    #[test]
    fn cpu_usage_of_missing_process_fails() {
        let man = manager(FakeProvider::new());
        assert!(man.cpu_usage(pid(99)).is_err());
    }

    #[test]
    fn cpu_listing_attaches_values() {
        let man = manager(
            FakeProvider::new()
                .with_process(FakeProcess::new(1, "init").ticks(200, 0))
                .with_process(FakeProcess::new(2, "nostat").missing(Record::Stat)),
        );
        let rows = man.list_with_cpu().unwrap();
        assert_eq!(rows.len(), 1);
        // 2 s of CPU over 100 s on 2 cores
        let pct = rows[0].cpu_percent().unwrap();
        assert!((pct - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cpu_listing_drops_malformed_and_denied_stat_rows() {
        let man = manager(
            FakeProvider::new()
                .with_process(FakeProcess::new(1, "init").ticks(200, 0))
                .with_process(FakeProcess::new(2, "locked").denied(Record::Stat))
                .with_process(FakeProcess::new(3, "short").stat("3 (short) S 1")),
        );
        let pids: Vec<u32> = man
            .list_with_cpu()
            .unwrap()
            .iter()
            .map(|s| s.pid().as_u32())
            .collect();
        assert_eq!(pids, vec![1]);
    }

    #[test]
    fn cpu_listing_keeps_rows_when_context_fails() {
        let man = manager(
            FakeProvider::new()
                .with_process(FakeProcess::new(1, "init"))
                .without_uptime(),
        );
        let rows = man.list_with_cpu().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cpu_percent(), None);
    }

    #[test]
    fn interval_usage_of_idle_process_is_zero() {
        let man = manager(FakeProvider::new().with_process(FakeProcess::new(3, "idle").ticks(5, 5)));
        let pct = man.cpu_usage_over(pid(3), Duration::from_millis(5)).unwrap();
        assert_eq!(pct, 0.0);
    }

    #[test]
    fn num_cpus_rejects_zero() {
        let man = manager(FakeProvider::new().with_cpuinfo(""));
        assert!(matches!(man.num_cpus(), Err(MetricError::NoCores)));
        let man = manager(FakeProvider::new());
        assert_eq!(man.num_cpus().unwrap(), 2);
    }

    #[test]
    fn kill_reports_typed_failures() {
        let man = manager(FakeProvider::new());
        assert_eq!(man.kill(pid(99)), Err(ControlError::NotFound(pid(99))));
        assert_eq!(man.kill(pid(2)), Err(ControlError::PermissionDenied(pid(2))));
        assert_eq!(man.kill(pid(1)), Ok(()));
        assert_eq!(man.controller().terminated(), vec![pid(1)]);
    }

    #[test]
    fn priority_round_trip_and_range_check() {
        let man = manager(FakeProvider::new());
        man.set_priority(pid(1), 10).unwrap();
        assert_eq!(man.get_priority(pid(1)).unwrap().value(), 10);

        assert_eq!(man.set_priority(pid(1), 25), Err(ControlError::InvalidPriority(25)));
        assert_eq!(man.get_priority(pid(1)).unwrap().value(), 10);

        assert_eq!(
            man.set_priority(pid(2), 5),
            Err(ControlError::PermissionDenied(pid(2)))
        );
        assert_eq!(man.get_priority(pid(42)), Err(ControlError::NotFound(pid(42))));
    }
}
