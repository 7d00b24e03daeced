use std::vec;

use log::{debug, warn};

use crate::error::{ProviderError, RecordError};
use crate::process::record::{self, CpuTicks};
use crate::process::{Pid, ProcessSnapshot};
use crate::provider::{NamespaceEntry, ProcessInfoProvider, Record};

/// Lazy walk over the provider's process namespace.
///
/// Each `next` reads one candidate's name, state and memory. Candidates that
/// fail any of the three are skipped, so the sequence only holds complete rows.
/// Order follows the namespace and is unspecified.
pub struct Processes<'a, P: ?Sized> {
    provider: &'a P,
    entries: vec::IntoIter<NamespaceEntry>,
    page_size: u64,
}

pub fn processes<P: ProcessInfoProvider + ?Sized>(
    provider: &P,
) -> Result<Processes<'_, P>, ProviderError> {
    let entries = provider.namespace_entries()?;
    Ok(Processes {
        provider,
        entries: entries.into_iter(),
        page_size: provider.page_size(),
    })
}

/// Namespace entries that name a process: directories whose name is all digits.
pub fn candidate_pid(entry: &NamespaceEntry) -> Option<Pid> {
    if !entry.is_dir || entry.name.is_empty() || !entry.name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    entry.name.parse().ok()
}

impl<P: ProcessInfoProvider + ?Sized> Iterator for Processes<'_, P> {
    type Item = ProcessSnapshot;

    fn next(&mut self) -> Option<ProcessSnapshot> {
        for entry in self.entries.by_ref() {
            let Some(pid) = candidate_pid(&entry) else {
                continue;
            };

            match read_snapshot(self.provider, pid, self.page_size) {
                Ok(snapshot) => return Some(snapshot),
                //Ignore the error if a process vanished between listing and reading its data
                Err(e) if e.is_absent() => debug!("PID {pid} exited during listing: {e}"),
                Err(e) => warn!("Skipping PID {pid}: {e}"),
            }
        }
        None
    }
}

pub fn read_snapshot<P: ProcessInfoProvider + ?Sized>(
    provider: &P,
    pid: Pid,
    page_size: u64,
) -> Result<ProcessSnapshot, RecordError> {
    let name = record::parse_name(&provider.read_record(pid, Record::Name)?)?;
    let state = record::parse_state(&provider.read_record(pid, Record::Status)?)?;
    let (resident_kb, virtual_kb) =
        record::parse_memory(&provider.read_record(pid, Record::Memory)?, page_size)?;

    Ok(ProcessSnapshot::new(pid, name, state, resident_kb, virtual_kb))
}

pub fn read_cpu_ticks<P: ProcessInfoProvider + ?Sized>(
    provider: &P,
    pid: Pid,
) -> Result<CpuTicks, RecordError> {
    Ok(record::parse_cpu_ticks(&provider.read_record(pid, Record::Stat)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeProcess, FakeProvider};

    #[test]
    fn only_digit_directories_are_candidates() {
        assert!(candidate_pid(&NamespaceEntry::dir("123")).is_some());
        assert!(candidate_pid(&NamespaceEntry::dir("self")).is_none());
        assert!(candidate_pid(&NamespaceEntry::dir("12a")).is_none());
        assert!(candidate_pid(&NamespaceEntry::dir("")).is_none());
        assert!(candidate_pid(&NamespaceEntry::dir("0")).is_none());
        assert!(candidate_pid(&NamespaceEntry::file("123")).is_none());
    }

    #[test]
    fn lists_every_complete_process() {
        let provider = FakeProvider::new()
            .with_process(FakeProcess::new(1, "init"))
            .with_process(FakeProcess::new(200, "bash").state('R').pages(10, 20))
            .with_entry(NamespaceEntry::dir("sys"))
            .with_entry(NamespaceEntry::file("uptime"));

        let mut snaps: Vec<_> = processes(&provider).unwrap().collect();
        snaps.sort_by_key(|s| s.pid());

        assert_eq!(snaps.len(), 2);
        let bash = &snaps[1];
        assert_eq!(bash.pid().as_u32(), 200);
        assert_eq!(bash.name(), "bash");
        assert_eq!(bash.state(), 'R');
        assert_eq!((bash.resident_kb(), bash.virtual_kb()), (40, 80));
        assert_eq!(bash.cpu_percent(), None);
    }

    #[test]
    fn broken_candidates_are_dropped_not_fatal() {
        let provider = FakeProvider::new()
            .with_process(FakeProcess::new(1, "init"))
            .with_process(FakeProcess::new(2, "gone").missing(Record::Name))
            .with_process(FakeProcess::new(3, "locked").denied(Record::Status))
            .with_process(FakeProcess::new(4, "weird").status("Name:\tweird\n"))
            .with_process(FakeProcess::new(5, "short").memory("12"))
            .with_process(FakeProcess::new(6, "ok"));

        let pids: Vec<u32> = processes(&provider)
            .unwrap()
            .map(|s| s.pid().as_u32())
            .collect();
        assert_eq!(pids.len(), 2);
        assert!(pids.contains(&1));
        assert!(pids.contains(&6));
    }

    #[test]
    fn oversized_memory_record_drops_only_that_row() {
        let provider = FakeProvider::new()
            .with_process(FakeProcess::new(1, "init"))
            .with_process(FakeProcess::new(2, "huge").memory("18446744073709551615 1"));

        let pids: Vec<u32> = processes(&provider)
            .unwrap()
            .map(|s| s.pid().as_u32())
            .collect();
        assert_eq!(pids, vec![1]);
    }

    #[test]
    fn output_never_exceeds_digit_entries() {
        let provider = FakeProvider::new()
            .with_process(FakeProcess::new(10, "a"))
            .with_process(FakeProcess::new(11, "b").missing(Record::Memory))
            .with_entry(NamespaceEntry::dir("net"));
        let digit_entries = provider
            .namespace_entries()
            .unwrap()
            .iter()
            .filter(|e| candidate_pid(e).is_some())
            .count();
        assert!(processes(&provider).unwrap().count() <= digit_entries);
    }

    #[test]
    fn unreadable_namespace_fails_the_listing() {
        let provider = FakeProvider::new().without_namespace();
        assert!(processes(&provider).is_err());
    }

    #[test]
    fn cpu_ticks_come_from_stat_record() {
        let provider = FakeProvider::new().with_process(FakeProcess::new(9, "worker").ticks(30, 12));
        let ticks = read_cpu_ticks(&provider, Pid::new(9).unwrap()).unwrap();
        assert_eq!(ticks, CpuTicks { user: 30, system: 12 });
        assert!(read_cpu_ticks(&provider, Pid::new(10).unwrap()).unwrap_err().is_absent());
    }
}
