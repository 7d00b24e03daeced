//! The `/proc` provider against a synthetic directory tree.

use std::fs;
use std::path::Path;

use lpm_inspector::manager::context::{self, SystemContext};
use lpm_inspector::provider::{ProcFs, ProcessInfoProvider};
use lpm_inspector::testing::FakeController;
use lpm_inspector::{Manager, Pid};
use tempfile::TempDir;

fn write_process(root: &Path, pid: u32, name: &str, state: &str, statm: &str, utime: u64, stime: u64) {
    let dir = root.join(pid.to_string());
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("comm"), format!("{name}\n")).unwrap();
    fs::write(dir.join("status"), format!("Name:\t{name}\nUmask:\t0022\nState:\t{state}\nTgid:\t{pid}\n")).unwrap();
    fs::write(dir.join("statm"), statm).unwrap();
    fs::write(
        dir.join("stat"),
        format!("{pid} ({name}) S 1 {pid} {pid} 0 -1 4194304 10 0 0 0 {utime} {stime} 0 0 20 0 1 0 50 1000 10\n"),
    )
    .unwrap();
}

fn proc_tree() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let path = root.path();
    write_process(path, 1, "init", "S (sleeping)", "2000 300 0 0 0 0 0\n", 0, 0);
    write_process(path, 812, "Web Content", "R (running)", "5000 1000 0 0 0 0 0\n", 90, 10);
    // Vanished mid-listing: directory without records
    fs::create_dir(path.join("977")).unwrap();
    // Not processes
    fs::create_dir(path.join("sys")).unwrap();
    fs::create_dir(path.join("1a")).unwrap();
    fs::write(path.join("42"), "a file named like a pid").unwrap();
    fs::write(path.join("cpuinfo"), "processor\t: 0\nmodel name\t: x\n\nprocessor\t: 1\nmodel name\t: x\n").unwrap();
    fs::write(path.join("uptime"), "50.00 90.00\n").unwrap();
    root
}

fn manager(root: &TempDir) -> Manager<ProcFs, FakeController> {
    Manager::new(ProcFs::new(root.path()), FakeController::new())
}

#[test]
fn lists_only_readable_digit_directories() {
    let root = proc_tree();
    let rows = manager(&root).list().unwrap();

    let pids: Vec<u32> = rows.iter().map(|r| r.pid().as_u32()).collect();
    assert_eq!(pids, vec![1, 812]);

    let web = &rows[1];
    assert_eq!(web.name(), "Web Content");
    assert_eq!(web.state(), 'R');
    let kb_per_page = procfs::page_size() / 1024;
    assert_eq!(web.resident_kb(), 1000 * kb_per_page);
    assert_eq!(web.virtual_kb(), 5000 * kb_per_page);
}

#[test]
fn cpu_usage_from_tree() {
    let root = proc_tree();
    let man = manager(&root);
    let hz = man.provider().clock_ticks_per_second() as f64;

    let pct = man.cpu_usage(Pid::new(812).unwrap()).unwrap();
    let expected = (100.0 / hz) / (50.0 * 2.0) * 100.0;
    assert!((pct - expected).abs() < 1e-9);

    assert!(man.cpu_usage(Pid::new(977).unwrap()).is_err());
}

#[test]
fn host_context_from_tree() {
    let root = proc_tree();
    let provider = ProcFs::new(root.path());
    let ctx = SystemContext::read(&provider).unwrap();
    assert_eq!(ctx.num_logical_cores, 2);
    assert_eq!(ctx.uptime_seconds, 50.0);
    assert_eq!(
        context::read_num_logical_cores(&provider).unwrap(),
        context::read_num_logical_cores(&provider).unwrap()
    );
}

#[test]
fn missing_host_records_only_affect_cpu() {
    let root = proc_tree();
    fs::remove_file(root.path().join("uptime")).unwrap();
    let man = manager(&root);

    assert_eq!(man.list().unwrap().len(), 2);
    assert!(man.cpu_usage(Pid::new(1).unwrap()).is_err());
    assert!(man.list_with_cpu().unwrap().iter().all(|r| r.cpu_percent().is_none()));
}
