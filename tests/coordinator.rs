//! Partition coordination across concurrent workers.

mod common;

use common::{PROMPT, ScriptedService, read_lines, test_config};
use drugbatch::checkpoint::record_key;
use drugbatch::coordinator::{plan_run, run_partitions};
use drugbatch::partition::PartitionId;
use std::collections::HashSet;
use tempfile::TempDir;

fn cells(n: usize) -> Vec<Option<String>> {
    (0..n).map(|i| Some(format!("drug{i:03}"))).collect()
}

#[test]
fn every_name_goes_to_exactly_one_worker() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let plan = plan_run(cells(23), 4, 0, None);
    let service = ScriptedService::echo();
    let config = test_config(2);

    let reports = run_partitions(&plan, tmp.path(), &service, &config, PROMPT)?;

    assert_eq!(reports.len(), 4);
    let assigned: Vec<usize> = reports.iter().map(|r| r.assigned).collect();
    assert_eq!(assigned, vec![5, 5, 5, 8]);

    let sent = service.sent_names();
    assert_eq!(sent.len(), 23);
    assert_eq!(sent.iter().collect::<HashSet<_>>().len(), 23);

    // each worker wrote only its own contiguous slice
    for (i, part) in plan.partitions.iter().enumerate() {
        assert_eq!(part.id, PartitionId::Worker(i + 1));
        let path = tmp.path().join(format!("processed_drugs_worker{}.txt", i + 1));
        let keys: Vec<String> = read_lines(&path)
            .iter()
            .map(|l| record_key(l).to_string())
            .collect();
        let expected: Vec<String> = part.names.iter().map(|n| n.name.clone()).collect();
        assert_eq!(keys, expected, "worker {} checkpoint order", i + 1);
    }
    Ok(())
}

#[test]
fn single_worker_runs_inline_on_single_files() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let plan = plan_run(cells(5), 1, 0, None);
    let service = ScriptedService::echo();
    let config = test_config(10);

    let reports = run_partitions(&plan, tmp.path(), &service, &config, PROMPT)?;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].worker, "single");
    assert_eq!(read_lines(&tmp.path().join("processed_drugs_single.txt")).len(), 5);
    assert!(!tmp.path().join("processed_drugs_worker1.txt").exists());
    Ok(())
}

#[test]
fn window_limits_what_is_sent() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let plan = plan_run(cells(100), 2, 10, Some(5));
    let service = ScriptedService::echo();
    let config = test_config(10);

    run_partitions(&plan, tmp.path(), &service, &config, PROMPT)?;

    let mut sent = service.sent_names();
    sent.sort();
    let expected: Vec<String> = (10..15).map(|i| format!("drug{i:03}")).collect();
    assert_eq!(sent, expected);
    Ok(())
}

#[test]
fn failing_worker_does_not_stop_the_others() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let plan = plan_run(cells(6), 3, 0, None);
    // drug002 is in worker 2's only batch
    let service = ScriptedService::poisoned(["drug002"]);
    let config = test_config(10);

    let reports = run_partitions(&plan, tmp.path(), &service, &config, PROMPT)?;

    let failed: Vec<usize> = reports.iter().map(|r| r.stats.failed_batches).collect();
    assert_eq!(failed, vec![0, 1, 0]);
    assert!(read_lines(&tmp.path().join("processed_drugs_worker2.txt")).is_empty());
    assert_eq!(read_lines(&tmp.path().join("processed_errors_worker2.txt")).len(), 1);
    assert_eq!(read_lines(&tmp.path().join("processed_drugs_worker1.txt")).len(), 2);
    assert_eq!(read_lines(&tmp.path().join("processed_drugs_worker3.txt")).len(), 2);
    Ok(())
}

#[test]
fn more_workers_than_names() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let plan = plan_run(cells(2), 4, 0, None);
    let service = ScriptedService::echo();
    let config = test_config(10);

    let reports = run_partitions(&plan, tmp.path(), &service, &config, PROMPT)?;

    let assigned: Vec<usize> = reports.iter().map(|r| r.assigned).collect();
    assert_eq!(assigned, vec![0, 0, 0, 2]);
    assert_eq!(service.calls().len(), 1);
    Ok(())
}
