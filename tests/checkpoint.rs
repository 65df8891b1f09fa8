//! Tests for the checkpoint store.

use drugbatch::checkpoint::{CheckpointStore, ErrorEntry, range_label};
use drugbatch::error::BatchFailure;
use drugbatch::partition::PartitionId;
use std::fs;
use tempfile::TempDir;

#[test]
fn missing_file_loads_empty() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let store = CheckpointStore::new(tmp.path(), PartitionId::Worker(1));

    assert!(store.load()?.is_empty());
    assert!(!store.success_path().exists());
    Ok(())
}

#[test]
fn paths_follow_partition_naming() {
    let store = CheckpointStore::new("/out/parser", PartitionId::Worker(4));
    assert!(store.success_path().ends_with("processed_drugs_worker4.txt"));
    assert!(store.error_path().ends_with("processed_errors_worker4.txt"));

    let single = CheckpointStore::new("/out/parser", PartitionId::Single);
    assert!(single.success_path().ends_with("processed_drugs_single.txt"));
}

#[test]
fn append_then_load_first_fields() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let store = CheckpointStore::new(tmp.path(), PartitionId::Single);

    let written = store.append_success(&[
        "阿司匹林|Aspirin|已上市|解热镇痛|否|拜阿司匹灵",
        "复方甘草片|Compound Liquorice Tablets|已上市|镇咳|是|",
    ])?;
    assert_eq!(written, 2);

    let keys = store.load()?;
    assert_eq!(keys.len(), 2);
    assert!(keys.contains("阿司匹林"));
    assert!(keys.contains("复方甘草片"));
    Ok(())
}

#[test]
fn appends_never_truncate() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let store = CheckpointStore::new(tmp.path(), PartitionId::Worker(2));

    store.append_success(&["a|1"])?;
    // a fresh store over the same files, as after a restart
    let reopened = CheckpointStore::new(tmp.path(), PartitionId::Worker(2));
    reopened.append_success(&["b|2", "c|3"])?;

    assert_eq!(fs::read_to_string(store.success_path())?, "a|1\nb|2\nc|3\n");
    Ok(())
}

#[test]
fn load_tolerates_padding_blank_lines_and_bad_bytes() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let store = CheckpointStore::new(tmp.path(), PartitionId::Single);

    let mut bytes = " 布洛芬 | Ibuprofen \r\n\n".as_bytes().to_vec();
    bytes.extend_from_slice(b"\xff\xfe|junk\n");
    bytes.extend_from_slice("对乙酰氨基酚\n".as_bytes());
    fs::write(store.success_path(), bytes)?;

    let keys = store.load()?;
    assert!(keys.contains("布洛芬"));
    assert!(keys.contains("对乙酰氨基酚"));
    assert_eq!(keys.len(), 3);
    Ok(())
}

#[test]
fn error_entries_append_one_line_each() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let store = CheckpointStore::new(tmp.path(), PartitionId::Worker(1));

    store.append_error(&ErrorEntry {
        category: BatchFailure::ServiceCallFailed,
        range_label: range_label(0, 19),
        raw_response: String::new(),
        reason: "API error (503): upstream overloaded".into(),
    })?;
    store.append_error(&ErrorEntry {
        category: BatchFailure::EmptyResponse,
        range_label: range_label(20, 39),
        raw_response: "\n\t\n".into(),
        reason: "response has no text content".into(),
    })?;

    let text = fs::read_to_string(store.error_path())?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let fields: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(
        fields,
        vec![
            "service call failed",
            "rows 0 - 19",
            "",
            "API error (503): upstream overloaded"
        ]
    );
    assert!(lines[1].starts_with("empty or malformed response\trows 20 - 39\t"));
    assert_eq!(lines[1].split('\t').count(), 4);

    // the error file never feeds the resume set
    assert!(store.load()?.is_empty());
    Ok(())
}

#[test]
fn append_into_unwritable_path_fails() {
    let tmp = TempDir::new().unwrap();
    let store = CheckpointStore::new(tmp.path(), PartitionId::Single);
    fs::create_dir(store.success_path()).unwrap();

    assert!(store.append_success(&["x|y"]).is_err());
    assert!(store.load().is_err());
}
