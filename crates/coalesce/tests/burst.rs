//! End-to-end bursts through the real disk sink

use coalesce::{Coalescer, CoalescerConfig};
use std::time::Duration;
use tempfile::TempDir;

fn disk_writer() -> Coalescer {
    Coalescer::with_config(CoalescerConfig {
        debounce: Duration::from_millis(25),
        ..CoalescerConfig::default()
    })
}

async fn wait_idle(writer: &Coalescer) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !writer.idle() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("writer did not quiesce");
}

#[tokio::test]
async fn append_burst_lands_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("log.txt");
    let key = path.to_str().unwrap();

    let writer = disk_writer();
    for i in 1..=5 {
        writer.append(key, format!("{i}\n"));
    }
    wait_idle(&writer).await;

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "1\n2\n3\n4\n5\n");
}

#[tokio::test]
async fn replace_burst_keeps_newest() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.txt");
    let key = path.to_str().unwrap();

    let writer = disk_writer();
    for i in 1..=5 {
        writer.write(key, format!("{i}\n"));
    }
    wait_idle(&writer).await;

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "5\n");
}

#[tokio::test]
async fn many_files_at_once() {
    let temp_dir = TempDir::new().unwrap();
    let writer = disk_writer();

    let keys: Vec<String> = (0..10)
        .map(|i| {
            temp_dir
                .path()
                .join(format!("file-{i}.txt"))
                .to_str()
                .unwrap()
                .to_owned()
        })
        .collect();

    for key in &keys {
        writer.append(key.as_str(), "first\n");
        writer.append(key.as_str(), "second\n");
    }
    wait_idle(&writer).await;

    for key in &keys {
        let contents = std::fs::read_to_string(key).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
