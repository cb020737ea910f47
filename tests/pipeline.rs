//! End-to-end pipeline properties exercised with a scripted page source.

use async_trait::async_trait;
use chrono::NaiveDate;
use pagewatch::{runner, FetchError, PageSource, RunOptions, SnapshotStore, Target};
use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;
use url::Url;

/// Page source whose responses can be rescripted between runs.
struct ScriptedSource {
    responses: Mutex<HashMap<String, Result<String, u16>>>,
}

impl ScriptedSource {
    fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
        }
    }

    fn serve(&self, url: &str, body: &str) {
        self.responses
            .lock()
            .expect("responses lock")
            .insert(url.to_string(), Ok(body.to_string()));
    }

    fn fail(&self, url: &str, status: u16) {
        self.responses
            .lock()
            .expect("responses lock")
            .insert(url.to_string(), Err(status));
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        match self.responses.lock().expect("responses lock").get(url.as_str()) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("valid date")
}

fn target(url: &str) -> Target {
    Target::new(Url::parse(url).expect("valid url"))
}

#[tokio::test]
async fn unchanged_content_is_idempotent_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path());
    let source = ScriptedSource::new();
    source.serve("https://example.com/a", "<html><body>Stable</body></html>");
    let targets = vec![target("https://example.com/a")];

    let first = runner::run(&source, &store, &targets, &RunOptions::new(date("2026-08-22"))).await;
    assert_eq!(first.changed, 1);

    let second = runner::run(&source, &store, &targets, &RunOptions::new(date("2026-08-23"))).await;
    assert_eq!(second.unchanged, 1);
    assert_eq!(second.changed, 0);
    assert!(second.is_success());

    assert_eq!(store.snapshots("example_com/a").expect("list").len(), 1);
    assert!(!dir.path().join("diffs/example_com/a").exists());
}

#[tokio::test]
async fn changed_content_produces_snapshot_and_diff() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path());
    let source = ScriptedSource::new();
    let targets = vec![target("http://example.com/a")];

    source.serve("http://example.com/a", "<html><body>Hello</body></html>");
    let day1 = runner::run(&source, &store, &targets, &RunOptions::new(date("2026-08-22"))).await;
    assert!(day1.is_success());

    source.serve("http://example.com/a", "<html><body>Hello World</body></html>");
    let day2 = runner::run(&source, &store, &targets, &RunOptions::new(date("2026-08-23"))).await;
    assert!(day2.is_success());
    assert_eq!(day2.changed, 1);

    let snapshots = store.snapshots("example_com/a").expect("list");
    assert_eq!(snapshots.len(), 2);
    let dates: Vec<NaiveDate> = snapshots.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![date("2026-08-22"), date("2026-08-23")]);

    let diff_path = dir
        .path()
        .join("diffs/example_com/a/diff_2026-08-22_to_2026-08-23.txt");
    let rendered = fs::read_to_string(&diff_path).expect("diff artifact");
    assert!(rendered.contains("-    Hello\n"));
    assert!(rendered.contains("+    Hello World\n"));
}

#[tokio::test]
async fn whitespace_and_attribute_order_changes_are_not_changes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path());
    let source = ScriptedSource::new();
    let targets = vec![target("https://example.com/a")];

    source.serve(
        "https://example.com/a",
        r#"<html><body><a href="/x" id="l">go</a></body></html>"#,
    );
    runner::run(&source, &store, &targets, &RunOptions::new(date("2026-08-22"))).await;

    source.serve(
        "https://example.com/a",
        "<html>\n  <body>\n    <a id=\"l\" href=\"/x\">go</a>\n  </body>\n</html>",
    );
    let second = runner::run(&source, &store, &targets, &RunOptions::new(date("2026-08-23"))).await;
    assert_eq!(second.unchanged, 1);
    assert_eq!(store.snapshots("example_com/a").expect("list").len(), 1);
}

#[tokio::test]
async fn failing_target_does_not_block_the_rest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path());
    let source = ScriptedSource::new();
    source.serve("https://one.example.com/", "<html><body>one</body></html>");
    source.fail("https://two.example.com/", 503);
    source.serve("https://three.example.com/", "<html><body>three</body></html>");
    let targets = vec![
        target("https://one.example.com"),
        target("https://two.example.com"),
        target("https://three.example.com"),
    ];

    let summary =
        runner::run(&source, &store, &targets, &RunOptions::new(date("2026-08-23"))).await;
    assert_eq!(summary.changed, 2);
    assert_eq!(summary.fetch_errors, 1);
    assert!(!summary.is_success());
    assert_eq!(store.snapshots("one_example_com").expect("list").len(), 1);
    assert_eq!(store.snapshots("three_example_com").expect("list").len(), 1);
    assert!(store.snapshots("two_example_com").expect("list").is_empty());
}

#[tokio::test]
async fn same_date_recapture_overwrites_without_duplicate_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path());
    let source = ScriptedSource::new();
    let targets = vec![target("https://example.com/a")];
    let options = RunOptions::new(date("2026-08-23"));

    source.serve("https://example.com/a", "<html><body>morning</body></html>");
    runner::run(&source, &store, &targets, &options).await;

    source.serve("https://example.com/a", "<html><body>evening</body></html>");
    let second = runner::run(&source, &store, &targets, &options).await;
    assert_eq!(second.changed, 1);

    let snapshots = store.snapshots("example_com/a").expect("list");
    assert_eq!(snapshots.len(), 1);
    let content = store.read(&snapshots[0]).expect("read");
    assert!(content.contains("evening"));
}

#[tokio::test]
async fn diff_always_compares_the_two_newest_snapshots() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path());
    let source = ScriptedSource::new();
    let targets = vec![target("https://example.com/a")];

    source.serve("https://example.com/a", "<html><body>v1</body></html>");
    runner::run(&source, &store, &targets, &RunOptions::new(date("2026-08-20"))).await;
    source.serve("https://example.com/a", "<html><body>v2</body></html>");
    runner::run(&source, &store, &targets, &RunOptions::new(date("2026-08-21"))).await;
    source.serve("https://example.com/a", "<html><body>v3</body></html>");
    runner::run(&source, &store, &targets, &RunOptions::new(date("2026-08-23"))).await;

    let diff_dir = dir.path().join("diffs/example_com/a");
    let mut artifacts: Vec<String> = fs::read_dir(&diff_dir)
        .expect("diff dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    artifacts.sort();
    assert_eq!(
        artifacts,
        vec![
            "diff_2026-08-20_to_2026-08-21.txt",
            "diff_2026-08-21_to_2026-08-23.txt"
        ]
    );

    let newest = fs::read_to_string(diff_dir.join("diff_2026-08-21_to_2026-08-23.txt"))
        .expect("read diff");
    assert!(newest.contains("-    v2\n"));
    assert!(newest.contains("+    v3\n"));
}
