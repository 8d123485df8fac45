//! End-to-end pipeline tests over an in-memory monorepo.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use factory_core::{
    ApiError, ContentResponse, EntryKind, FileEntry, RepoApi, RepoCoordinates,
};
use factory_renderer::KindRegistry;
use factory_sync::pipeline::{run, ItemStatus, RunOptions};
use factory_sync::SyncError;
use factory_scanner::ScanError;

// ---------------------------------------------------------------------------
// In-memory monorepo + destination store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    /// Source-tree directory listings, path → entries.
    listings: HashMap<String, Vec<FileEntry>>,
    /// Files across all repos, (owner/repo, path) → (sha, base64 content).
    files: HashMap<(String, String), (String, String)>,
    ops: Vec<String>,
    sha_counter: u64,
}

#[derive(Default)]
struct FakeHost {
    state: Mutex<State>,
}

impl FakeHost {
    fn dir(self, path: &str, entries: Vec<FileEntry>) -> Self {
        self.state
            .lock()
            .unwrap()
            .listings
            .insert(path.to_owned(), entries);
        self
    }

    fn source_file(self, path: &str, yaml: &str) -> Self {
        let encoded = STANDARD.encode(yaml.as_bytes());
        self.state.lock().unwrap().files.insert(
            ("acme/shop".to_owned(), path.to_owned()),
            ("sha-src".to_owned(), encoded),
        );
        self
    }

    /// Register a source file entry with no content payload.
    fn contentless_file(self, path: &str) -> Self {
        self.state.lock().unwrap().files.insert(
            ("acme/shop".to_owned(), path.to_owned()),
            ("sha-src".to_owned(), String::new()),
        );
        self
    }

    fn writes(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter(|op| op.starts_with("put ") || op.starts_with("delete "))
            .cloned()
            .collect()
    }

    fn stored(&self, owner: &str, repo: &str, path: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(&(format!("{owner}/{repo}"), path.to_owned()))
            .map(|(_, content)| content.clone())
    }
}

fn file_entry(path: &str) -> FileEntry {
    FileEntry {
        kind: EntryKind::File,
        name: path.rsplit('/').next().unwrap_or(path).to_owned(),
        path: path.to_owned(),
        sha: format!("sha-{path}"),
        content: None,
    }
}

fn dir_entry(path: &str) -> FileEntry {
    FileEntry {
        kind: EntryKind::Dir,
        name: path.rsplit('/').next().unwrap_or(path).to_owned(),
        path: path.to_owned(),
        sha: format!("sha-{path}"),
        content: None,
    }
}

#[async_trait]
impl RepoApi for FakeHost {
    async fn get_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        _ref_name: Option<&str>,
    ) -> Result<Option<ContentResponse>, ApiError> {
        let mut st = self.state.lock().unwrap();
        st.ops.push(format!("get {owner}/{repo}:{path}"));
        if owner == "acme" && repo == "shop" {
            if let Some(entries) = st.listings.get(path) {
                return Ok(Some(ContentResponse::Listing(entries.clone())));
            }
        }
        Ok(st
            .files
            .get(&(format!("{owner}/{repo}"), path.to_owned()))
            .map(|(sha, content)| {
                ContentResponse::File(FileEntry {
                    kind: EntryKind::File,
                    name: path.rsplit('/').next().unwrap_or(path).to_owned(),
                    path: path.to_owned(),
                    sha: sha.clone(),
                    content: if content.is_empty() {
                        None
                    } else {
                        Some(content.clone())
                    },
                })
            }))
    }

    async fn delete_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        _branch: &str,
        _sha: &str,
        _message: &str,
    ) -> Result<(), ApiError> {
        let mut st = self.state.lock().unwrap();
        st.ops.push(format!("delete {owner}/{repo}:{path}"));
        st.files.remove(&(format!("{owner}/{repo}"), path.to_owned()));
        Ok(())
    }

    async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        _branch: &str,
        content: &str,
        _message: &str,
    ) -> Result<(), ApiError> {
        let mut st = self.state.lock().unwrap();
        st.ops.push(format!("put {owner}/{repo}:{path}"));
        st.sha_counter += 1;
        let sha = format!("sha{}", st.sha_counter);
        st.files
            .insert((format!("{owner}/{repo}"), path.to_owned()), (sha, content.to_owned()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn coords() -> RepoCoordinates {
    RepoCoordinates {
        owner: "acme".into(),
        repo: "shop".into(),
        ref_name: "main".into(),
    }
}

const CHECKOUT_DEF: &str = r#"
template:
  type: openshift
  spec:
    stages:
      pullCode:
        spec:
          gitlab:
            projectId: org/checkout
            branch: main
"#;

fn checkout_monorepo() -> FakeHost {
    FakeHost::default()
        .dir("apps", vec![dir_entry("apps/checkout")])
        .dir(
            "apps/checkout",
            vec![file_entry("apps/checkout/pipeline.factory-dev.yaml")],
        )
        .source_file("apps/checkout/pipeline.factory-dev.yaml", CHECKOUT_DEF)
}

async fn run_default(host: &FakeHost) -> Result<factory_sync::RunReport, SyncError> {
    run(host, &coords(), &KindRegistry::with_builtins(), &RunOptions::default()).await
}

// ---------------------------------------------------------------------------
// 1. Happy path — the checkout scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn checkout_app_renders_and_syncs_workflow() {
    let host = checkout_monorepo();
    let report = run_default(&host).await.expect("run");

    assert_eq!(report.apps.len(), 1);
    assert_eq!(report.apps[0].app, "checkout");
    assert_eq!(report.apps[0].items.len(), 1);
    assert!(!report.has_failures());

    match &report.apps[0].items[0].status {
        ItemStatus::Synced { destination } => {
            assert_eq!(destination, "org/checkout@main:.github/workflows/pipeline.yml");
        }
        other => panic!("expected Synced, got {other:?}"),
    }

    let stored = host
        .stored("org", "checkout", ".github/workflows/pipeline.yml")
        .expect("workflow written");
    let rendered = String::from_utf8(STANDARD.decode(stored).unwrap()).unwrap();
    assert!(rendered.contains("MODULE_NAME=pipeline"), "rendered:\n{rendered}");
    assert!(rendered.contains("TARGET_BRANCH=main"), "rendered:\n{rendered}");
}

#[tokio::test]
async fn second_run_leaves_destination_byte_identical() {
    let host = checkout_monorepo();
    run_default(&host).await.expect("first run");
    let first = host.stored("org", "checkout", ".github/workflows/pipeline.yml");

    run_default(&host).await.expect("second run");
    let second = host.stored("org", "checkout", ".github/workflows/pipeline.yml");
    assert_eq!(first, second);

    // The second run's probe found the first run's file and replaced it.
    let deletes = host
        .writes()
        .iter()
        .filter(|op| op.starts_with("delete org/checkout"))
        .count();
    assert_eq!(deletes, 1);
}

// ---------------------------------------------------------------------------
// 2. Per-item isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_kind_fails_one_item_and_batch_continues() {
    let unknown_def = CHECKOUT_DEF.replace("type: openshift", "type: unknown-kind");
    let host = FakeHost::default()
        .dir("apps", vec![dir_entry("apps/checkout"), dir_entry("apps/billing")])
        .dir(
            "apps/checkout",
            vec![file_entry("apps/checkout/pipeline.factory-dev.yaml")],
        )
        .dir(
            "apps/billing",
            vec![file_entry("apps/billing/invoices.factory-dev.yaml")],
        )
        .source_file("apps/checkout/pipeline.factory-dev.yaml", CHECKOUT_DEF)
        .source_file("apps/billing/invoices.factory-dev.yaml", &unknown_def);

    let report = run_default(&host).await.expect("run completes");
    assert_eq!(report.failed_count(), 1);

    let failed = report
        .items()
        .find(|i| matches!(i.status, ItemStatus::Failed { .. }))
        .expect("one failed item");
    assert_eq!(failed.path, "apps/billing/invoices.factory-dev.yaml");
    match &failed.status {
        ItemStatus::Failed { reason } => {
            assert!(reason.contains("unknown-kind"), "reason must name the kind: {reason}")
        }
        _ => unreachable!(),
    }

    // Nothing written for the failed item; the sibling synced.
    assert!(host.stored("org", "checkout", ".github/workflows/pipeline.yml").is_some());
    assert!(host.stored("org", "checkout", ".github/workflows/invoices.yml").is_none());
}

#[tokio::test]
async fn malformed_definition_fails_only_its_item() {
    let host = FakeHost::default()
        .dir("apps", vec![dir_entry("apps/checkout")])
        .dir(
            "apps/checkout",
            vec![
                file_entry("apps/checkout/pipeline.factory-dev.yaml"),
                file_entry("apps/checkout/broken.factory-dev.yaml"),
            ],
        )
        .source_file("apps/checkout/pipeline.factory-dev.yaml", CHECKOUT_DEF)
        .source_file("apps/checkout/broken.factory-dev.yaml", ": : not yaml [at all");

    let report = run_default(&host).await.expect("run completes");
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.items().count(), 2);
    assert!(host.stored("org", "checkout", ".github/workflows/pipeline.yml").is_some());
}

#[tokio::test]
async fn contentless_definition_fails_its_item() {
    let host = FakeHost::default()
        .dir("apps", vec![dir_entry("apps/checkout")])
        .dir(
            "apps/checkout",
            vec![file_entry("apps/checkout/pipeline.factory-dev.yaml")],
        )
        .contentless_file("apps/checkout/pipeline.factory-dev.yaml");

    let report = run_default(&host).await.expect("run completes");
    assert_eq!(report.failed_count(), 1);
    match &report.apps[0].items[0].status {
        ItemStatus::Failed { reason } => assert!(reason.contains("no content"), "{reason}"),
        other => panic!("expected Failed, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// 3. Fatal paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn zero_apps_aborts_before_any_write() {
    let host = FakeHost::default().dir("apps", vec![file_entry("apps/README.md")]);

    let err = run_default(&host).await.unwrap_err();
    assert!(
        matches!(err, SyncError::Scan(ScanError::NoApps { .. })),
        "got: {err}"
    );
    assert!(host.writes().is_empty(), "no write may precede the failure");
}

#[tokio::test]
async fn app_without_dev_definitions_aborts_the_run() {
    let host = FakeHost::default()
        .dir("apps", vec![dir_entry("apps/empty")])
        .dir("apps/empty", vec![file_entry("apps/empty/notes.txt")]);

    let err = run_default(&host).await.unwrap_err();
    assert!(
        matches!(err, SyncError::Scan(ScanError::NoDefinitions { .. })),
        "got: {err}"
    );
}

// ---------------------------------------------------------------------------
// 4. Dry run and reporting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dry_run_reports_would_sync_and_writes_nothing() {
    let host = checkout_monorepo();
    let opts = RunOptions {
        dry_run: true,
        ..Default::default()
    };
    let report = run(&host, &coords(), &KindRegistry::with_builtins(), &opts)
        .await
        .expect("run");

    assert!(matches!(
        report.apps[0].items[0].status,
        ItemStatus::WouldSync { .. }
    ));
    assert!(host.writes().is_empty());
}

#[tokio::test]
async fn deploy_definitions_are_counted_not_rendered() {
    let host = FakeHost::default()
        .dir("apps", vec![dir_entry("apps/checkout")])
        .dir(
            "apps/checkout",
            vec![
                file_entry("apps/checkout/pipeline.factory-dev.yaml"),
                file_entry("apps/checkout/pipeline.factory-deploy.yaml"),
            ],
        )
        .source_file("apps/checkout/pipeline.factory-dev.yaml", CHECKOUT_DEF);

    let report = run_default(&host).await.expect("run");
    assert_eq!(report.apps[0].deploy_definitions, 1);
    assert_eq!(report.apps[0].items.len(), 1, "only dev definitions are rendered");
}

#[tokio::test]
async fn report_timestamps_are_ordered() {
    let host = checkout_monorepo();
    let report = run_default(&host).await.expect("run");
    assert!(report.finished_at >= report.started_at);
}
