//! Integration tests for batch runs
//!
//! These tests drive the orchestrator with scripted renderers that count
//! their calls, plus one end-to-end run against a wiremock server.

use async_trait::async_trait;
use page_harvest::renderer::{build_http_client, HttpRenderer, RenderError, Renderer};
use page_harvest::storage::{ArtifactStore, FsArtifactStore, MemoryArtifactStore};
use page_harvest::{
    BatchOptions, ItemFetcher, ItemId, ItemResult, ItemStatus, Orchestrator, SiteProfile,
    UrlTemplate,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// What a scripted renderer does on a given call
#[derive(Clone)]
enum Step {
    Page(String),
    Fail,
    Hang,
}

/// Renderer that follows a script per call and records call start times
struct ScriptedRenderer {
    script: Box<dyn Fn(&str, usize) -> Step + Send + Sync>,
    calls: AtomicUsize,
    calls_by_id: Mutex<HashMap<String, usize>>,
    started: Mutex<Vec<Instant>>,
}

impl ScriptedRenderer {
    fn new(script: impl Fn(&str, usize) -> Step + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            calls_by_id: Mutex::new(HashMap::new()),
            started: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn calls_for(&self, id: &str) -> usize {
        self.calls_by_id
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn render(&self, url: &Url, _timeout: Duration) -> Result<String, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.lock().unwrap().push(Instant::now());

        let id = url.path().rsplit('/').next().unwrap_or_default().to_string();
        let call = {
            let mut by_id = self.calls_by_id.lock().unwrap();
            let count = by_id.entry(id.clone()).or_insert(0);
            *count += 1;
            *count
        };

        match (self.script)(&id, call) {
            Step::Page(html) => Ok(html),
            Step::Fail => Err(RenderError::Network {
                url: url.to_string(),
                message: "connection reset".to_string(),
            }),
            Step::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn page(id: &str) -> String {
    format!("<html><article>Item {}</article></html>", id)
}

fn profile() -> Arc<SiteProfile> {
    let json = r#"{
        "domain": "example.com",
        "content": {
            "mainSelector": "article",
            "presentIndicators": ["<article>"],
            "removedIndicators": ["404 Not Found", "no longer available"]
        }
    }"#;
    Arc::new(SiteProfile::from_json(json).unwrap())
}

fn template() -> UrlTemplate {
    UrlTemplate::new("https://example.com/items/{id}").unwrap()
}

fn fast_options() -> BatchOptions {
    BatchOptions {
        concurrency: 3,
        inter_request_delay: Duration::ZERO,
        max_retries: 2,
        backoff_base: Duration::from_millis(5),
        backoff_cap: Duration::from_millis(20),
        render_timeout: Duration::from_secs(2),
        cancel_grace: Duration::from_millis(50),
        force: false,
    }
}

fn orchestrator(
    renderer: Arc<ScriptedRenderer>,
    store: Arc<dyn ArtifactStore>,
    options: BatchOptions,
) -> Orchestrator {
    let fetcher = ItemFetcher::new(renderer, store, Some(profile()), options.render_timeout);
    Orchestrator::new(fetcher, options)
}

fn result<'a>(results: &'a HashMap<ItemId, ItemResult>, id: &str) -> &'a ItemResult {
    &results[&ItemId::new(id).unwrap()]
}

#[tokio::test]
async fn test_result_keys_match_input_for_every_configuration() {
    let ids = ["a", "b", "c", "d", "e", "f", "g"];

    for concurrency in [1, 2, 5] {
        for max_retries in [0, 1, 3] {
            // "a" and "d" fail once, "g" never loads
            let renderer = ScriptedRenderer::new(|id, call| match id {
                "g" => Step::Fail,
                "a" | "d" if call == 1 => Step::Fail,
                _ => Step::Page(page(id)),
            });
            let options = BatchOptions {
                concurrency,
                max_retries,
                ..fast_options()
            };
            let orchestrator = orchestrator(
                renderer.clone(),
                Arc::new(MemoryArtifactStore::new()),
                options,
            );

            let results = orchestrator
                .run(ids, &template(), CancellationToken::new())
                .await
                .unwrap();

            let keys: HashSet<_> = results.keys().map(|id| id.as_str().to_string()).collect();
            let expected: HashSet<_> = ids.iter().map(|id| id.to_string()).collect();
            assert_eq!(keys, expected);
            assert_eq!(result(&results, "g").status, ItemStatus::Error);
            assert_eq!(renderer.calls_for("g"), max_retries as usize + 1);
        }
    }
}

#[tokio::test]
async fn test_saved_item_is_not_rendered() {
    let store = Arc::new(MemoryArtifactStore::new());
    store.put(&ItemId::new("a").unwrap(), &page("a")).unwrap();
    let renderer = ScriptedRenderer::new(|id, _| Step::Page(page(id)));
    let orchestrator = orchestrator(renderer.clone(), store, fast_options());

    let results = orchestrator
        .run(["a"], &template(), CancellationToken::new())
        .await
        .unwrap();

    let a = result(&results, "a");
    assert_eq!(a.status, ItemStatus::Success);
    assert!(a.skipped);
    assert_eq!(a.bytes, Some(page("a").len()));
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_removal_wins_over_presence() {
    let store = Arc::new(MemoryArtifactStore::new());
    let renderer = ScriptedRenderer::new(|_, _| {
        Step::Page("<html><article>404 Not Found</article></html>".to_string())
    });
    let orchestrator = orchestrator(renderer.clone(), store.clone(), fast_options());

    let results = orchestrator
        .run(["gone"], &template(), CancellationToken::new())
        .await
        .unwrap();

    let gone = result(&results, "gone");
    assert_eq!(gone.status, ItemStatus::Removed);
    assert_eq!(gone.error_message.as_deref(), Some("404 Not Found"));
    assert_eq!(renderer.calls(), 1);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_fails_max_retries_times_then_succeeds() {
    let store = Arc::new(MemoryArtifactStore::new());
    let max_retries = 3;
    let renderer = ScriptedRenderer::new(move |id, call| {
        if call <= max_retries {
            Step::Fail
        } else {
            Step::Page(page(id))
        }
    });
    let options = BatchOptions {
        max_retries: max_retries as u32,
        ..fast_options()
    };
    let orchestrator = orchestrator(renderer.clone(), store.clone(), options);

    let results = orchestrator
        .run(["a"], &template(), CancellationToken::new())
        .await
        .unwrap();

    let a = result(&results, "a");
    assert_eq!(a.status, ItemStatus::Success);
    assert_eq!(a.attempts, 4);
    assert_eq!(renderer.calls(), max_retries + 1);
    assert_eq!(
        store.get(&ItemId::new("a").unwrap()).unwrap(),
        Some(page("a"))
    );
}

#[tokio::test]
async fn test_always_failing_item_reports_error_without_artifact() {
    let store = Arc::new(MemoryArtifactStore::new());
    let renderer = ScriptedRenderer::new(|_, _| Step::Fail);
    let orchestrator = orchestrator(renderer.clone(), store.clone(), fast_options());

    let results = orchestrator
        .run(["a"], &template(), CancellationToken::new())
        .await
        .unwrap();

    let a = result(&results, "a");
    assert_eq!(a.status, ItemStatus::Error);
    assert!(a.error_message.as_deref().unwrap().contains("connection reset"));
    assert_eq!(renderer.calls(), 3);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unrecognized_page_is_retried_then_reported() {
    let renderer = ScriptedRenderer::new(|_, _| Step::Page("<html>loading</html>".to_string()));
    let orchestrator = orchestrator(
        renderer.clone(),
        Arc::new(MemoryArtifactStore::new()),
        fast_options(),
    );

    let results = orchestrator
        .run(["a"], &template(), CancellationToken::new())
        .await
        .unwrap();

    let a = result(&results, "a");
    assert_eq!(a.status, ItemStatus::Error);
    assert_eq!(a.error_message.as_deref(), Some("structure not recognized"));
    assert_eq!(renderer.calls(), 3);
}

#[tokio::test]
async fn test_pacing_with_single_worker() {
    let delay = Duration::from_millis(60);
    let renderer = ScriptedRenderer::new(|id, _| Step::Page(page(id)));
    let options = BatchOptions {
        concurrency: 1,
        inter_request_delay: delay,
        ..fast_options()
    };
    let orchestrator = orchestrator(
        renderer.clone(),
        Arc::new(MemoryArtifactStore::new()),
        options,
    );

    orchestrator
        .run(["a", "b", "c", "d"], &template(), CancellationToken::new())
        .await
        .unwrap();

    let started = renderer.started.lock().unwrap().clone();
    assert_eq!(started.len(), 4);
    for pair in started.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= delay);
    }
}

#[tokio::test]
async fn test_forced_reruns_produce_identical_artifacts() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(FsArtifactStore::new(temp_dir.path()).unwrap());
    let ids = ["a", "b", "c"];
    let options = BatchOptions {
        force: true,
        ..fast_options()
    };

    let mut snapshots = Vec::new();
    for _ in 0..2 {
        let renderer = ScriptedRenderer::new(|id, _| Step::Page(page(id)));
        let orchestrator = orchestrator(renderer.clone(), store.clone(), options.clone());
        orchestrator
            .run(ids, &template(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(renderer.calls(), 3);

        let snapshot: Vec<Vec<u8>> = ids
            .iter()
            .map(|id| std::fs::read(store.artifact_path(&ItemId::new(*id).unwrap())).unwrap())
            .collect();
        snapshots.push(snapshot);
    }

    assert_eq!(snapshots[0], snapshots[1]);
}

#[tokio::test]
async fn test_storage_failure_is_not_retried() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let artifact_dir = temp_dir.path().join("artifacts");
    let store = Arc::new(FsArtifactStore::new(&artifact_dir).unwrap());
    // Removing the directory makes every write fail
    std::fs::remove_dir_all(&artifact_dir).unwrap();

    let renderer = ScriptedRenderer::new(|id, _| Step::Page(page(id)));
    let orchestrator = orchestrator(renderer.clone(), store.clone(), fast_options());

    let results = orchestrator
        .run(["a"], &template(), CancellationToken::new())
        .await
        .unwrap();

    let a = result(&results, "a");
    assert_eq!(a.status, ItemStatus::Error);
    assert!(a
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("storage failure"));
    assert_eq!(renderer.calls(), 1);
    assert!(!artifact_dir.join("a.html").exists());
}

#[tokio::test]
async fn test_cancellation_reports_unfinished_items() {
    let store = Arc::new(MemoryArtifactStore::new());
    // "a" loads, everything else hangs until abandoned
    let renderer = ScriptedRenderer::new(|id, _| match id {
        "a" => Step::Page(page(id)),
        _ => Step::Hang,
    });
    let options = BatchOptions {
        concurrency: 1,
        ..fast_options()
    };
    let orchestrator = orchestrator(renderer.clone(), store, options);
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        })
    };

    let started = Instant::now();
    let results = orchestrator
        .run(["a", "b", "c"], &template(), cancel)
        .await
        .unwrap();
    canceller.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(results.len(), 3);
    assert_eq!(result(&results, "a").status, ItemStatus::Success);
    for id in ["b", "c"] {
        let r = result(&results, id);
        assert_eq!(r.status, ItemStatus::Error);
        assert_eq!(r.error_message.as_deref(), Some("cancelled"));
    }
    assert_eq!(result(&results, "b").attempts, 1);
    assert_eq!(result(&results, "c").attempts, 0);
    assert_eq!(renderer.calls(), 2);
}

#[tokio::test]
async fn test_duplicate_ids_collapse() {
    let renderer = ScriptedRenderer::new(|id, _| Step::Page(page(id)));
    let orchestrator = orchestrator(
        renderer.clone(),
        Arc::new(MemoryArtifactStore::new()),
        fast_options(),
    );

    let results = orchestrator
        .run(["a", "b", "a", "a"], &template(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(renderer.calls_for("a"), 1);
}

#[tokio::test]
async fn test_end_to_end_with_http_renderer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items/101"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page("101"))
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items/102"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string("<html><h1>404 Not Found</h1></html>"),
        )
        .mount(&mock_server)
        .await;

    // Loads on the second request only
    Mock::given(method("GET"))
        .and(path("/items/103"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items/103"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("103")))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(FsArtifactStore::new(temp_dir.path()).unwrap());
    let renderer = Arc::new(HttpRenderer::new(
        build_http_client("TestHarvester/1.0").unwrap(),
    ));
    let options = fast_options();
    let fetcher = ItemFetcher::new(
        renderer,
        store.clone(),
        Some(profile()),
        options.render_timeout,
    );
    let orchestrator = Orchestrator::new(fetcher, options);
    let template = UrlTemplate::new(format!("{}/items/{{id}}", mock_server.uri())).unwrap();

    let results = orchestrator
        .run(["101", "102", "103"], &template, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result(&results, "101").status, ItemStatus::Success);
    assert_eq!(result(&results, "102").status, ItemStatus::Removed);
    assert_eq!(result(&results, "103").status, ItemStatus::Success);
    assert_eq!(result(&results, "103").attempts, 2);

    let keys: Vec<_> = store
        .list_keys()
        .unwrap()
        .into_iter()
        .map(|id| id.as_str().to_string())
        .collect();
    assert_eq!(keys, vec!["101", "103"]);
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("101.html")).unwrap(),
        page("101")
    );
}
