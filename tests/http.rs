use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const FROZEN_NOW: &str = "2026-01-05T12:00:00+00:00";

#[derive(Debug, Deserialize)]
struct Entry {
    id: String,
    mood: i32,
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StatsBody {
    average_mood: f64,
    average_energy: f64,
    total_entries: usize,
    highest: Option<Entry>,
    lowest: Option<Entry>,
    current_streak: u32,
}

#[derive(Debug, Deserialize)]
struct GoalBody {
    id: String,
    completed: bool,
    #[serde(default)]
    progress: Option<u8>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("mood_tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/stats")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    spawn_server_at(&unique_data_path()).await
}

async fn spawn_server_at(data_path: &str) -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_mood_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("APP_NOW", FROZEN_NOW)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = spawn_server().await;

    #[cfg(unix)]
    cleanup::register(server.child.id());

    let server = Arc::new(server);
    *guard = Some(Arc::clone(&server));
    server
}

async fn post_entry(client: &Client, base_url: &str, body: serde_json::Value) -> Entry {
    let response = client
        .post(format!("{base_url}/api/entries"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn get_entries(client: &Client, base_url: &str, range: &str) -> Vec<Entry> {
    client
        .get(format!("{base_url}/api/entries?range={range}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_stats_and_windows_over_backfilled_log() {
    let server = spawn_server().await;
    let client = Client::new();
    let base = server.base_url.as_str();

    post_entry(&client, base, json!({ "mood": 6, "energy": 5 })).await;
    post_entry(
        &client,
        base,
        json!({ "mood": 8, "energy": 5, "recorded_at": "2026-01-04T09:00:00+00:00" }),
    )
    .await;
    post_entry(
        &client,
        base,
        json!({ "mood": 7, "energy": 6, "recorded_at": "2026-01-03T21:00:00+00:00" }),
    )
    .await;

    let stats: StatsBody = client
        .get(format!("{base}/api/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats.total_entries, 3);
    assert_eq!(stats.average_mood, 7.0);
    assert_eq!(stats.average_energy, 5.3);
    assert_eq!(stats.current_streak, 3);
    assert_eq!(stats.highest.unwrap().mood, 8);
    assert_eq!(stats.lowest.unwrap().mood, 6);

    post_entry(
        &client,
        base,
        json!({ "mood": 2, "energy": 2, "recorded_at": "2025-11-26T12:00:00+00:00" }),
    )
    .await;

    assert_eq!(get_entries(&client, base, "7days").await.len(), 3);
    assert_eq!(get_entries(&client, base, "30days").await.len(), 3);
    assert_eq!(get_entries(&client, base, "90days").await.len(), 4);
    assert_eq!(get_entries(&client, base, "all").await.len(), 4);

    let stats: StatsBody = client
        .get(format!("{base}/api/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats.total_entries, 4);
    assert_eq!(stats.current_streak, 3);
}

#[tokio::test]
async fn http_rejects_out_of_range_values() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for body in [
        json!({ "mood": 11, "energy": 5 }),
        json!({ "mood": 5, "energy": 0 }),
    ] {
        let response = client
            .post(format!("{}/api/entries", server.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(error["error"].as_str().unwrap().contains("between 1 and 10"));
    }

    let response = client
        .get(format!("{}/api/entries?range=365days", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: serde_json::Value = response.json().await.unwrap();
    assert!(error["error"].is_string());
}

#[tokio::test]
async fn http_rejects_future_recorded_at() {
    let server = spawn_server().await;
    let client = Client::new();
    let base = server.base_url.as_str();

    let response = client
        .post(format!("{base}/api/entries"))
        .json(&json!({ "mood": 5, "energy": 5, "recorded_at": "2027-06-01T00:00:00+00:00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: serde_json::Value = response.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("future"));

    post_entry(
        &client,
        base,
        json!({ "mood": 5, "energy": 5, "recorded_at": FROZEN_NOW }),
    )
    .await;

    assert_eq!(get_entries(&client, base, "7days").await.len(), 1);
    assert_eq!(get_entries(&client, base, "all").await.len(), 1);
}

#[tokio::test]
async fn http_failed_write_leaves_log_unchanged() {
    let mut dir = std::env::temp_dir();
    dir.push(format!("mood_tracker_unwritable_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let server = spawn_server_at(&dir.to_string_lossy()).await;
    let client = Client::new();
    let base = server.base_url.as_str();

    let response = client
        .post(format!("{base}/api/entries"))
        .json(&json!({ "mood": 6, "energy": 6 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = client
        .post(format!("{base}/api/tags"))
        .json(&json!({ "name": "rain", "category": "weather" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert!(get_entries(&client, base, "all").await.is_empty());
    let tags: Vec<serde_json::Value> = client
        .get(format!("{base}/api/tags"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(tags.is_empty());

    drop(server);
    let _ = std::fs::remove_dir_all(&dir);
    let _ = std::fs::remove_file(dir.with_extension("json.tmp"));
}

#[tokio::test]
async fn http_deleting_tag_prunes_entry_references() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = server.base_url.as_str();

    let tag: serde_json::Value = client
        .post(format!("{base}/api/tags"))
        .json(&json!({ "name": "  gym  ", "category": "activity" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tag["name"], "gym");
    let tag_id = tag["id"].as_str().unwrap().to_string();

    let entry = post_entry(
        &client,
        base,
        json!({ "mood": 7, "energy": 8, "tags": [tag_id.clone()] }),
    )
    .await;
    assert_eq!(entry.tags, vec![tag_id.clone()]);

    let response = client
        .delete(format!("{base}/api/tags/{tag_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let entries = get_entries(&client, base, "all").await;
    let kept = entries.iter().find(|e| e.id == entry.id).expect("entry kept");
    assert!(kept.tags.is_empty());

    let response = client
        .post(format!("{base}/api/entries"))
        .json(&json!({ "mood": 5, "energy": 5, "tags": [tag_id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_goal_lifecycle() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = server.base_url.as_str();

    let response = client
        .post(format!("{base}/api/goals"))
        .json(&json!({ "title": "Calmer mornings", "target_mood": 8, "duration_days": 14 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let goal: GoalBody = response.json().await.unwrap();
    assert!(!goal.completed);

    let goals: Vec<GoalBody> = client
        .get(format!("{base}/api/goals"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = goals.iter().find(|g| g.id == goal.id).expect("goal listed");
    assert!(listed.progress.is_some_and(|p| p <= 100));

    let completed: GoalBody = client
        .post(format!("{base}/api/goals/{}/complete", goal.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(completed.completed);

    let response = client
        .delete(format!("{base}/api/goals/{}", goal.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .delete(format!("{base}/api/goals/{}", goal.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .post(format!("{base}/api/goals"))
        .json(&json!({ "title": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
