use assert_cmd::Command;
use predicates::prelude::*;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

fn tdata_cmd(workdir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("tdata").expect("Binary exists");
    // Keep a developer's .env and shell secrets out of the run.
    cmd.current_dir(workdir)
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENAI_API_URL")
        .env_remove("UNSTRUCTURED_API_KEY")
        .env_remove("UNSTRUCTURED_API_URL");
    cmd
}

#[test]
fn init_creates_working_directory_layout() {
    let tmp = tempdir().unwrap();

    tdata_cmd(tmp.path())
        .arg("init")
        .arg("--base-dir")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Created ingest/ and output/"));

    assert!(tmp.path().join("ingest/datasheets").is_dir());
    assert!(tmp.path().join("ingest/C-code-reference").is_dir());
    assert!(tmp.path().join("output").is_dir());
}

#[test]
fn run_fails_without_openai_api_key() {
    let tmp = tempdir().unwrap();

    tdata_cmd(tmp.path())
        .arg("run")
        .arg("--base-dir")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn run_with_empty_ingest_skips_both_stages() {
    let tmp = tempdir().unwrap();

    // No inputs means no network calls, so an unreachable service URL is fine.
    tdata_cmd(tmp.path())
        .arg("run")
        .arg("--base-dir")
        .arg(tmp.path())
        .env("OPENAI_API_KEY", "sk-test")
        .env("OPENAI_API_URL", "http://127.0.0.1:9/v1/chat/completions")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("summary: skipped")
                .and(predicate::str::contains("dataset: skipped")),
        );

    assert_eq!(
        std::fs::read_dir(tmp.path().join("output")).unwrap().count(),
        0
    );
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use tdata::cli::{run, Cli, Commands};

    let tmp = tempdir().unwrap();
    let cli = Cli {
        command: Commands::Init {
            base_dir: Some(tmp.path().to_path_buf()),
        },
    };

    run(cli).await.expect("init succeeds");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
