//! End-to-end runtime tests: producers through the worker manager's fan-in
//! into the dispatcher, with a recording delivery collaborator and a real
//! on-disk registry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use hostlink::{
    Delivery, DeliveryError, Dispatcher, Entity, EntityWorker, EventData, JobFn, Registry,
    ScheduleTrigger, Scheduler, SensorUpdate, WorkerError, WorkerManager,
};

/// Emits the given entities in order, then idles until cancelled.
struct ScriptedWorker {
    id: String,
    script: Mutex<Vec<Entity>>,
}

impl ScriptedWorker {
    fn new(id: &str, script: Vec<Entity>) -> Arc<dyn EntityWorker> {
        Arc::new(Self {
            id: id.to_owned(),
            script: Mutex::new(script),
        })
    }
}

#[async_trait]
impl EntityWorker for ScriptedWorker {
    fn id(&self) -> &str {
        &self.id
    }

    async fn start(&self, token: CancellationToken) -> Result<mpsc::Receiver<Entity>, WorkerError> {
        let (tx, rx) = mpsc::channel(16);
        let script = std::mem::take(&mut *self.script.lock().unwrap());

        tokio::spawn(async move {
            for entity in script {
                if tx.send(entity).await.is_err() {
                    return;
                }
            }
            token.cancelled().await;
        });

        Ok(rx)
    }
}

#[derive(Default)]
struct RecordingDelivery {
    registered: Mutex<Vec<String>>,
    updated: Mutex<Vec<String>>,
    events: Mutex<Vec<String>>,
    remote_disabled: Mutex<bool>,
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn register(&self, sensor: &SensorUpdate) -> Result<bool, DeliveryError> {
        self.registered
            .lock()
            .unwrap()
            .push(sensor.unique_id.clone());
        Ok(true)
    }

    async fn update(&self, sensor: &SensorUpdate) -> Result<(), DeliveryError> {
        self.updated.lock().unwrap().push(sensor.unique_id.clone());
        Ok(())
    }

    async fn entity_disabled(&self, _id: &str) -> Result<bool, DeliveryError> {
        Ok(*self.remote_disabled.lock().unwrap())
    }

    async fn send_event(&self, event: &EventData) -> Result<(), DeliveryError> {
        self.events.lock().unwrap().push(event.event_type.clone());
        Ok(())
    }

    async fn send_location(
        &self,
        _location: &hostlink::LocationUpdate,
    ) -> Result<(), DeliveryError> {
        Ok(())
    }
}

fn sensor(id: &str) -> Entity {
    Entity::Sensor(SensorUpdate::new(id, "Reading", json!(1)))
}

fn init_tracing() {
    // RUST_LOG=hostlink=trace makes a failing run readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Harness {
    _dir: TempDir,
    registry: Arc<Registry>,
    delivery: Arc<RecordingDelivery>,
}

impl Harness {
    fn new() -> Self {
        init_tracing();
        let dir = TempDir::new().unwrap();
        Self {
            registry: Arc::new(Registry::load(dir.path()).unwrap()),
            delivery: Arc::new(RecordingDelivery::default()),
            _dir: dir,
        }
    }

    /// Runs the full pipeline over the given producers until all of their
    /// scripts are drained, then cancels the root token.
    async fn run(&self, workers: Vec<Arc<dyn EntityWorker>>) {
        let root = CancellationToken::new();
        let manager = WorkerManager::new();
        let merged = manager.start_entity_workers(&root, &workers).await;

        let dispatcher = Dispatcher::new(self.registry.clone(), self.delivery.clone());
        let run = tokio::spawn({
            let token = root.clone();
            async move { dispatcher.run(token, merged).await }
        });

        // Scripts are finite; give the pipeline time to drain them.
        tokio::time::sleep(Duration::from_millis(100)).await;
        root.cancel();
        tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .expect("dispatch loop did not stop after cancellation")
            .unwrap();
    }
}

#[tokio::test]
async fn first_sighting_registers_second_updates() {
    let harness = Harness::new();

    harness
        .run(vec![ScriptedWorker::new(
            "cpu",
            vec![sensor("cpu_temp"), sensor("cpu_temp")],
        )])
        .await;

    assert_eq!(
        harness.delivery.registered.lock().unwrap().as_slice(),
        ["cpu_temp"]
    );
    assert_eq!(
        harness.delivery.updated.lock().unwrap().as_slice(),
        ["cpu_temp"]
    );
    assert!(harness.registry.is_registered("cpu_temp"));
}

#[tokio::test]
async fn registration_survives_reload() {
    let harness = Harness::new();

    harness
        .run(vec![ScriptedWorker::new("cpu", vec![sensor("cpu_temp")])])
        .await;

    // A fresh registry over the same directory sees the registration.
    let reloaded = Registry::load(harness._dir.path()).unwrap();
    assert!(reloaded.is_registered("cpu_temp"));
}

#[tokio::test]
async fn many_producers_feed_one_dispatcher() {
    let harness = Harness::new();

    harness
        .run(vec![
            ScriptedWorker::new("a", vec![sensor("a_0"), sensor("a_1")]),
            ScriptedWorker::new("b", vec![sensor("b_0")]),
            ScriptedWorker::new(
                "events",
                vec![Entity::Event(EventData::new("lid_closed", json!({})))],
            ),
        ])
        .await;

    let mut registered = harness.delivery.registered.lock().unwrap().clone();
    registered.sort();
    assert_eq!(registered, ["a_0", "a_1", "b_0"]);
    assert_eq!(
        harness.delivery.events.lock().unwrap().as_slice(),
        ["lid_closed"]
    );
}

#[tokio::test]
async fn remote_disable_is_learned_through_the_pipeline() {
    let harness = Harness::new();
    harness.registry.set_registered("wifi", true).unwrap();
    *harness.delivery.remote_disabled.lock().unwrap() = true;

    harness
        .run(vec![ScriptedWorker::new("net", vec![sensor("wifi")])])
        .await;

    // Reconciled into the registry; nothing was delivered.
    assert!(harness.registry.is_disabled("wifi"));
    assert!(harness.delivery.updated.lock().unwrap().is_empty());
}

#[tokio::test]
async fn root_cancellation_stops_a_quiet_pipeline() {
    // A producer that never emits: shutdown must not hang on it.
    let harness = Harness::new();

    let root = CancellationToken::new();
    let manager = WorkerManager::new();
    let merged = manager
        .start_entity_workers(&root, &[ScriptedWorker::new("quiet", vec![])])
        .await;

    let dispatcher = Dispatcher::new(harness.registry.clone(), harness.delivery.clone());
    let run = tokio::spawn({
        let token = root.clone();
        async move { dispatcher.run(token, merged).await }
    });

    root.cancel();
    tokio::time::timeout(Duration::from_secs(1), run)
        .await
        .expect("dispatch loop did not stop after cancellation")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn scheduled_poller_feeds_the_pipeline() {
    // A polling producer: a scheduled job samples a counter and pushes a
    // sensor reading into the producer stream on every firing.
    let root = CancellationToken::new();
    let scheduler = Scheduler::start(root.clone());
    let (tx, mut merged) = mpsc::channel(16);

    let samples = Arc::new(AtomicUsize::new(0));
    let job_samples = samples.clone();
    scheduler
        .schedule_job(
            JobFn::arc("sample counter", move |_token| {
                let tx = tx.clone();
                let samples = job_samples.clone();
                async move {
                    let seq = samples.fetch_add(1, Ordering::SeqCst);
                    let _ = tx.send(sensor(&format!("sample_{seq}"))).await;
                    Ok(())
                }
            }),
            ScheduleTrigger::every(Duration::from_secs(30)),
        )
        .unwrap();

    tokio::time::sleep(Duration::from_secs(95)).await;
    root.cancel();

    let mut seen = Vec::new();
    while let Ok(Some(entity)) = tokio::time::timeout(Duration::from_secs(1), merged.recv()).await {
        seen.push(entity);
        if seen.len() == 3 {
            break;
        }
    }
    assert_eq!(seen.len(), 3);
    assert_eq!(samples.load(Ordering::SeqCst), 3);
}
