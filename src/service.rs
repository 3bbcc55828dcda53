//! Compositor service: the single sequential owner of all scene state.
//!
//! Commands from the UI/HTTP layer and load completions from background tasks
//! all funnel through one `tokio::select!` loop; the [`SceneCompositor`] is
//! never touched from anywhere else. Loads are spawned fire-and-forget and
//! report back with their generation tag — the compositor decides whether the
//! result is still current. Committed snapshots are broadcast to observers.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info};

use crate::assets::{AssetLoader, LoadedAsset};
use crate::error::AssetError;
use crate::scene::{
    Axis, Generation, LoadRequest, SceneCompositor, SceneSnapshot, SlotKind,
};

/// Inbound operations accepted by the compositor service
#[derive(Debug)]
pub enum Command {
    SwitchActor {
        identifier: String,
    },
    SetGarment {
        identifier: String,
        texture: Option<Vec<u8>>,
    },
    ClearGarment,
    Reset,
    BeginGesture,
    EndGesture,
    Pan {
        dx: f32,
        dy: f32,
        touch_count: u32,
    },
    Pinch {
        factor: f32,
    },
    Rotate {
        delta: f32,
    },
    SetGarmentOffset {
        axis: Axis,
        value: f32,
    },
    SetGarmentScale {
        value: f32,
    },
    SetGarmentTilt {
        value: f32,
    },
    SetGarmentPitch {
        value: f32,
    },
    SetActorHeight {
        value: f32,
    },
    SetActorWeight {
        value: f32,
    },
    Snapshot {
        reply: oneshot::Sender<SceneSnapshot>,
    },
}

/// Completion message sent back by a spawned load task
#[derive(Debug)]
struct LoadDone {
    slot: SlotKind,
    identifier: String,
    generation: Generation,
    result: Result<LoadedAsset, AssetError>,
}

/// Cloneable handle for talking to the compositor service
#[derive(Clone)]
pub struct CompositorHandle {
    cmd_tx: mpsc::Sender<Command>,
    snapshot_tx: broadcast::Sender<SceneSnapshot>,
}

impl CompositorHandle {
    pub async fn switch_actor(&self, identifier: impl Into<String>) {
        self.send(Command::SwitchActor {
            identifier: identifier.into(),
        })
        .await;
    }

    pub async fn set_garment(&self, identifier: impl Into<String>, texture: Option<Vec<u8>>) {
        self.send(Command::SetGarment {
            identifier: identifier.into(),
            texture,
        })
        .await;
    }

    pub async fn clear_garment(&self) {
        self.send(Command::ClearGarment).await;
    }

    pub async fn reset(&self) {
        self.send(Command::Reset).await;
    }

    pub async fn begin_gesture(&self) {
        self.send(Command::BeginGesture).await;
    }

    pub async fn end_gesture(&self) {
        self.send(Command::EndGesture).await;
    }

    pub async fn pan(&self, dx: f32, dy: f32, touch_count: u32) {
        self.send(Command::Pan { dx, dy, touch_count }).await;
    }

    pub async fn pinch(&self, factor: f32) {
        self.send(Command::Pinch { factor }).await;
    }

    pub async fn rotate(&self, delta: f32) {
        self.send(Command::Rotate { delta }).await;
    }

    pub async fn set_garment_offset(&self, axis: Axis, value: f32) {
        self.send(Command::SetGarmentOffset { axis, value }).await;
    }

    pub async fn set_garment_scale(&self, value: f32) {
        self.send(Command::SetGarmentScale { value }).await;
    }

    pub async fn set_garment_tilt(&self, value: f32) {
        self.send(Command::SetGarmentTilt { value }).await;
    }

    pub async fn set_garment_pitch(&self, value: f32) {
        self.send(Command::SetGarmentPitch { value }).await;
    }

    pub async fn set_actor_height(&self, value: f32) {
        self.send(Command::SetActorHeight { value }).await;
    }

    pub async fn set_actor_weight(&self, value: f32) {
        self.send(Command::SetActorWeight { value }).await;
    }

    /// Current committed scene state
    pub async fn snapshot(&self) -> Option<SceneSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await;
        rx.await.ok()
    }

    /// Subscribe to committed snapshot updates
    pub fn subscribe(&self) -> broadcast::Receiver<SceneSnapshot> {
        self.snapshot_tx.subscribe()
    }

    async fn send(&self, command: Command) {
        if self.cmd_tx.send(command).await.is_err() {
            error!("Compositor service is gone; command dropped");
        }
    }
}

/// Spawn the compositor service task and return its handle
pub fn spawn(
    compositor: SceneCompositor,
    loader: Arc<dyn AssetLoader>,
    shutdown_rx: broadcast::Receiver<()>,
) -> CompositorHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (snapshot_tx, _) = broadcast::channel(64);

    let handle = CompositorHandle {
        cmd_tx,
        snapshot_tx: snapshot_tx.clone(),
    };

    tokio::spawn(run(compositor, loader, cmd_rx, snapshot_tx, shutdown_rx));

    handle
}

async fn run(
    mut compositor: SceneCompositor,
    loader: Arc<dyn AssetLoader>,
    mut cmd_rx: mpsc::Receiver<Command>,
    snapshot_tx: broadcast::Sender<SceneSnapshot>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let (done_tx, mut done_rx) = mpsc::channel::<LoadDone>(16);
    let mut last_published: Option<SceneSnapshot> = None;

    info!("Compositor service started");

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => {
                        if let Some(request) = apply_command(&mut compositor, cmd) {
                            spawn_load(&loader, &done_tx, request);
                        }
                    }
                    None => {
                        debug!("Command channel closed");
                        break;
                    }
                }
            }
            Some(done) = done_rx.recv() => {
                let follow_up = match done.slot {
                    SlotKind::Actor => compositor.on_actor_loaded(
                        &done.identifier,
                        done.generation,
                        done.result,
                    ),
                    SlotKind::Garment => {
                        compositor.on_garment_loaded(
                            &done.identifier,
                            done.generation,
                            done.result,
                        );
                        None
                    }
                };
                if let Some(request) = follow_up {
                    spawn_load(&loader, &done_tx, request);
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Compositor service shutting down");
                break;
            }
        }

        publish(&compositor, &snapshot_tx, &mut last_published);
    }
}

/// Apply one command to the compositor; returns a load to spawn, if any
fn apply_command(compositor: &mut SceneCompositor, command: Command) -> Option<LoadRequest> {
    match command {
        Command::SwitchActor { identifier } => {
            return Some(compositor.switch_actor(&identifier));
        }
        Command::SetGarment { identifier, texture } => {
            return compositor.set_garment(&identifier, texture);
        }
        Command::ClearGarment => compositor.clear_garment(),
        Command::Reset => compositor.reset(),
        Command::BeginGesture => compositor.begin_gesture(),
        Command::EndGesture => compositor.end_gesture(),
        Command::Pan { dx, dy, touch_count } => compositor.on_pan(dx, dy, touch_count),
        Command::Pinch { factor } => compositor.on_pinch(factor),
        Command::Rotate { delta } => compositor.on_rotate(delta),
        Command::SetGarmentOffset { axis, value } => compositor.set_garment_offset(axis, value),
        Command::SetGarmentScale { value } => compositor.set_garment_scale(value),
        Command::SetGarmentTilt { value } => compositor.set_garment_tilt(value),
        Command::SetGarmentPitch { value } => compositor.set_garment_pitch(value),
        Command::SetActorHeight { value } => compositor.set_actor_height(value),
        Command::SetActorWeight { value } => compositor.set_actor_weight(value),
        Command::Snapshot { reply } => {
            let _ = reply.send(compositor.snapshot());
        }
    }
    None
}

/// Spawn a load task; its completion is marshaled back onto the service loop.
/// Superseded loads are not aborted — their results are discarded on arrival.
fn spawn_load(
    loader: &Arc<dyn AssetLoader>,
    done_tx: &mpsc::Sender<LoadDone>,
    request: LoadRequest,
) {
    let loader = Arc::clone(loader);
    let done_tx = done_tx.clone();

    tokio::spawn(async move {
        let result = loader.load(&request.identifier).await;
        let done = LoadDone {
            slot: request.slot,
            identifier: request.identifier,
            generation: request.generation,
            result,
        };
        if done_tx.send(done).await.is_err() {
            debug!("Compositor service stopped before load completion");
        }
    });
}

fn publish(
    compositor: &SceneCompositor,
    snapshot_tx: &broadcast::Sender<SceneSnapshot>,
    last_published: &mut Option<SceneSnapshot>,
) {
    let snapshot = compositor.snapshot();
    if last_published.as_ref() != Some(&snapshot) {
        let _ = snapshot_tx.send(snapshot.clone());
        *last_published = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::config::{CatalogConfig, GestureConfig, SliderConfig};
    use crate::render::HeadlessBackend;
    use crate::scene::Catalog;

    /// Loader that resolves immediately
    struct InstantLoader;

    #[async_trait]
    impl AssetLoader for InstantLoader {
        async fn load(&self, identifier: &str) -> Result<LoadedAsset, AssetError> {
            if identifier == "missing" {
                return Err(AssetError::NotFound(identifier.to_string()));
            }
            Ok(LoadedAsset {
                identifier: identifier.to_string(),
                data: vec![0u8; 4],
            })
        }
    }

    /// Loader whose completions are released one identifier at a time,
    /// letting tests pick the completion order
    struct GatedLoader {
        gates: HashMap<String, Arc<Notify>>,
    }

    impl GatedLoader {
        fn new(identifiers: &[&str]) -> (Self, HashMap<String, Arc<Notify>>) {
            let gates: HashMap<String, Arc<Notify>> = identifiers
                .iter()
                .map(|id| (id.to_string(), Arc::new(Notify::new())))
                .collect();
            (
                Self {
                    gates: gates.clone(),
                },
                gates,
            )
        }
    }

    #[async_trait]
    impl AssetLoader for GatedLoader {
        async fn load(&self, identifier: &str) -> Result<LoadedAsset, AssetError> {
            if let Some(gate) = self.gates.get(identifier) {
                gate.notified().await;
            }
            Ok(LoadedAsset {
                identifier: identifier.to_string(),
                data: vec![0u8; 4],
            })
        }
    }

    /// The shutdown sender must stay alive for the service to keep running;
    /// dropping it closes the channel, which the loop treats as shutdown.
    fn start(
        loader: Arc<dyn AssetLoader>,
    ) -> (CompositorHandle, HeadlessBackend, broadcast::Sender<()>) {
        let backend = HeadlessBackend::new();
        let compositor = SceneCompositor::new(
            Box::new(backend.clone()),
            Catalog::from_config(&CatalogConfig::default()),
            GestureConfig::default(),
            SliderConfig::default(),
        );
        let (shutdown_tx, _) = broadcast::channel(1);
        let handle = spawn(compositor, loader, shutdown_tx.subscribe());
        (handle, backend, shutdown_tx)
    }

    /// Wait until the published snapshot satisfies a predicate
    async fn wait_for(
        handle: &CompositorHandle,
        predicate: impl Fn(&SceneSnapshot) -> bool,
    ) -> SceneSnapshot {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(snapshot) = handle.snapshot().await {
                    if predicate(&snapshot) {
                        return snapshot;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for scene state")
    }

    #[tokio::test]
    async fn test_switch_and_garment_end_to_end() {
        let (handle, backend, _shutdown) = start(Arc::new(InstantLoader));

        handle.switch_actor("femalemodel").await;
        wait_for(&handle, |s| s.actor.state == "ready").await;

        handle.set_garment("blueshirt", None).await;
        let snapshot = wait_for(&handle, |s| s.garment.state == "ready").await;
        assert_eq!(snapshot.garment.identifier.as_deref(), Some("blueshirt"));
        assert_eq!(backend.entities_from_asset("blueshirt").len(), 1);

        handle.clear_garment().await;
        wait_for(&handle, |s| s.garment.state == "unloaded").await;
        assert!(backend.entities_from_asset("blueshirt").is_empty());
        assert_eq!(backend.entities_from_asset("femalemodel").len(), 1);
    }

    #[tokio::test]
    async fn test_last_writer_wins_with_slow_first_load() {
        let (loader, gates) = GatedLoader::new(&["femalemodel", "malemodel"]);
        let (handle, backend, _shutdown) = start(Arc::new(loader));

        handle.switch_actor("femalemodel").await;
        handle.switch_actor("malemodel").await;
        wait_for(&handle, |s| s.generation == 2).await;

        // The superseded load completes first and must be discarded
        gates["femalemodel"].notify_one();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(backend.entities_from_asset("femalemodel").is_empty());

        gates["malemodel"].notify_one();
        let snapshot = wait_for(&handle, |s| s.actor.state == "ready").await;
        assert_eq!(snapshot.actor.identifier.as_deref(), Some("malemodel"));
        assert!(backend.entities_from_asset("femalemodel").is_empty());
        assert_eq!(backend.entities_from_asset("malemodel").len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_reports_failed_state() {
        let (handle, backend, _shutdown) = start(Arc::new(InstantLoader));

        handle.switch_actor("missing").await;
        let snapshot = wait_for(&handle, |s| s.actor.state == "failed").await;
        assert_eq!(snapshot.actor.identifier.as_deref(), Some("missing"));
        assert_eq!(backend.entities_from_asset("missing").len(), 0);
    }

    #[tokio::test]
    async fn test_sliders_through_service() {
        let (handle, _backend, _shutdown) = start(Arc::new(InstantLoader));

        handle.switch_actor("femalemodel").await;
        wait_for(&handle, |s| s.actor.state == "ready").await;

        handle.set_garment_offset(Axis::Y, 1000.0).await;
        handle.set_garment_tilt(-4.0).await;

        let snapshot = wait_for(&handle, |s| s.garment.transform.offset.y != 0.0).await;
        assert_eq!(snapshot.garment.transform.offset.y, 300.0);
        assert_eq!(snapshot.garment.transform.tilt, -0.8);
    }

    #[tokio::test]
    async fn test_snapshot_broadcast_publishes_updates() {
        let (handle, _backend, _shutdown) = start(Arc::new(InstantLoader));
        let mut rx = handle.subscribe();

        handle.switch_actor("femalemodel").await;

        let snapshot = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let snapshot = rx.recv().await.expect("broadcast closed");
                if snapshot.actor.state == "ready" {
                    return snapshot;
                }
            }
        })
        .await
        .expect("no snapshot received");

        assert_eq!(snapshot.actor.identifier.as_deref(), Some("femalemodel"));
    }
}
