//! Shutdown registry
//!
//! Keeps track of every DAG currently being monitored so they can be killed
//! when the process shuts down. The registry is an explicit service: create
//! one, share it (it is cheap to clone) with every monitor, and bind it to
//! the process termination signal with [`ShutdownRegistry::start`].

use dagmon_client::{JobHandle, KILL_REQUEST_TIMEOUT};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Process-wide set of active job handles
///
/// Entries are keyed per registration, so two sessions watching the same DAG
/// hold independent entries. Each entry carries a one-shot kill claim shared
/// with its session: whichever side claims it first sends the only kill.
#[derive(Clone, Default)]
pub struct ShutdownRegistry {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<u64, Entry>>,
    next_key: AtomicU64,
    hook: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
struct Entry {
    handle: Arc<dyn JobHandle>,
    kill_claimed: Arc<AtomicBool>,
}

impl ShutdownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handle for as long as the returned guard lives
    pub fn register(&self, handle: Arc<dyn JobHandle>) -> Registration {
        let key = self.inner.next_key.fetch_add(1, Ordering::Relaxed);
        let job_id = handle.job_id().to_string();
        let kill_claimed = Arc::new(AtomicBool::new(false));

        self.entries().insert(
            key,
            Entry {
                handle,
                kill_claimed: Arc::clone(&kill_claimed),
            },
        );
        debug!("Registered DAG {} for shutdown", job_id);

        Registration {
            registry: self.clone(),
            key,
            job_id,
            kill_claimed,
        }
    }

    /// Removes a registration now instead of when it drops
    pub fn deregister(&self, registration: Registration) {
        drop(registration);
    }

    /// Whether any live registration watches `job_id`
    pub fn contains(&self, job_id: &str) -> bool {
        self.entries()
            .values()
            .any(|entry| entry.handle.job_id() == job_id)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Best-effort kill of every registered DAG
    ///
    /// Works on a snapshot of the set so the lock is not held across network
    /// calls. Registrations whose kill was already claimed are skipped. Kill
    /// failures are logged and never stop the other handles from being
    /// attempted. Returns the number of kill requests issued.
    pub async fn kill_all(&self) -> usize {
        let snapshot: Vec<Arc<dyn JobHandle>> = self
            .entries()
            .values()
            .filter(|entry| !entry.kill_claimed.swap(true, Ordering::SeqCst))
            .map(|entry| Arc::clone(&entry.handle))
            .collect();
        if snapshot.is_empty() {
            return 0;
        }

        info!("Killing {} running DAG(s)", snapshot.len());

        let attempted = snapshot.len();
        let mut kills = JoinSet::new();
        for handle in snapshot {
            kills.spawn(async move {
                let job_id = handle.job_id().to_string();
                match tokio::time::timeout(KILL_REQUEST_TIMEOUT, handle.request_kill()).await {
                    Ok(Ok(())) => debug!("Kill requested for DAG {}", job_id),
                    Ok(Err(e)) => warn!("Failed to kill DAG {}: {}", job_id, e),
                    Err(_) => warn!("Kill request for DAG {} timed out", job_id),
                }
            });
        }

        while let Some(result) = kills.join_next().await {
            if let Err(e) = result {
                warn!("Kill task panicked: {}", e);
            }
        }

        attempted
    }

    /// Binds the registry to the process termination signal
    ///
    /// Must be called from within a tokio runtime. Calling it again while
    /// bound is a no-op.
    pub fn start(&self) {
        self.start_with(shutdown_signal());
    }

    /// Binds the registry to an arbitrary shutdown future
    pub fn start_with<F>(&self, signal: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut hook = self.hook();
        if hook.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let registry = self.clone();
        *hook = Some(tokio::spawn(async move {
            signal.await;
            info!("Shutdown requested");
            registry.kill_all().await;
        }));
    }

    /// Unbinds the shutdown hook without killing anything
    pub fn stop(&self) {
        if let Some(task) = self.hook().take() {
            task.abort();
        }
    }

    pub fn is_started(&self) -> bool {
        self.hook().as_ref().is_some_and(|task| !task.is_finished())
    }

    fn remove(&self, key: u64) -> bool {
        self.entries().remove(&key).is_some()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<u64, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn hook(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner.hook.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deregisters its handle when dropped
pub struct Registration {
    registry: ShutdownRegistry,
    key: u64,
    job_id: String,
    kill_claimed: Arc<AtomicBool>,
}

impl Registration {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Takes the right to kill this DAG
    ///
    /// Returns true exactly once across the session and the shutdown hook.
    pub fn claim_kill(&self) -> bool {
        !self.kill_claimed.swap(true, Ordering::SeqCst)
    }

    pub fn is_kill_claimed(&self) -> bool {
        self.kill_claimed.load(Ordering::SeqCst)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.registry.remove(self.key) {
            debug!("Deregistered DAG {}", self.job_id);
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedHandle;
    use tokio::sync::oneshot;

    #[test]
    fn test_registration_guard_deregisters_on_drop() {
        let registry = ShutdownRegistry::new();
        let registration = registry.register(ScriptedHandle::new("dag_1", vec![]));
        assert_eq!(registration.job_id(), "dag_1");
        assert!(registry.contains("dag_1"));
        assert_eq!(registry.len(), 1);

        drop(registration);
        assert!(registry.is_empty());
        assert!(!registry.contains("dag_1"));
    }

    #[test]
    fn test_explicit_deregister() {
        let registry = ShutdownRegistry::new();
        let registration = registry.register(ScriptedHandle::new("dag_1", vec![]));

        registry.deregister(registration);

        assert!(registry.is_empty());
    }

    #[test]
    fn test_sessions_on_same_dag_have_independent_entries() {
        let registry = ShutdownRegistry::new();
        let first = registry.register(ScriptedHandle::new("dag_1", vec![]));
        let second = registry.register(ScriptedHandle::new("dag_1", vec![]));
        assert_eq!(registry.len(), 2);

        drop(first);

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("dag_1"));
        drop(second);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_kill_claim_is_taken_once() {
        let registry = ShutdownRegistry::new();
        let registration = registry.register(ScriptedHandle::new("dag_1", vec![]));

        assert!(!registration.is_kill_claimed());
        assert!(registration.claim_kill());
        assert!(!registration.claim_kill());
        assert!(registration.is_kill_claimed());
    }

    #[tokio::test]
    async fn test_kill_all_attempts_every_handle() {
        let registry = ShutdownRegistry::new();
        let failing = ScriptedHandle::new("dag_1", vec![]).failing_kills();
        let healthy = ScriptedHandle::new("dag_2", vec![]);
        let _first = registry.register(failing.clone());
        let _second = registry.register(healthy.clone());

        let attempted = registry.kill_all().await;

        assert_eq!(attempted, 2);
        assert_eq!(failing.kill_count(), 1);
        assert_eq!(healthy.kill_count(), 1);
        // Sessions deregister themselves; killing does not
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_kill_all_skips_claimed_registrations() {
        let registry = ShutdownRegistry::new();
        let claimed = ScriptedHandle::new("dag_1", vec![]);
        let open = ScriptedHandle::new("dag_2", vec![]);
        let claimed_registration = registry.register(claimed.clone());
        let open_registration = registry.register(open.clone());
        assert!(claimed_registration.claim_kill());

        assert_eq!(registry.kill_all().await, 1);
        assert_eq!(claimed.kill_count(), 0);
        assert_eq!(open.kill_count(), 1);
        assert!(!open_registration.claim_kill());

        // A second shutdown pass has nothing left to kill
        assert_eq!(registry.kill_all().await, 0);
        assert_eq!(open.kill_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_kill_all_bounds_hanging_kills() {
        let registry = ShutdownRegistry::new();
        let hanging = ScriptedHandle::new("dag_1", vec![]).hanging_kills();
        let healthy = ScriptedHandle::new("dag_2", vec![]);
        let _first = registry.register(hanging.clone());
        let _second = registry.register(healthy.clone());

        let attempted = registry.kill_all().await;

        assert_eq!(attempted, 2);
        assert_eq!(hanging.kill_count(), 1);
        assert_eq!(healthy.kill_count(), 1);
    }

    #[tokio::test]
    async fn test_kill_all_on_empty_registry() {
        let registry = ShutdownRegistry::new();
        assert_eq!(registry.kill_all().await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_hook_kills_registered_handles() {
        let registry = ShutdownRegistry::new();
        let handle = ScriptedHandle::new("dag_1", vec![]);
        let _registration = registry.register(handle.clone());

        let (tx, rx) = oneshot::channel::<()>();
        registry.start_with(async move {
            let _ = rx.await;
        });
        assert!(registry.is_started());

        tx.send(()).unwrap();
        for _ in 0..100 {
            if handle.kill_count() > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(handle.kill_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_unbinds_hook() {
        let registry = ShutdownRegistry::new();
        let handle = ScriptedHandle::new("dag_1", vec![]);
        let _registration = registry.register(handle.clone());

        let (tx, rx) = oneshot::channel::<()>();
        registry.start_with(async move {
            let _ = rx.await;
        });
        registry.stop();
        assert!(!registry.is_started());

        let _ = tx.send(());
        tokio::task::yield_now().await;
        assert_eq!(handle.kill_count(), 0);
    }
}
