//! # Busline Runtime
//!
//! Runtime implementation for the Busline booking client.
//!
//! Owns the client state, runs reducers one action at a time and executes the
//! effects they return, feeding resulting actions back in.
//!
//! - **Store**: state, reducer and environment behind one handle
//! - **Effect execution**: futures and timers spawned on tokio, results fed back
//! - **`EffectHandle`**: Lets callers wait until the effects of an action have settled
//!
//! ## Example
//!
//! ```ignore
//! use busline_runtime::Store;
//!
//! let store = Store::new(AppState::default(), AppReducer::new(), environment);
//!
//! // Send an action and wait for the backend round-trip it triggers
//! store.send_cascading(AppAction::search()).await?.wait().await;
//!
//! // Read state
//! let found = store.state(|s| s.booking.found.len()).await;
//! ```

use busline_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Store errors
pub mod error {
    use thiserror::Error;

    /// Failures sending to or waiting on a [`crate::Store`]
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// `shutdown` was called; no further actions are accepted
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Effects were still in flight when the shutdown deadline passed
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// A wait (handle or `send_and_wait_for`) hit its deadline
        #[error("Timed out waiting for the store")]
        Timeout,

        /// Nobody is broadcasting actions any more
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// What an [`EffectHandle`] waits for
///
/// - **Direct**: the effects returned for the sent action
/// - **Cascading**: also the effects of every action those effects feed back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    /// Effects of the sent action only
    Direct,

    /// Track effects transitively through the feedback loop
    Cascading,
}

/// Settles once the effects of a sent action are done
///
/// ```ignore
/// let mut handle = store.send(AppAction::Booking(BookingAction::Search)).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    mode: TrackingMode,
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Caller-facing handle plus the tracking context effects carry
    fn new(mode: TrackingMode) -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            mode,
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            mode,
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// A handle with nothing to wait for
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            mode: TrackingMode::Direct,
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Tracking mode this handle was created with
    #[must_use]
    pub const fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Wait until the tracked effect count drops to zero
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// [`EffectHandle::wait`] with a deadline
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("mode", &self.mode)
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Shared counter and wake-up channel behind a handle
#[derive(Clone)]
struct EffectTracking {
    mode: TrackingMode,
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Releases one tracked effect on drop, including when the effect panics
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Releases one store-wide pending effect on drop
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The store and its effect executor
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreError, TrackingMode,
    };
    use tokio::sync::{broadcast, watch};

    /// Runs one reducer over one state tree
    ///
    /// State sits behind a `RwLock`: reducers run under the write lock, one
    /// action at a time, and readers go through [`Store::state`].
    ///
    /// Network responses are applied in whatever order they arrive; reducers
    /// that care about ordering must guard against stale results themselves.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Broadcast of every action produced by effects.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// New store; observers that fall 64 actions behind start lagging
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (action_broadcast, _) = broadcast::channel(64);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Access the injected environment
        #[must_use]
        pub fn environment(&self) -> &E {
            &self.environment
        }

        /// Reduce `action` and start its effects
        ///
        /// Returns once the reducer has run and effects are spawned. Await the
        /// handle to wait for the effects themselves.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.send_internal(action, TrackingMode::Direct).await
        }

        /// Send an action whose handle settles only when every follow-up action
        /// produced through the feedback loop has also settled
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        pub async fn send_cascading(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.send_internal(action, TrackingMode::Cascading).await
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast before sending, so the result
        /// cannot be missed, then returns the first action matching `predicate`.
        ///
        /// # Errors
        ///
        /// [`StoreError::Timeout`] when nothing matches in time,
        /// [`StoreError::ChannelClosed`] if the broadcast closes and
        /// [`StoreError::ShutdownInProgress`] after shutdown.
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Only actions produced by effects are broadcast, not the actions
        /// passed to `send` directly.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let seat_count = store.state(|s| s.booking.seats.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Stop accepting actions and wait for in-flight effects
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when the timeout elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(20);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        async fn send_internal(
            &self,
            action: A,
            mode: TrackingMode,
        ) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.total").increment(1);

            let (handle, tracking) = EffectHandle::new(mode);

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Feed an action produced by an effect back into the store
        async fn feed_back(&self, action: A, mode: TrackingMode) {
            let _ = self.action_broadcast.send(action.clone());

            match self.send_internal(action, mode).await {
                Ok(mut child) if mode == TrackingMode::Cascading => child.wait().await,
                Ok(_) => {},
                Err(error) => tracing::debug!(%error, "Dropped feedback action"),
            }
        }

        /// Spawn a tracked task that keeps both the handle and shutdown counters up
        fn spawn_tracked<F>(&self, tracking: &EffectTracking, task: F)
        where
            F: std::future::Future<Output = ()> + Send + 'static,
        {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);

            let guard = DecrementGuard(tracking.clone());
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            tokio::spawn(async move {
                let _guard = guard;
                let _pending_guard = pending_guard;
                task.await;
            });
        }

        /// Execute an effect with tracking
        ///
        /// Effect failures never halt the store: a panicking effect task is
        /// isolated and the guards still release its counters.
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let store = self.clone();
                    let mode = tracking.mode;

                    self.spawn_tracked(&tracking, async move {
                        if let Some(action) = fut.await {
                            store.feed_back(action, mode).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let store = self.clone();
                    let mode = tracking.mode;

                    self.spawn_tracked(&tracking, async move {
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action, mode).await;
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential")
                        .increment(1);
                    let store = self.clone();
                    let mode = tracking.mode;

                    self.spawn_tracked(&tracking, async move {
                        for effect in effects {
                            let (sub_tx, mut sub_rx) = watch::channel(());
                            let sub_tracking = EffectTracking {
                                mode,
                                counter: Arc::new(AtomicUsize::new(0)),
                                notifier: Arc::new(sub_tx),
                            };

                            store.execute_effect(effect, sub_tracking.clone());

                            while sub_tracking.counter.load(Ordering::SeqCst) > 0 {
                                if sub_rx.changed().await.is_err() {
                                    break;
                                }
                            }
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use busline_core::{SmallVec, smallvec};

    #[derive(Debug, Clone, Default)]
    struct Seats {
        held: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum SeatAction {
        Hold,
        Release,
        Look,
        HoldFromBackend,
        HoldAfterTwoHops,
        HoldAfterTimer,
        HoldThreeAtOnce,
        HoldHoldRelease,
        BackendCrashes,
    }

    struct SeatReducer;

    fn respond(action: SeatAction) -> Effect<SeatAction> {
        Effect::Future(Box::pin(async move { Some(action) }))
    }

    impl Reducer for SeatReducer {
        type State = Seats;
        type Action = SeatAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Seats,
            action: SeatAction,
            _env: &(),
        ) -> SmallVec<[Effect<SeatAction>; 4]> {
            match action {
                SeatAction::Hold => {
                    state.held += 1;
                    SmallVec::new()
                },
                SeatAction::Release => {
                    state.held -= 1;
                    SmallVec::new()
                },
                SeatAction::Look => SmallVec::new(),
                SeatAction::HoldFromBackend => smallvec![respond(SeatAction::Hold)],
                SeatAction::HoldAfterTwoHops => smallvec![Effect::Future(Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Some(SeatAction::HoldFromBackend)
                }))],
                SeatAction::HoldAfterTimer => smallvec![Effect::Delay {
                    duration: Duration::from_millis(10),
                    action: Box::new(SeatAction::Hold),
                }],
                SeatAction::HoldThreeAtOnce => smallvec![Effect::Parallel(vec![
                    respond(SeatAction::Hold),
                    respond(SeatAction::Hold),
                    respond(SeatAction::Hold),
                ])],
                SeatAction::HoldHoldRelease => smallvec![Effect::Sequential(vec![
                    respond(SeatAction::Hold),
                    respond(SeatAction::Hold),
                    respond(SeatAction::Release),
                ])],
                #[allow(clippy::panic)] // Exercises effect isolation
                SeatAction::BackendCrashes => smallvec![Effect::Future(Box::pin(async {
                    panic!("backend task crashed");
                }))],
            }
        }
    }

    fn store() -> Store<Seats, SeatAction, (), SeatReducer> {
        Store::new(Seats::default(), SeatReducer, ())
    }

    #[tokio::test]
    async fn reducer_runs_before_send_returns() {
        let store = store();

        let _ = store.send(SeatAction::Hold).await;
        let _ = store.send(SeatAction::Hold).await;
        let _ = store.send(SeatAction::Release).await;
        let _ = store.send(SeatAction::Look).await;

        assert_eq!(store.state(|s| s.held).await, 1);
    }

    #[tokio::test]
    async fn future_result_is_fed_back() -> Result<(), StoreError> {
        let store = store();

        store.send(SeatAction::HoldFromBackend).await?.wait().await;

        assert_eq!(store.state(|s| s.held).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn cascading_handle_covers_follow_up_effects() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send_cascading(SeatAction::HoldAfterTwoHops).await?;
        assert_eq!(handle.mode(), TrackingMode::Cascading);
        handle.wait_with_timeout(Duration::from_secs(1)).await?;

        assert_eq!(store.state(|s| s.held).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn delayed_action_arrives_after_timer() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(SeatAction::HoldAfterTimer).await?;
        assert_eq!(store.state(|s| s.held).await, 0);

        handle.wait().await;
        assert_eq!(store.state(|s| s.held).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn parallel_and_sequential_effects_all_run() -> Result<(), StoreError> {
        let store = store();

        store.send(SeatAction::HoldThreeAtOnce).await?.wait().await;
        assert_eq!(store.state(|s| s.held).await, 3);

        store.send(SeatAction::HoldHoldRelease).await?.wait().await;
        assert_eq!(store.state(|s| s.held).await, 4);
        Ok(())
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_matching_action() -> Result<(), StoreError> {
        let store = store();

        let action = store
            .send_and_wait_for(
                SeatAction::HoldFromBackend,
                |a| *a == SeatAction::Hold,
                Duration::from_secs(1),
            )
            .await?;

        assert_eq!(action, SeatAction::Hold);
        Ok(())
    }

    #[tokio::test]
    async fn send_and_wait_for_gives_up() {
        let store = store();

        let result = store
            .send_and_wait_for(SeatAction::Look, |a| *a == SeatAction::Hold, Duration::from_millis(20))
            .await;

        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn clones_share_one_state() {
        let store = store();
        let other = store.clone();

        let _ = store.send(SeatAction::Hold).await;
        assert_eq!(other.state(|s| s.held).await, 1);
    }

    #[tokio::test]
    async fn crashed_effect_does_not_poison_store() -> Result<(), StoreError> {
        let store = store();

        store.send(SeatAction::BackendCrashes).await?.wait().await;
        let _ = store.send(SeatAction::Hold).await;

        assert_eq!(store.state(|s| s.held).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn actions_after_shutdown_are_rejected() -> Result<(), StoreError> {
        let store = store();

        let _ = store.send(SeatAction::HoldAfterTimer).await?;
        store.shutdown(Duration::from_secs(1)).await?;

        assert!(matches!(
            store.send(SeatAction::Hold).await,
            Err(StoreError::ShutdownInProgress)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn completed_handle_does_not_block() {
        let mut handle = EffectHandle::completed();
        assert!(handle.wait_with_timeout(Duration::from_millis(10)).await.is_ok());
    }
}
