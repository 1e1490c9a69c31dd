//! # Busline Testing
//!
//! Testing utilities and helpers for the Busline booking client.
//!
//! This crate provides:
//! - Deterministic implementations of environment traits (clock, references)
//! - A Given-When-Then harness for reducers
//! - Helpers for driving effects and stores to completion
//!
//! ## Example
//!
//! ```ignore
//! use busline_testing::{helpers, test_clock};
//! use busline_runtime::Store;
//!
//! #[tokio::test]
//! async fn search_populates_results() {
//!     let store = Store::new(AppState::default(), AppReducer::new(), test_environment());
//!
//!     helpers::send_and_settle(&store, AppAction::search()).await;
//!
//!     let found = store.state(|s| s.booking.found.len()).await;
//!     assert_eq!(found, 2);
//! }
//! ```

use busline_core::environment::{Clock, ReferenceGenerator};
use chrono::{DateTime, Utc};

/// Ergonomic Given-When-Then testing for reducers
pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Deterministic implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, ReferenceGenerator, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use busline_testing::mocks::FixedClock;
    /// use busline_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2);
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which cannot happen.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Predictable booking references: `ECO-TEST00001`, `ECO-TEST00002`, ...
    ///
    /// ```
    /// use busline_testing::mocks::SequentialReferences;
    /// use busline_core::environment::ReferenceGenerator;
    ///
    /// let refs = SequentialReferences::new();
    /// assert_eq!(refs.next_reference(), "ECO-TEST00001");
    /// assert_eq!(refs.next_reference(), "ECO-TEST00002");
    /// ```
    #[derive(Debug, Default)]
    pub struct SequentialReferences {
        next: AtomicU32,
    }

    impl SequentialReferences {
        /// Start the sequence at 1
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU32::new(0),
            }
        }
    }

    impl ReferenceGenerator for SequentialReferences {
        fn next_reference(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            format!("ECO-TEST{n:05}")
        }
    }
}

/// Helpers for running effects and stores in tests
pub mod helpers {
    use busline_core::effect::Effect;
    use busline_core::reducer::Reducer;
    use busline_runtime::Store;
    use futures::future::BoxFuture;
    use std::time::Duration;

    /// Upper bound on how long a test waits for a store to settle
    pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Execute effects without a store and collect the actions they produce
    ///
    /// Delays are not slept; their action is yielded immediately. Parallel
    /// effects are drained in declaration order, which keeps results stable.
    pub fn collect_actions<A>(effects: Vec<Effect<A>>) -> BoxFuture<'static, Vec<A>>
    where
        A: Send + 'static,
    {
        Box::pin(async move {
            let mut actions = Vec::new();
            for effect in effects {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => actions.extend(fut.await),
                    Effect::Delay { action, .. } => actions.push(*action),
                    Effect::Parallel(children) | Effect::Sequential(children) => {
                        actions.extend(collect_actions(children).await);
                    },
                }
            }
            actions
        })
    }

    /// Send an action and wait until it and every follow-up action have settled
    ///
    /// # Panics
    ///
    /// Panics if the store rejects the action or does not settle within
    /// [`SETTLE_TIMEOUT`].
    #[allow(clippy::expect_used)] // Test helper
    pub async fn send_and_settle<S, A, E, R>(store: &Store<S, A, E, R>, action: A)
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        store
            .send_cascading(action)
            .await
            .expect("store should accept the action")
            .wait_with_timeout(SETTLE_TIMEOUT)
            .await
            .expect("store should settle");
    }

    /// Install a test-writer tracing subscriber, ignoring repeat installs
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("busline=debug")
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, SequentialReferences, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use busline_core::effect::Effect;
    use std::time::Duration;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn sequential_references_are_padded() {
        let refs = SequentialReferences::new();
        for _ in 0..9 {
            let _ = refs.next_reference();
        }
        assert_eq!(refs.next_reference(), "ECO-TEST00010");
    }

    #[tokio::test]
    async fn collect_actions_flattens_nested_effects() {
        let effects = vec![
            Effect::None,
            Effect::Future(Box::pin(async { Some(1) })),
            Effect::Parallel(vec![
                Effect::Delay {
                    duration: Duration::from_secs(60),
                    action: Box::new(2),
                },
                Effect::Future(Box::pin(async { None })),
            ]),
            Effect::Sequential(vec![Effect::Future(Box::pin(async { Some(3) }))]),
        ];

        assert_eq!(helpers::collect_actions(effects).await, vec![1, 2, 3]);
    }
}
