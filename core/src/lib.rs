//! # Busline Core
//!
//! Core traits and types for the Busline booking client.
//!
//! The booking client is modelled as a single state tree updated by reducers.
//! Reducers never perform I/O: they mutate state synchronously and return
//! effect descriptions, which the runtime executes and feeds back as actions.
//!
//! ## Building blocks
//!
//! - **State**: Domain state for a feature slice (search, seats, checkout, session)
//! - **Action**: All possible inputs to a reducer (user intents and backend responses)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`, no I/O
//! - **Effect**: A value describing work for the runtime to do later
//! - **Environment**: Backend, storage and clock handles behind traits
//!
//! ## Example
//!
//! ```ignore
//! use busline_core::*;
//!
//! #[derive(Clone, Debug, Default)]
//! struct SeatState {
//!     selected: Vec<String>,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum SeatAction {
//!     Toggle(String),
//! }
//!
//! impl Reducer for SeatReducer {
//!     type State = SeatState;
//!     type Action = SeatAction;
//!     type Environment = SeatEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut SeatState,
//!         action: SeatAction,
//!         env: &SeatEnvironment,
//!     ) -> SmallVec<[Effect<SeatAction>; 4]> {
//!         // Business logic goes here
//!         SmallVec::new()
//!     }
//! }
//! ```

// Shared by every crate in the workspace
pub use chrono::{DateTime, NaiveDate, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Reducer composition (`combine_reducers`, `scope_reducer`)
pub mod composition;

/// Declarative macros for building effects
pub mod effect_macros;

pub use reducer::Reducer;
pub use effect::Effect;

/// The [`Reducer`](reducer::Reducer) trait
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Turns one action into a state change plus follow-up work
    ///
    /// A reducer may read the environment (clock, reference generator) but
    /// must leave every network or disk call to the effects it returns.
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for BookingReducer {
    ///     type State = BookingState;
    ///     type Action = BookingAction;
    ///     type Environment = AppEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut BookingState,
    ///         action: BookingAction,
    ///         env: &AppEnvironment,
    ///     ) -> SmallVec<[Effect<BookingAction>; 4]> {
    ///         match action {
    ///             BookingAction::ToggleSeat(id) => {
    ///                 state.toggle_seat(&id);
    ///                 SmallVec::new()
    ///             }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// Slice of client state owned by this reducer
        type State;

        /// Inputs: user intents and backend replies
        type Action;

        /// Handles to the outside world
        type Environment;

        /// Apply `action` to `state` and describe any follow-up work
        ///
        /// Invalid input is reported through state (an error field or a
        /// notice effect) rather than a return value.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// The [`Effect`](effect::Effect) type
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Work a reducer hands to the store
    ///
    /// Nothing runs until the store picks the effect up. Any action an effect
    /// yields goes back through the same reducer.
    pub enum Effect<Action> {
        /// Nothing to do
        None,

        /// Spawn all children at once
        Parallel(Vec<Effect<Action>>),

        /// Run children one after another
        Sequential(Vec<Effect<Action>>),

        /// Dispatch an action after a pause
        Delay {
            /// Pause length
            duration: Duration,
            /// Dispatched once the pause elapses
            action: Box<Action>,
        },

        /// An async task, typically a backend call
        ///
        /// `Some(action)` is dispatched back to the store; `None` ends the chain.
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Futures have no Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Shorthand for [`Effect::Parallel`]
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Shorthand for [`Effect::Sequential`]
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Lift an effect into a parent action type
        ///
        /// Used when a slice reducer is embedded in an app-level reducer: every
        /// action the effect eventually produces is wrapped by `f`.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            Action: Send + 'static,
            F: Fn(Action) -> B + Clone + Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => Effect::Parallel(
                    effects.into_iter().map(|e| e.map(f.clone())).collect(),
                ),
                Effect::Sequential(effects) => Effect::Sequential(
                    effects.into_iter().map(|e| e.map(f.clone())).collect(),
                ),
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Future(fut) => {
                    Effect::Future(Box::pin(async move { fut.await.map(f) }))
                },
            }
        }
    }
}

/// Small traits reducers read through their environment
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Source of the current time
    pub trait Clock: Send + Sync {
        /// Current instant in UTC
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Generates human-readable references for newly assembled records
    ///
    /// References are not required to be globally unique; collisions are an
    /// accepted property of the default generator.
    pub trait ReferenceGenerator: Send + Sync {
        /// Produce the next reference
        fn next_reference(&self) -> String;
    }
}
