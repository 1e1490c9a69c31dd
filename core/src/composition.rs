//! Reducer composition utilities
//!
//! An application state is usually a tree of feature slices, each with its own
//! reducer and action type. This module glues them together:
//!
//! - **`scope_reducer`**: Focus a slice reducer on one field of the parent state,
//!   translating parent actions into slice actions and lifting effects back up
//! - **`combine_reducers`**: Run several reducers over the same state/action
//!
//! # Example
//!
//! ```
//! use busline_core::{Effect, Reducer, SmallVec};
//! use busline_core::composition::{combine_reducers, scope_reducer};
//!
//! #[derive(Clone, Default)]
//! struct SearchState { origin: String }
//!
//! #[derive(Clone)]
//! enum SearchAction { SetOrigin(String) }
//!
//! #[derive(Clone)]
//! enum AppAction { Search(SearchAction) }
//!
//! #[derive(Default)]
//! struct AppState { search: SearchState }
//!
//! struct SearchReducer;
//!
//! impl Reducer for SearchReducer {
//!     type State = SearchState;
//!     type Action = SearchAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut SearchState, action: SearchAction, _env: &()) -> SmallVec<[Effect<SearchAction>; 4]> {
//!         match action {
//!             SearchAction::SetOrigin(origin) => state.origin = origin,
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! fn search(app: &mut AppState) -> &mut SearchState {
//!     &mut app.search
//! }
//!
//! let app = combine_reducers(vec![Box::new(scope_reducer(
//!     SearchReducer,
//!     search,
//!     |action: AppAction| match action {
//!         AppAction::Search(a) => Some(a),
//!     },
//!     AppAction::Search,
//! ))]);
//!
//! let mut state = AppState::default();
//! let _ = app.reduce(&mut state, AppAction::Search(SearchAction::SetOrigin("Kampala".into())), &());
//! assert_eq!(state.search.origin, "Kampala");
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
#[must_use]
pub fn combine_reducers<S, A, E>(
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
}

impl<S, A, E> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    /// Number of reducers in the combination
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether the combination is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects);
        }

        all_effects
    }
}

/// Scopes a slice reducer to one field of a larger state.
///
/// - `state` borrows the slice out of the parent state
/// - `extract` turns a parent action into a slice action, or `None` when the
///   action is not meant for this slice (the slice is then left untouched)
/// - `embed` wraps actions produced by the slice's effects back into the parent type
///
/// `extract` may also translate actions addressed to other slices, which is how
/// one slice reacts to another's outcome without sharing state.
pub fn scope_reducer<S, SubS, A, SubA, E, R>(
    reducer: R,
    state: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
) -> ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    ScopedReducer {
        reducer,
        state,
        extract,
        embed,
        _phantom: std::marker::PhantomData,
    }
}

/// A reducer focused on a slice of parent state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    reducer: R,
    state: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
    _phantom: std::marker::PhantomData<fn() -> E>,
}

impl<S, SubS, A, SubA, E, R> Reducer for ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
    SubA: Send + 'static,
    A: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(sub_action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let sub_state = (self.state)(state);
        self.reducer
            .reduce(sub_state, sub_action, env)
            .into_iter()
            .map(|effect| effect.map(self.embed))
            .collect()
    }
}
