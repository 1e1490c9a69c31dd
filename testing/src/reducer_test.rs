//! Given/When/Then harness for a single reducer call

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use busline_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Runs one action through a reducer and checks the resulting state and effects
///
/// ```ignore
/// use busline_testing::ReducerTest;
///
/// ReducerTest::new(BookingReducer)
///     .with_env(test_environment())
///     .given_state(BookingState::with_seats(seats))
///     .when_action(BookingAction::ToggleSeat(seat_id))
///     .then_state(|state| {
///         assert_eq!(state.selected_seats.len(), 1);
///     })
///     .then_effects(|effects| {
///         assertions::assert_no_effects(effects);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: Clone,
    A: Clone,
{
    /// Harness for `reducer`; state, action and environment are set separately
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Environment passed to the reducer
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Given: state before the action
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// When: the action under test
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Then: check the state after the action
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Then: check the returned effects
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Reduce once, then run every state check followed by every effect check
    ///
    /// # Panics
    ///
    /// Panics when `given_state`, `when_action` or `with_env` was skipped, and
    /// when a check fails.
    #[allow(clippy::panic, clippy::expect_used)] // Test harness
    pub fn run(self) {
        let mut state = self.initial_state.expect("call given_state() before run()");
        let action = self.action.expect("call when_action() before run()");
        let env = self.environment.expect("call with_env() before run()");

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }
        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Checks over a reducer's returned effects
pub mod assertions {
    use busline_core::effect::Effect;

    /// Nothing to execute: empty, or a lone `Effect::None`
    ///
    /// # Panics
    ///
    /// Panics on any real effect.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "expected no effects, got {effects:?}"
        );
    }

    /// Exactly `expected` effects
    ///
    /// # Panics
    ///
    /// Panics on a different count.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(effects.len(), expected, "unexpected effect count");
    }

    /// At least one `Future` effect, i.e. a backend call or storage write
    ///
    /// # Panics
    ///
    /// Panics when there is none.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "expected a Future effect"
        );
    }

    /// Assert that effects contain at least one `Delay` effect
    ///
    /// # Panics
    ///
    /// Panics if no `Delay` effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Delay { .. })),
            "expected a Delay effect"
        );
    }

    /// Assert that a `Delay` effect schedules the expected action
    ///
    /// # Panics
    ///
    /// Panics if no `Delay` effect carries `expected`.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_delays_action<A>(effects: &[Effect<A>], expected: &A)
    where
        A: PartialEq + std::fmt::Debug,
    {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Delay { action, .. } if action.as_ref() == expected)),
            "expected a Delay scheduling {expected:?}, got {effects:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busline_core::effect::Effect;
    use busline_core::reducer::Reducer;
    use std::time::Duration;

    #[derive(Clone, Debug, Default)]
    struct SeatState {
        selected: Vec<u32>,
        notice: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum SeatAction {
        Toggle(u32),
        Continue,
        DismissNotice,
    }

    struct SeatReducer;

    struct NoEnv;

    impl Reducer for SeatReducer {
        type State = SeatState;
        type Action = SeatAction;
        type Environment = NoEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> smallvec::SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                SeatAction::Toggle(seat) => {
                    if let Some(pos) = state.selected.iter().position(|s| *s == seat) {
                        state.selected.remove(pos);
                    } else {
                        state.selected.push(seat);
                    }
                    smallvec::smallvec![Effect::None]
                },
                SeatAction::Continue if state.selected.is_empty() => {
                    state.notice = Some("No seats selected".to_string());
                    smallvec::smallvec![Effect::Delay {
                        duration: Duration::from_secs(3),
                        action: Box::new(SeatAction::DismissNotice),
                    }]
                },
                SeatAction::Continue => smallvec::SmallVec::new(),
                SeatAction::DismissNotice => {
                    state.notice = None;
                    smallvec::SmallVec::new()
                },
            }
        }
    }

    #[test]
    fn toggling_an_unselected_seat_selects_it() {
        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(SeatState::default())
            .when_action(SeatAction::Toggle(7))
            .then_state(|state| {
                assert_eq!(state.selected, vec![7]);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn toggling_a_selected_seat_deselects_it() {
        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(SeatState {
                selected: vec![3, 7],
                notice: None,
            })
            .when_action(SeatAction::Toggle(3))
            .then_state(|state| {
                assert_eq!(state.selected, vec![7]);
            })
            .run();
    }

    #[test]
    fn continue_without_seats_schedules_dismissal() {
        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(SeatState::default())
            .when_action(SeatAction::Continue)
            .then_state(|state| {
                assert_eq!(state.notice.as_deref(), Some("No seats selected"));
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_delay_effect(effects);
                assertions::assert_delays_action(effects, &SeatAction::DismissNotice);
            })
            .run();
    }

    #[test]
    fn none_counts_as_no_effects() {
        assertions::assert_no_effects::<SeatAction>(&[Effect::None]);
        assertions::assert_no_effects::<SeatAction>(&[]);
    }

    #[test]
    fn pending_future_is_detected() {
        let effects = [Effect::<SeatAction>::Future(Box::pin(async { None }))];
        assertions::assert_has_future_effect(&effects);
    }
}
