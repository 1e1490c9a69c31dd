//! Session lifecycle: restore, login, register, logout

use crate::api::{Credentials, Registration};
use crate::environment::AppEnvironment;
use crate::notify::{Notice, notify};
use crate::types::Session;
use busline_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};

/// Session slice
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Current session, if signed in
    pub session: Option<Session>,
    /// Set once persisted state has been read
    pub initialized: bool,
    /// A login/register/logout call is in flight
    pub is_loading: bool,
    /// Last failure message
    pub last_error: Option<String>,
}

impl AuthState {
    /// Whether a user is signed in
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

/// Session actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthAction {
    // Commands
    /// Read the persisted session (startup)
    Restore,
    /// Sign in
    Login {
        /// Email and password
        credentials: Credentials,
    },
    /// Create an account and sign in
    Register {
        /// Registration form
        registration: Registration,
    },
    /// Sign out locally and on the backend
    Logout,

    // Events
    /// Persisted session read
    Restored {
        /// Session found in storage
        session: Option<Session>,
    },
    /// Login or registration succeeded
    Authenticated {
        /// New session
        session: Session,
    },
    /// Login or registration failed
    AuthFailed {
        /// User-facing message
        error: String,
    },
    /// Logout finished; the local session is already gone
    LoggedOut {
        /// Backend failure, if any
        error: Option<String>,
    },
}

/// Reducer for the session slice
#[derive(Clone, Debug, Default)]
pub struct AuthReducer;

impl AuthReducer {
    /// Creates a new `AuthReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn reject(state: &mut AuthState, env: &AppEnvironment, title: &str, error: String) -> SmallVec<[Effect<AuthAction>; 4]> {
        tracing::debug!(%error, "Auth request rejected");
        state.last_error = Some(error.clone());
        smallvec![notify(&env.notifier, Notice::error(title, error))]
    }
}

impl Reducer for AuthReducer {
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            AuthAction::Restore => {
                let sessions = env.sessions.clone();
                smallvec![async_effect! {
                    Some(AuthAction::Restored { session: sessions.restore() })
                }]
            },

            AuthAction::Login { credentials } => {
                if state.is_loading {
                    return SmallVec::new();
                }
                if let Err(error) = credentials.validate() {
                    return Self::reject(state, env, "Login failed", error);
                }

                state.is_loading = true;
                state.last_error = None;

                let auth = env.auth.clone();
                smallvec![async_effect! {
                    match auth.login(credentials).await {
                        Ok(response) => Some(AuthAction::Authenticated { session: response.into() }),
                        Err(error) => Some(AuthAction::AuthFailed { error: error.user_message("Login failed") }),
                    }
                }]
            },

            AuthAction::Register { registration } => {
                if state.is_loading {
                    return SmallVec::new();
                }
                if let Err(error) = registration.validate() {
                    return Self::reject(state, env, "Registration failed", error);
                }

                state.is_loading = true;
                state.last_error = None;

                let auth = env.auth.clone();
                smallvec![async_effect! {
                    match auth.register(registration).await {
                        Ok(response) => Some(AuthAction::Authenticated { session: response.into() }),
                        Err(error) => Some(AuthAction::AuthFailed { error: error.user_message("Registration failed") }),
                    }
                }]
            },

            AuthAction::Logout => {
                let previous = state.session.take();
                state.is_loading = previous.is_some();
                state.last_error = None;

                let auth = env.auth.clone();
                let sessions = env.sessions.clone();
                smallvec![async_effect! {
                    let error = match previous {
                        Some(session) => auth
                            .logout(&session)
                            .await
                            .err()
                            .map(|e| e.user_message("Logout failed")),
                        None => None,
                    };
                    if let Err(error) = sessions.clear() {
                        tracing::warn!(%error, "Could not clear persisted session");
                    }
                    Some(AuthAction::LoggedOut { error })
                }]
            },

            // ========== Events ==========
            AuthAction::Restored { session } => {
                state.session = session;
                state.initialized = true;
                SmallVec::new()
            },

            AuthAction::Authenticated { session } => {
                tracing::info!(user_id = %session.user.id, "Signed in");
                state.is_loading = false;
                state.initialized = true;
                state.last_error = None;

                let sessions = env.sessions.clone();
                let persisted = session.clone();
                let welcome = Notice::success("Signed in", format!("Welcome, {}", session.user.name));
                state.session = Some(session);

                smallvec![
                    busline_core::fire_and_forget! {
                        if let Err(error) = sessions.persist(&persisted) {
                            tracing::warn!(%error, "Could not persist session");
                        }
                    },
                    notify(&env.notifier, welcome),
                ]
            },

            AuthAction::AuthFailed { error } => {
                state.is_loading = false;
                state.last_error = Some(error.clone());
                smallvec![notify(&env.notifier, Notice::error("Authentication failed", error))]
            },

            AuthAction::LoggedOut { error } => {
                state.is_loading = false;
                match error {
                    Some(error) => {
                        tracing::warn!(%error, "Backend logout failed; local session cleared anyway");
                        state.last_error = Some(error.clone());
                        smallvec![notify(&env.notifier, Notice::error("Logout failed", error))]
                    },
                    None => {
                        tracing::info!("Signed out");
                        SmallVec::new()
                    },
                }
            },
        }
    }
}
