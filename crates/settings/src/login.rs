use drawx_session::{Identity, SessionError, SessionRegistry};

use crate::cache::SettingsCache;

/// Who is logged in, as far as the session records can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    LoggedIn(Identity),
    /// Nobody is logged in
    NoSession,
    /// Several identities are logged in; the user has to pick one
    Ambiguous { sessions: usize },
}

impl LoginState {
    pub fn into_identity(self) -> Option<Identity> {
        match self {
            LoginState::LoggedIn(identity) => Some(identity),
            LoginState::NoSession | LoginState::Ambiguous { .. } => None,
        }
    }
}

impl<S: SessionRegistry> SettingsCache<S> {
    /// Current login state. Only the multiple-sessions failure is turned
    /// into a state; every other lookup error is returned as is.
    pub fn login_state(&self) -> Result<LoginState, SessionError> {
        match self.sessions.current_identity() {
            Ok(Some(identity)) => Ok(LoginState::LoggedIn(identity)),
            Ok(None) => Ok(LoginState::NoSession),
            Err(SessionError::MultipleSessions { count }) => Ok(LoginState::Ambiguous { sessions: count }),
            Err(e) => Err(e),
        }
    }

    /// The logged-in identity, or `None`.
    ///
    /// `None` covers both "nobody logged in" and "several logged in"; use
    /// [`login_state`](Self::login_state) to tell them apart.
    pub fn logged_in_user(&self) -> Result<Option<Identity>, SessionError> {
        let state = self.login_state()?;
        if let LoginState::Ambiguous { sessions } = state {
            log::debug!("{sessions} users logged in, reporting none");
        }
        Ok(state.into_identity())
    }
}
