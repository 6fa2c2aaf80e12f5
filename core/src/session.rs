//! Session Context: a read-only view of who is signed in.
//!
//! Sign-in and sign-out belong to an external identity provider; this module
//! only answers whether remote operations are allowed right now.

use std::sync::RwLock;

/// Opaque user identifier issued by the identity provider.
pub type IdentityRef = String;

pub trait SessionContext: Send + Sync {
    /// True when a remote-eligible credential exists at this instant.
    fn is_authenticated(&self) -> bool;

    /// The identity that owns local data, which may outlive the credential
    /// (an expired token still knows whose data this is).
    fn current_identity(&self) -> Option<IdentityRef>;
}

/// No one signed in; everything stays on the device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignedOut;

impl SessionContext for SignedOut {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn current_identity(&self) -> Option<IdentityRef> {
        None
    }
}

/// A session whose state can be flipped in place, for embedding and tests.
#[derive(Debug, Default)]
pub struct StaticSession {
    state: RwLock<(Option<IdentityRef>, bool)>,
}

impl StaticSession {
    #[must_use]
    pub fn signed_in(identity: &str) -> Self {
        Self {
            state: RwLock::new((Some(identity.to_string()), true)),
        }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Drop the credential but keep the identity, as a lapsed token would.
    pub fn expire(&self) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.1 = false;
    }

    pub fn sign_out(&self) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *state = (None, false);
    }
}

impl SessionContext for StaticSession {
    fn is_authenticated(&self) -> bool {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.0.is_some() && state.1
    }

    fn current_identity(&self) -> Option<IdentityRef> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .0
            .clone()
    }
}
