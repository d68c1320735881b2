//! Admin passcode gate.
//!
//! A single shared passcode stored on the branding document, compared in
//! plaintext. The flag gates UI visibility only; the backing store enforces
//! no authorization of its own. Never persisted: every start is logged out.

use tokio::sync::watch;

/// Used when branding has not loaded or carries no passcode.
pub const FALLBACK_ADMIN_PASSCODE: &str = "1234";

pub fn passcode_matches(entered: &str, configured: &str) -> bool {
    let expected = if configured.is_empty() {
        FALLBACK_ADMIN_PASSCODE
    } else {
        configured
    };
    entered == expected
}

pub struct AdminGate {
    authenticated: watch::Sender<bool>,
}

impl AdminGate {
    pub fn new() -> Self {
        let (authenticated, _) = watch::channel(false);
        Self { authenticated }
    }

    /// Sets the flag and returns true on a matching passcode; a wrong
    /// passcode is a plain false, never an error.
    pub fn login(&self, entered: &str, configured: &str) -> bool {
        if passcode_matches(entered, configured) {
            self.authenticated.send_replace(true);
            true
        } else {
            false
        }
    }

    pub fn logout(&self) {
        self.authenticated.send_replace(false);
    }

    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }
}

impl Default for AdminGate {
    fn default() -> Self {
        Self::new()
    }
}
