//! Durable device-local customer state.
//!
//! The customer's last-used name and phone number live in a small JSON file
//! outside the document store. The phone number doubles as the lookup key
//! for "my bookings".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::Appointment;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerPrefs {
    pub name: String,
    pub phone: String,
}

pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file is treated as first use.
    pub fn load(&self) -> CustomerPrefs {
        match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                log::warn!("Ignoring corrupt prefs file {}: {err}", self.path.display());
                CustomerPrefs::default()
            }),
            Err(_) => CustomerPrefs::default(),
        }
    }

    pub fn save(&self, prefs: &CustomerPrefs) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(prefs)?;
        fs::write(&self.path, raw)
    }

    /// Called by the booking flow after a successful submit.
    pub fn remember(&self, name: &str, phone: &str) -> io::Result<()> {
        self.save(&CustomerPrefs {
            name: name.to_string(),
            phone: phone.to_string(),
        })
    }

    /// Logs the customer out of booking history; the name is kept so the
    /// booking form stays prefilled.
    pub fn clear_phone(&self) -> io::Result<()> {
        let mut prefs = self.load();
        prefs.phone.clear();
        self.save(&prefs)
    }
}

/// Strict filter over the appointments mirror by the customer's phone.
pub fn bookings_for_phone(appointments: &[Appointment], phone: &str) -> Vec<Appointment> {
    let phone = phone.trim();
    appointments
        .iter()
        .filter(|appointment| appointment.customer_phone == phone)
        .cloned()
        .collect()
}
