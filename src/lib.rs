//! Real-time booking and catalog state core for a barbershop app.
//!
//! Everything persistent lives in a hosted document store consumed through
//! the [`store::DocumentStore`] contract; [`state::AppCore`] mirrors its
//! collections into watch channels, writes mutations through, and gates the
//! admin surface behind the branding passcode. [`memory::MemoryStore`] is an
//! in-process store for development and tests.
//!
//! ```no_run
//! use std::sync::Arc;
//! use barbersync::memory::MemoryStore;
//! use barbersync::models::Appointment;
//! use barbersync::state::AppCore;
//!
//! # async fn run() -> Result<(), barbersync::store::StoreError> {
//! let core = AppCore::connect(Arc::new(MemoryStore::new())).await;
//! let mut appointments = core.appointments();
//!
//! core.add_appointment(Appointment {
//!     customer_name: "Ali".to_string(),
//!     date: "2025-06-01".to_string(),
//!     time: "10:00 AM".to_string(),
//!     ..Appointment::default()
//! })
//! .await?;
//!
//! appointments.changed().await.ok();
//! assert_eq!(appointments.borrow().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod memory;
pub mod models;
pub mod prefs;
pub mod state;
pub mod store;
pub mod upload;

pub use config::AppConfig;
pub use state::AppCore;
pub use store::{DocumentStore, StoreError};
