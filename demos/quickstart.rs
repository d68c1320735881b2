//! Boots the core against the in-process store, plays through an admin
//! session and a customer booking, and prints the resulting mirrors.
//!
//! Run with `cargo run --example quickstart`.

use std::sync::Arc;

use barbersync::config::AppConfig;
use barbersync::memory::MemoryStore;
use barbersync::models::{Appointment, AppointmentStatus, Service};
use barbersync::prefs::PrefsStore;
use barbersync::state::AppCore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    if config.is_store_configured() {
        log::info!("Store credentials found for {}", config.store_project_id);
    } else {
        log::info!("No store credentials; using the in-process store");
    }

    let core = AppCore::connect(Arc::new(MemoryStore::new())).await;
    let mut services = core.services();
    let mut appointments = core.appointments();
    let mut notifications = core.notifications();

    // Admin signs in with the seeded passcode and fills the catalog.
    assert!(core.login_admin("1234"));
    core.update_service(Service {
        name: "Signature Cut".to_string(),
        category: "Haircut".to_string(),
        price: 500,
        duration: 45,
        description: "Precision cut, styling, and lineup.".to_string(),
        ..Service::default()
    })
    .await?;
    let service = services.wait_for(|s| !s.is_empty()).await?.first().cloned();
    let service = service.ok_or("service mirror empty")?;
    log::info!("Catalog ready: {} ({} min)", service.name, service.duration);

    // A customer books it and the device remembers their details.
    let prefs = PrefsStore::new(config.prefs_path.clone());
    core.add_appointment(Appointment {
        customer_name: "Ali".to_string(),
        customer_phone: "0300-1234567".to_string(),
        service_id: service.id.clone(),
        date: "2025-06-01".to_string(),
        time: "10:00 AM".to_string(),
        ..Appointment::default()
    })
    .await?;
    prefs.remember("Ali", "0300-1234567")?;

    let booked = appointments.wait_for(|a| !a.is_empty()).await?[0].clone();
    log::info!(
        "Booked: {} on {} at {} ({})",
        booked.customer_name,
        booked.date,
        booked.time,
        booked.status.as_str()
    );

    let note = notifications.wait_for(|n| !n.is_empty()).await?[0].clone();
    log::info!("Notification: {} - {}", note.title, note.body);

    // Admin confirms.
    core.update_appointment(&booked.id, AppointmentStatus::Confirmed)
        .await?;
    let confirmed = appointments
        .wait_for(|a| a.first().map(|apt| apt.status) == Some(AppointmentStatus::Confirmed))
        .await?[0]
        .clone();
    log::info!("Final status: {}", confirmed.status.as_str());

    core.shutdown().await;
    Ok(())
}
