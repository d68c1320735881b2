//! Shared application state.
//!
//! [`AppCore`] owns an in-memory mirror of every collection the app shows:
//! branding, services, barbers, offers, appointments, gallery, notifications.
//! One background listener per collection replaces its mirror wholesale on
//! every snapshot the store pushes; mutations write through to the store and
//! never touch a mirror directly, so a caller's view becomes consistent only
//! once the corresponding snapshot lands. Mirrors are exposed as watch
//! channels any UI binding can observe.

use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::AdminGate;
use crate::models::{
    AppNotification, Appointment, AppointmentStatus, Barber, BrandingConfig, GalleryImage, Offer,
    RecordId, Service, APPOINTMENTS_COLLECTION, BARBERS_COLLECTION, BRANDING_DOC_ID,
    CONFIG_COLLECTION, GALLERY_COLLECTION, NOTIFICATIONS_COLLECTION, OFFERS_COLLECTION,
    SERVICES_COLLECTION,
};
use crate::store::{
    CollectionQuery, Document, DocumentStore, Fields, SortOrder, StoreError, Subscription,
    Unsubscribe,
};

/// The appointments mirror keeps the 50 most recent bookings by date.
pub const APPOINTMENTS_MIRROR_LIMIT: usize = 50;
/// The notifications mirror keeps the 20 most recent entries.
pub const NOTIFICATIONS_MIRROR_LIMIT: usize = 20;

struct Listener {
    cancel: Unsubscribe,
    task: JoinHandle<()>,
}

pub struct AppCore {
    store: Option<Arc<dyn DocumentStore>>,
    branding: watch::Sender<BrandingConfig>,
    services: watch::Sender<Vec<Service>>,
    barbers: watch::Sender<Vec<Barber>>,
    offers: watch::Sender<Vec<Offer>>,
    appointments: watch::Sender<Vec<Appointment>>,
    gallery: watch::Sender<Vec<GalleryImage>>,
    notifications: watch::Sender<Vec<AppNotification>>,
    connected: watch::Sender<bool>,
    admin: AdminGate,
    listeners: Mutex<Vec<Listener>>,
}

impl AppCore {
    /// Core without a backing store: mirrors stay empty, connectivity stays
    /// false, and every mutation fails with [`StoreError::NotConfigured`].
    pub fn offline() -> Self {
        Self::new(None)
    }

    /// Seeds the branding singleton if absent, then opens one subscription
    /// per collection. Seed failures are logged, not fatal: the listeners
    /// catch up once the store comes back.
    pub async fn connect(store: Arc<dyn DocumentStore>) -> Self {
        let core = Self::new(Some(store.clone()));
        seed_branding(store.as_ref()).await;

        let listeners = vec![
            spawn_branding_listener(
                store.as_ref(),
                core.branding.clone(),
                core.connected.clone(),
            ),
            spawn_mirror_listener(
                store.as_ref(),
                CollectionQuery::all(SERVICES_COLLECTION),
                core.services.clone(),
            ),
            spawn_mirror_listener(
                store.as_ref(),
                CollectionQuery::all(BARBERS_COLLECTION),
                core.barbers.clone(),
            ),
            spawn_mirror_listener(
                store.as_ref(),
                CollectionQuery::all(OFFERS_COLLECTION),
                core.offers.clone(),
            ),
            spawn_mirror_listener(
                store.as_ref(),
                CollectionQuery::ordered(
                    APPOINTMENTS_COLLECTION,
                    "date",
                    SortOrder::Descending,
                    APPOINTMENTS_MIRROR_LIMIT,
                ),
                core.appointments.clone(),
            ),
            spawn_mirror_listener(
                store.as_ref(),
                CollectionQuery::all(GALLERY_COLLECTION),
                core.gallery.clone(),
            ),
            spawn_mirror_listener(
                store.as_ref(),
                CollectionQuery::ordered(
                    NOTIFICATIONS_COLLECTION,
                    "timestamp",
                    SortOrder::Descending,
                    NOTIFICATIONS_MIRROR_LIMIT,
                ),
                core.notifications.clone(),
            ),
        ];
        *core.lock_listeners() = listeners;

        core
    }

    fn new(store: Option<Arc<dyn DocumentStore>>) -> Self {
        let (branding, _) = watch::channel(BrandingConfig::default());
        let (services, _) = watch::channel(Vec::new());
        let (barbers, _) = watch::channel(Vec::new());
        let (offers, _) = watch::channel(Vec::new());
        let (appointments, _) = watch::channel(Vec::new());
        let (gallery, _) = watch::channel(Vec::new());
        let (notifications, _) = watch::channel(Vec::new());
        let (connected, _) = watch::channel(false);

        Self {
            store,
            branding,
            services,
            barbers,
            offers,
            appointments,
            gallery,
            notifications,
            connected,
            admin: AdminGate::new(),
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<Listener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Releases every subscription exactly once and waits for the listener
    /// tasks to drain. Calling again is a no-op.
    pub async fn shutdown(&self) {
        let listeners = std::mem::take(&mut *self.lock_listeners());
        for listener in listeners {
            let Listener { mut cancel, task } = listener;
            cancel.release();
            if let Err(err) = task.await {
                log::warn!("Mirror listener ended abnormally: {err}");
            }
        }
    }

    fn store(&self) -> Result<&dyn DocumentStore, StoreError> {
        self.store.as_deref().ok_or(StoreError::NotConfigured)
    }

    // --- reactive views ---

    pub fn branding(&self) -> watch::Receiver<BrandingConfig> {
        self.branding.subscribe()
    }

    pub fn services(&self) -> watch::Receiver<Vec<Service>> {
        self.services.subscribe()
    }

    pub fn barbers(&self) -> watch::Receiver<Vec<Barber>> {
        self.barbers.subscribe()
    }

    pub fn offers(&self) -> watch::Receiver<Vec<Offer>> {
        self.offers.subscribe()
    }

    pub fn appointments(&self) -> watch::Receiver<Vec<Appointment>> {
        self.appointments.subscribe()
    }

    pub fn gallery(&self) -> watch::Receiver<Vec<GalleryImage>> {
        self.gallery.subscribe()
    }

    pub fn notifications(&self) -> watch::Receiver<Vec<AppNotification>> {
        self.notifications.subscribe()
    }

    pub fn connected(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn current_branding(&self) -> BrandingConfig {
        self.branding.borrow().clone()
    }

    pub fn admin_authenticated(&self) -> watch::Receiver<bool> {
        self.admin.watch()
    }

    pub fn is_admin_authenticated(&self) -> bool {
        self.admin.is_authenticated()
    }

    // --- admin gate ---

    pub fn login_admin(&self, passcode: &str) -> bool {
        let configured = self.branding.borrow().admin_password.clone();
        self.admin.login(passcode, &configured)
    }

    pub fn logout_admin(&self) {
        self.admin.logout();
    }

    // --- write-through mutations ---

    /// Full replace of the branding singleton.
    pub async fn update_branding(&self, branding: BrandingConfig) -> Result<(), StoreError> {
        self.store()?
            .set_document(CONFIG_COLLECTION, BRANDING_DOC_ID, encode_fields(&branding)?)
            .await
    }

    /// Creates the booking (always an insert; any supplied id is stripped)
    /// and returns the generated id. A booking-type notification is written
    /// afterwards as a best-effort secondary record: its failure is logged
    /// and dropped, never rolled into the booking result.
    pub async fn add_appointment(&self, appointment: Appointment) -> Result<String, StoreError> {
        let store = self.store()?;
        let id = store
            .create_document(APPOINTMENTS_COLLECTION, payload(&appointment)?)
            .await?;

        let note = AppNotification::booking(&appointment.customer_name, &appointment.date);
        match payload(&note) {
            Ok(fields) => {
                if let Err(err) = store.create_document(NOTIFICATIONS_COLLECTION, fields).await {
                    log::warn!("Booking notification write failed: {err}");
                }
            }
            Err(err) => log::warn!("Booking notification could not be encoded: {err}"),
        }

        Ok(id)
    }

    /// Admin-only status transition. Last write wins; nothing blocks a
    /// confirm-then-cancel sequence.
    pub async fn update_appointment(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<(), StoreError> {
        let mut fields = Fields::new();
        fields.insert(
            "status".to_string(),
            Value::String(status.as_str().to_string()),
        );
        self.store()?
            .update_fields(APPOINTMENTS_COLLECTION, id, fields)
            .await
    }

    pub async fn update_service(&self, service: Service) -> Result<(), StoreError> {
        self.upsert(SERVICES_COLLECTION, &service.id, payload(&service)?)
            .await
    }

    pub async fn delete_service(&self, id: &str) -> Result<(), StoreError> {
        self.store()?.delete_document(SERVICES_COLLECTION, id).await
    }

    pub async fn update_barber(&self, barber: Barber) -> Result<(), StoreError> {
        self.upsert(BARBERS_COLLECTION, &barber.id, payload(&barber)?)
            .await
    }

    pub async fn delete_barber(&self, id: &str) -> Result<(), StoreError> {
        self.store()?.delete_document(BARBERS_COLLECTION, id).await
    }

    pub async fn update_offer(&self, offer: Offer) -> Result<(), StoreError> {
        self.upsert(OFFERS_COLLECTION, &offer.id, payload(&offer)?)
            .await
    }

    pub async fn delete_offer(&self, id: &str) -> Result<(), StoreError> {
        self.store()?.delete_document(OFFERS_COLLECTION, id).await
    }

    pub async fn add_gallery_image(&self, url: &str) -> Result<String, StoreError> {
        let image = GalleryImage::new(url);
        self.store()?
            .create_document(GALLERY_COLLECTION, payload(&image)?)
            .await
    }

    pub async fn delete_gallery_image(&self, id: &str) -> Result<(), StoreError> {
        self.store()?.delete_document(GALLERY_COLLECTION, id).await
    }

    pub async fn mark_notification_read(&self, id: &str) -> Result<(), StoreError> {
        let mut fields = Fields::new();
        fields.insert("read".to_string(), Value::Bool(true));
        self.store()?
            .update_fields(NOTIFICATIONS_COLLECTION, id, fields)
            .await
    }

    /// Create on [`RecordId::Draft`], full replace on [`RecordId::Persisted`].
    async fn upsert(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let store = self.store()?;
        match RecordId::from_raw(id) {
            RecordId::Draft => store.create_document(collection, fields).await.map(|_| ()),
            RecordId::Persisted(id) => store.set_document(collection, &id, fields).await,
        }
    }
}

/// Get-then-conditional-create. Not guarded against a concurrent seeder;
/// both write identical defaults.
async fn seed_branding(store: &dyn DocumentStore) {
    match store.get_document(CONFIG_COLLECTION, BRANDING_DOC_ID).await {
        Ok(Some(_)) => {}
        Ok(None) => match encode_fields(&BrandingConfig::default()) {
            Ok(fields) => {
                if let Err(err) = store
                    .set_document(CONFIG_COLLECTION, BRANDING_DOC_ID, fields)
                    .await
                {
                    log::warn!("Could not seed branding defaults: {err}");
                }
            }
            Err(err) => log::warn!("Could not encode branding defaults: {err}"),
        },
        Err(err) => log::warn!("Could not check branding document: {err}"),
    }
}

fn spawn_branding_listener(
    store: &dyn DocumentStore,
    branding: watch::Sender<BrandingConfig>,
    connected: watch::Sender<bool>,
) -> Listener {
    let Subscription { mut events, cancel } =
        store.subscribe_document(CONFIG_COLLECTION, BRANDING_DOC_ID);
    let task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                Ok(Some(doc)) => {
                    match serde_json::from_value::<BrandingConfig>(Value::Object(doc.fields)) {
                        Ok(config) => {
                            branding.send_replace(config);
                            connected.send_replace(true);
                        }
                        Err(err) => log::warn!("Ignoring malformed branding document: {err}"),
                    }
                }
                // Absent until the seed write lands.
                Ok(None) => {}
                Err(err) => {
                    log::warn!("Branding subscription error: {err}");
                    connected.send_replace(false);
                }
            }
        }
    });
    Listener { cancel, task }
}

fn spawn_mirror_listener<T>(
    store: &dyn DocumentStore,
    query: CollectionQuery,
    mirror: watch::Sender<Vec<T>>,
) -> Listener
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let collection = query.collection.clone();
    let Subscription { mut events, cancel } = store.subscribe_collection(query);
    let task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                Ok(docs) => {
                    let items = docs
                        .into_iter()
                        .filter_map(|doc| decode_document::<T>(&collection, doc))
                        .collect();
                    mirror.send_replace(items);
                }
                Err(err) => log::warn!("{collection} subscription error: {err}"),
            }
        }
    });
    Listener { cancel, task }
}

fn encode_fields<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value).map_err(|err| StoreError::Codec(err.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Codec(format!("expected an object, got {other}"))),
    }
}

/// Serializes a record and strips its identifier; the id travels in the
/// document path, never in the field map.
fn payload<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    let mut fields = encode_fields(value)?;
    fields.remove("id");
    Ok(fields)
}

/// Folds the store-assigned id back into the record. Malformed documents are
/// skipped with a warning rather than poisoning the whole snapshot.
fn decode_document<T: DeserializeOwned>(collection: &str, doc: Document) -> Option<T> {
    let Document { id, mut fields } = doc;
    fields.insert("id".to_string(), Value::String(id));
    match serde_json::from_value(Value::Object(fields)) {
        Ok(item) => Some(item),
        Err(err) => {
            log::warn!("Skipping malformed {collection} document: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_strips_the_identifier() {
        let service = Service {
            id: "abc123".to_string(),
            name: "Haircut".to_string(),
            price: 500,
            duration: 30,
            ..Service::default()
        };
        let fields = payload(&service).expect("encode");
        assert!(fields.get("id").is_none());
        assert_eq!(fields["name"], json!("Haircut"));
        assert_eq!(fields["price"], json!(500));
    }

    #[test]
    fn decode_folds_the_id_back_in() {
        let doc = Document {
            id: "generated-id-0001".to_string(),
            fields: json!({ "name": "Haircut", "price": 500 })
                .as_object()
                .expect("object")
                .clone(),
        };
        let service: Service = decode_document("services", doc).expect("decode");
        assert_eq!(service.id, "generated-id-0001");
        assert_eq!(service.name, "Haircut");
        // Absent fields take their defaults.
        assert_eq!(service.duration, 0);
    }

    #[test]
    fn decode_skips_documents_with_wrong_types() {
        let doc = Document {
            id: "bad".to_string(),
            fields: json!({ "price": "not a number" })
                .as_object()
                .expect("object")
                .clone(),
        };
        assert!(decode_document::<Service>("services", doc).is_none());
    }

    #[tokio::test]
    async fn offline_core_rejects_mutations() {
        let core = AppCore::offline();
        assert!(!core.is_connected());
        assert!(core.services().borrow().is_empty());

        let result = core.add_appointment(Appointment::default()).await;
        assert!(matches!(result, Err(StoreError::NotConfigured)));
        let result = core.delete_service("abc").await;
        assert!(matches!(result, Err(StoreError::NotConfigured)));
    }

    #[tokio::test]
    async fn offline_core_still_gates_admin() {
        let core = AppCore::offline();
        assert!(core.login_admin("1234"));
        assert!(core.is_admin_authenticated());
        core.logout_admin();
        assert!(!core.is_admin_authenticated());
    }
}
