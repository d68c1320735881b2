use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const CONFIG_COLLECTION: &str = "config";
pub const BRANDING_DOC_ID: &str = "branding";

pub const SERVICES_COLLECTION: &str = "services";
pub const BARBERS_COLLECTION: &str = "barbers";
pub const OFFERS_COLLECTION: &str = "offers";
pub const APPOINTMENTS_COLLECTION: &str = "appointments";
pub const GALLERY_COLLECTION: &str = "gallery";
pub const NOTIFICATIONS_COLLECTION: &str = "notifications";

/// Categories offered by the service editor. `Service::category` itself is a
/// free string; this set only drives pickers and filters.
pub const SERVICE_CATEGORIES: [&str; 4] = ["Haircut", "Beard", "Facial", "Combo"];

pub const GALLERY_DEFAULT_CATEGORY: &str = "Look";

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Whether an editable record has been persisted yet.
///
/// Editor forms hand records around with a blank id until the store assigns
/// one. Dispatch on this instead of inspecting the raw string: `Draft` means
/// create, `Persisted` means full replace at the known id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordId {
    Draft,
    Persisted(String),
}

impl RecordId {
    pub fn from_raw(id: &str) -> Self {
        let id = id.trim();
        if id.is_empty() {
            RecordId::Draft
        } else {
            RecordId::Persisted(id.to_string())
        }
    }
}

/// The one configuration document holding shop identity, contact info, and
/// integration credentials. Lives at `config/branding` and is seeded with
/// these defaults on first run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandingConfig {
    pub shop_name: String,
    pub shop_slogan: String,
    pub logo_url: String,
    pub hero_image_url: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub contact_phone: String,
    pub whatsapp_number: String,
    pub address: String,
    pub currency: String,
    /// Compared in plaintext by the admin gate. Gates UI visibility only.
    pub admin_password: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
    pub stats: Vec<StatHighlight>,
    pub operating_hours: OperatingHours,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            // Name and slogan stay empty until the live document loads.
            shop_name: String::new(),
            shop_slogan: String::new(),
            logo_url: "https://img.icons8.com/ios-filled/200/ffffff/barber.png".to_string(),
            hero_image_url: String::new(),
            primary_color: "#D4AF37".to_string(),
            secondary_color: "#0A0A0B".to_string(),
            contact_phone: "+92 300 0000000".to_string(),
            whatsapp_number: "923000000000".to_string(),
            address: "Premium Plaza, DHA Phase 5, Lahore".to_string(),
            currency: "PKR".to_string(),
            admin_password: "1234".to_string(),
            cloudinary_cloud_name: String::new(),
            cloudinary_upload_preset: String::new(),
            stats: Vec::new(),
            operating_hours: OperatingHours::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatHighlight {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingHours {
    pub weekdays: String,
    pub weekends: String,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            weekdays: "10:00 AM - 11:00 PM".to_string(),
            weekends: "11:00 AM - 09:00 PM".to_string(),
        }
    }
}

/// A bookable service. Price is an integer in the shop's currency with no
/// minor-unit assumption.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: i64,
    /// Minutes.
    pub duration: u32,
    pub image_url: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Barber {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub image_url: String,
    /// 0.0 to 5.0.
    pub rating: f64,
    pub experience: String,
    pub available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Offer {
    pub id: String,
    pub title: String,
    /// Free-form, e.g. "20%".
    pub discount: String,
    pub image_url: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

/// A booking request. `service_id` and `barber_id` reference catalog records
/// but are not enforced; an empty `barber_id` means "any barber". Nothing
/// prevents two appointments from occupying the same barber, date, and time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Appointment {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub service_id: String,
    pub barber_id: String,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryImage {
    pub id: String,
    pub url: String,
    pub category: String,
    /// RFC 3339.
    pub timestamp: String,
}

impl GalleryImage {
    pub fn new(url: &str) -> Self {
        Self {
            id: String::new(),
            url: url.to_string(),
            category: GALLERY_DEFAULT_CATEGORY.to_string(),
            timestamp: now_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Booking,
    Offer,
    #[default]
    System,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    /// RFC 3339.
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
}

impl AppNotification {
    /// The record written as a side effect of every booking.
    pub fn booking(customer_name: &str, date: &str) -> Self {
        Self {
            id: String::new(),
            title: "New booking request".to_string(),
            body: format!("{customer_name} for {date}"),
            timestamp: now_rfc3339(),
            kind: NotificationKind::Booking,
            read: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_blank_is_draft() {
        assert_eq!(RecordId::from_raw(""), RecordId::Draft);
        assert_eq!(RecordId::from_raw("   "), RecordId::Draft);
    }

    #[test]
    fn record_id_nonblank_is_persisted() {
        assert_eq!(
            RecordId::from_raw("3f0e8a1c-77aa-4f5e-9d2b-8c1d4e5f6a7b"),
            RecordId::Persisted("3f0e8a1c-77aa-4f5e-9d2b-8c1d4e5f6a7b".to_string())
        );
    }

    #[test]
    fn status_serializes_lowercase() {
        let value = serde_json::to_value(AppointmentStatus::Confirmed).expect("serialize");
        assert_eq!(value, serde_json::json!("confirmed"));
    }

    #[test]
    fn appointment_defaults_to_pending() {
        let appointment: Appointment = serde_json::from_str("{}").expect("decode empty");
        assert_eq!(appointment.status, AppointmentStatus::Pending);
    }

    #[test]
    fn notification_kind_uses_type_field() {
        let note = AppNotification::booking("Ali", "2025-06-01");
        let value = serde_json::to_value(&note).expect("serialize");
        assert_eq!(value["type"], serde_json::json!("booking"));
        assert_eq!(value["body"], serde_json::json!("Ali for 2025-06-01"));
        assert!(!value["read"].as_bool().expect("read flag"));
    }

    #[test]
    fn branding_round_trips_camel_case() {
        let branding = BrandingConfig::default();
        let value = serde_json::to_value(&branding).expect("serialize");
        assert!(value.get("shopName").is_some());
        assert!(value.get("adminPassword").is_some());
        assert!(value.get("operatingHours").is_some());

        let back: BrandingConfig = serde_json::from_value(value).expect("decode");
        assert_eq!(back, branding);
    }

    #[test]
    fn partial_branding_document_fills_defaults() {
        let branding: BrandingConfig =
            serde_json::from_value(serde_json::json!({ "shopName": "Fade Factory" }))
                .expect("decode partial");
        assert_eq!(branding.shop_name, "Fade Factory");
        assert_eq!(branding.admin_password, "1234");
        assert_eq!(branding.currency, "PKR");
    }
}
