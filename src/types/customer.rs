//! Customer types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Place used when neither the source row nor the caller provides one
pub const DEFAULT_PLACE: &str = "Unknown";

/// Customer entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub place: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// "Surname Name Patronymic", skipping empty parts
    pub fn full_name(&self) -> String {
        [
            Some(self.surname.as_str()),
            Some(self.name.as_str()),
            self.patronymic.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn identity(&self) -> CustomerIdentity {
        CustomerIdentity::new(
            &self.name,
            &self.surname,
            self.patronymic.as_deref(),
            &self.place,
        )
    }

    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.is_empty())
    }

    pub fn has_address(&self) -> bool {
        self.address.as_deref().is_some_and(|a| !a.is_empty())
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.full_name(), self.place)
    }
}

/// The (name, surname, patronymic, place) tuple that identifies a customer.
///
/// An empty patronymic is stored as `None`, so a lookup with `None` matches
/// rows holding either NULL or an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerIdentity {
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub place: String,
}

impl CustomerIdentity {
    pub fn new(name: &str, surname: &str, patronymic: Option<&str>, place: &str) -> Self {
        Self {
            name: name.to_string(),
            surname: surname.to_string(),
            patronymic: patronymic
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            place: place.to_string(),
        }
    }

    /// Patronymic as compared by the uniqueness rule
    pub fn patronymic_key(&self) -> &str {
        self.patronymic.as_deref().unwrap_or("")
    }
}

/// Request to create a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[serde(flatten)]
    pub identity: CustomerIdentity,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Manually entered customer. Blank optional fields are dropped and a blank
/// place falls back to [`DEFAULT_PLACE`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub place: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewCustomer {
    pub fn to_request(&self) -> CreateCustomerRequest {
        let place = non_blank(self.place.as_deref()).unwrap_or(DEFAULT_PLACE);
        CreateCustomerRequest {
            identity: CustomerIdentity::new(
                self.name.trim(),
                self.surname.trim(),
                self.patronymic.as_deref(),
                place,
            ),
            phone: non_blank(self.phone.as_deref()).map(str::to_string),
            address: non_blank(self.address.as_deref()).map(str::to_string),
        }
    }
}

/// Edit of an existing customer; `None` keeps the stored value. An empty
/// string clears patronymic, phone or address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub place: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The full record `customer` would have after this edit
    pub fn apply(&self, customer: &Customer) -> CreateCustomerRequest {
        let mut identity = customer.identity();
        if let Some(name) = &self.name {
            identity.name = name.trim().to_string();
        }
        if let Some(surname) = &self.surname {
            identity.surname = surname.trim().to_string();
        }
        if let Some(patronymic) = &self.patronymic {
            identity.patronymic = non_blank(Some(patronymic.as_str())).map(str::to_string);
        }
        if let Some(place) = &self.place {
            identity.place = place.trim().to_string();
        }

        let replace = |change: &Option<String>, stored: &Option<String>| match change {
            Some(value) => non_blank(Some(value.as_str())).map(str::to_string),
            None => stored.clone(),
        };
        CreateCustomerRequest {
            identity,
            phone: replace(&self.phone, &customer.phone),
            address: replace(&self.address, &customer.address),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Contact fields to fill on an existing customer.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactBackfill {
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ContactBackfill {
    /// Values from an incoming row that the existing customer lacks
    pub fn for_existing(existing: &Customer, phone: Option<&str>, address: Option<&str>) -> Self {
        Self {
            phone: phone
                .filter(|_| !existing.has_phone())
                .map(str::to_string),
            address: address
                .filter(|_| !existing.has_address())
                .map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phone.is_none() && self.address.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(patronymic: Option<&str>, phone: Option<&str>) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: "Иван".to_string(),
            surname: "Иванов".to_string(),
            patronymic: patronymic.map(str::to_string),
            place: "Baku".to_string(),
            phone: phone.map(str::to_string),
            address: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn full_name_orders_surname_first() {
        let c = customer(Some("Петрович"), None);
        assert_eq!(c.full_name(), "Иванов Иван Петрович");
        assert_eq!(c.to_string(), "Иванов Иван Петрович (Baku)");
    }

    #[test]
    fn full_name_skips_blank_parts() {
        let mut c = customer(None, None);
        c.name = String::new();
        assert_eq!(c.full_name(), "Иванов");
    }

    #[test]
    fn identity_treats_empty_patronymic_as_missing() {
        let a = CustomerIdentity::new("Əli", "Məmmədov", None, "Bakı");
        let b = CustomerIdentity::new("Əli", "Məmmədov", Some(""), "Bakı");
        let c = CustomerIdentity::new("Əli", "Məmmədov", Some("  "), "Bakı");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.patronymic_key(), "");
    }

    #[test]
    fn new_customer_defaults_place_and_drops_blanks() {
        let req = NewCustomer {
            name: " Əli ".to_string(),
            surname: "Məmmədov".to_string(),
            patronymic: Some(" ".to_string()),
            place: Some("".to_string()),
            phone: Some("  ".to_string()),
            address: Some("Nizami 5".to_string()),
        }
        .to_request();

        assert_eq!(req.identity, CustomerIdentity::new("Əli", "Məmmədov", None, DEFAULT_PLACE));
        assert_eq!(req.phone, None);
        assert_eq!(req.address.as_deref(), Some("Nizami 5"));
    }

    #[test]
    fn changes_keep_untouched_fields() {
        let mut existing = customer(Some("Петрович"), Some("+994501234567"));
        existing.address = Some("Nizami 5".to_string());
        let changes = CustomerChanges {
            place: Some("Sumqayıt".to_string()),
            phone: Some(String::new()),
            ..Default::default()
        };

        let req = changes.apply(&existing);
        assert_eq!(
            req.identity,
            CustomerIdentity::new("Иван", "Иванов", Some("Петрович"), "Sumqayıt")
        );
        assert_eq!(req.phone, None);
        assert_eq!(req.address.as_deref(), Some("Nizami 5"));
        assert!(!changes.is_empty());
        assert!(CustomerChanges::default().is_empty());
    }

    #[test]
    fn backfill_only_fills_missing_values() {
        let existing = customer(None, Some("+994501234567"));
        let backfill = ContactBackfill::for_existing(&existing, Some("+994509999999"), Some("Nizami 5"));
        assert_eq!(backfill.phone, None);
        assert_eq!(backfill.address.as_deref(), Some("Nizami 5"));
    }

    #[test]
    fn backfill_treats_empty_phone_as_missing() {
        let existing = customer(None, Some(""));
        let backfill = ContactBackfill::for_existing(&existing, Some("+994501234567"), None);
        assert_eq!(backfill.phone.as_deref(), Some("+994501234567"));
        assert!(!backfill.is_empty());
    }
}
