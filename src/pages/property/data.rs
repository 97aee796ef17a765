use mysql_common::prelude::FromRow;

use crate::{choices, libs::dser::deser_lenient_f64};

choices! {
    pub enum PropertyStatus {
        Available => "Available",
        Sold => "Sold",
        UnderContract => "Under Contract",
    }
}

impl Default for PropertyStatus {
    fn default() -> Self {
        PropertyStatus::Available
    }
}

pub static PROPERTY_FIELDS: &str = "id, property_type, location, address, floors, covered_area,
    electricity_status, bathroom_count, bedroom_count, booking_amount, price, status, image";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, FromRow, PartialEq)]
pub struct PropertyListing {
    #[serde(default)]
    pub id: String,
    pub property_type: String,
    pub location: String,
    pub address: String,
    #[serde(default)]
    pub floors: u32,
    #[serde(default)]
    pub covered_area: String,
    #[serde(default)]
    pub electricity_status: String,
    #[serde(default)]
    pub bathroom_count: u32,
    #[serde(default)]
    pub bedroom_count: u32,
    #[serde(default, deserialize_with = "deser_lenient_f64")]
    pub booking_amount: Option<f64>,
    #[serde(default, deserialize_with = "deser_lenient_f64")]
    pub price: Option<f64>,
    #[serde(default)]
    pub status: PropertyStatus,
    /// link of the stored image
    #[serde(default, skip_deserializing)]
    pub image: Option<String>,
}

impl PropertyListing {
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("property_type", &self.property_type),
            ("location", &self.location),
            ("address", &self.address),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{name} is required"));
            }
        }
        if self.property_type.chars().count() > 30 || self.location.chars().count() > 30 {
            return Err("property_type and location are limited to 30 characters".into());
        }
        if self.address.chars().count() > 100 {
            return Err("address is limited to 100 characters".into());
        }
        for (name, value) in [("booking_amount", self.booking_amount), ("price", self.price)] {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(format!("{name} must be a non-negative number"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_property(id: &str, status: PropertyStatus) -> PropertyListing {
    PropertyListing {
        id: id.into(),
        property_type: "House".into(),
        location: "Gulberg".into(),
        address: "12 Main Boulevard".into(),
        floors: 2,
        covered_area: "10 Marla".into(),
        electricity_status: "Yes".into(),
        bathroom_count: 3,
        bedroom_count: 4,
        booking_amount: Some(50_000.0),
        price: Some(480_000.0),
        status,
        image: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_display_names() {
        assert_eq!("Under Contract".parse::<PropertyStatus>(), Ok(PropertyStatus::UnderContract));
        assert!("under contract".parse::<PropertyStatus>().is_err());
        assert_eq!(
            serde_json::to_value(PropertyStatus::UnderContract).unwrap(),
            "Under Contract"
        );
        assert_eq!(mysql::Value::from(PropertyStatus::Sold), mysql::Value::from("Sold"));
    }

    #[test]
    fn status_reads_from_varchar_column() {
        use mysql::prelude::FromValue;
        let status = PropertyStatus::from_value_opt(mysql::Value::from("Sold")).unwrap();
        assert_eq!(status, PropertyStatus::Sold);
        assert!(PropertyStatus::from_value_opt(mysql::Value::from("Gone")).is_err());
    }

    #[test]
    fn form_defaults_to_available() {
        let listing: PropertyListing = serde_json::from_str(
            r#"{"property_type": "Flat", "location": "DHA", "address": "7 Lane", "price": "1,200,000"}"#,
        )
        .unwrap();
        assert_eq!(listing.status, PropertyStatus::Available);
        assert_eq!(listing.price, Some(1_200_000.0));
        assert!(listing.validate().is_ok());
    }

    #[test]
    fn validation_reports_missing_and_negative_fields() {
        let mut listing = sample_property("p", PropertyStatus::Available);
        listing.address = " ".into();
        assert_eq!(listing.validate().unwrap_err(), "address is required");
        let mut listing = sample_property("p", PropertyStatus::Available);
        listing.price = Some(-1.0);
        assert!(listing.validate().is_err());
    }
}
