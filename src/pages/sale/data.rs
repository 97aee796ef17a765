use mysql_common::prelude::FromRow;

use crate::libs::{is_email, time::parse_date};

pub static SALE_FIELDS: &str = "id, property_id, agent_id, buyer_name, buyer_id, buyer_email,
    buyer_tel, buyer_address, payment_method, seller_name, seller_tel, seller_email,
    seller_address, ownership_verification, sale_date, sale_price, title_insurance,
    legal_fees, deposit, closing_date";

#[derive(Debug, Clone, serde::Serialize, FromRow, PartialEq)]
pub struct Sale {
    pub id: String,
    pub property_id: String,
    /// employee id of the closing agent
    pub agent_id: Option<String>,
    pub buyer_name: String,
    pub buyer_id: String,
    pub buyer_email: Option<String>,
    pub buyer_tel: String,
    pub buyer_address: String,
    pub payment_method: String,
    pub seller_name: String,
    pub seller_tel: String,
    pub seller_email: Option<String>,
    pub seller_address: String,
    pub ownership_verification: String,
    pub sale_date: Option<String>,
    pub sale_price: f64,
    pub title_insurance: f64,
    pub legal_fees: f64,
    pub deposit: f64,
    pub closing_date: Option<String>,
}

impl Sale {
    /// What the brokerage keeps once fees are paid out of the sale price.
    pub fn profit(&self) -> f64 {
        self.sale_price - self.legal_fees - self.title_insurance
    }
}

fn unknown_buyer() -> String {
    "Unknown Buyer".into()
}
fn unknown_buyer_id() -> String {
    "Unknown ID".into()
}
fn unknown_seller() -> String {
    "Unknown Seller".into()
}
fn not_provided() -> String {
    "Not Provided".into()
}
fn no_email() -> Option<String> {
    Some("notprovided@example.com".into())
}
fn cash() -> String {
    "Cash".into()
}
fn pending_verification() -> String {
    "Pending Verification".into()
}

/// Sale form. Contact fields fall back to placeholder values.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SaleDraft {
    #[serde(default = "unknown_buyer")]
    pub buyer_name: String,
    #[serde(default = "unknown_buyer_id")]
    pub buyer_id: String,
    #[serde(default = "no_email")]
    pub buyer_email: Option<String>,
    #[serde(default = "not_provided")]
    pub buyer_tel: String,
    #[serde(default = "not_provided")]
    pub buyer_address: String,
    #[serde(default = "cash")]
    pub payment_method: String,
    #[serde(default = "unknown_seller")]
    pub seller_name: String,
    #[serde(default = "not_provided")]
    pub seller_tel: String,
    #[serde(default = "no_email")]
    pub seller_email: Option<String>,
    #[serde(default = "not_provided")]
    pub seller_address: String,
    #[serde(default = "pending_verification")]
    pub ownership_verification: String,
    #[serde(default)]
    pub sale_date: Option<String>,
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub title_insurance: f64,
    #[serde(default)]
    pub legal_fees: f64,
    #[serde(default)]
    pub deposit: f64,
    #[serde(default)]
    pub closing_date: Option<String>,
}

impl Default for SaleDraft {
    fn default() -> Self {
        Self {
            buyer_name: unknown_buyer(),
            buyer_id: unknown_buyer_id(),
            buyer_email: no_email(),
            buyer_tel: not_provided(),
            buyer_address: not_provided(),
            payment_method: cash(),
            seller_name: unknown_seller(),
            seller_tel: not_provided(),
            seller_email: no_email(),
            seller_address: not_provided(),
            ownership_verification: pending_verification(),
            sale_date: None,
            sale_price: None,
            title_insurance: 0.0,
            legal_fees: 0.0,
            deposit: 0.0,
            closing_date: None,
        }
    }
}

impl SaleDraft {
    pub fn validate(&self) -> Result<f64, String> {
        let Some(sale_price) = self.sale_price else {
            return Err("Sale price is required.".into());
        };
        if !sale_price.is_finite() || sale_price <= 0.0 {
            return Err("sale_price must be a positive number".into());
        }
        for (name, value) in [
            ("title_insurance", self.title_insurance),
            ("legal_fees", self.legal_fees),
            ("deposit", self.deposit),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a non-negative number"));
            }
        }
        for (name, value) in [("buyer_email", &self.buyer_email), ("seller_email", &self.seller_email)] {
            if value.as_deref().is_some_and(|e| !e.is_empty() && !is_email(e)) {
                return Err(format!("{name} is not a valid email address"));
            }
        }
        for (name, value) in [("sale_date", &self.sale_date), ("closing_date", &self.closing_date)] {
            if value.as_deref().is_some_and(|d| !d.is_empty() && parse_date(d).is_none()) {
                return Err(format!("{name} must be formatted as YYYY-MM-DD"));
            }
        }
        Ok(sale_price)
    }

    pub fn into_sale(self, id: String, property_id: String, agent_id: String, sale_date: String) -> Sale {
        Sale {
            id,
            property_id,
            agent_id: Some(agent_id),
            buyer_name: self.buyer_name,
            buyer_id: self.buyer_id,
            buyer_email: self.buyer_email.filter(|e| !e.is_empty()),
            buyer_tel: self.buyer_tel,
            buyer_address: self.buyer_address,
            payment_method: self.payment_method,
            seller_name: self.seller_name,
            seller_tel: self.seller_tel,
            seller_email: self.seller_email.filter(|e| !e.is_empty()),
            seller_address: self.seller_address,
            ownership_verification: self.ownership_verification,
            sale_date: Some(self.sale_date.filter(|d| !d.is_empty()).unwrap_or(sale_date)),
            sale_price: self.sale_price.unwrap_or_default(),
            title_insurance: self.title_insurance,
            legal_fees: self.legal_fees,
            deposit: self.deposit,
            closing_date: self.closing_date.filter(|d| !d.is_empty()),
        }
    }
}

/// Profit booked for an agent when a sale is recorded.
#[derive(Debug, Clone, serde::Serialize, FromRow, PartialEq)]
pub struct AgentProfit {
    pub id: String,
    pub agent_id: String,
    pub sale_id: String,
    pub profit_amount: f64,
    pub recorded_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_contacts_use_placeholders() {
        let draft: SaleDraft = serde_json::from_str(r#"{"sale_price": 250000}"#).unwrap();
        assert_eq!(draft.buyer_name, "Unknown Buyer");
        assert_eq!(draft.seller_email.as_deref(), Some("notprovided@example.com"));
        assert_eq!(draft.payment_method, "Cash");
        assert_eq!(draft.validate(), Ok(250000.0));
    }

    #[test]
    fn profit_deducts_fees_but_not_deposit() {
        let draft = SaleDraft {
            sale_price: Some(500_000.0),
            legal_fees: 2_000.0,
            title_insurance: 1_000.0,
            deposit: 25_000.0,
            ..SaleDraft::default()
        };
        let sale = draft.into_sale("s".into(), "p".into(), "e".into(), "2025-03-01".into());
        assert_eq!(sale.profit(), 497_000.0);
        assert_eq!(sale.sale_date.as_deref(), Some("2025-03-01"));
    }

    #[test]
    fn rejects_bad_price_email_and_date() {
        assert_eq!(SaleDraft::default().validate().unwrap_err(), "Sale price is required.");
        let draft = SaleDraft {
            sale_price: Some(10.0),
            buyer_email: Some("not-an-email".into()),
            ..SaleDraft::default()
        };
        assert!(draft.validate().unwrap_err().contains("buyer_email"));
        let draft = SaleDraft {
            sale_price: Some(10.0),
            closing_date: Some("01/02/2025".into()),
            ..SaleDraft::default()
        };
        assert!(draft.validate().unwrap_err().contains("closing_date"));
        let draft = SaleDraft {
            sale_price: Some(0.0),
            ..SaleDraft::default()
        };
        assert!(draft.validate().is_err());
    }
}
