use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Postal address captured by value on an order.
///
/// Orders keep their own copy, so deleting or editing an address-book entry
/// never changes a placed order.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, FromJsonQueryResult,
)]
pub struct ShippingAddress {
    #[validate(length(min = 1, max = 255))]
    pub recipient: String,
    #[validate(length(min = 3, max = 32))]
    pub phone: String,
    #[validate(length(min = 1, max = 500))]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
}

impl ShippingAddress {
    /// Single-line rendering used by the CLI and logs.
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        for part in [&self.line2, &self.ward, &self.district, &self.province]
            .into_iter()
            .flatten()
        {
            if !part.trim().is_empty() {
                parts.push(part.as_str());
            }
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_skips_missing_parts() {
        let address = ShippingAddress {
            recipient: "Lan".into(),
            phone: "0901234567".into(),
            line1: "12 Hang Bac".into(),
            line2: None,
            ward: Some(" ".into()),
            district: Some("Hoan Kiem".into()),
            province: Some("Ha Noi".into()),
        };
        assert_eq!(address.one_line(), "12 Hang Bac, Hoan Kiem, Ha Noi");
        assert!(address.validate().is_ok());
    }

    #[test]
    fn recipient_is_required() {
        let address = ShippingAddress {
            recipient: String::new(),
            phone: "0901234567".into(),
            line1: "12 Hang Bac".into(),
            line2: None,
            ward: None,
            district: None,
            province: None,
        };
        assert!(address.validate().is_err());
    }
}
