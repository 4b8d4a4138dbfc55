use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{FormError, FormResult};

/// Form-level inputs that sit next to the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    TaxRate,
    DiscountAmount,
    OtherCostPercentage,
    PaidAmount,
    PaymentDate,
}

impl HeaderField {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderField::TaxRate => "tax_rate",
            HeaderField::DiscountAmount => "discount_amount",
            HeaderField::OtherCostPercentage => "other_cost_percentage",
            HeaderField::PaidAmount => "paid_amount",
            HeaderField::PaymentDate => "payment_date",
        }
    }

    pub fn all() -> [HeaderField; 5] {
        [
            HeaderField::TaxRate,
            HeaderField::DiscountAmount,
            HeaderField::OtherCostPercentage,
            HeaderField::PaidAmount,
            HeaderField::PaymentDate,
        ]
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeaderField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "tax_rate" | "tax" => Ok(HeaderField::TaxRate),
            "discount_amount" | "discount" => Ok(HeaderField::DiscountAmount),
            "other_cost_percentage" | "other_cost" => Ok(HeaderField::OtherCostPercentage),
            "paid_amount" | "paid" => Ok(HeaderField::PaidAmount),
            "payment_date" => Ok(HeaderField::PaymentDate),
            other => Err(FormError::InvalidInput(format!(
                "unknown header field `{other}`"
            ))),
        }
    }
}

/// Current values of the header inputs.
///
/// `discount_user_modified` is the override latch: once the discount input is
/// edited directly it is never derived from the percentage again for the
/// lifetime of the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderFields {
    #[serde(default)]
    pub tax_rate: String,
    #[serde(default)]
    pub discount_amount: String,
    #[serde(default)]
    pub other_cost_percentage: String,
    #[serde(default)]
    pub paid_amount: String,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip)]
    discount_user_modified: bool,
}

impl HeaderFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a direct user edit. Editing the discount closes the latch.
    pub fn edit(&mut self, field: HeaderField, raw: &str) -> FormResult<()> {
        match field {
            HeaderField::TaxRate => self.tax_rate = raw.trim().to_string(),
            HeaderField::DiscountAmount => {
                self.discount_amount = raw.trim().to_string();
                self.discount_user_modified = true;
            }
            HeaderField::OtherCostPercentage => {
                self.other_cost_percentage = raw.trim().to_string()
            }
            HeaderField::PaidAmount => self.paid_amount = raw.trim().to_string(),
            HeaderField::PaymentDate => {
                let trimmed = raw.trim();
                self.payment_date = if trimmed.is_empty() {
                    None
                } else {
                    Some(NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
                        FormError::InvalidInput(format!(
                            "payment date `{trimmed}` must be YYYY-MM-DD"
                        ))
                    })?)
                };
            }
        }
        Ok(())
    }

    pub fn get(&self, field: HeaderField) -> String {
        match field {
            HeaderField::TaxRate => self.tax_rate.clone(),
            HeaderField::DiscountAmount => self.discount_amount.clone(),
            HeaderField::OtherCostPercentage => self.other_cost_percentage.clone(),
            HeaderField::PaidAmount => self.paid_amount.clone(),
            HeaderField::PaymentDate => self
                .payment_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    pub fn discount_user_modified(&self) -> bool {
        self.discount_user_modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_edit_closes_latch_for_good() {
        let mut header = HeaderFields::new();
        assert!(!header.discount_user_modified());
        header.edit(HeaderField::DiscountAmount, "5").unwrap();
        header.edit(HeaderField::OtherCostPercentage, "10").unwrap();
        assert!(header.discount_user_modified());
    }

    #[test]
    fn payment_date_requires_iso_format() {
        let mut header = HeaderFields::new();
        header.edit(HeaderField::PaymentDate, "2024-03-01").unwrap();
        assert_eq!(header.get(HeaderField::PaymentDate), "2024-03-01");
        assert!(header.edit(HeaderField::PaymentDate, "01/03/2024").is_err());
        header.edit(HeaderField::PaymentDate, "").unwrap();
        assert!(header.payment_date.is_none());
    }

    #[test]
    fn header_names_parse_with_aliases() {
        assert_eq!("paid".parse::<HeaderField>().unwrap(), HeaderField::PaidAmount);
        assert_eq!(
            "other-cost".parse::<HeaderField>().unwrap(),
            HeaderField::OtherCostPercentage
        );
        assert!("bogus".parse::<HeaderField>().is_err());
    }
}
