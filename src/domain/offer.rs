//! Offer records and the tag-to-field mapping used to fill them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::OfferClassification;

/// Record column a feed tag can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferField {
    Title,
    Description,
    Brand,
    SellerId,
    SellerName,
    FirstImageUrl,
    CategoryId,
    RatingCount,
    RatingValue,
    PriceBeforeDiscounts,
    Discount,
    PriceAfterDiscounts,
    Bonuses,
    Sales,
    Currency,
    Barcode,
}

impl OfferField {
    pub const ALL: [OfferField; 16] = [
        Self::Title,
        Self::Description,
        Self::Brand,
        Self::SellerId,
        Self::SellerName,
        Self::FirstImageUrl,
        Self::CategoryId,
        Self::RatingCount,
        Self::RatingValue,
        Self::PriceBeforeDiscounts,
        Self::Discount,
        Self::PriceAfterDiscounts,
        Self::Bonuses,
        Self::Sales,
        Self::Currency,
        Self::Barcode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Brand => "brand",
            Self::SellerId => "seller_id",
            Self::SellerName => "seller_name",
            Self::FirstImageUrl => "first_image_url",
            Self::CategoryId => "category_id",
            Self::RatingCount => "rating_count",
            Self::RatingValue => "rating_value",
            Self::PriceBeforeDiscounts => "price_before_discounts",
            Self::Discount => "discount",
            Self::PriceAfterDiscounts => "price_after_discounts",
            Self::Bonuses => "bonuses",
            Self::Sales => "sales",
            Self::Currency => "currency",
            Self::Barcode => "barcode",
        }
    }
}

impl fmt::Display for OfferField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown offer field: {s}"))
    }
}

/// Correspondence between feed tags and record columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(BTreeMap<String, OfferField>);

impl Default for FieldMapping {
    fn default() -> Self {
        let entries = [
            ("name", OfferField::Title),
            ("description", OfferField::Description),
            ("vendor", OfferField::Brand),
            ("picture", OfferField::FirstImageUrl),
            ("categoryId", OfferField::CategoryId),
            ("oldprice", OfferField::PriceBeforeDiscounts),
            ("price", OfferField::PriceAfterDiscounts),
            ("currencyId", OfferField::Currency),
            ("barcode", OfferField::Barcode),
        ];
        Self(
            entries
                .into_iter()
                .map(|(tag, field)| (tag.to_string(), field))
                .collect(),
        )
    }
}

impl FieldMapping {
    pub fn get(&self, tag: &str) -> Option<OfferField> {
        self.0.get(tag).copied()
    }

    pub fn insert(&mut self, tag: impl Into<String>, field: OfferField) {
        self.0.insert(tag.into(), field);
    }

    pub fn remove(&mut self, tag: &str) -> Option<OfferField> {
        self.0.remove(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, OfferField)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (String, OfferField)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Flattened offer ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferRecord {
    pub uuid: Uuid,
    pub marketplace_id: Option<i64>,
    pub product_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub seller_id: Option<String>,
    pub seller_name: Option<String>,
    pub first_image_url: Option<String>,
    pub category_id: Option<String>,
    pub category_lvl_1: Option<String>,
    pub category_lvl_2: Option<String>,
    pub category_lvl_3: Option<String>,
    pub category_remaining: Option<String>,
    /// JSON object of `<param>` name to value
    pub features: String,
    pub rating_count: Option<String>,
    pub rating_value: Option<String>,
    pub price_before_discounts: Option<String>,
    pub discount: Option<String>,
    pub price_after_discounts: Option<String>,
    pub bonuses: Option<String>,
    pub sales: Option<String>,
    pub currency: Option<String>,
    pub barcode: Option<String>,
    pub inserted_at: DateTime<Utc>,
}

impl OfferRecord {
    pub fn new(product_id: Option<String>, marketplace_id: Option<i64>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            marketplace_id,
            product_id,
            title: None,
            description: None,
            brand: None,
            seller_id: None,
            seller_name: None,
            first_image_url: None,
            category_id: None,
            category_lvl_1: None,
            category_lvl_2: None,
            category_lvl_3: None,
            category_remaining: None,
            features: "{}".to_string(),
            rating_count: None,
            rating_value: None,
            price_before_discounts: None,
            discount: None,
            price_after_discounts: None,
            bonuses: None,
            sales: None,
            currency: None,
            barcode: None,
            inserted_at: Utc::now(),
        }
    }

    fn slot(&mut self, field: OfferField) -> &mut Option<String> {
        match field {
            OfferField::Title => &mut self.title,
            OfferField::Description => &mut self.description,
            OfferField::Brand => &mut self.brand,
            OfferField::SellerId => &mut self.seller_id,
            OfferField::SellerName => &mut self.seller_name,
            OfferField::FirstImageUrl => &mut self.first_image_url,
            OfferField::CategoryId => &mut self.category_id,
            OfferField::RatingCount => &mut self.rating_count,
            OfferField::RatingValue => &mut self.rating_value,
            OfferField::PriceBeforeDiscounts => &mut self.price_before_discounts,
            OfferField::Discount => &mut self.discount,
            OfferField::PriceAfterDiscounts => &mut self.price_after_discounts,
            OfferField::Bonuses => &mut self.bonuses,
            OfferField::Sales => &mut self.sales,
            OfferField::Currency => &mut self.currency,
            OfferField::Barcode => &mut self.barcode,
        }
    }

    pub fn field(&self, field: OfferField) -> Option<&str> {
        let value = match field {
            OfferField::Title => &self.title,
            OfferField::Description => &self.description,
            OfferField::Brand => &self.brand,
            OfferField::SellerId => &self.seller_id,
            OfferField::SellerName => &self.seller_name,
            OfferField::FirstImageUrl => &self.first_image_url,
            OfferField::CategoryId => &self.category_id,
            OfferField::RatingCount => &self.rating_count,
            OfferField::RatingValue => &self.rating_value,
            OfferField::PriceBeforeDiscounts => &self.price_before_discounts,
            OfferField::Discount => &self.discount,
            OfferField::PriceAfterDiscounts => &self.price_after_discounts,
            OfferField::Bonuses => &self.bonuses,
            OfferField::Sales => &self.sales,
            OfferField::Currency => &self.currency,
            OfferField::Barcode => &self.barcode,
        };
        value.as_deref()
    }

    /// Set `field` unless it already holds a value. Returns whether it was set.
    pub fn set_if_absent(&mut self, field: OfferField, value: String) -> bool {
        let slot = self.slot(field);
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    pub fn apply_classification(&mut self, classification: OfferClassification) {
        self.category_lvl_1 = Some(classification.level1);
        self.category_lvl_2 = Some(classification.level2);
        self.category_lvl_3 = Some(classification.level3);
        self.category_remaining = Some(classification.remainder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_field_names_when_parsing_then_match_serde_names() {
        for field in OfferField::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
            assert_eq!(field.as_str().parse::<OfferField>().unwrap(), field);
        }
        assert!("price".parse::<OfferField>().is_err());
    }

    #[test]
    fn given_default_mapping_then_price_tag_maps_to_price_after_discounts() {
        let mapping = FieldMapping::default();
        assert_eq!(mapping.get("price"), Some(OfferField::PriceAfterDiscounts));
        assert_eq!(mapping.get("vendor"), Some(OfferField::Brand));
        assert_eq!(mapping.get("param"), None);
    }

    #[test]
    fn given_value_already_set_when_set_if_absent_then_keeps_first() {
        let mut record = OfferRecord::new(Some("42".into()), None);

        assert!(record.set_if_absent(OfferField::FirstImageUrl, "a.jpg".into()));
        assert!(!record.set_if_absent(OfferField::FirstImageUrl, "b.jpg".into()));

        assert_eq!(record.field(OfferField::FirstImageUrl), Some("a.jpg"));
    }
}
