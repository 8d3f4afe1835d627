use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A catalog product
///
/// Lesson products carry a course relation and usually no catalog price:
/// their price comes from the buyer's price band. A lesson product with a
/// catalog price set keeps that fixed price (a special offer item).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    #[schema(example = 1)]
    pub product_id: i32,
    #[schema(example = "Block of ten driving lessons")]
    pub name: String,
    #[schema(value_type = Option<f64>, example = 230.00)]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<f64>, example = 199.00)]
    pub sale_price: Option<Decimal>,
    #[schema(example = true)]
    pub lesson: bool,
    #[schema(example = "tenhour")]
    pub course: Option<String>,
}

impl Product {
    /// The fixed catalog price, sale price preferred when present
    pub fn catalog_price(&self) -> Option<Decimal> {
        self.sale_price.or(self.price)
    }

    /// Whether this product must be priced through the band engine
    pub fn is_band_priced(&self) -> bool {
        self.lesson && self.price.is_none()
    }
}

/// Response body for a product price lookup
///
/// When a band-priced product is requested without a postcode and more than
/// one band exists, no price can be resolved yet: `pick_band` is set and
/// `bands` lists the codes the caller can choose from.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductPriceResponse {
    #[schema(example = 1)]
    pub product_id: i32,
    #[schema(example = "A")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,
    #[schema(value_type = Option<f64>, example = 230.00)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<f64>, example = 199.00)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
    pub pick_band: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bands: Vec<String>,
}

impl ProductPriceResponse {
    /// A directly priced product (fixed catalog price or resolved band price)
    pub fn priced(
        product_id: i32,
        band: Option<String>,
        price: Decimal,
        sale_price: Option<Decimal>,
    ) -> Self {
        Self {
            product_id,
            band,
            price: Some(price),
            sale_price,
            pick_band: false,
            bands: Vec::new(),
        }
    }

    /// A band-priced product with no resolvable band yet
    pub fn band_choice(product_id: i32, bands: Vec<String>) -> Self {
        Self {
            product_id,
            band: None,
            price: None,
            sale_price: None,
            pick_band: true,
            bands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(price: Option<Decimal>, sale: Option<Decimal>, lesson: bool) -> Product {
        Product {
            product_id: 1,
            name: "Test product".to_string(),
            price,
            sale_price: sale,
            lesson,
            course: lesson.then(|| "tenhour".to_string()),
        }
    }

    #[test]
    fn test_catalog_price_prefers_sale_price() {
        let p = product(Some(dec!(230.00)), Some(dec!(199.00)), false);
        assert_eq!(p.catalog_price(), Some(dec!(199.00)));
    }

    #[test]
    fn test_catalog_price_falls_back_to_full_price() {
        let p = product(Some(dec!(230.00)), None, false);
        assert_eq!(p.catalog_price(), Some(dec!(230.00)));
    }

    #[test]
    fn test_lesson_without_catalog_price_is_band_priced() {
        assert!(product(None, None, true).is_band_priced());
        assert!(!product(Some(dec!(230.00)), None, true).is_band_priced());
        assert!(!product(None, None, false).is_band_priced());
    }
}
