// Domain type definitions for the lesson pricing engine
// Provides shared types used across band resolution and fee composition

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// The course relation used as the base pricing unit. A band's hourly rate
/// IS the price of this course; every other course is priced from it.
pub const ONE_HOUR: &str = "onehour";

/// Transmission type for a lesson vehicle
///
/// Each postcode carries two parallel band assignments, one per transmission.
/// Automatic pricing falls back to the manual band when unset; the reverse
/// fallback never happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Manual,
    Automatic,
}

impl Transmission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Manual => "manual",
            Transmission::Automatic => "automatic",
        }
    }
}

impl Default for Transmission {
    fn default() -> Self {
        Transmission::Manual
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Transmission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Transmission::Manual),
            "automatic" => Ok(Transmission::Automatic),
            _ => Err(format!("Invalid transmission type: {}", s)),
        }
    }
}

/// Result of pricing a course against a band
///
/// `sale_price` is present only for courses other than the one-hour base
/// unit; the base unit is simply the band's hourly rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResolvedPrice {
    #[schema(value_type = f64, example = 230.00)]
    pub price: Decimal,
    #[schema(value_type = Option<f64>, example = 50.00)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
}

/// Band assignment update for a postcode
///
/// Both fields are optional so a caller can reassign one transmission
/// without touching the other. An assignment with neither field set is
/// rejected as a no-op.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BandAssignment {
    #[schema(example = "B")]
    pub manual: Option<String>,
    #[schema(example = "C")]
    pub automatic: Option<String>,
}

impl BandAssignment {
    pub fn is_empty(&self) -> bool {
        self.manual.is_none() && self.automatic.is_none()
    }
}
