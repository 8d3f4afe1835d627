// Band catalog repository
//
// Owns the postcode -> band assignments and the price band reference data.
// Postcodes are matched on their normalized short form; bands are matched
// case-insensitively on their code.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::pricing::error::{PricingError, PricingResult};
use crate::pricing::postcode::{area_patterns, short_postcode};
use crate::pricing::types::{BandAssignment, Transmission};

/// A postcode's band assignments, one per transmission
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PostcodeEntry {
    #[schema(example = "AB1")]
    pub postcode: String,
    #[schema(example = "A")]
    pub manual_band: String,
    #[schema(example = "B")]
    pub auto_band: Option<String>,
}

impl PostcodeEntry {
    /// The band for a transmission, with automatic degrading to manual
    /// when no automatic band is assigned. Manual never degrades.
    pub fn band_for(&self, transmission: Transmission) -> &str {
        match transmission {
            Transmission::Manual => &self.manual_band,
            Transmission::Automatic => self.auto_band.as_deref().unwrap_or(&self.manual_band),
        }
    }
}

/// Raw band row as stored; offer rates arrive as JSONB
#[derive(Debug, FromRow)]
struct PriceBandRow {
    band: String,
    hourly_rate: Decimal,
    offer_rates: serde_json::Value,
    test_fee: Decimal,
    theory_fee: Decimal,
    materials_fee: Decimal,
    dsdvdwb_fee: Decimal,
    dtc_fee: Decimal,
}

/// A price band: base hourly rate, per-course offer rates and fixed fees
///
/// Treated as immutable once fetched for the duration of a pricing pass;
/// a later fetch simply replaces the cached copy.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PriceBand {
    #[schema(example = "A")]
    pub band: String,
    #[schema(value_type = f64, example = 23.00)]
    pub hourly_rate: Decimal,
    /// Course relation -> discounted hourly rate
    #[schema(value_type = Object)]
    pub offer_rates: HashMap<String, Decimal>,
    #[schema(value_type = f64, example = 62.00)]
    pub test_fee: Decimal,
    #[schema(value_type = f64, example = 23.00)]
    pub theory_fee: Decimal,
    #[schema(value_type = f64, example = 15.00)]
    pub materials_fee: Decimal,
    #[schema(value_type = f64, example = 0.0)]
    pub dsdvdwb_fee: Decimal,
    #[schema(value_type = f64, example = 0.0)]
    pub dtc_fee: Decimal,
}

impl TryFrom<PriceBandRow> for PriceBand {
    type Error = PricingError;

    fn try_from(row: PriceBandRow) -> PricingResult<Self> {
        let offer_rates: HashMap<String, Decimal> = serde_json::from_value(row.offer_rates)
            .map_err(|e| {
                PricingError::InvalidConfiguration(format!(
                    "Invalid offer_rates JSON for band {}: {}",
                    row.band, e
                ))
            })?;

        Ok(PriceBand {
            band: row.band,
            hourly_rate: row.hourly_rate,
            offer_rates,
            test_fee: row.test_fee,
            theory_fee: row.theory_fee,
            materials_fee: row.materials_fee,
            dsdvdwb_fee: row.dsdvdwb_fee,
            dtc_fee: row.dtc_fee,
        })
    }
}

const BAND_COLUMNS: &str =
    "band, hourly_rate, offer_rates, test_fee, theory_fee, materials_fee, dsdvdwb_fee, dtc_fee";

/// Repository for price bands and postcode assignments
#[derive(Clone)]
pub struct BandCatalog {
    pool: PgPool,
}

impl BandCatalog {
    /// Create a new BandCatalog
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the postcode entry for a postcode, matched on its short form
    pub async fn find_postcode(&self, postcode: &str) -> PricingResult<PostcodeEntry> {
        let short = short_postcode(postcode);
        tracing::debug!("Looking up postcode entry for {}", short);

        let entry = sqlx::query_as::<_, PostcodeEntry>(
            "SELECT postcode, manual_band, auto_band FROM postcodes WHERE postcode = $1",
        )
        .bind(&short)
        .fetch_optional(&self.pool)
        .await?;

        entry.ok_or(PricingError::PostcodeNotFound(short))
    }

    /// Resolve a postcode to a band code for the given transmission
    ///
    /// Automatic falls back to the manual band when no automatic band is
    /// assigned. Unknown postcodes are reported, never defaulted.
    pub async fn get_band_by_postcode(
        &self,
        postcode: &str,
        transmission: Transmission,
    ) -> PricingResult<String> {
        let entry = self.find_postcode(postcode).await?;
        Ok(entry.band_for(transmission).to_string())
    }

    /// Fetch the full band record for a band code (case-insensitive)
    pub async fn get_band_info(&self, band: &str) -> PricingResult<PriceBand> {
        let code = band.trim().to_uppercase();

        let row = sqlx::query_as::<_, PriceBandRow>(&format!(
            "SELECT {BAND_COLUMNS} FROM price_bands WHERE band = $1"
        ))
        .bind(&code)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(PricingError::BandNotFound(code))?.try_into()
    }

    /// List every band, cheapest hourly rate first
    pub async fn list_bands(&self) -> PricingResult<Vec<PriceBand>> {
        let rows = sqlx::query_as::<_, PriceBandRow>(&format!(
            "SELECT {BAND_COLUMNS} FROM price_bands ORDER BY hourly_rate ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PriceBand::try_from).collect()
    }

    /// List the postcode entries in a postcode area
    ///
    /// Scans the ten district sub-prefixes of the area (AB0.. AB9) so that
    /// an "AB" listing matches AB1x but never an area that merely starts
    /// with the same letters.
    pub async fn list_postcodes_in_area(&self, area: &str) -> PricingResult<Vec<PostcodeEntry>> {
        let patterns = area_patterns(area);

        let entries = sqlx::query_as::<_, PostcodeEntry>(
            "SELECT postcode, manual_band, auto_band FROM postcodes \
             WHERE postcode LIKE ANY($1) ORDER BY postcode ASC",
        )
        .bind(&patterns)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// List the distinct bands covering a postcode area, cheapest first
    pub async fn list_bands_in_area(
        &self,
        area: &str,
        transmission: Transmission,
    ) -> PricingResult<Vec<PriceBand>> {
        let patterns = area_patterns(area);

        let rows = sqlx::query_as::<_, PriceBandRow>(
            "SELECT DISTINCT b.band, b.hourly_rate, b.offer_rates, b.test_fee, b.theory_fee, \
                    b.materials_fee, b.dsdvdwb_fee, b.dtc_fee \
             FROM postcodes p \
             JOIN price_bands b \
               ON b.band = CASE WHEN $2 = 'automatic' \
                                THEN COALESCE(p.auto_band, p.manual_band) \
                                ELSE p.manual_band END \
             WHERE p.postcode LIKE ANY($1) \
             ORDER BY b.hourly_rate ASC",
        )
        .bind(&patterns)
        .bind(transmission.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PriceBand::try_from).collect()
    }

    /// Overwrite the band assignment(s) for exactly one postcode
    ///
    /// An empty assignment is rejected locally as a no-op failure; zero
    /// matched rows also report `false` so callers can treat "nothing
    /// changed" as routine rather than exceptional.
    pub async fn update_band(
        &self,
        postcode: &str,
        assignment: &BandAssignment,
    ) -> PricingResult<bool> {
        if assignment.is_empty() {
            tracing::warn!(
                "Ignoring empty band assignment for postcode {}",
                postcode
            );
            return Ok(false);
        }

        let short = short_postcode(postcode);
        let manual = assignment.manual.as_ref().map(|b| b.trim().to_uppercase());
        let automatic = assignment
            .automatic
            .as_ref()
            .map(|b| b.trim().to_uppercase());

        let result = sqlx::query(
            "UPDATE postcodes \
             SET manual_band = COALESCE($1, manual_band), \
                 auto_band = COALESCE($2, auto_band) \
             WHERE postcode = $3",
        )
        .bind(manual)
        .bind(automatic)
        .bind(&short)
        .execute(&self.pool)
        .await?;

        let updated = result.rows_affected() == 1;
        if updated {
            tracing::info!("Updated band assignment for postcode {}", short);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(manual: &str, auto: Option<&str>) -> PostcodeEntry {
        PostcodeEntry {
            postcode: "AB1".to_string(),
            manual_band: manual.to_string(),
            auto_band: auto.map(|b| b.to_string()),
        }
    }

    #[test]
    fn test_manual_band_is_returned_directly() {
        let entry = entry("A", Some("B"));
        assert_eq!(entry.band_for(Transmission::Manual), "A");
    }

    #[test]
    fn test_automatic_band_is_returned_when_assigned() {
        let entry = entry("A", Some("B"));
        assert_eq!(entry.band_for(Transmission::Automatic), "B");
    }

    #[test]
    fn test_automatic_falls_back_to_manual_when_unassigned() {
        let entry = entry("A", None);
        assert_eq!(entry.band_for(Transmission::Automatic), "A");
    }

    #[test]
    fn test_band_row_parses_offer_rates() {
        let row = PriceBandRow {
            band: "A".to_string(),
            hourly_rate: Decimal::from(23),
            offer_rates: serde_json::json!({"tenhour": 21, "twohour": 22}),
            test_fee: Decimal::from(62),
            theory_fee: Decimal::from(23),
            materials_fee: Decimal::ZERO,
            dsdvdwb_fee: Decimal::ZERO,
            dtc_fee: Decimal::ZERO,
        };

        let band = PriceBand::try_from(row).unwrap();
        assert_eq!(band.offer_rates.get("tenhour"), Some(&Decimal::from(21)));
        assert_eq!(band.offer_rates.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_assignment_is_a_no_op_failure() {
        // Lazy pool: never connects, so the update must return before any
        // store access for this to pass
        let pool = sqlx::PgPool::connect_lazy("postgresql://localhost/unused").unwrap();
        let catalog = BandCatalog::new(pool);

        let updated = catalog
            .update_band("AB12CD", &BandAssignment::default())
            .await
            .unwrap();
        assert!(!updated);
    }

    #[test]
    fn test_band_row_rejects_malformed_offer_rates() {
        let row = PriceBandRow {
            band: "A".to_string(),
            hourly_rate: Decimal::from(23),
            offer_rates: serde_json::json!(["not", "a", "map"]),
            test_fee: Decimal::ZERO,
            theory_fee: Decimal::ZERO,
            materials_fee: Decimal::ZERO,
            dsdvdwb_fee: Decimal::ZERO,
            dtc_fee: Decimal::ZERO,
        };

        let result = PriceBand::try_from(row);
        assert!(matches!(
            result,
            Err(PricingError::InvalidConfiguration(_))
        ));
    }
}
