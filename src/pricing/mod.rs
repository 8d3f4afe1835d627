// Lesson Pricing Engine
//
// Resolves a customer's postcode to a price band and composes lesson prices
// against it. Three parts:
// - BandCatalog: postcode -> band assignments and band reference data
// - FeeRules: per-course attribute table (hours, included extras)
// - PriceResolver: band selection state plus the fee-composition formula
//
// The engine is a capability injected into the order subsystem, not a base
// class it inherits from; callers reach it through the narrow interfaces
// re-exported here.

pub mod band_catalog;
pub mod error;
pub mod fee_rules;
pub mod handlers;
pub mod postcode;
pub mod resolver;
pub mod types;

pub use band_catalog::{BandCatalog, PostcodeEntry, PriceBand};
pub use error::{PricingError, PricingResult};
pub use fee_rules::{CourseRule, FeeRules};
pub use postcode::{area_patterns, short_postcode};
pub use resolver::{compose_price, BandSource, PriceResolver};
pub use types::{BandAssignment, ResolvedPrice, Transmission, ONE_HOUR};

use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

/// Entry point for the pricing capability
///
/// Owns the shared band catalog and course-rule cache; hands out
/// request-scoped resolvers so no band state leaks across pricing passes.
pub struct LessonPricingEngine {
    catalog: Arc<BandCatalog>,
    fee_rules: Arc<FeeRules>,
}

impl LessonPricingEngine {
    /// Create a new LessonPricingEngine
    pub fn new(pool: PgPool) -> Self {
        Self {
            catalog: Arc::new(BandCatalog::new(pool.clone())),
            fee_rules: Arc::new(FeeRules::new(pool)),
        }
    }

    /// The band catalog
    pub fn catalog(&self) -> &Arc<BandCatalog> {
        &self.catalog
    }

    /// The course-rule store
    pub fn fee_rules(&self) -> &Arc<FeeRules> {
        &self.fee_rules
    }

    /// A fresh, unbound resolver for one pricing pass
    pub fn resolver(&self) -> PriceResolver {
        PriceResolver::new(self.catalog.clone(), self.fee_rules.clone())
    }

    /// Pre-load the course-rule cache on startup
    pub async fn warm_cache(&self) -> PricingResult<()> {
        tracing::info!("Warming course-rule cache...");
        let rules = self.fee_rules.list_course_rules().await?;
        tracing::info!("Course-rule cache warmed ({} courses)", rules.len());
        Ok(())
    }

    /// The full price list for a band: every course priced against it
    pub async fn price_list(&self, band: &str) -> PricingResult<HashMap<String, ResolvedPrice>> {
        let band = self.catalog.get_band_info(band).await?;
        let courses: Vec<String> = self.fee_rules.list_course_rules().await?.into_keys().collect();

        self.resolver().compute_batch(&courses, &band).await
    }

    /// The full price list for a postcode's band
    pub async fn price_list_for_postcode(
        &self,
        postcode: &str,
        transmission: Transmission,
    ) -> PricingResult<HashMap<String, ResolvedPrice>> {
        let band = self
            .catalog
            .get_band_by_postcode(postcode, transmission)
            .await?;
        self.price_list(&band).await
    }
}
