// Course rule store
//
// Loads the per-course attribute table (hours plus which extras a course
// includes) once per process and serves lookups from memory. The table is
// reference data that changes rarely, so staleness until restart is
// acceptable and saves an N+1 lookup when pricing a full course list.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::pricing::error::{PricingError, PricingResult};

/// Static pricing attributes for a course relation
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct CourseRule {
    #[schema(example = "tenhour")]
    pub course: String,
    #[schema(value_type = f64, example = 10.0)]
    pub hours: Decimal,
    pub includes_test: bool,
    pub includes_theory: bool,
    pub includes_materials: bool,
    pub includes_dsdvdwb: bool,
    pub includes_dtc: bool,
}

/// Read-through store for course rules
///
/// The cache is populated lazily under a double-checked write lock; racing
/// populators compute identical values from the same source table, so last
/// writer wins is harmless.
pub struct FeeRules {
    pool: PgPool,
    cache: RwLock<Option<HashMap<String, CourseRule>>>,
}

impl FeeRules {
    /// Create a new FeeRules store
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: RwLock::new(None),
        }
    }

    /// Look up the rule for a course relation
    pub async fn get_course_rule(&self, course: &str) -> PricingResult<CourseRule> {
        self.ensure_loaded().await?;

        let cache = self.cache.read().await;
        cache
            .as_ref()
            .and_then(|rules| rules.get(course))
            .cloned()
            .ok_or_else(|| PricingError::CourseNotFound(course.to_string()))
    }

    /// The full course table, keyed by course relation
    pub async fn list_course_rules(&self) -> PricingResult<HashMap<String, CourseRule>> {
        self.ensure_loaded().await?;

        let cache = self.cache.read().await;
        Ok(cache.as_ref().cloned().unwrap_or_default())
    }

    /// Populate the cache on first use
    async fn ensure_loaded(&self) -> PricingResult<()> {
        // Fast path with read lock
        {
            let cache = self.cache.read().await;
            if cache.is_some() {
                return Ok(());
            }
        }

        let mut cache = self.cache.write().await;

        // Double-check after acquiring write lock (another task may have
        // loaded in the meantime)
        if cache.is_some() {
            return Ok(());
        }

        let rules = self.load_course_rules().await?;
        tracing::info!("Loaded {} course rules", rules.len());
        *cache = Some(rules);

        Ok(())
    }

    /// Load the full course-rule table from the store
    async fn load_course_rules(&self) -> PricingResult<HashMap<String, CourseRule>> {
        let rules = sqlx::query_as::<_, CourseRule>(
            "SELECT course, hours, includes_test, includes_theory, includes_materials, \
                    includes_dsdvdwb, includes_dtc \
             FROM course_rules",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rules
            .into_iter()
            .map(|rule| (rule.course.clone(), rule))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn rule(course: &str, hours: u32) -> CourseRule {
        CourseRule {
            course: course.to_string(),
            hours: Decimal::from(hours),
            includes_test: false,
            includes_theory: false,
            includes_materials: false,
            includes_dsdvdwb: false,
            includes_dtc: false,
        }
    }

    #[test]
    fn test_rules_key_by_course_relation() {
        let rules: HashMap<String, CourseRule> = [rule("onehour", 1), rule("tenhour", 10)]
            .into_iter()
            .map(|r| (r.course.clone(), r))
            .collect();

        assert_eq!(rules.get("tenhour").unwrap().hours, Decimal::from(10));
        assert!(rules.get("twentyhour").is_none());
    }
}
