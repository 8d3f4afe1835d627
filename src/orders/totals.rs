// Lesson-aware total computation
//
// Sits between the generic order totals and the pricing engine. While the
// lines of a basket are walked, LessonAwareTotals notices the first
// band-priced lesson item, flips the order's lesson flag, and binds the
// buyer's band once so every later line prices against the same resolution.
// The flag is one-way: a basket that has contained a lesson item stays a
// lesson basket for the rest of that checkout.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::pricing::{
    short_postcode, BandSource, PriceResolver, PricingResult, ResolvedPrice, Transmission,
};

/// The exact pricing-engine field set an order persists on create/update
///
/// `postcode` and `band` are `None` when unset, never an empty string, so
/// "unset" stays distinguishable from an actual value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonFields {
    pub lesson: bool,
    pub postcode: Option<String>,
    pub band: Option<String>,
    pub transmission: Transmission,
}

/// Per-basket pricing context
///
/// Created empty, populated on the first observation of a postcode or band
/// (explicit set, or absorbed from a persisted order record), and consulted
/// on every total recomputation.
#[derive(Debug, Clone, Default)]
pub struct LessonContext {
    postcode: Option<String>,
    band: Option<String>,
    transmission: Transmission,
    lesson: bool,
}

impl LessonContext {
    /// A fresh context with no location known yet
    pub fn new(transmission: Transmission) -> Self {
        Self {
            transmission,
            ..Self::default()
        }
    }

    pub fn postcode(&self) -> Option<&str> {
        self.postcode.as_deref()
    }

    pub fn band(&self) -> Option<&str> {
        self.band.as_deref()
    }

    pub fn transmission(&self) -> Transmission {
        self.transmission
    }

    pub fn lesson(&self) -> bool {
        self.lesson
    }

    /// Explicitly set the postcode, normalized to short form
    ///
    /// Changing the postcode drops a band resolved from the previous one;
    /// setting the same postcode again leaves the band alone.
    pub fn set_postcode(&mut self, postcode: &str) {
        let short = short_postcode(postcode);
        if short.is_empty() {
            return;
        }
        if self.postcode.as_deref() != Some(short.as_str()) {
            self.postcode = Some(short);
            self.band = None;
        }
    }

    /// Explicitly set the band code
    pub fn set_band(&mut self, band: &str) {
        let code = band.trim().to_uppercase();
        if !code.is_empty() {
            self.band = Some(code);
        }
    }

    /// Absorb the postcode from a persisted order; first observation wins
    pub fn adopt_postcode(&mut self, postcode: &str) {
        if self.postcode.is_none() && !postcode.trim().is_empty() {
            self.postcode = Some(short_postcode(postcode));
        }
    }

    /// Absorb the band from a persisted order; first observation wins
    pub fn adopt_band(&mut self, band: &str) {
        if self.band.is_none() && !band.trim().is_empty() {
            self.band = Some(band.trim().to_uppercase());
        }
    }

    /// Record a basket line; returns whether the lesson flag newly flipped
    ///
    /// The flag is monotonic: once true, no further observation resets it.
    pub fn observe_line(&mut self, is_lesson: bool) -> bool {
        if is_lesson && !self.lesson {
            self.lesson = true;
            return true;
        }
        false
    }

    /// The field set the owning order persists
    pub fn persist_fields(&self) -> LessonFields {
        LessonFields {
            lesson: self.lesson,
            postcode: self.postcode.clone().filter(|p| !p.is_empty()),
            band: self.band.clone().filter(|b| !b.is_empty()),
            transmission: self.transmission,
        }
    }
}

/// Walks basket lines, maintaining the lesson context and band binding
pub struct LessonAwareTotals {
    resolver: PriceResolver,
    context: LessonContext,
}

impl LessonAwareTotals {
    /// Create a new LessonAwareTotals over a fresh resolver
    pub fn new(resolver: PriceResolver, context: LessonContext) -> Self {
        Self { resolver, context }
    }

    pub fn context(&self) -> &LessonContext {
        &self.context
    }

    /// Record one basket line during total recomputation
    ///
    /// Flips the lesson flag on the first lesson item and lazily binds the
    /// band when the context can resolve one. An unchanged basket walked
    /// twice binds once and yields identical `persist_fields`.
    pub async fn observe_line(&mut self, is_lesson: bool) -> PricingResult<()> {
        self.context.observe_line(is_lesson);

        if self.context.lesson() && self.resolver.band().is_none() {
            self.bind_band().await?;
        }

        Ok(())
    }

    /// Resolve and cache the context's band, writing the resolved code back
    async fn bind_band(&mut self) -> PricingResult<()> {
        let source = if let Some(band) = self.context.band() {
            BandSource::Band(band.to_string())
        } else if let Some(postcode) = self.context.postcode() {
            BandSource::Postcode {
                postcode: postcode.to_string(),
                transmission: self.context.transmission(),
            }
        } else {
            // Nothing resolvable yet; the flag is still recorded
            return Ok(());
        };

        let band = self.resolver.select_band(source).await?;
        let code = band.band.clone();
        self.context.set_band(&code);

        Ok(())
    }

    /// Price one course against the bound band
    pub async fn unit_price(&self, course: &str) -> PricingResult<ResolvedPrice> {
        self.resolver.compute_price(course, None).await
    }

    /// The field set to persist on the owning order
    pub fn persist_fields(&self) -> LessonFields {
        self.context.persist_fields()
    }
}

/// Plain subtotal arithmetic shared by basket and order totals
pub struct TotalsCalculator;

impl TotalsCalculator {
    /// Subtotal for one line: quantity times the unit price
    pub fn line_subtotal(quantity: i32, unit_price: Decimal) -> Decimal {
        Decimal::from(quantity) * unit_price
    }

    /// Order total: the sum of line subtotals
    ///
    /// Tax and delivery are computed downstream of the engine; this is the
    /// goods subtotal the order record persists.
    pub fn order_total(subtotals: &[Decimal]) -> Decimal {
        subtotals.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lesson_flag_flips_once() {
        let mut context = LessonContext::new(Transmission::Manual);

        assert!(!context.observe_line(false));
        assert!(context.observe_line(true));
        assert!(context.lesson());

        // Already set: further observations report no change
        assert!(!context.observe_line(true));
        assert!(!context.observe_line(false));
        assert!(context.lesson());
    }

    #[test]
    fn test_lesson_flag_is_monotonic() {
        let mut context = LessonContext::new(Transmission::Manual);
        context.observe_line(true);

        for _ in 0..20 {
            context.observe_line(false);
        }
        assert!(context.lesson());
    }

    #[test]
    fn test_persist_fields_idempotent_over_unchanged_basket() {
        let mut context = LessonContext::new(Transmission::Automatic);
        context.set_postcode("AB1 2CD");
        context.set_band("a");

        let walk = |ctx: &mut LessonContext| {
            ctx.observe_line(false);
            ctx.observe_line(true);
            ctx.persist_fields()
        };

        let first = walk(&mut context);
        let second = walk(&mut context);

        assert_eq!(first, second);
        assert!(first.lesson);
        assert_eq!(first.postcode.as_deref(), Some("AB1"));
        assert_eq!(first.band.as_deref(), Some("A"));
        assert_eq!(first.transmission, Transmission::Automatic);
    }

    #[test]
    fn test_unset_fields_persist_as_none() {
        let context = LessonContext::new(Transmission::Manual);
        let fields = context.persist_fields();

        assert!(!fields.lesson);
        assert_eq!(fields.postcode, None);
        assert_eq!(fields.band, None);
    }

    #[test]
    fn test_empty_inputs_never_become_empty_strings() {
        let mut context = LessonContext::new(Transmission::Manual);
        context.set_postcode("   ");
        context.set_band("");
        context.adopt_postcode("");
        context.adopt_band("  ");

        let fields = context.persist_fields();
        assert_eq!(fields.postcode, None);
        assert_eq!(fields.band, None);
    }

    #[test]
    fn test_changing_postcode_clears_resolved_band() {
        let mut context = LessonContext::new(Transmission::Manual);
        context.set_postcode("AB1 2CD");
        context.set_band("A");

        // Same postcode again: band survives
        context.set_postcode("ab12cd");
        assert_eq!(context.band(), Some("A"));

        // Different postcode: the old band no longer applies
        context.set_postcode("CD2 3EF");
        assert_eq!(context.band(), None);
        assert_eq!(context.postcode(), Some("CD2"));
    }

    #[test]
    fn test_adopt_does_not_override_explicit_values() {
        let mut context = LessonContext::new(Transmission::Manual);
        context.set_postcode("AB1");
        context.set_band("A");

        context.adopt_postcode("CD2");
        context.adopt_band("B");

        assert_eq!(context.postcode(), Some("AB1"));
        assert_eq!(context.band(), Some("A"));
    }

    #[test]
    fn test_adopt_populates_empty_context() {
        let mut context = LessonContext::new(Transmission::Manual);
        context.adopt_postcode("AB1 2CD");
        context.adopt_band("b");

        assert_eq!(context.postcode(), Some("AB1"));
        assert_eq!(context.band(), Some("B"));
    }

    #[tokio::test]
    async fn test_totals_without_location_record_the_flag_but_never_resolve() {
        use crate::pricing::{BandCatalog, FeeRules, PriceResolver, PricingError};
        use std::sync::Arc;

        // Lazy pool: never connects, so any resolution attempt would fail
        // with a store error instead of the asserted outcomes
        let pool = sqlx::PgPool::connect_lazy("postgresql://localhost/unused").unwrap();
        let resolver = PriceResolver::new(
            Arc::new(BandCatalog::new(pool.clone())),
            Arc::new(FeeRules::new(pool)),
        );

        let mut totals =
            LessonAwareTotals::new(resolver, LessonContext::new(Transmission::Manual));

        totals.observe_line(true).await.unwrap();
        totals.observe_line(true).await.unwrap();

        let fields = totals.persist_fields();
        assert!(fields.lesson);
        assert_eq!(fields.postcode, None);
        assert_eq!(fields.band, None);

        // Pricing still fails loudly with no band rather than defaulting
        let result = totals.unit_price("tenhour").await;
        assert!(matches!(result, Err(PricingError::NoBandSelected)));
    }

    #[test]
    fn test_line_subtotal() {
        assert_eq!(
            TotalsCalculator::line_subtotal(2, dec!(4.50)),
            dec!(9.00)
        );
        assert_eq!(
            TotalsCalculator::line_subtotal(10, dec!(23.00)),
            dec!(230.00)
        );
    }

    #[test]
    fn test_order_total() {
        let subtotals = vec![dec!(10.00), dec!(5.50), dec!(3.25)];
        assert_eq!(TotalsCalculator::order_total(&subtotals), dec!(18.75));
        assert_eq!(TotalsCalculator::order_total(&[]), Decimal::ZERO);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// The lesson flag never resets, whatever the observation sequence
    #[test]
    fn prop_lesson_flag_never_resets() {
        proptest!(|(observations in prop::collection::vec(any::<bool>(), 1..=50))| {
            let mut context = LessonContext::new(Transmission::Manual);
            let mut seen_lesson = false;

            for is_lesson in observations {
                seen_lesson |= is_lesson;
                context.observe_line(is_lesson);
                prop_assert_eq!(context.lesson(), seen_lesson);
            }
        });
    }

    /// Walking the same observations twice yields identical persisted fields
    #[test]
    fn prop_recomputation_is_idempotent() {
        proptest!(|(observations in prop::collection::vec(any::<bool>(), 1..=20))| {
            let mut context = LessonContext::new(Transmission::Manual);
            context.set_postcode("AB1 2CD");

            for &is_lesson in &observations {
                context.observe_line(is_lesson);
            }
            let first = context.persist_fields();

            for &is_lesson in &observations {
                context.observe_line(is_lesson);
            }
            let second = context.persist_fields();

            prop_assert_eq!(first, second);
        });
    }

    /// Total equals the sum of the line subtotals, in any order
    #[test]
    fn prop_total_is_sum_of_subtotals() {
        proptest!(|(
            lines in prop::collection::vec((1i32..=100, 1u32..=10000u32), 1..=20)
        )| {
            let subtotals: Vec<Decimal> = lines
                .iter()
                .map(|&(qty, price_cents)| {
                    let price = Decimal::from(price_cents) / Decimal::from(100);
                    TotalsCalculator::line_subtotal(qty, price)
                })
                .collect();

            let total = TotalsCalculator::order_total(&subtotals);
            let expected: Decimal = subtotals.iter().sum();
            prop_assert_eq!(total, expected);

            let mut reversed = subtotals.clone();
            reversed.reverse();
            prop_assert_eq!(TotalsCalculator::order_total(&reversed), total);
        });
    }
}
