//! Normalized metric inputs entering the scoring engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Assembled market metrics for one opportunity, normalized at the gateway
/// boundary from whatever raw upstream payloads looked like.
///
/// Values are nominally in `[0, 100]` but are not trusted: the scoring
/// engine clamps out-of-range values rather than rejecting them, so a
/// slightly dirty upstream batch still scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricInputs {
    /// How crowded the niche is (higher = more competitors).
    pub competition: Decimal,
    /// Expected profitability of the niche.
    pub profitability: Decimal,
    /// Size of the addressable market.
    pub market_size: Decimal,
    /// Confidence in the underlying signal data.
    pub confidence: Decimal,
}

impl MetricInputs {
    /// Bundle up the four metrics.
    #[must_use]
    pub const fn new(
        competition: Decimal,
        profitability: Decimal,
        market_size: Decimal,
        confidence: Decimal,
    ) -> Self {
        Self {
            competition,
            profitability,
            market_size,
            confidence,
        }
    }
}
