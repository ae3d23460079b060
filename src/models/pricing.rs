use serde::{Deserialize, Serialize};

/// Itemized price components for one selection. `total` always satisfies
/// `base_price + surcharges - discount_amount + options_total`, clamped
/// to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub base_price: f64,
    pub outbound_surcharge: f64,
    pub return_surcharge: f64,
    pub discount_amount: f64,
    pub options_total: f64,
    pub total: f64,
    pub currency: String,
}

impl PricingBreakdown {
    pub fn new(
        base_price: f64,
        outbound_surcharge: f64,
        return_surcharge: f64,
        discount_amount: f64,
        options_total: f64,
        currency: impl Into<String>,
    ) -> Self {
        let total = (base_price + outbound_surcharge + return_surcharge - discount_amount
            + options_total)
            .max(0.0);
        Self {
            base_price,
            outbound_surcharge,
            return_surcharge,
            discount_amount,
            options_total,
            total,
            currency: currency.into(),
        }
    }

    pub fn surcharge_total(&self) -> f64 {
        self.outbound_surcharge + self.return_surcharge
    }
}

/// Which price source is authoritative right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    /// Only the local estimate exists.
    Estimating,
    /// A server request is in flight; last known breakdown stays on display.
    AwaitingServer,
    /// The displayed breakdown is the server's.
    Reconciled,
    /// The last server request failed; displayed breakdown may be outdated.
    Stale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_composition() {
        let breakdown = PricingBreakdown::new(100.0, 25.0, 10.0, 20.0, 5.0, "USD");
        assert_eq!(breakdown.total, 120.0);
        assert_eq!(breakdown.surcharge_total(), 35.0);
    }

    #[test]
    fn test_total_clamped_to_zero_when_discount_exceeds_subtotal() {
        let breakdown = PricingBreakdown::new(50.0, 0.0, 0.0, 80.0, 0.0, "USD");
        assert_eq!(breakdown.total, 0.0);
    }
}
