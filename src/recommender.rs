//! Rule-based plan recommendation.
//!
//! Maps one customer's usage profile onto one of the three catalog tiers
//! and prices the switch against what the customer pays today.
use crate::models::{Customer, Plan, Recommendation};

/// Available plans, ascending capacity.
pub static PLAN_CATALOG: [Plan; 3] = [
    Plan {
        name: "Basic",
        data_gb: 10.0,
        minutes: 200.0,
        sms: 100.0,
        price: 199.0,
    },
    Plan {
        name: "Standard",
        data_gb: 50.0,
        minutes: 1000.0,
        sms: 500.0,
        price: 499.0,
    },
    Plan {
        name: "Premium",
        data_gb: 200.0,
        minutes: 3000.0,
        sms: 2000.0,
        price: 999.0,
    },
];

/// Catalog tier selected for a usage profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTier {
    Basic,
    Standard,
    Premium,
}

/// Strict upper bounds a profile must stay under on all three axes.
struct UsageCeiling {
    data_gb: f64,
    minutes: f64,
    sms: f64,
}

impl UsageCeiling {
    fn admits(&self, data_gb: f64, minutes: f64, sms: f64) -> bool {
        data_gb < self.data_gb && minutes < self.minutes && sms < self.sms
    }
}

const BASIC_CEILING: UsageCeiling = UsageCeiling {
    data_gb: 8.0,
    minutes: 300.0,
    sms: 150.0,
};

const STANDARD_CEILING: UsageCeiling = UsageCeiling {
    data_gb: 80.0,
    minutes: 1500.0,
    sms: 1000.0,
};

impl PlanTier {
    /// First tier whose ceiling admits the usage; Premium has none.
    pub fn for_usage(data_gb: f64, minutes: f64, sms: f64) -> Self {
        if BASIC_CEILING.admits(data_gb, minutes, sms) {
            PlanTier::Basic
        } else if STANDARD_CEILING.admits(data_gb, minutes, sms) {
            PlanTier::Standard
        } else {
            PlanTier::Premium
        }
    }

    pub fn plan(self) -> &'static Plan {
        match self {
            PlanTier::Basic => &PLAN_CATALOG[0],
            PlanTier::Standard => &PLAN_CATALOG[1],
            PlanTier::Premium => &PLAN_CATALOG[2],
        }
    }
}

/// Rounds to 2 decimal places, half away from zero.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Shortest round-trip rendering of a usage figure, with the exponent form
/// written as a signed two-digit exponent (`1e-05`, `1e+16`).
fn usage_figure(value: f64) -> String {
    let repr = format!("{:?}", value);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => repr,
    }
}

/// Recommends a plan for `customer`.
///
/// Total and side-effect free. Savings are rounded once here; every
/// downstream sum works on the rounded figure.
pub fn recommend(customer: &Customer) -> Recommendation {
    let data = customer.avg_monthly_data_gb;
    let mins = customer.avg_monthly_minutes;
    let sms = customer.avg_monthly_sms;
    let spend = customer.avg_monthly_spend;

    let plan = PlanTier::for_usage(data, mins, sms).plan();
    let savings = round_currency(spend - plan.price);

    let reason_text = if savings > 0.0 {
        "to save money"
    } else {
        "for better data benefits and to avoid extra charges"
    };

    let recommendation_reason = format!(
        "Customer currently spends ₹{:.0}/month. \
         Based on their usage ({}GB data, {} mins calls, {} SMS), \
         the {} plan at ₹{:.0} is recommended {}.",
        spend,
        usage_figure(data),
        usage_figure(mins),
        usage_figure(sms),
        plan.name,
        plan.price,
        reason_text
    );

    Recommendation {
        customer_id: customer.customer_id,
        recommended_plan: plan.name.to_string(),
        estimated_monthly_bill: plan.price,
        estimated_savings: savings,
        recommendation_reason,
    }
}
