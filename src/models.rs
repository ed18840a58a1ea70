use serde::{Deserialize, Serialize};

// ============ Customer Data ============

/// Column set every customer table carries, in canonical order.
pub const CUSTOMER_COLUMNS: [&str; 7] = [
    "customer_id",
    "name",
    "region",
    "avg_monthly_data_gb",
    "avg_monthly_minutes",
    "avg_monthly_sms",
    "avg_monthly_spend",
];

/// A customer row as produced by a data source, before normalization.
///
/// Every column is optional: sources may omit columns entirely or carry
/// cells that could not be decoded. `Customer::from` fills the gaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerRow {
    pub customer_id: Option<u64>,
    pub name: Option<String>,
    pub region: Option<String>,
    pub avg_monthly_data_gb: Option<f64>,
    pub avg_monthly_minutes: Option<f64>,
    pub avg_monthly_sms: Option<f64>,
    pub avg_monthly_spend: Option<f64>,
}

/// A normalized customer usage profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer identifier.
    pub customer_id: u64,
    /// Display name (may be empty).
    pub name: String,
    /// Region name, compared case-insensitively (may be empty).
    pub region: String,
    /// Average monthly mobile data usage in GB.
    pub avg_monthly_data_gb: f64,
    /// Average monthly call minutes.
    pub avg_monthly_minutes: f64,
    /// Average monthly SMS count.
    pub avg_monthly_sms: f64,
    /// Average monthly bill today.
    pub avg_monthly_spend: f64,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            customer_id: row.customer_id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            region: row.region.unwrap_or_default(),
            avg_monthly_data_gb: finite_or_zero(row.avg_monthly_data_gb),
            avg_monthly_minutes: finite_or_zero(row.avg_monthly_minutes),
            avg_monthly_sms: finite_or_zero(row.avg_monthly_sms),
            avg_monthly_spend: finite_or_zero(row.avg_monthly_spend),
        }
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Immutable snapshot of the full customer population.
///
/// Produced wholesale by one load cycle and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerTable {
    customers: Vec<Customer>,
}

impl CustomerTable {
    pub fn new(customers: Vec<Customer>) -> Self {
        Self { customers }
    }

    /// Table with zero rows (still carrying the full column set).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalizes raw source rows into a table, preserving source order.
    pub fn from_rows(rows: Vec<CustomerRow>) -> Self {
        Self::new(rows.into_iter().map(Customer::from).collect())
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &CUSTOMER_COLUMNS
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Customer> {
        self.customers.iter()
    }

    /// Looks up a customer by id. Duplicate ids resolve to the first row.
    pub fn find(&self, customer_id: u64) -> Option<&Customer> {
        self.customers.iter().find(|c| c.customer_id == customer_id)
    }
}

// ============ Plans & Recommendations ============

/// A telecom service tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    /// Tier name, unique within the catalog.
    pub name: &'static str,
    /// Included data in GB.
    pub data_gb: f64,
    /// Included call minutes.
    pub minutes: f64,
    /// Included SMS.
    pub sms: f64,
    /// Monthly price.
    pub price: f64,
}

/// Plan recommendation derived from a single customer's usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub customer_id: u64,
    /// Name of the recommended catalog plan.
    pub recommended_plan: String,
    /// Monthly bill on the recommended plan (its price).
    pub estimated_monthly_bill: f64,
    /// Current spend minus the plan price, rounded to 2 decimals.
    /// Positive means the customer overpays today; negative is an upsell.
    pub estimated_savings: f64,
    /// Human-readable explanation.
    pub recommendation_reason: String,
}

/// A customer joined with its recommendation, as returned by listing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecommendation {
    pub customer_id: u64,
    pub name: String,
    pub region: String,
    pub avg_monthly_data_gb: f64,
    pub avg_monthly_minutes: f64,
    pub avg_monthly_sms: f64,
    pub avg_monthly_spend: f64,
    pub recommended_plan: String,
    pub estimated_monthly_bill: f64,
    pub estimated_savings: f64,
    pub recommendation_reason: String,
}

impl CustomerRecommendation {
    pub fn new(customer: &Customer, recommendation: Recommendation) -> Self {
        Self {
            customer_id: customer.customer_id,
            name: customer.name.clone(),
            region: customer.region.clone(),
            avg_monthly_data_gb: customer.avg_monthly_data_gb,
            avg_monthly_minutes: customer.avg_monthly_minutes,
            avg_monthly_sms: customer.avg_monthly_sms,
            avg_monthly_spend: customer.avg_monthly_spend,
            recommended_plan: recommendation.recommended_plan,
            estimated_monthly_bill: recommendation.estimated_monthly_bill,
            estimated_savings: recommendation.estimated_savings,
            recommendation_reason: recommendation.recommendation_reason,
        }
    }
}

// ============ API Request/Response Models ============

/// Query parameters accepted by the listing endpoints.
///
/// Everything is kept as raw text so malformed values fall back to the
/// endpoint defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQueryParams {
    pub region: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryQueryParams {
    pub region: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerRecommendation>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopSavingsResponse {
    pub top_savings: Vec<CustomerRecommendation>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopUpsellResponse {
    pub top_upsell: Vec<CustomerRecommendation>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct PlanCatalogResponse {
    pub plans: Vec<Plan>,
}

/// Aggregate view over a (optionally region-scoped) customer population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Region filter applied, or `"All"`.
    pub region: String,
    pub total_customers: usize,
    /// Mean current spend; 0.0 for an empty population.
    pub avg_monthly_spend: f64,
    pub total_current_spend: f64,
    pub savings_opportunities: SavingsOpportunities,
    pub upsell_opportunities: UpsellOpportunities,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavingsOpportunities {
    pub count: usize,
    pub total_potential_savings: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsellOpportunities {
    pub count: usize,
    pub total_potential_revenue: f64,
}
