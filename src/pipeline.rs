/// Shared query pipeline behind every analytic endpoint:
/// filter by region → recommend → classify → sort → paginate, plus the
/// aggregate summary over the filtered population.
use crate::models::{
    Customer, CustomerRecommendation, CustomerTable, ListQueryParams, Recommendation,
    SavingsOpportunities, SummaryStats, UpsellOpportunities,
};
use crate::recommender::round_currency;
use std::cmp::Ordering;

/// Field a result page can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CustomerId,
    Name,
    Region,
    AvgMonthlyDataGb,
    AvgMonthlyMinutes,
    AvgMonthlySms,
    AvgMonthlySpend,
    RecommendedPlan,
    EstimatedMonthlyBill,
    EstimatedSavings,
}

impl SortKey {
    /// Parses a record field name; unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let key = match name.trim().to_ascii_lowercase().as_str() {
            "customer_id" => SortKey::CustomerId,
            "name" => SortKey::Name,
            "region" => SortKey::Region,
            "avg_monthly_data_gb" => SortKey::AvgMonthlyDataGb,
            "avg_monthly_minutes" => SortKey::AvgMonthlyMinutes,
            "avg_monthly_sms" => SortKey::AvgMonthlySms,
            "avg_monthly_spend" => SortKey::AvgMonthlySpend,
            "recommended_plan" => SortKey::RecommendedPlan,
            "estimated_monthly_bill" => SortKey::EstimatedMonthlyBill,
            "estimated_savings" => SortKey::EstimatedSavings,
            _ => return None,
        };
        Some(key)
    }

    fn compare(self, a: &CustomerRecommendation, b: &CustomerRecommendation) -> Ordering {
        match self {
            SortKey::CustomerId => a.customer_id.cmp(&b.customer_id),
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Region => a.region.cmp(&b.region),
            SortKey::AvgMonthlyDataGb => a.avg_monthly_data_gb.total_cmp(&b.avg_monthly_data_gb),
            SortKey::AvgMonthlyMinutes => a.avg_monthly_minutes.total_cmp(&b.avg_monthly_minutes),
            SortKey::AvgMonthlySms => a.avg_monthly_sms.total_cmp(&b.avg_monthly_sms),
            SortKey::AvgMonthlySpend => a.avg_monthly_spend.total_cmp(&b.avg_monthly_spend),
            SortKey::RecommendedPlan => a.recommended_plan.cmp(&b.recommended_plan),
            SortKey::EstimatedMonthlyBill => {
                a.estimated_monthly_bill.total_cmp(&b.estimated_monthly_bill)
            }
            SortKey::EstimatedSavings => a.estimated_savings.total_cmp(&b.estimated_savings),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Ascending),
            "desc" | "descending" => Some(SortOrder::Descending),
            _ => None,
        }
    }
}

/// Which records survive classification by the sign of `estimated_savings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    All,
    /// Strictly positive savings.
    Savings,
    /// Strictly negative savings.
    Upsell,
}

impl View {
    fn admits(self, estimated_savings: f64) -> bool {
        match self {
            View::All => true,
            View::Savings => estimated_savings > 0.0,
            View::Upsell => estimated_savings < 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Case-insensitive exact region match; `None` keeps every row.
    pub region: Option<String>,
    /// `None` keeps post-filter order.
    pub sort_key: Option<SortKey>,
    pub sort_order: SortOrder,
    pub limit: usize,
    pub view: View,
}

impl QueryOptions {
    /// Options carrying an endpoint's defaults.
    pub fn new(view: View, sort_key: SortKey, sort_order: SortOrder, limit: usize) -> Self {
        Self {
            region: None,
            sort_key: Some(sort_key),
            sort_order,
            limit,
            view,
        }
    }

    /// Overrides defaults with whatever request parameters parse.
    ///
    /// An unparsable `limit` or `order` keeps the default; an unknown `sort`
    /// field disables sorting.
    pub fn with_params(mut self, params: &ListQueryParams) -> Self {
        self.region = normalize_region(params.region.as_deref());

        if let Some(ref sort) = params.sort {
            self.sort_key = SortKey::parse(sort);
            if self.sort_key.is_none() {
                tracing::debug!("Unknown sort key '{}', keeping filter order", sort);
            }
        }
        if let Some(order) = params.order.as_deref().and_then(SortOrder::parse) {
            self.sort_order = order;
        }
        if let Some(limit) = params
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<usize>().ok())
        {
            self.limit = limit;
        }
        self
    }
}

/// One page of enriched records plus the size of the full result set.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub records: Vec<CustomerRecommendation>,
    /// Number of records before truncation to `limit`.
    pub total: usize,
}

/// Blank or missing region filters mean "all regions". Surrounding
/// whitespace is not part of the region name.
pub fn normalize_region(region: Option<&str>) -> Option<String> {
    region
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

fn region_filter<'a>(
    table: &'a CustomerTable,
    region: Option<&str>,
) -> impl Iterator<Item = &'a Customer> {
    let wanted = region.map(str::to_lowercase);
    table.iter().filter(move |customer| match wanted {
        Some(ref wanted) => customer.region.to_lowercase() == *wanted,
        None => true,
    })
}

/// Runs the pipeline over `table`.
pub fn query<F>(table: &CustomerTable, recommend_fn: F, options: &QueryOptions) -> QueryPage
where
    F: Fn(&Customer) -> Recommendation,
{
    let mut records: Vec<CustomerRecommendation> = region_filter(table, options.region.as_deref())
        .map(|customer| CustomerRecommendation::new(customer, recommend_fn(customer)))
        .filter(|record| options.view.admits(record.estimated_savings))
        .collect();

    // sort_by is stable: ties keep source order
    if let Some(key) = options.sort_key {
        match options.sort_order {
            SortOrder::Ascending => records.sort_by(|a, b| key.compare(a, b)),
            SortOrder::Descending => records.sort_by(|a, b| key.compare(b, a)),
        }
    }

    let total = records.len();
    records.truncate(options.limit);

    QueryPage { records, total }
}

/// Aggregates spend and opportunity figures over the region-filtered table.
///
/// Sums are taken over the already-rounded per-customer savings; the mean of
/// an empty population is 0.0.
pub fn summarize<F>(table: &CustomerTable, recommend_fn: F, region: Option<&str>) -> SummaryStats
where
    F: Fn(&Customer) -> Recommendation,
{
    let region = normalize_region(region);

    let mut total_customers = 0usize;
    let mut total_spend = 0.0;
    let mut savings = SavingsOpportunities::default();
    let mut upsell = UpsellOpportunities::default();

    for customer in region_filter(table, region.as_deref()) {
        total_customers += 1;
        total_spend += customer.avg_monthly_spend;

        let estimated_savings = recommend_fn(customer).estimated_savings;
        if estimated_savings > 0.0 {
            savings.count += 1;
            savings.total_potential_savings += estimated_savings;
        } else if estimated_savings < 0.0 {
            upsell.count += 1;
            upsell.total_potential_revenue += estimated_savings.abs();
        }
    }

    let avg_spend = if total_customers == 0 {
        0.0
    } else {
        total_spend / total_customers as f64
    };
    savings.total_potential_savings = round_currency(savings.total_potential_savings);
    upsell.total_potential_revenue = round_currency(upsell.total_potential_revenue);

    SummaryStats {
        region: region.unwrap_or_else(|| "All".to_string()),
        total_customers,
        avg_monthly_spend: round_currency(avg_spend),
        total_current_spend: round_currency(total_spend),
        savings_opportunities: savings,
        upsell_opportunities: upsell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommender::recommend;

    fn customer(id: u64, region: &str, spend: f64) -> Customer {
        Customer {
            customer_id: id,
            name: format!("Customer {}", id),
            region: region.to_string(),
            avg_monthly_data_gb: 5.0,
            avg_monthly_minutes: 100.0,
            avg_monthly_sms: 50.0,
            avg_monthly_spend: spend,
        }
    }

    fn table() -> CustomerTable {
        // All Basic (price 199): savings = spend - 199
        CustomerTable::new(vec![
            customer(3, "Delhi", 399.0),
            customer(1, "Mumbai", 99.0),
            customer(2, "delhi", 199.0),
            customer(4, "Pune", 250.5),
        ])
    }

    fn ids(page: &QueryPage) -> Vec<u64> {
        page.records.iter().map(|r| r.customer_id).collect()
    }

    #[test]
    fn test_listing_defaults() {
        let options = QueryOptions::new(View::All, SortKey::CustomerId, SortOrder::Ascending, 100);
        let page = query(&table(), recommend, &options);
        assert_eq!(ids(&page), vec![1, 2, 3, 4]);
        assert_eq!(page.total, 4);
    }

    #[test]
    fn test_region_filter_is_case_insensitive() {
        let params = ListQueryParams {
            region: Some("DELHI".to_string()),
            ..Default::default()
        };
        let options = QueryOptions::new(View::All, SortKey::CustomerId, SortOrder::Ascending, 10)
            .with_params(&params);
        let page = query(&table(), recommend, &options);
        assert_eq!(ids(&page), vec![2, 3]);
    }

    #[test]
    fn test_unknown_sort_key_keeps_source_order() {
        let params = ListQueryParams {
            sort: Some("favourite_colour".to_string()),
            ..Default::default()
        };
        let options = QueryOptions::new(View::All, SortKey::CustomerId, SortOrder::Ascending, 10)
            .with_params(&params);
        assert_eq!(options.sort_key, None);
        let page = query(&table(), recommend, &options);
        assert_eq!(ids(&page), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_malformed_params_keep_defaults() {
        let params = ListQueryParams {
            order: Some("sideways".to_string()),
            limit: Some("ten".to_string()),
            region: Some(String::new()),
            ..Default::default()
        };
        let options = QueryOptions::new(View::Savings, SortKey::EstimatedSavings, SortOrder::Descending, 10)
            .with_params(&params);
        assert_eq!(options.sort_order, SortOrder::Descending);
        assert_eq!(options.limit, 10);
        assert_eq!(options.region, None);
    }

    #[test]
    fn test_blank_region_means_all_regions() {
        let params = ListQueryParams {
            region: Some("  ".to_string()),
            ..Default::default()
        };
        let options = QueryOptions::new(View::All, SortKey::CustomerId, SortOrder::Ascending, 10)
            .with_params(&params);
        assert_eq!(options.region, None);
        assert_eq!(query(&table(), recommend, &options).total, 4);

        let stats = summarize(&table(), recommend, Some(" \t"));
        assert_eq!(stats.region, "All");
        assert_eq!(stats.total_customers, 4);
    }

    #[test]
    fn test_region_is_trimmed() {
        assert_eq!(normalize_region(Some(" Delhi ")), Some("Delhi".to_string()));
        let stats = summarize(&table(), recommend, Some(" delhi"));
        assert_eq!(stats.region, "delhi");
        assert_eq!(stats.total_customers, 2);
    }

    #[test]
    fn test_savings_and_upsell_views_partition() {
        let savings = query(
            &table(),
            recommend,
            &QueryOptions::new(View::Savings, SortKey::EstimatedSavings, SortOrder::Descending, 10),
        );
        let upsell = query(
            &table(),
            recommend,
            &QueryOptions::new(View::Upsell, SortKey::EstimatedSavings, SortOrder::Ascending, 10),
        );
        assert_eq!(ids(&savings), vec![3, 4]);
        assert_eq!(ids(&upsell), vec![1]);
        // customer 2 has exactly zero savings and appears in neither
        assert!(!ids(&savings).contains(&2) && !ids(&upsell).contains(&2));
    }

    #[test]
    fn test_limit_truncates_but_total_counts_all() {
        let page = query(
            &table(),
            recommend,
            &QueryOptions::new(View::All, SortKey::AvgMonthlySpend, SortOrder::Descending, 2),
        );
        assert_eq!(ids(&page), vec![3, 4]);
        assert_eq!(page.total, 4);

        let empty = query(
            &table(),
            recommend,
            &QueryOptions::new(View::All, SortKey::CustomerId, SortOrder::Ascending, 0),
        );
        assert!(empty.records.is_empty());
        assert_eq!(empty.total, 4);
    }

    #[test]
    fn test_descending_sort_is_stable() {
        let table = CustomerTable::new(vec![
            customer(10, "Pune", 300.0),
            customer(11, "Pune", 500.0),
            customer(12, "Pune", 300.0),
        ]);
        let page = query(
            &table,
            recommend,
            &QueryOptions::new(View::All, SortKey::AvgMonthlySpend, SortOrder::Descending, 10),
        );
        assert_eq!(ids(&page), vec![11, 10, 12]);
    }

    #[test]
    fn test_summary() {
        let stats = summarize(&table(), recommend, None);
        assert_eq!(stats.region, "All");
        assert_eq!(stats.total_customers, 4);
        assert_eq!(stats.total_current_spend, 947.5);
        assert_eq!(stats.avg_monthly_spend, 236.88);
        assert_eq!(stats.savings_opportunities.count, 2);
        assert_eq!(stats.savings_opportunities.total_potential_savings, 251.5);
        assert_eq!(stats.upsell_opportunities.count, 1);
        assert_eq!(stats.upsell_opportunities.total_potential_revenue, 100.0);
    }

    #[test]
    fn test_summary_of_empty_population() {
        let stats = summarize(&table(), recommend, Some("Atlantis"));
        assert_eq!(stats.region, "Atlantis");
        assert_eq!(stats.total_customers, 0);
        assert_eq!(stats.avg_monthly_spend, 0.0);
        assert_eq!(stats.total_current_spend, 0.0);
        assert_eq!(stats.savings_opportunities, SavingsOpportunities::default());
    }
}
