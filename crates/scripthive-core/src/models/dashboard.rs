//! Aggregate figures shown on the dashboard cards and charts.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{Project, StatusKind, Transaction, User};

/// Months of revenue kept for the trend chart.
pub const REVENUE_MONTHS: usize = 6;

/// Label for projects posted without a category.
const UNCATEGORIZED: &str = "Other";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_scripts: usize,
    pub active_users: usize,
    pub total_users: usize,
    pub pending_reviews: usize,
    /// Sum of successful transaction amounts, in KES.
    pub revenue: f64,
    pub successful_payments: usize,
    pub failed_payments: usize,
    /// Successful revenue per calendar month, oldest first.
    pub revenue_by_month: Vec<MonthlyRevenue>,
    /// Scripts per category, largest first.
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub amount: f64,
}

impl MonthlyRevenue {
    /// Short month name, e.g. "Jun".
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%b").to_string())
            .unwrap_or_else(|| format!("{:02}", self.month))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Calendar month of a transaction date, in either the compact
/// `yyyyMMddHHmmss` form M-Pesa sends or RFC 3339.
fn transaction_month(date: &str) -> Option<(i32, u32)> {
    let date = date.trim();
    let day = if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y%m%d%H%M%S") {
        dt.date()
    } else if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        dt.date_naive()
    } else {
        NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()?
    };
    Some((day.year(), day.month()))
}

impl DashboardStats {
    pub fn compute(users: &[User], projects: &[Project], transactions: &[Transaction]) -> Self {
        let revenue = transactions
            .iter()
            .filter(|t| t.is_successful())
            .map(|t| t.amount)
            .sum();

        Self {
            total_scripts: projects.len(),
            active_users: users.iter().filter(|u| u.active).count(),
            total_users: users.len(),
            pending_reviews: projects
                .iter()
                .filter(|p| p.status_kind() == StatusKind::Pending)
                .count(),
            revenue,
            successful_payments: transactions.iter().filter(|t| t.is_successful()).count(),
            failed_payments: transactions
                .iter()
                .filter(|t| t.status_kind() == StatusKind::Failed)
                .count(),
            revenue_by_month: Self::monthly_revenue(transactions),
            categories: Self::category_counts(projects),
        }
    }

    /// The last `REVENUE_MONTHS` months that saw successful payments. Months
    /// with no payments are filled in so the trend has no gaps. Undated
    /// payments still count towards `revenue` but not here.
    fn monthly_revenue(transactions: &[Transaction]) -> Vec<MonthlyRevenue> {
        let mut months: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for t in transactions.iter().filter(|t| t.is_successful()) {
            if let Some(key) = t.transaction_date.as_deref().and_then(transaction_month) {
                *months.entry(key).or_default() += t.amount;
            }
        }

        let (Some(&first), Some(&last)) = (months.keys().next(), months.keys().next_back()) else {
            return Vec::new();
        };

        let mut series = Vec::new();
        let (mut year, mut month) = first;
        while (year, month) <= last {
            series.push(MonthlyRevenue {
                year,
                month,
                amount: months.get(&(year, month)).copied().unwrap_or(0.0),
            });
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }

        let skip = series.len().saturating_sub(REVENUE_MONTHS);
        series.split_off(skip)
    }

    fn category_counts(projects: &[Project]) -> Vec<CategoryCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for p in projects {
            let name = match p.category.trim() {
                "" => UNCATEGORIZED,
                name => name,
            };
            *counts.entry(name).or_default() += 1;
        }

        let mut categories: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(name, count)| CategoryCount {
                name: name.to_string(),
                count,
            })
            .collect();
        categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        categories
    }

    /// Percent change of the latest month's revenue over the month before.
    /// None without two months to compare or when the earlier one is zero.
    pub fn revenue_change(&self) -> Option<f64> {
        let [.., previous, latest] = self.revenue_by_month.as_slice() else {
            return None;
        };
        if previous.amount == 0.0 {
            return None;
        }
        Some((latest.amount - previous.amount) / previous.amount * 100.0)
    }
}
