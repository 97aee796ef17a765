use mysql_common::prelude::FromRow;

/// Points per closed sale.
pub const SALE_POINTS: u32 = 10;
/// Points per completed task.
pub const TASK_POINTS: u32 = 5;

#[derive(Debug, Clone, Default, serde::Serialize, FromRow, PartialEq, Eq)]
pub struct PerformanceMetrics {
    pub employee_id: String,
    pub tasks_completed: u32,
    pub sales_closed: u32,
    pub aggregate_points: u32,
}

impl PerformanceMetrics {
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            ..Default::default()
        }
    }
    pub fn update_aggregate_points(&mut self) {
        self.aggregate_points = aggregate_points(self.sales_closed, self.tasks_completed);
    }
}

pub fn aggregate_points(sales_closed: u32, tasks_completed: u32) -> u32 {
    sales_closed * SALE_POINTS + tasks_completed * TASK_POINTS
}

#[derive(Debug, Clone, serde::Serialize, FromRow, PartialEq)]
pub struct ProductivityTracker {
    pub id: String,
    pub employee_id: String,
    pub date: String,
    pub hours_worked: f64,
    pub tasks_completed: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, FromRow, PartialEq)]
pub struct Revenue {
    #[serde(default)]
    pub id: String,
    pub year: u32,
    pub month: u32,
    pub total_revenue: f64,
    pub total_expenses: f64,
    #[serde(default)]
    pub net_profit: f64,
}

impl Revenue {
    pub fn new(year: u32, month: u32, total_revenue: f64, total_expenses: f64) -> Self {
        Self {
            id: String::new(),
            year,
            month,
            total_revenue,
            total_expenses,
            net_profit: total_revenue - total_expenses,
        }
    }
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=12).contains(&self.month) {
            return Err(format!("month must be between 1 and 12, got {}", self.month));
        }
        if self.year < 1900 {
            return Err(format!("year {} is out of range", self.year));
        }
        if !self.total_revenue.is_finite() || !self.total_expenses.is_finite() {
            return Err("revenue and expenses must be numbers".into());
        }
        Ok(())
    }
    pub fn period(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

/// Sample revenue for the twelve months ending at `(year, month)`: a base of
/// 1,000,000 growing 50,000 per month back in time, with expenses at 30%.
pub fn sample_revenue(year: u32, month: u32) -> Vec<Revenue> {
    (0..12u32)
        .map(|i| {
            let (year, month) = if month <= i {
                (year - 1, 12 + month - i)
            } else {
                (year, month - i)
            };
            let total_revenue = 1_000_000.0 + f64::from(i) * 50_000.0;
            let total_expenses = (total_revenue * 0.3 * 100.0).round() / 100.0;
            Revenue::new(year, month, total_revenue, total_expenses)
        })
        .collect()
}

/// Metrics row joined with the employee's name and role.
#[derive(Debug, Clone, serde::Serialize, FromRow)]
pub struct MetricsInfo {
    pub employee_id: String,
    pub name: String,
    pub role: String,
    pub tasks_completed: u32,
    pub sales_closed: u32,
    pub aggregate_points: u32,
}

pub static METRICS_INFO_SQL: &str = "SELECT m.employee_id,
    TRIM(CONCAT(u.first_name, ' ', u.last_name)) AS name, e.role,
    m.tasks_completed, m.sales_closed, m.aggregate_points
    FROM performance_metrics m JOIN employee e ON e.id = m.employee_id
    JOIN user u ON u.id = e.user_id";

/// Chart data: one label per value.
#[derive(Debug, Clone, Default, serde::Serialize, PartialEq)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl FromIterator<(String, f64)> for Series {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let (labels, values) = iter.into_iter().unzip();
        Series { labels, values }
    }
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize, PartialEq)]
pub struct FinancialOverview {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
}

impl FinancialOverview {
    pub fn of(periods: &[Revenue]) -> Self {
        let total_revenue = periods.iter().map(|r| r.total_revenue).sum();
        let total_expenses = periods.iter().map(|r| r.total_expenses).sum();
        FinancialOverview {
            total_revenue,
            total_expenses,
            net_profit: total_revenue - total_expenses,
        }
    }
}
