//! Permission groups and the actions inside each group.

pub static PROPERTY: &str = "property";
pub static PROPERTY_ACTIONS: [&str; 7] = [
    PropertyGroup::QUERY,
    PropertyGroup::CREATE,
    PropertyGroup::UPDATE,
    PropertyGroup::DELETE,
    PropertyGroup::EXPORT,
    PropertyGroup::IMPORT,
    PropertyGroup::SELL,
];

pub struct PropertyGroup;
impl PropertyGroup {
    pub const QUERY: &'static str = "query";
    pub const CREATE: &'static str = "create";
    /// edit fields and change status
    pub const UPDATE: &'static str = "update";
    pub const DELETE: &'static str = "delete";
    pub const EXPORT: &'static str = "export";
    pub const IMPORT: &'static str = "import";
    /// record a sale
    pub const SELL: &'static str = "sell";
}

pub static TASK: &str = "task";
pub static TASK_ACTIONS: [&str; 6] = [
    TaskGroup::QUERY_OWN,
    TaskGroup::QUERY_ALL,
    TaskGroup::UPDATE_STATUS,
    TaskGroup::ASSIGN,
    TaskGroup::DELETE,
    TaskGroup::TEMPLATE,
];

pub struct TaskGroup;
impl TaskGroup {
    pub const QUERY_OWN: &'static str = "query_own";
    pub const QUERY_ALL: &'static str = "query_all";
    pub const UPDATE_STATUS: &'static str = "update_status";
    /// assign and edit
    pub const ASSIGN: &'static str = "assign";
    /// delete one task or clear all
    pub const DELETE: &'static str = "delete";
    /// create predefined tasks
    pub const TEMPLATE: &'static str = "template";
}

pub static EMPLOYEE: &str = "employee";
pub static EMPLOYEE_ACTIONS: [&str; 4] = [
    EmployeeGroup::QUERY,
    EmployeeGroup::CREATE,
    EmployeeGroup::UPDATE,
    EmployeeGroup::DELETE,
];

pub struct EmployeeGroup;
impl EmployeeGroup {
    pub const QUERY: &'static str = "query";
    pub const CREATE: &'static str = "create";
    pub const UPDATE: &'static str = "update";
    pub const DELETE: &'static str = "delete";
}

pub static SALE: &str = "sale";
pub static SALE_ACTIONS: [&str; 2] = [SaleGroup::QUERY_OWN, SaleGroup::QUERY_ALL];

pub struct SaleGroup;
impl SaleGroup {
    pub const QUERY_OWN: &'static str = "query_own";
    pub const QUERY_ALL: &'static str = "query_all";
}

pub static REPORT: &str = "report";
pub static REPORT_ACTIONS: [&str; 5] = [
    ReportGroup::HOME,
    ReportGroup::AGENT,
    ReportGroup::ADMIN,
    ReportGroup::LOG_HOURS,
    ReportGroup::REVENUE,
];

pub struct ReportGroup;
impl ReportGroup {
    pub const HOME: &'static str = "home";
    pub const AGENT: &'static str = "agent";
    pub const ADMIN: &'static str = "admin";
    pub const LOG_HOURS: &'static str = "log_hours";
    /// write revenue periods
    pub const REVENUE: &'static str = "revenue";
}

pub fn groups() -> Vec<(&'static str, &'static [&'static str])> {
    vec![
        (PROPERTY, &PROPERTY_ACTIONS),
        (TASK, &TASK_ACTIONS),
        (EMPLOYEE, &EMPLOYEE_ACTIONS),
        (SALE, &SALE_ACTIONS),
        (REPORT, &REPORT_ACTIONS),
    ]
}
