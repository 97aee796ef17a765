pub struct Table;

// ids are uuid v4 strings, 36 characters
// dates are stored as YYYY-MM-DD, 10 characters

impl Table {
    /// password is sha256(salt + password), salt is url-safe base64
    pub const USER_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS user(
            id VARCHAR(36) NOT NULL,
            username VARCHAR(150) NOT NULL,
            first_name VARCHAR(150) NOT NULL,
            last_name VARCHAR(150) NOT NULL,
            email VARCHAR(254) NOT NULL,
            salt VARCHAR(32) NOT NULL,
            password BINARY(32) NOT NULL,
            is_superuser INT NOT NULL DEFAULT 0,
            PRIMARY KEY (id),
            UNIQUE (username)
        )
    ";
    /// revocation stamp per user in unix nanoseconds, tokens issued at or before tbn are rejected
    pub const TOKEN_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS token(
            id VARCHAR(36) NOT NULL,
            tbn BIGINT NOT NULL,
            PRIMARY KEY (id)
        )
    ";
    pub const EMPLOYEE_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS employee(
            id VARCHAR(36) NOT NULL,
            user_id VARCHAR(36) NOT NULL,
            role VARCHAR(10) NOT NULL,
            join_date VARCHAR(10) NOT NULL,
            performance_score DOUBLE NOT NULL DEFAULT 0,
            PRIMARY KEY (id),
            UNIQUE (user_id),
            FOREIGN KEY (user_id) REFERENCES user(id) ON DELETE CASCADE
        )
    ";
    pub const PROPERTY_LISTING_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS property_listing(
            id VARCHAR(36) NOT NULL,
            property_type VARCHAR(50) NOT NULL,
            location VARCHAR(255) NOT NULL,
            address VARCHAR(255) NOT NULL,
            floors INT NOT NULL DEFAULT 0,
            covered_area VARCHAR(50) NOT NULL DEFAULT '',
            electricity_status VARCHAR(50) NOT NULL DEFAULT '',
            bathroom_count INT NOT NULL DEFAULT 0,
            bedroom_count INT NOT NULL DEFAULT 0,
            booking_amount DECIMAL(15, 2) NULL,
            price DECIMAL(15, 2) NULL,
            status VARCHAR(20) NOT NULL,
            image VARCHAR(64) NULL,
            PRIMARY KEY (id)
        )
    ";
    pub const PREDEFINED_TASK_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS predefined_task(
            id VARCHAR(36) NOT NULL,
            title VARCHAR(255) NOT NULL,
            description TEXT NOT NULL,
            priority VARCHAR(10) NOT NULL,
            PRIMARY KEY (id)
        )
    ";
    /// document is the link of the completion document
    pub const TASK_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS task(
            id VARCHAR(36) NOT NULL,
            predefined_task_id VARCHAR(36) NOT NULL,
            assigned_to VARCHAR(36) NULL,
            description TEXT NOT NULL,
            priority VARCHAR(10) NOT NULL,
            due_date VARCHAR(10) NOT NULL,
            status VARCHAR(10) NOT NULL,
            document VARCHAR(64) NULL,
            PRIMARY KEY (id),
            FOREIGN KEY (predefined_task_id) REFERENCES predefined_task(id) ON DELETE CASCADE,
            FOREIGN KEY (assigned_to) REFERENCES employee(id) ON DELETE SET NULL
        )
    ";
    pub const SALE_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS sale(
            id VARCHAR(36) NOT NULL,
            property_id VARCHAR(36) NOT NULL,
            agent_id VARCHAR(36) NULL,
            buyer_name VARCHAR(255) NOT NULL,
            buyer_id VARCHAR(50) NOT NULL,
            buyer_email VARCHAR(254) NULL,
            buyer_tel VARCHAR(20) NOT NULL,
            buyer_address VARCHAR(255) NOT NULL,
            payment_method VARCHAR(50) NOT NULL,
            seller_name VARCHAR(255) NOT NULL,
            seller_tel VARCHAR(20) NOT NULL,
            seller_email VARCHAR(254) NULL,
            seller_address VARCHAR(255) NOT NULL,
            ownership_verification VARCHAR(255) NOT NULL,
            sale_date VARCHAR(10) NULL,
            sale_price DECIMAL(15, 2) NOT NULL,
            title_insurance DECIMAL(15, 2) NOT NULL DEFAULT 0,
            legal_fees DECIMAL(15, 2) NOT NULL DEFAULT 0,
            deposit DECIMAL(15, 2) NOT NULL DEFAULT 0,
            closing_date VARCHAR(10) NULL,
            PRIMARY KEY (id),
            FOREIGN KEY (property_id) REFERENCES property_listing(id) ON DELETE CASCADE,
            FOREIGN KEY (agent_id) REFERENCES employee(id) ON DELETE SET NULL
        )
    ";
    pub const AGENT_PROFIT_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS agent_profit(
            id VARCHAR(36) NOT NULL,
            agent_id VARCHAR(36) NOT NULL,
            sale_id VARCHAR(36) NOT NULL,
            profit_amount DECIMAL(15, 2) NOT NULL,
            recorded_at VARCHAR(10) NOT NULL,
            PRIMARY KEY (id),
            FOREIGN KEY (agent_id) REFERENCES employee(id) ON DELETE CASCADE,
            FOREIGN KEY (sale_id) REFERENCES sale(id) ON DELETE CASCADE
        )
    ";
    /// aggregate_points = sales_closed * 10 + tasks_completed * 5
    pub const PERFORMANCE_METRICS_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS performance_metrics(
            employee_id VARCHAR(36) NOT NULL,
            tasks_completed INT UNSIGNED NOT NULL DEFAULT 0,
            sales_closed INT UNSIGNED NOT NULL DEFAULT 0,
            aggregate_points INT UNSIGNED NOT NULL DEFAULT 0,
            PRIMARY KEY (employee_id),
            FOREIGN KEY (employee_id) REFERENCES employee(id) ON DELETE CASCADE
        )
    ";
    pub const PRODUCTIVITY_TRACKER_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS productivity_tracker(
            id VARCHAR(36) NOT NULL,
            employee_id VARCHAR(36) NOT NULL,
            date VARCHAR(10) NOT NULL,
            hours_worked DOUBLE NOT NULL DEFAULT 0,
            tasks_completed INT UNSIGNED NOT NULL DEFAULT 0,
            PRIMARY KEY (id),
            UNIQUE (employee_id, date),
            FOREIGN KEY (employee_id) REFERENCES employee(id) ON DELETE CASCADE
        )
    ";
    pub const REVENUE_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS revenue(
            id VARCHAR(36) NOT NULL,
            year INT UNSIGNED NOT NULL,
            month INT UNSIGNED NOT NULL,
            total_revenue DECIMAL(15, 2) NOT NULL,
            total_expenses DECIMAL(15, 2) NOT NULL,
            net_profit DECIMAL(15, 2) NOT NULL,
            PRIMARY KEY (id),
            UNIQUE (year, month)
        )
    ";

    /// Every table, parents before children.
    pub const ALL: [(&'static str, &'static str); 11] = [
        ("user", Self::USER_TABLE),
        ("token", Self::TOKEN_TABLE),
        ("employee", Self::EMPLOYEE_TABLE),
        ("property_listing", Self::PROPERTY_LISTING_TABLE),
        ("predefined_task", Self::PREDEFINED_TASK_TABLE),
        ("task", Self::TASK_TABLE),
        ("sale", Self::SALE_TABLE),
        ("agent_profit", Self::AGENT_PROFIT_TABLE),
        ("performance_metrics", Self::PERFORMANCE_METRICS_TABLE),
        ("productivity_tracker", Self::PRODUCTIVITY_TRACKER_TABLE),
        ("revenue", Self::REVENUE_TABLE),
    ];
}

#[cfg(test)]
mod tests {
    use super::Table;

    #[test]
    fn referenced_tables_are_created_first() {
        let position = |name: &str| Table::ALL.iter().position(|(n, _)| *n == name).unwrap();
        for (i, (_, ddl)) in Table::ALL.iter().enumerate() {
            for part in ddl.split("REFERENCES ").skip(1) {
                let parent = part.split('(').next().unwrap().trim();
                assert!(position(parent) < i, "{parent} must precede table #{i}");
            }
        }
    }
}
