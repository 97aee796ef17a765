use std::sync::Arc;

use dashmap::DashMap;

use crate::pages::employee::data::Employee;

macro_rules! gen_cache {
    ($(($N:ident, $T:ty)), +) => {
        lazy_static::lazy_static! {
            $(
                pub static ref $N: Arc<DashMap<String, $T>> = {
                    Arc::new(DashMap::new())
                };
            )+
        }
        pub fn clear_cache() {
            $(
                $N.clear();
            )+
        }
    };
}

gen_cache! {
    // user id -> employee profile
    (EMPLOYEE_CACHE, Employee)
}

/// Drop the cached profile of `user_id` after its employee row changed.
pub fn invalidate_employee(user_id: &str) {
    EMPLOYEE_CACHE.remove(user_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::employee::data::Role;

    #[test]
    fn invalidation_drops_only_the_given_user() {
        for user in ["cache-u1", "cache-u2"] {
            EMPLOYEE_CACHE.insert(
                user.to_owned(),
                Employee {
                    id: format!("e-{user}"),
                    user_id: user.to_owned(),
                    role: Role::Agent,
                    join_date: "2024-01-01".into(),
                    performance_score: 0.0,
                },
            );
        }
        invalidate_employee("cache-u1");
        assert!(!EMPLOYEE_CACHE.contains_key("cache-u1"));
        assert!(EMPLOYEE_CACHE.contains_key("cache-u2"));
    }
}
