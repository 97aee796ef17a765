mod table;
use std::{fmt::Display, sync::OnceLock};

use mysql::{prelude::Queryable, Pool, PooledConn};
pub use table::Table;

use crate::{Config, Response};

pub struct Database;
impl Database {
    /// primary or unique key already present
    pub const DUPLICATE_KEY_ERROR_CODE: u16 = 1062;
}

static POOL: OnceLock<Pool> = OnceLock::new();

/// Open the connection pool. Later calls keep the first pool.
pub fn init_pool(url: &str) -> mysql::Result<()> {
    let pool = Pool::new(url)?;
    let _ = POOL.set(pool);
    Ok(())
}

/// Take a connection from the pool, opening it from the installed config
/// on first use.
pub fn get_conn() -> Result<PooledConn, Response> {
    let pool = match POOL.get() {
        Some(pool) => pool,
        None => {
            let pool = Pool::new(Config::get().mysql_addr().as_str())?;
            POOL.get_or_init(|| pool)
        }
    };
    Ok(pool.get_conn()?)
}

#[macro_export]
macro_rules! catch {
    ($result:expr => dup, $msg:expr) => {
        match $result {
            Ok(ok) => Ok(ok),
            Err(err) => Err($crate::database::catch_some_mysql_error(
                $crate::database::Database::DUPLICATE_KEY_ERROR_CODE,
                $msg,
                err,
            )),
        }
    };
    ($result:expr => dup) => {
        $crate::catch!($result => dup, "duplicate entry")
    };
}

/// Map mysql error `code` to an envelope carrying `msg` (409 for duplicate
/// keys, 404 otherwise), anything else to a 500.
pub fn catch_some_mysql_error(code: u16, msg: impl Display, err: mysql::Error) -> Response {
    match err {
        mysql::Error::MySqlError(e) if e.code == code => {
            if code == Database::DUPLICATE_KEY_ERROR_CODE {
                Response::already_exist(msg)
            } else {
                Response::not_exist(msg)
            }
        }
        e => Response::from(e),
    }
}

/// Run `$fn($conn, params..)` inside a transaction: commit on `Ok`,
/// roll back on `Err`. Evaluates to the function's own result.
#[macro_export]
macro_rules! commit_or_rollback {
    ($fn:expr, $conn:expr $(, $params:expr)* $(,)?) => {{
        mysql::prelude::Queryable::query_drop($conn, "BEGIN")?;
        match $fn($conn $(, $params)*) {
            Ok(ok) => {
                mysql::prelude::Queryable::query_drop($conn, "COMMIT")?;
                Ok(ok)
            }
            Err(e) => {
                mysql::prelude::Queryable::query_drop($conn, "ROLLBACK")?;
                Err(e)
            }
        }
    }};
}

pub fn create_table() -> Result<(), Response> {
    let mut conn = get_conn()?;
    for (name, ddl) in Table::ALL {
        tracing::debug!(table = name, "ensuring table");
        conn.query_drop(ddl)?;
    }
    Ok(())
}
