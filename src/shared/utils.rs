use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use serde::Serialize;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_conn(database_url: &str) -> Result<DbPool, diesel::r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().build(manager)
}

/// Applies the table DDL of every domain module, in dependency order.
/// Statements are idempotent (CREATE TABLE IF NOT EXISTS), so this runs
/// unconditionally at startup.
pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let mut conn = pool.get()?;
    let migrations = [
        crate::users_api::migrations::create_users_tables_migration(),
        crate::rooms_api::migrations::create_rooms_tables_migration(),
        crate::meetings_api::migrations::create_meetings_tables_migration(),
    ];
    for sql in migrations {
        if let Err(e) = conn.batch_execute(sql) {
            log::error!("Failed to execute migration: {}", e);
            return Err(e.into());
        }
    }
    log::info!("Database migrations applied");
    Ok(())
}

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Out-of-range values are clamped to defaults rather than rejected.
pub fn normalize_pagination(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = match page {
        Some(p) if p >= 1 => p,
        _ => 1,
    };
    let limit = match limit {
        Some(l) if (1..=MAX_PAGE_LIMIT).contains(&l) => l,
        _ => DEFAULT_PAGE_LIMIT,
    };
    (page, limit)
}

pub fn page_offset(page: i64, limit: i64) -> i64 {
    (page - 1) * limit
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    /// Raw query values go through the same clamping the service applied, so
    /// the reported page and limit always match the returned slice.
    pub fn new(items: Vec<T>, page: Option<i64>, limit: Option<i64>, total: i64) -> Self {
        let (page, limit) = normalize_pagination(page, limit);
        Self {
            items,
            pagination: PaginationMeta::new(page, limit, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(normalize_pagination(None, None), (1, 10));
        assert_eq!(normalize_pagination(Some(3), Some(25)), (3, 25));
    }

    #[test]
    fn test_pagination_clamps_instead_of_rejecting() {
        assert_eq!(normalize_pagination(Some(0), Some(0)), (1, 10));
        assert_eq!(normalize_pagination(Some(-5), Some(-1)), (1, 10));
        assert_eq!(normalize_pagination(Some(2), Some(101)), (2, 10));
        assert_eq!(normalize_pagination(Some(1), Some(100)), (1, 100));
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
        assert_eq!(page_offset(2, 25), 25);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(PaginationMeta::new(1, 10, 0).total_pages, 0);
        assert_eq!(PaginationMeta::new(1, 10, 1).total_pages, 1);
        assert_eq!(PaginationMeta::new(1, 10, 10).total_pages, 1);
        assert_eq!(PaginationMeta::new(1, 10, 11).total_pages, 2);
        assert_eq!(PaginationMeta::new(1, 25, 99).total_pages, 4);
    }

    #[test]
    fn test_paginated_reports_clamped_values() {
        let page = Paginated::new(vec![1, 2, 3], Some(0), Some(1000), 3);
        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.limit, 10);
        assert_eq!(page.pagination.total_pages, 1);
        assert_eq!(page.items, vec![1, 2, 3]);
    }
}
