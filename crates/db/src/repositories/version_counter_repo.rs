//! Repository for the `slot_configuration_version_counters` table.
//!
//! One row per (store, page type) holding the last version number handed
//! out. Allocation locks that row until the surrounding transaction ends, so
//! concurrent inserts for the same page serialize here and never share a
//! number.

use sqlx::{PgConnection, PgPool};
use storefront_core::page_type::PageType;
use storefront_core::types::DbId;

pub struct VersionCounterRepo;

impl VersionCounterRepo {
    /// Allocate the next version number for a page.
    ///
    /// Must run on the same transaction as the insert that uses the number.
    /// On first use the counter is seeded from the highest stored version.
    pub async fn allocate(
        conn: &mut PgConnection,
        store_id: DbId,
        page_type: PageType,
    ) -> Result<i32, sqlx::Error> {
        let row: (i32,) = sqlx::query_as(
            "INSERT INTO slot_configuration_version_counters (store_id, page_type, last_version)
             VALUES ($1, $2,
                     COALESCE((SELECT MAX(version_number) FROM slot_configurations
                               WHERE store_id = $1 AND page_type = $2), 0) + 1)
             ON CONFLICT (store_id, page_type) DO UPDATE
                SET last_version = GREATEST(slot_configuration_version_counters.last_version,
                                            EXCLUDED.last_version - 1) + 1,
                    updated_at = NOW()
             RETURNING last_version",
        )
        .bind(store_id)
        .bind(page_type.as_str())
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    /// Last allocated number, `None` if the page never had a version.
    pub async fn current(
        pool: &PgPool,
        store_id: DbId,
        page_type: PageType,
    ) -> Result<Option<i32>, sqlx::Error> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT last_version FROM slot_configuration_version_counters
             WHERE store_id = $1 AND page_type = $2",
        )
        .bind(store_id)
        .bind(page_type.as_str())
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|r| r.0))
    }
}
