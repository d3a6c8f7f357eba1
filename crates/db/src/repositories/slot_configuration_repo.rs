//! Repository for the `slot_configurations` table.
//!
//! Every read and write is scoped by `store_id`. Inserts allocate their
//! version number through [`VersionCounterRepo`] on the same transaction.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use storefront_core::page_type::PageType;
use storefront_core::slot_status::SlotStatus;
use storefront_core::types::DbId;

use crate::models::slot_configuration::{
    DraftInsert, NewSlotConfiguration, SlotConfiguration, SlotContentUpdate, StatusTransition,
};
use crate::repositories::VersionCounterRepo;

/// Column list for slot_configurations queries.
const COLUMNS: &str = "id, store_id, user_id, page_type, version_number, status, configuration, \
    parent_version_id, current_edit_id, has_unpublished_changes, metadata, \
    published_at, published_by, acceptance_published_at, acceptance_published_by, \
    created_at, updated_at";

/// Conflict target of the partial unique index on open drafts.
const OPEN_DRAFT_CONFLICT: &str =
    "ON CONFLICT (store_id, page_type, user_id) WHERE status IN ('init', 'draft') DO NOTHING";

pub struct SlotConfigurationRepo;

impl SlotConfigurationRepo {
    /// Find a record by id within a store.
    pub async fn find_by_id(
        pool: &PgPool,
        store_id: DbId,
        id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM slot_configurations WHERE id = $1 AND store_id = $2");
        sqlx::query_as::<_, SlotConfiguration>(&query)
            .bind(id)
            .bind(store_id)
            .fetch_optional(pool)
            .await
    }

    /// The user's open (init or draft) record for a page, if any.
    pub async fn find_open_draft(
        pool: &PgPool,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM slot_configurations
             WHERE store_id = $1 AND page_type = $2 AND user_id = $3
               AND status IN ('init', 'draft')"
        );
        sqlx::query_as::<_, SlotConfiguration>(&query)
            .bind(store_id)
            .bind(page_type.as_str())
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Highest-numbered record of a page in the given status.
    pub async fn find_latest_by_status(
        pool: &PgPool,
        store_id: DbId,
        page_type: PageType,
        status: SlotStatus,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM slot_configurations
             WHERE store_id = $1 AND page_type = $2 AND status = $3
             ORDER BY version_number DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, SlotConfiguration>(&query)
            .bind(store_id)
            .bind(page_type.as_str())
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Records of a page in any of `statuses`, newest version first.
    pub async fn list_by_statuses(
        pool: &PgPool,
        store_id: DbId,
        page_type: PageType,
        statuses: &[SlotStatus],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SlotConfiguration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM slot_configurations
             WHERE store_id = $1 AND page_type = $2 AND status = ANY($3)
             ORDER BY version_number DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, SlotConfiguration>(&query)
            .bind(store_id)
            .bind(page_type.as_str())
            .bind(status_values(statuses))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Every open record the user holds in a store, across page types.
    pub async fn list_open_drafts_for_user(
        pool: &PgPool,
        store_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<SlotConfiguration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM slot_configurations
             WHERE store_id = $1 AND user_id = $2 AND status IN ('init', 'draft')
             ORDER BY page_type"
        );
        sqlx::query_as::<_, SlotConfiguration>(&query)
            .bind(store_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Insert an open record unless the user already has one for the page.
    ///
    /// The partial unique index decides the race: the losing insert does
    /// nothing, its transaction is rolled back (releasing the version number
    /// it allocated) and the winner's row is returned.
    pub async fn insert_draft_if_absent(
        pool: &PgPool,
        input: &NewSlotConfiguration,
    ) -> Result<DraftInsert, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let version =
            VersionCounterRepo::allocate(&mut *tx, input.store_id, input.page_type).await?;
        let created = insert_row(&mut *tx, input, version, OPEN_DRAFT_CONFLICT).await?;

        match created {
            Some(record) => {
                tx.commit().await?;
                Ok(DraftInsert::Created(record))
            }
            None => {
                tx.rollback().await?;
                let existing =
                    Self::find_open_draft(pool, input.store_id, input.page_type, input.user_id)
                        .await?
                        .ok_or(sqlx::Error::RowNotFound)?;
                Ok(DraftInsert::Existing(existing))
            }
        }
    }

    /// Insert a record with a freshly allocated version number.
    pub async fn insert_version(
        pool: &PgPool,
        input: &NewSlotConfiguration,
    ) -> Result<SlotConfiguration, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let version =
            VersionCounterRepo::allocate(&mut *tx, input.store_id, input.page_type).await?;
        let record = insert_row(&mut *tx, input, version, "")
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;
        Ok(record)
    }

    /// Overwrite the editable columns of an open record.
    ///
    /// Returns `None` when the record is gone or no longer open, which
    /// happens when a publish wins a race with the edit.
    pub async fn update_content(
        pool: &PgPool,
        store_id: DbId,
        id: DbId,
        update: &SlotContentUpdate,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let query = format!(
            "UPDATE slot_configurations SET
                status = $3,
                configuration = $4,
                parent_version_id = $5,
                current_edit_id = $6,
                has_unpublished_changes = $7,
                metadata = $8,
                updated_at = NOW()
             WHERE id = $1 AND store_id = $2 AND status IN ('init', 'draft')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SlotConfiguration>(&query)
            .bind(id)
            .bind(store_id)
            .bind(update.status.as_str())
            .bind(Json(&update.configuration))
            .bind(update.parent_version_id)
            .bind(update.current_edit_id)
            .bind(update.has_unpublished_changes)
            .bind(update.metadata.as_ref().map(Json))
            .fetch_optional(pool)
            .await
    }

    /// Move a record from `transition.from` to `transition.to`, stamping the
    /// acceptance or publish fields for the target stage.
    ///
    /// Returns `None` if the record is not currently in `transition.from`.
    pub async fn transition_status(
        pool: &PgPool,
        store_id: DbId,
        id: DbId,
        transition: &StatusTransition,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let query = format!(
            "UPDATE slot_configurations SET
                status = $4,
                acceptance_published_at = CASE WHEN $4 = 'acceptance' THEN NOW() ELSE acceptance_published_at END,
                acceptance_published_by = CASE WHEN $4 = 'acceptance' THEN $5 ELSE acceptance_published_by END,
                published_at = CASE WHEN $4 = 'published' THEN NOW() ELSE published_at END,
                published_by = CASE WHEN $4 = 'published' THEN $5 ELSE published_by END,
                has_unpublished_changes = CASE WHEN $6 THEN false ELSE has_unpublished_changes END,
                updated_at = NOW()
             WHERE id = $1 AND store_id = $2 AND status = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SlotConfiguration>(&query)
            .bind(id)
            .bind(store_id)
            .bind(transition.from.as_str())
            .bind(transition.to.as_str())
            .bind(transition.actor)
            .bind(transition.clear_unpublished_changes)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete an open record. Returns `true` if a row was removed.
    pub async fn delete_open(pool: &PgPool, store_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM slot_configurations
             WHERE id = $1 AND store_id = $2 AND status IN ('init', 'draft')",
        )
        .bind(id)
        .bind(store_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark published/acceptance records above `above_version` as reverted
    /// and insert `input` as a new version, in one transaction.
    ///
    /// Returns the number of superseded records and the inserted row, or
    /// `None` (nothing written) if `target_id` is no longer published or in
    /// acceptance once the page's counter row is locked.
    pub async fn supersede_and_insert(
        pool: &PgPool,
        target_id: DbId,
        above_version: i32,
        input: &NewSlotConfiguration,
    ) -> Result<Option<(u64, SlotConfiguration)>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        // The counter row lock serializes supersedes on this page, so the
        // target check below sees every earlier revert.
        let version =
            VersionCounterRepo::allocate(&mut *tx, input.store_id, input.page_type).await?;

        let target: Option<(DbId,)> = sqlx::query_as(
            "SELECT id FROM slot_configurations
             WHERE id = $1 AND store_id = $2 AND status IN ('published', 'acceptance')
             FOR UPDATE",
        )
        .bind(target_id)
        .bind(input.store_id)
        .fetch_optional(&mut *tx)
        .await?;
        if target.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let superseded = sqlx::query(
            "UPDATE slot_configurations SET status = 'reverted', updated_at = NOW()
             WHERE store_id = $1 AND page_type = $2 AND version_number > $3
               AND status IN ('published', 'acceptance')",
        )
        .bind(input.store_id)
        .bind(input.page_type.as_str())
        .bind(above_version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let record = insert_row(&mut *tx, input, version, "")
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;
        Ok(Some((superseded, record)))
    }

    /// Clear the user's current-edit markers for a page, then point
    /// `config_id`'s marker at itself.
    pub async fn set_current_edit(
        pool: &PgPool,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
        config_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE slot_configurations SET current_edit_id = NULL, updated_at = NOW()
             WHERE store_id = $1 AND page_type = $2 AND user_id = $3
               AND current_edit_id IS NOT NULL",
        )
        .bind(store_id)
        .bind(page_type.as_str())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE slot_configurations SET current_edit_id = id, updated_at = NOW()
             WHERE id = $1 AND store_id = $2 AND page_type = $3
             RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, SlotConfiguration>(&query)
            .bind(config_id)
            .bind(store_id)
            .bind(page_type.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        if record.is_some() {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(record)
    }

    /// Most recently updated record of the user carrying a current-edit marker.
    pub async fn find_current_edit(
        pool: &PgPool,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM slot_configurations
             WHERE store_id = $1 AND page_type = $2 AND user_id = $3
               AND current_edit_id IS NOT NULL
             ORDER BY updated_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, SlotConfiguration>(&query)
            .bind(store_id)
            .bind(page_type.as_str())
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}

async fn insert_row(
    conn: &mut PgConnection,
    input: &NewSlotConfiguration,
    version_number: i32,
    on_conflict: &str,
) -> Result<Option<SlotConfiguration>, sqlx::Error> {
    let query = format!(
        "INSERT INTO slot_configurations
            (store_id, user_id, page_type, version_number, status, configuration,
             parent_version_id, current_edit_id, has_unpublished_changes, metadata,
             published_at, published_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                 CASE WHEN $5 = 'published' THEN NOW() END, $11)
         {on_conflict}
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, SlotConfiguration>(&query)
        .bind(input.store_id)
        .bind(input.user_id)
        .bind(input.page_type.as_str())
        .bind(version_number)
        .bind(input.status.as_str())
        .bind(Json(&input.configuration))
        .bind(input.parent_version_id)
        .bind(input.current_edit_id)
        .bind(input.has_unpublished_changes)
        .bind(input.metadata.as_ref().map(Json))
        .bind(input.published_by)
        .fetch_optional(conn)
        .await
}

fn status_values(statuses: &[SlotStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}
