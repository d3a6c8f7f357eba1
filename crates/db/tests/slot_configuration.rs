//! Integration tests for the slot configuration repository against a real
//! database:
//! - Version numbers are allocated per (store, page type) and never reused
//! - Only one open draft per user and page survives concurrent inserts
//! - Status transitions are conditional on the expected current status
//! - Legacy supersede marks later published versions reverted
//! - Current-edit markers are exclusive per user and page

use sqlx::PgPool;
use storefront_core::configuration::{ConfigurationTree, SlotDef};
use storefront_core::page_type::PageType;
use storefront_core::revert::{RecordMetadata, RevertMetadata};
use storefront_core::slot_status::SlotStatus;
use storefront_db::models::slot_configuration::{
    NewSlotConfiguration, SlotContentUpdate, StatusTransition,
};
use storefront_db::repositories::{SlotConfigurationRepo, VersionCounterRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const STORE: i64 = 1;

fn tree_with(slot_id: &str) -> ConfigurationTree {
    let mut tree = ConfigurationTree::empty();
    tree.slots.insert(slot_id.to_string(), SlotDef::new("text"));
    tree.root_slots.push(slot_id.to_string());
    tree
}

fn new_draft(user_id: i64, page_type: PageType) -> NewSlotConfiguration {
    NewSlotConfiguration::draft(STORE, user_id, page_type, SlotStatus::Draft, tree_with("hero"))
}

fn new_published(user_id: i64, page_type: PageType) -> NewSlotConfiguration {
    NewSlotConfiguration {
        status: SlotStatus::Published,
        published_by: Some(user_id),
        ..new_draft(user_id, page_type)
    }
}

// ---------------------------------------------------------------------------
// Version allocation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn versions_increase_per_page(pool: PgPool) {
    let a = SlotConfigurationRepo::insert_version(&pool, &new_published(1, PageType::Cart))
        .await
        .unwrap();
    let b = SlotConfigurationRepo::insert_version(&pool, &new_published(1, PageType::Cart))
        .await
        .unwrap();
    let c = SlotConfigurationRepo::insert_version(&pool, &new_published(1, PageType::Product))
        .await
        .unwrap();

    assert_eq!(a.version_number, 1);
    assert_eq!(b.version_number, 2);
    assert_eq!(c.version_number, 1);
    assert!(a.published_at.is_some());
    assert_eq!(
        VersionCounterRepo::current(&pool, STORE, PageType::Cart).await.unwrap(),
        Some(2)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleted_draft_version_is_not_reused(pool: PgPool) {
    let draft = SlotConfigurationRepo::insert_draft_if_absent(&pool, &new_draft(1, PageType::Cart))
        .await
        .unwrap()
        .into_record();
    assert!(SlotConfigurationRepo::delete_open(&pool, STORE, draft.id).await.unwrap());

    let next = SlotConfigurationRepo::insert_version(&pool, &new_published(1, PageType::Cart))
        .await
        .unwrap();
    assert_eq!(next.version_number, draft.version_number + 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_inserts_never_share_a_version(pool: PgPool) {
    let handles: Vec<_> = (0..8)
        .map(|user| {
            let pool = pool.clone();
            tokio::spawn(async move {
                SlotConfigurationRepo::insert_version(&pool, &new_published(user, PageType::Cart))
                    .await
                    .unwrap()
                    .version_number
            })
        })
        .collect();

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap());
    }
    versions.sort_unstable();
    assert_eq!(versions, (1..=8).collect::<Vec<_>>());
}

// ---------------------------------------------------------------------------
// Open drafts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_draft_creation_yields_one_draft(pool: PgPool) {
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                SlotConfigurationRepo::insert_draft_if_absent(&pool, &new_draft(5, PageType::Cart))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids = Vec::new();
    let mut created = 0;
    for handle in handles {
        let outcome = handle.await.unwrap();
        if outcome.was_created() {
            created += 1;
        }
        ids.push(outcome.into_record().id);
    }
    ids.dedup();
    assert_eq!(created, 1);
    assert_eq!(ids.len(), 1);

    let drafts = SlotConfigurationRepo::list_open_drafts_for_user(&pool, STORE, 5)
        .await
        .unwrap();
    assert_eq!(drafts.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_content_only_touches_open_records(pool: PgPool) {
    let draft = SlotConfigurationRepo::insert_draft_if_absent(&pool, &new_draft(1, PageType::Cart))
        .await
        .unwrap()
        .into_record();

    let mut update = SlotContentUpdate::from_record(&draft);
    update.configuration = tree_with("banner");
    update.has_unpublished_changes = true;
    update.metadata =
        Some(RecordMetadata::default().with_revert(RevertMetadata::no_previous_draft()));

    let updated = SlotConfigurationRepo::update_content(&pool, STORE, draft.id, &update)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.tree().slots.contains_key("banner"));
    assert!(updated.has_unpublished_changes);
    assert_eq!(
        updated.record_metadata().revert_metadata,
        Some(RevertMetadata::no_previous_draft())
    );

    let published = SlotConfigurationRepo::insert_version(&pool, &new_published(1, PageType::Cart))
        .await
        .unwrap();
    let rejected = SlotConfigurationRepo::update_content(&pool, STORE, published.id, &update)
        .await
        .unwrap();
    assert!(rejected.is_none());
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn transitions_stamp_stage_fields(pool: PgPool) {
    let draft = SlotConfigurationRepo::insert_draft_if_absent(&pool, &new_draft(1, PageType::Cart))
        .await
        .unwrap()
        .into_record();

    let to_acceptance = StatusTransition {
        from: SlotStatus::Draft,
        to: SlotStatus::Acceptance,
        actor: 42,
        clear_unpublished_changes: false,
    };
    let accepted = SlotConfigurationRepo::transition_status(&pool, STORE, draft.id, &to_acceptance)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(accepted.status, SlotStatus::Acceptance);
    assert_eq!(accepted.acceptance_published_by, Some(42));
    assert!(accepted.acceptance_published_at.is_some());
    assert!(accepted.published_at.is_none());

    // Same transition again: record is no longer a draft.
    let again = SlotConfigurationRepo::transition_status(&pool, STORE, draft.id, &to_acceptance)
        .await
        .unwrap();
    assert!(again.is_none());

    let to_published = StatusTransition {
        from: SlotStatus::Acceptance,
        to: SlotStatus::Published,
        actor: 43,
        clear_unpublished_changes: false,
    };
    let published = SlotConfigurationRepo::transition_status(&pool, STORE, draft.id, &to_published)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(published.status, SlotStatus::Published);
    assert_eq!(published.published_by, Some(43));
    assert_eq!(published.version_number, draft.version_number);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn supersede_marks_later_versions_reverted(pool: PgPool) {
    let v1 = SlotConfigurationRepo::insert_version(&pool, &new_published(1, PageType::Category))
        .await
        .unwrap();
    SlotConfigurationRepo::insert_version(&pool, &new_published(1, PageType::Category))
        .await
        .unwrap();
    SlotConfigurationRepo::insert_version(&pool, &new_published(1, PageType::Category))
        .await
        .unwrap();

    let (superseded, restored) = SlotConfigurationRepo::supersede_and_insert(
        &pool,
        v1.id,
        v1.version_number,
        &new_published(1, PageType::Category),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(superseded, 2);
    assert_eq!(restored.version_number, 4);

    let reverted = SlotConfigurationRepo::list_by_statuses(
        &pool,
        STORE,
        PageType::Category,
        &[SlotStatus::Reverted],
        10,
        0,
    )
    .await
    .unwrap();
    let numbers: Vec<i32> = reverted.iter().map(|r| r.version_number).collect();
    assert_eq!(numbers, vec![3, 2]);

    let latest = SlotConfigurationRepo::find_latest_by_status(
        &pool,
        STORE,
        PageType::Category,
        SlotStatus::Published,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(latest.id, restored.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn supersede_rejects_target_reverted_meanwhile(pool: PgPool) {
    let v1 = SlotConfigurationRepo::insert_version(&pool, &new_published(1, PageType::Category))
        .await
        .unwrap();
    let v2 = SlotConfigurationRepo::insert_version(&pool, &new_published(1, PageType::Category))
        .await
        .unwrap();

    SlotConfigurationRepo::supersede_and_insert(
        &pool,
        v1.id,
        v1.version_number,
        &new_published(1, PageType::Category),
    )
    .await
    .unwrap()
    .unwrap();

    let rejected = SlotConfigurationRepo::supersede_and_insert(
        &pool,
        v2.id,
        v2.version_number,
        &new_published(1, PageType::Category),
    )
    .await
    .unwrap();
    assert!(rejected.is_none());

    // The rolled-back allocation leaves the counter where it was.
    let next = SlotConfigurationRepo::insert_version(&pool, &new_published(1, PageType::Category))
        .await
        .unwrap();
    assert_eq!(next.version_number, 4);
}

// ---------------------------------------------------------------------------
// Current edit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn current_edit_is_exclusive(pool: PgPool) {
    let first = SlotConfigurationRepo::insert_version(&pool, &new_published(3, PageType::Header))
        .await
        .unwrap();
    let second = SlotConfigurationRepo::insert_version(&pool, &new_published(3, PageType::Header))
        .await
        .unwrap();

    SlotConfigurationRepo::set_current_edit(&pool, STORE, PageType::Header, 3, first.id)
        .await
        .unwrap()
        .unwrap();
    SlotConfigurationRepo::set_current_edit(&pool, STORE, PageType::Header, 3, second.id)
        .await
        .unwrap()
        .unwrap();

    let current = SlotConfigurationRepo::find_current_edit(&pool, STORE, PageType::Header, 3)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.id, second.id);

    let first_now = SlotConfigurationRepo::find_by_id(&pool, STORE, first.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first_now.current_edit_id, None);
}
