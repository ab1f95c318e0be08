use catalog::{Catalog, CategoryId, CategorySet, CategoryTree, ItemId, ItemSet, LookupError};
use purchase_window::catalog_sqlx::SqlxCatalog;
use purchase_window::db::Db;
use purchase_window::overrides::PurchasabilityOverride;
use purchase_window::overrides::repository::OverrideRepository;
use purchase_window::overrides::repository_sqlx::SqlxOverrideRepository;
use purchase_window::settings::{Configuration, SettingsRepository, SqlxSettingsRepository};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Isolated in-memory database per test; the unique name keeps parallel
/// tests apart while the shared cache lets pool connections see one schema.
async fn setup_db() -> SqlitePool {
    let db_name = Uuid::new_v4().to_string();
    let conn_str = format!("sqlite:file:{db_name}?mode=memory&cache=shared");

    let db = Db::connect(&conn_str).await.unwrap();
    db.migrate().await.unwrap();
    db.pool
}

async fn seed_catalog(pool: &SqlitePool) {
    // 1 ─┬─ 2 ── 4
    //    └─ 3
    // 9 (unrelated)
    for stmt in [
        "INSERT INTO categories (id, parent_id, slug) VALUES (1, NULL, 'drinks'), (2, 1, 'tea'), (3, 1, 'coffee'), (4, 2, 'green-tea'), (9, NULL, 'mugs')",
        "INSERT INTO items (id, slug) VALUES (10, 'sencha'), (11, 'espresso'), (12, 'matcha'), (13, 'mug')",
        "INSERT INTO item_categories (item_id, category_id) VALUES (10, 4), (11, 3), (12, 4), (12, 2), (13, 9)",
    ] {
        sqlx::query(stmt).execute(pool).await.unwrap();
    }
}

fn cats(ids: &[u64]) -> CategorySet {
    ids.iter().copied().map(CategoryId).collect()
}

fn items(ids: &[u64]) -> ItemSet {
    ids.iter().copied().map(ItemId).collect()
}

#[tokio::test]
async fn override_upsert_keeps_one_row_per_item() {
    let pool = setup_db().await;
    let repo = SqlxOverrideRepository::new(pool.clone());

    repo.save(ItemId(7), PurchasabilityOverride::Purchasable, 1)
        .await
        .unwrap();
    repo.save(ItemId(7), PurchasabilityOverride::Unpurchasable, 2)
        .await
        .unwrap();
    repo.save(ItemId(8), PurchasabilityOverride::Purchasable, 3)
        .await
        .unwrap();

    let mut rows = repo.load_all().await.unwrap();
    rows.sort_by_key(|(id, _)| *id);
    assert_eq!(
        rows,
        vec![
            (ItemId(7), PurchasabilityOverride::Unpurchasable),
            (ItemId(8), PurchasabilityOverride::Purchasable),
        ]
    );
}

#[tokio::test]
async fn negative_item_ids_are_skipped_on_load() {
    let pool = setup_db().await;
    let repo = SqlxOverrideRepository::new(pool.clone());

    sqlx::query(
        "INSERT INTO item_overrides (item_id, status, updated_at_ms) VALUES (-5, 'purchasable', 0), (5, 'unpurchasable', 0)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let rows = repo.load_all().await.unwrap();
    assert_eq!(rows, vec![(ItemId(5), PurchasabilityOverride::Unpurchasable)]);
}

#[tokio::test]
async fn settings_round_trip_through_json() {
    let pool = setup_db().await;
    let repo = SqlxSettingsRepository::new(pool);

    assert_eq!(repo.load().await.unwrap(), None);

    let config = Configuration {
        start: Some("2026-07-01T09:00".into()),
        end: Some("2026-07-31T18:00".into()),
        categories: cats(&[3, 1]),
        logging_enabled: true,
    };
    repo.save(&config, 10).await.unwrap();
    repo.save(&config, 11).await.unwrap();

    assert_eq!(repo.load().await.unwrap(), Some(config));
}

#[tokio::test]
async fn corrupt_settings_document_is_an_error() {
    let pool = setup_db().await;
    sqlx::query(
        "INSERT INTO settings (key, value, updated_at_ms) VALUES ('purchase_window', 'not json', 0)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let repo = SqlxSettingsRepository::new(pool);
    assert!(repo.load().await.is_err());
}

#[tokio::test]
async fn catalog_walks_the_category_tree() {
    let pool = setup_db().await;
    seed_catalog(&pool).await;
    let catalog = SqlxCatalog::new(pool, "https://shop.test/");

    assert_eq!(
        catalog.children_of(CategoryId(1)).await.unwrap(),
        cats(&[2, 3, 4])
    );
    assert_eq!(catalog.children_of(CategoryId(4)).await.unwrap(), cats(&[]));
    assert_eq!(
        catalog.children_of(CategoryId(99)).await,
        Err(LookupError::CategoryNotFound(CategoryId(99)))
    );
}

#[tokio::test]
async fn catalog_items_with_and_without_descendants() {
    let pool = setup_db().await;
    seed_catalog(&pool).await;
    let catalog = SqlxCatalog::new(pool, "https://shop.test");

    assert_eq!(
        catalog.items_in(&cats(&[1]), true).await.unwrap(),
        items(&[10, 11, 12])
    );
    assert_eq!(
        catalog.items_in(&cats(&[2]), false).await.unwrap(),
        items(&[12])
    );
    assert_eq!(
        catalog.items_in(&cats(&[3, 9]), true).await.unwrap(),
        items(&[11, 13])
    );
    assert!(catalog.items_in(&cats(&[]), true).await.unwrap().is_empty());
}

#[tokio::test]
async fn catalog_urls_come_from_slugs() {
    let pool = setup_db().await;
    seed_catalog(&pool).await;
    let catalog = SqlxCatalog::new(pool, "https://shop.test/");

    assert_eq!(
        CategoryTree::url_of(&catalog, CategoryId(4)).await.unwrap(),
        "https://shop.test/product-category/green-tea/"
    );
    assert_eq!(
        Catalog::url_of(&catalog, ItemId(11)).await.unwrap(),
        "https://shop.test/product/espresso/"
    );
    assert_eq!(
        Catalog::url_of(&catalog, ItemId(404)).await,
        Err(LookupError::ItemNotFound(ItemId(404)))
    );
    assert_eq!(catalog.storefront_index_url(), "https://shop.test/shop/");
}
