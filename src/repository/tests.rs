//! Repository Integration Tests
//!
//! Tests for the SQLite stores with an in-memory database.

#[cfg(test)]
mod tests {
    use crate::domain::{DomainError, EntityKind, Item, ItemTag, Tag};
    use crate::repository::db::connection;
    use crate::repository::{
        init_db, DbState, ItemQuery, ItemRepository, ItemStore, MappingStore, Repository,
        SlugRepository, SlugService, SlugTarget, TagRepository, TagStore, VisibilityFilter,
        VisibilityRepository, MAX_SLUG_LENGTH,
    };
    use rusqlite::params;
    use std::path::PathBuf;

    struct TestDb {
        state: DbState,
        items: ItemRepository,
        tags: TagRepository,
        visibility: VisibilityRepository,
        slugs: SlugRepository,
    }

    async fn setup_test_db() -> TestDb {
        // Use in-memory database for tests
        let db_path = PathBuf::from(":memory:");
        let db_state = init_db(&db_path).await.expect("Failed to init test DB");
        TestDb {
            items: ItemRepository::new(db_state.handle()),
            tags: TagRepository::new(db_state.handle()),
            visibility: VisibilityRepository::new(db_state.handle()),
            slugs: SlugRepository::new(db_state.handle()),
            state: db_state,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_item() {
        let db = setup_test_db().await;

        let created = db.items.create(&Item::new(0, "Lamp".to_string())).await.expect("Failed to create");
        assert!(created.id > 0);

        let found = db.items.find_by_id(created.id).await.expect("Find failed");
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_item_soft_delete() {
        let db = setup_test_db().await;

        let item = db.items.create(&Item::new(0, "Chair".to_string())).await.unwrap();
        db.items.delete(item.id).await.expect("Delete failed");

        let found = db.items.find_by_id(item.id).await.unwrap().unwrap();
        assert!(found.deleted);
        assert!(db.items.list().await.unwrap().is_empty());

        let all = db.items
            .query(&ItemQuery { include_deleted: true, ..ItemQuery::default() })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_item_query_filters() {
        let db = setup_test_db().await;

        let a = db.items.create(&Item::new(0, "A".to_string())).await.unwrap();
        let b = db.items.create(&Item::draft(0, "B".to_string())).await.unwrap();
        let c = db.items.create(&Item::new(0, "C".to_string())).await.unwrap();

        let visible = db.items.query(&ItemQuery::visible()).await.unwrap();
        let ids: Vec<u32> = visible.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);

        let picked = db.items
            .query(&ItemQuery { ids: Some(vec![b.id]), ..ItemQuery::default() })
            .await
            .unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "B");

        let none = db.items
            .query(&ItemQuery { ids: Some(vec![]), ..ItemQuery::default() })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let db = setup_test_db().await;

        let result = db.items.update(&Item::new(99, "Ghost".to_string())).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_tag_crud() {
        let db = setup_test_db().await;

        let tag = db.tags.create(&Tag::new(0, "Red".to_string())).await.unwrap();
        assert!(tag.id > 0);

        assert!(tag.updated_at.is_some());
        assert_eq!(db.tags.find_by_id(tag.id).await.unwrap(), Some(tag.clone()));

        let mut renamed = tag.clone();
        renamed.name = "Crimson".to_string();
        let renamed = db.tags.update(&renamed).await.unwrap();
        assert!(renamed.updated_at >= tag.updated_at);
        assert_eq!(db.tags.find_by_id(tag.id).await.unwrap(), Some(renamed));

        db.tags.delete(tag.id).await.unwrap();
        assert!(db.tags.find_by_id(tag.id).await.unwrap().is_none());
        assert!(matches!(db.tags.delete(tag.id).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_tag_name_conflicts() {
        let db = setup_test_db().await;

        db.tags.create(&Tag::new(0, "Sale".to_string())).await.unwrap();
        let result = db.tags.create(&Tag::new(0, "SALE".to_string())).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_tag_names_are_stored_trimmed() {
        let db = setup_test_db().await;

        let tag = db.tags.create(&Tag::new(0, "  Sale ".to_string())).await.unwrap();
        assert_eq!(tag.name, "Sale");
        assert_eq!(db.tags.find_by_name("sale").await.unwrap(), Some(tag.clone()));

        let renamed = db.tags.update(&Tag::new(tag.id, " Promo  ".to_string())).await.unwrap();
        assert_eq!(renamed.name, "Promo");
        assert_eq!(db.tags.find_by_id(tag.id).await.unwrap().unwrap().name, "Promo");
    }

    #[tokio::test]
    async fn test_row_id_beyond_u32_is_an_error() {
        let db = setup_test_db().await;
        {
            let guard = db.state.conn.lock().await;
            connection(&guard)
                .unwrap()
                .execute(
                    "INSERT INTO tags (id, name, name_key) VALUES (?, 'big', 'big')",
                    params![i64::from(u32::MAX) + 1],
                )
                .unwrap();
        }

        let result = db.tags.create(&Tag::new(0, "next".to_string())).await;
        assert!(matches!(result, Err(DomainError::Storage(_))));
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_existing() {
        let db = setup_test_db().await;

        let first = db.tags.get_or_create("Sale").await.unwrap();
        let second = db.tags.get_or_create("sale").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.name, "Sale");
        assert_eq!(db.tags.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_name_and_ids() {
        let db = setup_test_db().await;

        let red = db.tags.create(&Tag::new(0, "red".to_string())).await.unwrap();
        let blue = db.tags.create(&Tag::new(0, "blue".to_string())).await.unwrap();

        assert_eq!(db.tags.find_by_name("RED").await.unwrap(), Some(red.clone()));
        assert!(db.tags.find_by_name("green").await.unwrap().is_none());

        let found = db.tags.find_by_ids(&[blue.id, 404, red.id]).await.unwrap();
        assert_eq!(found, vec![blue, red]);
        assert!(db.tags.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_tags_ordered_by_name() {
        let db = setup_test_db().await;

        for name in ["red", "black", "blue"] {
            db.tags.create(&Tag::new(0, name.to_string())).await.unwrap();
        }

        let names: Vec<String> = db.tags.list().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["black", "blue", "red"]);
    }

    #[tokio::test]
    async fn test_mappings() {
        let db = setup_test_db().await;

        let item = db.items.create(&Item::new(0, "Lamp".to_string())).await.unwrap();
        let red = db.tags.create(&Tag::new(0, "red".to_string())).await.unwrap();
        let blue = db.tags.create(&Tag::new(0, "blue".to_string())).await.unwrap();

        let mapping = ItemTag { item_id: item.id, tag_id: blue.id };
        db.tags.insert_mapping(mapping).await.unwrap();
        db.tags.insert_mapping(mapping).await.unwrap();
        db.tags.insert_mapping(ItemTag { item_id: item.id, tag_id: red.id }).await.unwrap();

        assert_eq!(db.tags.list_mappings().await.unwrap().len(), 2);
        assert_eq!(db.tags.find_mapping(item.id, blue.id).await.unwrap(), Some(mapping));

        let for_item = db.tags.list_for_item(item.id).await.unwrap();
        assert_eq!(for_item, vec![red.clone(), blue.clone()]);

        db.tags.delete_mapping(mapping).await.unwrap();
        assert!(db.tags.find_mapping(item.id, blue.id).await.unwrap().is_none());
        assert!(matches!(
            db.tags.delete_mapping(mapping).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deleting_tag_cascades_mappings() {
        let db = setup_test_db().await;

        let item = db.items.create(&Item::new(0, "Lamp".to_string())).await.unwrap();
        let tag = db.tags.create(&Tag::new(0, "red".to_string())).await.unwrap();
        db.tags.insert_mapping(ItemTag { item_id: item.id, tag_id: tag.id }).await.unwrap();

        db.tags.delete(tag.id).await.unwrap();
        assert!(db.tags.list_mappings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_visibility_rows() {
        let db = setup_test_db().await;

        assert!(!db.visibility.has_store_mappings(EntityKind::Item).await.unwrap());
        assert!(!db.visibility.has_acl_records(EntityKind::Item).await.unwrap());

        db.visibility.map_to_store(EntityKind::Item, 1, 10).await.unwrap();
        db.visibility.map_to_store(EntityKind::Item, 2, 20).await.unwrap();
        db.visibility.grant_role(EntityKind::Item, 1, 3).await.unwrap();
        db.visibility.grant_role(EntityKind::Item, 2, 4).await.unwrap();

        assert!(db.visibility.has_store_mappings(EntityKind::Item).await.unwrap());
        assert!(!db.visibility.has_store_mappings(EntityKind::Tag).await.unwrap());

        let in_store = db.visibility.store_mapped_ids(EntityKind::Item, 10).await.unwrap();
        assert!(in_store.contains(&1) && !in_store.contains(&2));

        let granted = db.visibility.acl_granted_ids(EntityKind::Item, &[3, 4]).await.unwrap();
        assert_eq!(granted.len(), 2);
        assert!(db.visibility.acl_granted_ids(EntityKind::Item, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slug_uniqueness_and_history() {
        let db = setup_test_db().await;

        let first = SlugTarget { kind: EntityKind::Tag, id: 1 };
        let second = SlugTarget { kind: EntityKind::Tag, id: 2 };

        let slug = db.slugs.validate_name(first, "", "Summer Sale", true).await.unwrap();
        assert_eq!(slug, "summer-sale");
        db.slugs.save_slug(first, &slug, 0).await.unwrap();

        // Same entity keeps its own slug
        let again = db.slugs.validate_name(first, "", "Summer sale", true).await.unwrap();
        assert_eq!(again, "summer-sale");

        let other = db.slugs.validate_name(second, "", "summer SALE", true).await.unwrap();
        assert_eq!(other, "summer-sale-2");

        db.slugs.save_slug(first, "sale", 0).await.unwrap();
        db.slugs.save_slug(first, "summer-sale", 0).await.unwrap();
        assert_eq!(db.slugs.active_slug(first, 0).await.unwrap().as_deref(), Some("summer-sale"));

        let history = db.slugs.history(first).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|r| r.is_active).count(), 1);
    }

    #[tokio::test]
    async fn test_unique_slugs_of_long_names_stay_within_limit() {
        let db = setup_test_db().await;
        let name = "x".repeat(250);

        let first = SlugTarget { kind: EntityKind::Tag, id: 1 };
        let slug = db.slugs.validate_name(first, "", &name, true).await.unwrap();
        db.slugs.save_slug(first, &slug, 0).await.unwrap();

        let second = SlugTarget { kind: EntityKind::Tag, id: 2 };
        let other = db.slugs.validate_name(second, "", &name, true).await.unwrap();
        assert_ne!(other, slug);
        assert!(other.ends_with("-2"));
        assert_eq!(slug.chars().count(), MAX_SLUG_LENGTH);
        assert_eq!(other.chars().count(), MAX_SLUG_LENGTH);
    }

    #[tokio::test]
    async fn test_slug_falls_back_to_id() {
        let db = setup_test_db().await;

        let target = SlugTarget { kind: EntityKind::Tag, id: 42 };
        let slug = db.slugs.validate_name(target, "", "???", false).await.unwrap();
        assert_eq!(slug, "42");
    }
}
