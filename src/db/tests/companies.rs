use crate::db::Database;
use crate::entity::Entity;
use tempfile::NamedTempFile;

fn sample_entity(bin: &str) -> Entity {
    Entity {
        bin: bin.to_string(),
        title_ru: "ТОО Тест".to_string(),
        title_kz: "Тест ЖШС".to_string(),
        ceo_name: "Ivan Ivanov".to_string(),
        ceo_position: "Director".to_string(),
        primary_oked: "62.01".to_string(),
        secondary_oked: vec!["47.91".to_string(), "62.02".to_string()],
        email: "info@test.kz".to_string(),
        phone: "+7 701 000 00 00".to_string(),
        total_debt_kgd: 1500.25,
        is_nds: true,
        in_tax_debtor_registry: true,
        violation_count: 2,
        filials_count: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_upsert_and_get_roundtrip() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let entity = sample_entity("123456789012");
    db.upsert_company(&entity).await.unwrap();

    let stored = db.get_company("123456789012").await.unwrap().unwrap();
    assert_eq!(stored, entity);

    db.close().await;
}

#[tokio::test]
async fn test_get_missing_company_is_none() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    assert!(db.get_company("000000000000").await.unwrap().is_none());

    db.close().await;
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let entity = sample_entity("123456789012");
    db.upsert_company(&entity).await.unwrap();
    let after_first = db.list_companies().await.unwrap();

    db.upsert_company(&entity).await.unwrap();
    let after_second = db.list_companies().await.unwrap();

    assert_eq!(after_first.len(), 1);
    assert_eq!(after_first, after_second);

    db.close().await;
}

#[tokio::test]
async fn test_upsert_replaces_whole_row() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let original = sample_entity("123456789012");
    db.upsert_company(&original).await.unwrap();

    // Second version drops fields the first one had; no residue may remain
    let replacement = Entity {
        bin: "123456789012".to_string(),
        title_ru: "ТОО Новый".to_string(),
        ..Default::default()
    };
    db.upsert_company(&replacement).await.unwrap();

    let stored = db.get_company("123456789012").await.unwrap().unwrap();
    assert_eq!(stored, replacement);
    assert_eq!(stored.ceo_name, "");
    assert_eq!(stored.total_debt_kgd, 0.0);
    assert!(!stored.in_tax_debtor_registry);
    assert!(stored.secondary_oked.is_empty());

    assert_eq!(db.count_companies().await.unwrap(), 1);

    db.close().await;
}

#[tokio::test]
async fn test_list_companies_ordered_by_bin() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    for bin in ["300000000003", "100000000001", "200000000002"] {
        db.upsert_company(&sample_entity(bin)).await.unwrap();
    }

    let companies = db.list_companies().await.unwrap();
    let bins: Vec<&str> = companies.iter().map(|c| c.bin.as_str()).collect();
    assert_eq!(bins, vec!["100000000001", "200000000002", "300000000003"]);

    db.close().await;
}

#[tokio::test]
async fn test_boolean_and_list_columns_roundtrip() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let entity = Entity {
        bin: "1".to_string(),
        in_fake_registry: true,
        in_absent_registry: true,
        unreliable_samruk: true,
        was_nds: true,
        secondary_oked: vec!["62.01".to_string(), "62.01".to_string()],
        ..Default::default()
    };
    db.upsert_company(&entity).await.unwrap();

    let stored = db.get_company("1").await.unwrap().unwrap();
    assert!(stored.in_fake_registry);
    assert!(stored.in_absent_registry);
    assert!(stored.unreliable_samruk);
    assert!(stored.was_nds);
    assert!(!stored.in_bankrupt_registry);
    // Duplicates in the list survive persistence
    assert_eq!(stored.secondary_oked, vec!["62.01", "62.01"]);

    db.close().await;
}
