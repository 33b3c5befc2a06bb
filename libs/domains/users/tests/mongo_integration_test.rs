//! MongoDB integration tests for the users repository
//!
//! These run against a throwaway MongoDB container and need Docker:
//!
//! ```text
//! cargo test -p domain_users --test mongo_integration_test -- --ignored
//! ```

use chrono::Utc;
use domain_users::models::{NewUser, UserChanges};
use domain_users::*;
use test_utils::assertions::assert_some;
use test_utils::{TestDataBuilder, TestMongo};

fn new_user(builder: &TestDataBuilder, suffix: &str) -> NewUser {
    NewUser {
        user_id: builder.user_id(suffix),
        full_name: "Mongo User".to_string(),
        email: builder.email(suffix),
        city: "Lisbon".to_string(),
        is_active: true,
        hashed_password: password::hash_password("secret1").unwrap(),
        created_at: Utc::now(),
    }
}

async fn repository(mongo: &TestMongo) -> MongoUserRepository {
    let repo = MongoUserRepository::new(mongo.database());
    repo.create_indexes().await.unwrap();
    repo
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_insert_reads_back_stored_record() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo).await;
    let builder = TestDataBuilder::from_test_name("mongo_insert");

    let created = repo.insert(new_user(&builder, "a")).await.unwrap();
    assert_eq!(created.created_at, created.updated_at);

    let fetched = assert_some(
        repo.find_by_user_id(&created.user_id).await.unwrap(),
        "find_by_user_id",
    );
    assert_eq!(fetched.id, created.id);
    assert!(fetched.hashed_password.starts_with("$argon2id$"));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_unique_indexes_reject_duplicates() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo).await;
    let builder = TestDataBuilder::from_test_name("mongo_unique");

    repo.insert(new_user(&builder, "a")).await.unwrap();

    let mut same_user_id = new_user(&builder, "b");
    same_user_id.user_id = builder.user_id("a");
    assert!(matches!(
        repo.insert(same_user_id).await,
        Err(UserError::UserIdTaken)
    ));

    let mut same_email = new_user(&builder, "c");
    same_email.email = builder.email("a");
    assert!(matches!(
        repo.insert(same_email).await,
        Err(UserError::EmailTaken)
    ));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_guarded_update_reports_no_modification() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo).await;
    let builder = TestDataBuilder::from_test_name("mongo_update");

    let user = repo.insert(new_user(&builder, "a")).await.unwrap();

    let same = UserChanges {
        city: Some("Lisbon".to_string()),
        ..Default::default()
    };
    assert_eq!(repo.update(&user.user_id, same, Utc::now()).await.unwrap(), 0);

    let moved = UserChanges {
        city: Some("Porto".to_string()),
        ..Default::default()
    };
    assert_eq!(repo.update(&user.user_id, moved, Utc::now()).await.unwrap(), 1);

    let stored = assert_some(repo.find_by_user_id(&user.user_id).await.unwrap(), "after update");
    assert_eq!(stored.city, "Porto");
    assert_eq!(stored.full_name, "Mongo User");
    assert!(stored.updated_at >= stored.created_at);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_update_to_taken_email_hits_unique_index() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo).await;
    let builder = TestDataBuilder::from_test_name("mongo_update_email");

    let first = repo.insert(new_user(&builder, "a")).await.unwrap();
    let second = repo.insert(new_user(&builder, "b")).await.unwrap();

    let changes = UserChanges {
        email: Some(first.email.clone()),
        ..Default::default()
    };
    let result = repo.update(&second.user_id, changes, Utc::now()).await;
    assert!(matches!(result, Err(UserError::EmailTaken)));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_list_filters_and_paginates() {
    let mongo = TestMongo::new().await;
    let repo = repository(&mongo).await;
    let builder = TestDataBuilder::from_test_name("mongo_list");

    for i in 0..3 {
        repo.insert(new_user(&builder, &i.to_string())).await.unwrap();
    }
    let first = builder.user_id("0");
    assert_eq!(repo.deactivate(&first, Utc::now()).await.unwrap(), 1);

    let page = repo
        .list(UserFilter {
            skip: 0,
            limit: 2,
            is_active: None,
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 2);

    let inactive = repo
        .list(UserFilter {
            is_active: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].user_id, first);

    let none = repo
        .list(UserFilter {
            limit: 0,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_service_round_trip_over_mongo() {
    let mongo = TestMongo::new().await;
    let service = UserService::new(repository(&mongo).await);

    let created = service
        .create_user(CreateUser {
            user_id: "alice01".to_string(),
            full_name: "Alice Smith".to_string(),
            email: "a@x.io".to_string(),
            city: "NYC".to_string(),
            is_active: true,
            password: "secret1".to_string(),
        })
        .await
        .unwrap();

    service.deactivate_user("alice01").await.unwrap();

    let fetched = service.get_user("alice01").await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert!(!fetched.is_active);
    assert!(fetched.updated_at >= created.updated_at);
}
