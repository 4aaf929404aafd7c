//! Integration tests for User repository using in-memory SurrealDB.

use orgauth_core::error::CoreError;
use orgauth_core::models::user::CreateUser;
use orgauth_core::repository::{Pagination, UserRepository};
use orgauth_db::repository::SurrealUserRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> SurrealUserRepository<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgauth_db::run_migrations(&db).await.unwrap();
    SurrealUserRepository::new(db)
}

fn new_user(name: &str, email: &str) -> CreateUser {
    CreateUser {
        name: name.into(),
        email: email.into(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let repo = setup().await;

    let user = repo.create(new_user("alice", "alice@x.com")).await.unwrap();
    assert_eq!(user.name, "alice");
    assert_eq!(user.email, "alice@x.com");
    assert!(user.organizations.is_empty());

    let fetched = repo.get_by_email("alice@x.com").await.unwrap();
    assert_eq!(fetched.name, "alice");
    assert_eq!(fetched.password_hash, user.password_hash);
}

#[tokio::test]
async fn duplicate_email_is_rejected_without_overwrite() {
    let repo = setup().await;

    repo.create(new_user("alice", "alice@x.com")).await.unwrap();
    let err = repo
        .create(new_user("impostor", "alice@x.com"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, CoreError::AlreadyExists { ref entity } if entity == "user"),
        "expected AlreadyExists, got: {err:?}"
    );

    let fetched = repo.get_by_email("alice@x.com").await.unwrap();
    assert_eq!(fetched.name, "alice");
}

#[tokio::test]
async fn unknown_email_is_not_found() {
    let repo = setup().await;

    let err = repo.get_by_email("nobody@x.com").await.unwrap_err();
    assert!(err.is_not_found("user"));
}

#[tokio::test]
async fn add_organization_has_set_semantics() {
    let repo = setup().await;
    repo.create(new_user("alice", "alice@x.com")).await.unwrap();

    let org_id = Uuid::new_v4();
    repo.add_organization("alice@x.com", org_id).await.unwrap();
    repo.add_organization("alice@x.com", org_id).await.unwrap();

    let fetched = repo.get_by_email("alice@x.com").await.unwrap();
    assert_eq!(fetched.organizations, vec![org_id]);
}

#[tokio::test]
async fn add_organization_to_missing_user_fails() {
    let repo = setup().await;

    let err = repo
        .add_organization("ghost@x.com", Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found("user"));
}

#[tokio::test]
async fn remove_organization_fans_out_to_listing_users_only() {
    let repo = setup().await;
    for (name, email) in [("a", "a@x.com"), ("b", "b@x.com"), ("c", "c@x.com")] {
        repo.create(new_user(name, email)).await.unwrap();
    }

    let doomed = Uuid::new_v4();
    let kept = Uuid::new_v4();
    repo.add_organization("a@x.com", doomed).await.unwrap();
    repo.add_organization("a@x.com", kept).await.unwrap();
    repo.add_organization("b@x.com", doomed).await.unwrap();

    let touched = repo.remove_organization_from_all(doomed).await.unwrap();
    assert_eq!(touched, 2);

    assert_eq!(
        repo.get_by_email("a@x.com").await.unwrap().organizations,
        vec![kept]
    );
    assert!(repo.get_by_email("b@x.com").await.unwrap().organizations.is_empty());
    assert!(repo.get_by_email("c@x.com").await.unwrap().organizations.is_empty());
}

#[tokio::test]
async fn list_users_paginates() {
    let repo = setup().await;
    for i in 0..3 {
        repo.create(new_user(&format!("u{i}"), &format!("u{i}@x.com")))
            .await
            .unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);

    let next = page.next_page().unwrap();
    let rest = repo.list(next).await.unwrap();
    assert_eq!(rest.items.len(), 1);
    assert!(rest.next_page().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_creates_of_one_email_yield_one_user() {
    let repo = setup().await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.create(new_user(&format!("racer{i}"), "race@x.com"))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(CoreError::AlreadyExists { entity }) => assert_eq!(entity, "user"),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(created, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_organization_adds_all_land() {
    let repo = setup().await;
    repo.create(new_user("alice", "alice@x.com")).await.unwrap();

    let org_ids: Vec<Uuid> = (0..16).map(|_| Uuid::new_v4()).collect();
    let handles: Vec<_> = org_ids
        .iter()
        .map(|&org_id| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.add_organization("alice@x.com", org_id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let alice = repo.get_by_email("alice@x.com").await.unwrap();
    assert_eq!(alice.organizations.len(), org_ids.len());
    for id in &org_ids {
        assert!(alice.belongs_to(*id));
    }
}
