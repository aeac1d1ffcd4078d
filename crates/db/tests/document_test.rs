//! Integration tests for the document repository over the in-memory store.

use hackportal_db::bson::{Bson, Document, doc};
use hackportal_db::{Collection, DocumentError, DocumentRepository, MemoryStore};
use uuid::Uuid;

fn repo() -> DocumentRepository<MemoryStore> {
    DocumentRepository::new(MemoryStore::new())
}

fn applicant(email: &str) -> Document {
    doc! {
        "first_name": "Peter",
        "last_name": "Anteater",
        "email": email,
        "school_name": "UC Irvine",
        "is_first_hackathon": true,
        "pronouns": ["he", "him"],
    }
}

fn unique_email() -> String {
    format!("test-{}@uci.edu", Uuid::new_v4())
}

#[tokio::test]
async fn test_insert_then_retrieve_by_unique_field() {
    let repo = repo();
    let email = unique_email();
    let inserted = applicant(&email);

    let id = repo
        .insert(Collection::Users, inserted.clone())
        .await
        .expect("Failed to insert document");

    let found = repo
        .retrieve_one(Collection::Users, doc! { "email": email.as_str() }, None)
        .await
        .expect("Failed to retrieve document")
        .expect("Document should exist");

    assert_eq!(found.get("_id"), Some(&id));
    for (key, value) in &inserted {
        assert_eq!(found.get(key), Some(value), "field {key} differs");
    }
}

#[tokio::test]
async fn test_retrieve_one_with_fields() {
    let repo = repo();
    let email = unique_email();
    repo.insert(Collection::Users, applicant(&email))
        .await
        .expect("Failed to insert document");

    let found = repo
        .retrieve_one(
            Collection::Users,
            doc! { "email": email.as_str() },
            Some(&["first_name", "school_name"]),
        )
        .await
        .expect("Failed to retrieve document")
        .expect("Document should exist");

    let keys: Vec<&str> = found.keys().map(String::as_str).collect();
    assert_eq!(keys, ["_id", "first_name", "school_name"]);
}

#[tokio::test]
async fn test_no_matches_is_empty_not_error() {
    let repo = repo();
    repo.insert(Collection::Testing, applicant(&unique_email()))
        .await
        .expect("Failed to insert document");

    let one = repo
        .retrieve_one(Collection::Testing, doc! { "email": "nobody@uci.edu" }, None)
        .await
        .expect("Query should succeed");
    assert!(one.is_none());

    let many = repo
        .retrieve(Collection::Testing, doc! { "email": "nobody@uci.edu" }, None)
        .await
        .expect("Query should succeed");
    assert!(many.is_empty());
}

#[tokio::test]
async fn test_retrieve_returns_all_matches() {
    let repo = repo();
    for school in ["UC Irvine", "UC Irvine", "UCLA"] {
        let mut document = applicant(&unique_email());
        document.insert("school_name", school);
        repo.insert(Collection::Testing, document)
            .await
            .expect("Failed to insert document");
    }

    let irvine = repo
        .retrieve(Collection::Testing, doc! { "school_name": "UC Irvine" }, None)
        .await
        .expect("Query should succeed");
    assert_eq!(irvine.len(), 2);

    let all = repo
        .retrieve(Collection::Testing, doc! {}, Some(&["email"]))
        .await
        .expect("Query should succeed");
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|d| d.len() == 2 && d.contains_key("email")));
}

#[tokio::test]
async fn test_update_one_is_idempotent_for_convergent_patch() {
    let repo = repo();
    let email = unique_email();
    repo.insert(Collection::Users, applicant(&email))
        .await
        .expect("Failed to insert document");

    let patch = doc! { "status": "accepted" };
    let first = repo
        .update_one(Collection::Users, doc! { "email": email.as_str() }, patch.clone())
        .await
        .expect("Update should succeed");
    let second = repo
        .update_one(Collection::Users, doc! { "email": email.as_str() }, patch)
        .await
        .expect("Update should succeed");

    assert!(first);
    assert!(!second);
}

#[tokio::test]
async fn test_update_one_merges_fields() {
    let repo = repo();
    let email = unique_email();
    repo.insert(Collection::Users, applicant(&email))
        .await
        .expect("Failed to insert document");

    repo.update_one(
        Collection::Users,
        doc! { "email": email.as_str() },
        doc! { "major": "Computer Science", "review.score": 4 },
    )
    .await
    .expect("Update should succeed");

    let found = repo
        .retrieve_one(Collection::Users, doc! { "email": email.as_str() }, None)
        .await
        .expect("Query should succeed")
        .expect("Document should exist");
    assert_eq!(found.get_str("major").unwrap(), "Computer Science");
    assert_eq!(found.get_str("first_name").unwrap(), "Peter");
    assert_eq!(found.get_document("review").unwrap().get_i32("score").unwrap(), 4);
}

#[tokio::test]
async fn test_update_one_without_match_returns_false() {
    let repo = repo();
    let changed = repo
        .update_one(
            Collection::Users,
            doc! { "email": "nobody@uci.edu" },
            doc! { "status": "accepted" },
        )
        .await
        .expect("Update should succeed");
    assert!(!changed);
}

#[tokio::test]
async fn test_update_modifies_exactly_matching_subset() {
    let repo = repo();
    for school in ["UC Irvine", "UCLA", "UC Irvine", "UC Berkeley"] {
        let mut document = applicant(&unique_email());
        document.insert("school_name", school);
        document.insert("status", "pending");
        repo.insert(Collection::Testing, document)
            .await
            .expect("Failed to insert document");
    }

    let changed = repo
        .update(
            Collection::Testing,
            doc! { "school_name": "UC Irvine" },
            doc! { "status": "waitlisted" },
        )
        .await
        .expect("Update should succeed");
    assert!(changed);

    let all = repo
        .retrieve(Collection::Testing, doc! {}, None)
        .await
        .expect("Query should succeed");
    assert_eq!(all.len(), 4);
    for document in all {
        let expected = if document.get_str("school_name").unwrap() == "UC Irvine" {
            "waitlisted"
        } else {
            "pending"
        };
        assert_eq!(document.get_str("status").unwrap(), expected);
    }
}

#[tokio::test]
async fn test_empty_patch_is_rejected() {
    let repo = repo();
    let err = repo
        .update(Collection::Testing, doc! {}, Document::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::EmptyPatch));
}

#[tokio::test]
async fn test_unacknowledged_insert_is_an_error() {
    let repo = DocumentRepository::new(MemoryStore::unacknowledged());
    let err = repo
        .insert(Collection::Users, applicant(&unique_email()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DocumentError::Unacknowledged {
            operation: "insert",
            collection: Collection::Users,
        }
    ));
}

#[tokio::test]
async fn test_unacknowledged_update_is_an_error() {
    let store = MemoryStore::unacknowledged();
    let repo = DocumentRepository::new(store);
    let email = unique_email();
    // The write lands even though the insert reports failure.
    let _ = repo.insert(Collection::Users, applicant(&email)).await;

    let err = repo
        .update_one(
            Collection::Users,
            doc! { "email": email.as_str() },
            doc! { "status": "accepted" },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Unacknowledged {
            operation: "update_one",
            ..
        }
    ));

    let err = repo
        .update(Collection::Users, doc! {}, doc! { "status": "rejected" })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Unacknowledged {
            operation: "update",
            ..
        }
    ));
}

#[tokio::test]
async fn test_insert_returns_distinct_ids() {
    let repo = repo();
    let a = repo
        .insert(Collection::Testing, applicant(&unique_email()))
        .await
        .expect("Failed to insert document");
    let b = repo
        .insert(Collection::Testing, applicant(&unique_email()))
        .await
        .expect("Failed to insert document");

    assert!(matches!(a, Bson::ObjectId(_)));
    assert_ne!(a, b);
}
