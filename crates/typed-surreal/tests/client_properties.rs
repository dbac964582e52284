//! Behavioural properties of `Client`, checked against both backends: the
//! in-memory fake and the embedded SurrealDB engine (`mem://`).

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use typed_surreal::fakes::MemoryTransport;
use typed_surreal::{Client, Edge, Error, Patch, Record, RecordId, Result, Update};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Book {
    id: Option<RecordId>,
    title: String,
    author: String,
    published_at: Option<DateTime<Utc>>,
    available: bool,
}

impl Record for Book {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Publisher {
    id: Option<RecordId>,
    name: String,
}

impl Record for Publisher {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

fn book(title: &str, author: &str) -> Book {
    Book {
        id: None,
        title: title.to_string(),
        author: author.to_string(),
        published_at: Some(Utc.with_ymd_and_hms(2024, 10, 15, 0, 0, 0).unwrap()),
        available: true,
    }
}

async fn backends() -> Vec<(&'static str, Client)> {
    vec![
        ("memory", Client::new(MemoryTransport::new())),
        ("surreal", Client::in_memory().await.unwrap()),
    ]
}

async fn create_one<T: Record>(client: &Client, table: &str, record: &T) -> T {
    let mut created = client.create(table, record).await.unwrap();
    assert_eq!(created.len(), 1);
    created.pop().unwrap()
}

// ===========================================================================
// Create / select
// ===========================================================================

#[tokio::test]
async fn create_then_select_returns_equal_fields() {
    for (name, client) in backends().await {
        let input = book("Aeon's Surreal Renaissance", "Dave MacLeod");
        let created = create_one(&client, "book", &input).await;

        let id = created.id.clone().unwrap();
        assert_eq!(id.table(), "book", "{name}");
        assert!(input.id.is_none(), "{name}");

        let fetched: Book = client.select_record(&id).await.unwrap().unwrap();
        assert_eq!(fetched.id.as_ref(), Some(&id), "{name}");
        assert_eq!(fetched.title, input.title, "{name}");
        assert_eq!(fetched.author, input.author, "{name}");
        assert_eq!(fetched.published_at, input.published_at, "{name}");
        assert_eq!(fetched.available, input.available, "{name}");
    }
}

#[tokio::test]
async fn repeated_creates_get_distinct_ids() {
    for (name, client) in backends().await {
        let input = book("Same", "Same");
        let a = create_one(&client, "book", &input).await;
        let b = create_one(&client, "book", &input).await;
        assert_ne!(a.id, b.id, "{name}");
    }
}

#[tokio::test]
async fn create_many_returns_one_record_per_input_in_order() {
    for (name, client) in backends().await {
        let inputs = vec![book("One", "A"), book("Two", "B"), book("Three", "C")];
        let created = client.create_many("book", &inputs).await.unwrap();

        let titles: Vec<_> = created.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"], "{name}");
        assert!(created.iter().all(|b| b.id.is_some()), "{name}");
    }
}

#[tokio::test]
async fn select_missing_record_is_empty() {
    for (name, client) in backends().await {
        let created = create_one(&client, "book", &book("Gone", "X")).await;
        let id = created.id.unwrap();
        client.delete(&id).await.unwrap();

        let found: Option<Book> = client.select_record(&id).await.unwrap();
        assert!(found.is_none(), "{name}");
    }
}

#[tokio::test]
async fn select_decodes_lazily_and_reports_bad_rows() {
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Loose {
        id: Option<RecordId>,
        title: String,
        published_at: String,
    }

    impl Record for Loose {
        fn id(&self) -> Option<&RecordId> {
            self.id.as_ref()
        }
    }

    for (name, client) in backends().await {
        create_one(&client, "book", &book("Good", "A")).await;
        let bad = Loose {
            id: None,
            title: "Bad".to_string(),
            published_at: "last tuesday".to_string(),
        };
        create_one(&client, "book", &bad).await;

        let results: Vec<Result<Book>> = client.select("book").await.unwrap().collect();
        assert_eq!(results.len(), 2, "{name}");
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(Error::SchemaMismatch { .. })))
                .count(),
            1,
            "{name}"
        );
        assert!(
            results.iter().any(|r| matches!(r, Ok(b) if b.title == "Good")),
            "{name}"
        );
    }
}

// ===========================================================================
// Update
// ===========================================================================

#[tokio::test]
async fn content_update_replaces_merge_update_overlays() {
    for (name, client) in backends().await {
        let created = create_one(&client, "book", &book("X", "Dave MacLeod")).await;
        let id = created.id.clone().unwrap();

        // MERGE: only `available` changes
        let merged: Book = client
            .update_record(&id, Update::merge(Patch::new().set("available", false).unwrap()))
            .await
            .unwrap();
        assert!(!merged.available, "{name}");
        assert_eq!(merged.author, "Dave MacLeod", "{name}");
        assert_eq!(merged.published_at, created.published_at, "{name}");

        // CONTENT with only a title: every other field is gone
        #[derive(Serialize)]
        struct TitleOnly<'a> {
            title: &'a str,
        }
        let replaced: Book = client
            .update_record(&id, Update::content(&TitleOnly { title: "X" }).unwrap())
            .await
            .unwrap();
        assert_eq!(replaced.id.as_ref(), Some(&id), "{name}");
        assert_eq!(replaced.title, "X", "{name}");
        assert_eq!(replaced.author, "", "{name}");
        assert!(replaced.published_at.is_none(), "{name}");
        assert!(!replaced.available, "{name}");
    }
}

#[tokio::test]
async fn merge_over_table_updates_every_row() {
    for (name, client) in backends().await {
        let mut unavailable = book("A", "X");
        unavailable.available = false;
        client
            .create_many("book", &[unavailable.clone(), unavailable])
            .await
            .unwrap();

        let updated: Vec<Book> = client
            .update("book", Update::merge(Patch::new().set("available", true).unwrap()))
            .await
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(updated.len(), 2, "{name}");
        assert!(updated.iter().all(|b| b.available && b.author == "X"), "{name}");
    }
}

#[tokio::test]
async fn update_missing_record_is_not_found() {
    for (name, client) in backends().await {
        let created = create_one(&client, "book", &book("Gone", "X")).await;
        let id = created.id.unwrap();
        client.delete(&id).await.unwrap();

        let err = client
            .update_record::<Book>(&id, Update::merge(Patch::new().set("available", true).unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "{name}: {err}");
    }
}

// ===========================================================================
// Relate / delete
// ===========================================================================

#[tokio::test]
async fn relate_creates_distinct_edges() {
    for (name, client) in backends().await {
        let b = create_one(&client, "book", &book("A", "X")).await.id.unwrap();
        let p = create_one(
            &client,
            "publisher",
            &Publisher {
                id: None,
                name: "SurrealDB".to_string(),
            },
        )
        .await
        .id
        .unwrap();

        let first = client.relate(&b, "published_by", &p).await.unwrap();
        let second = client.relate(&b, "published_by", &p).await.unwrap();

        assert_eq!(first.from, b, "{name}");
        assert_eq!(first.to, p, "{name}");
        assert_eq!(first.label(), "published_by", "{name}");
        assert_ne!(first.id, second.id, "{name}");
    }
}

#[tokio::test]
async fn relate_to_missing_endpoint_is_dangling() {
    for (name, client) in backends().await {
        let b = create_one(&client, "book", &book("A", "X")).await.id.unwrap();
        let p = create_one(
            &client,
            "publisher",
            &Publisher {
                id: None,
                name: "Gone".to_string(),
            },
        )
        .await
        .id
        .unwrap();
        client.delete(&p).await.unwrap();

        let err = client.relate(&b, "published_by", &p).await.unwrap_err();
        assert!(
            matches!(err, Error::DanglingReference { ref id } if *id == p),
            "{name}: {err}"
        );
    }
}

#[tokio::test]
async fn deleting_an_endpoint_removes_its_edges() {
    for (name, client) in backends().await {
        let b = create_one(&client, "book", &book("A", "X")).await.id.unwrap();
        let p = create_one(
            &client,
            "publisher",
            &Publisher {
                id: None,
                name: "SurrealDB".to_string(),
            },
        )
        .await
        .id
        .unwrap();
        client.relate(&b, "published_by", &p).await.unwrap();

        client.delete(&p).await.unwrap();

        let edges: Vec<_> = client
            .select::<Edge>("published_by")
            .await
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert!(edges.is_empty(), "{name}: {edges:?}");
        assert!(client.select_record::<Book>(&b).await.unwrap().is_some(), "{name}");
    }
}

#[tokio::test]
async fn delete_table_removes_every_row() {
    for (name, client) in backends().await {
        client
            .create_many("book", &[book("A", "X"), book("B", "Y")])
            .await
            .unwrap();
        client.delete("book").await.unwrap();
        assert_eq!(client.select::<Book>("book").await.unwrap().len(), 0, "{name}");
    }
}

// ===========================================================================
// Lifecycle
// ===========================================================================

#[tokio::test]
async fn closed_client_reports_connection_closed() {
    for (name, client) in backends().await {
        let other = client.clone();
        client.close().await;

        let err = other.select::<Book>("book").await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed), "{name}");
    }
}
