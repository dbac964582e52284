//! `Library`: book/publisher operations over a typed client

use serde_json::{json, Value};
use tracing::{info, instrument};
use typed_surreal::{
    Client, Edge, Error, Patch, Record, RecordId, RecordKey, Result, Update, Vars,
};

use crate::model::{Book, Publisher, BOOK_TABLE, PUBLISHED_BY, PUBLISHER_TABLE};

const BOOKS_BY_AUTHOR: &str = "SELECT * FROM book WHERE author = $author;";
const PUBLISHERS_OF: &str = "SELECT VALUE out FROM published_by WHERE in = type::thing($tb, $key);";

/// Creates records and keeps their relations consistent
#[derive(Debug, Clone)]
pub struct Library {
    client: Client,
}

impl Library {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    #[instrument(skip(self))]
    pub async fn add_publisher(&self, name: &str) -> Result<Publisher> {
        let publisher = single(
            self.client
                .create(PUBLISHER_TABLE, &Publisher::new(name))
                .await?,
        )?;
        info!(id = %stored_id(&publisher)?, "Publisher added");
        Ok(publisher)
    }

    /// Store `book` and link it to `publisher`.
    #[instrument(skip_all, fields(title = %book.title))]
    pub async fn publish(&self, book: &Book, publisher: &Publisher) -> Result<(Book, Edge)> {
        let publisher_id = stored_id(publisher)?;
        let book = self.add_book(book).await?;
        let edge = self
            .client
            .relate(stored_id(&book)?, PUBLISHED_BY, publisher_id)
            .await?;
        Ok((book, edge))
    }

    #[instrument(skip_all, fields(title = %book.title))]
    pub async fn add_book(&self, book: &Book) -> Result<Book> {
        let book = single(self.client.create(BOOK_TABLE, book).await?)?;
        info!(id = %stored_id(&book)?, "Book added");
        Ok(book)
    }

    pub async fn books(&self) -> Result<Vec<Book>> {
        self.client.select::<Book>(BOOK_TABLE).await?.collect()
    }

    /// Replace the stored book with `book` as given.
    pub async fn replace(&self, book: &Book) -> Result<Book> {
        self.client
            .update_record(stored_id(book)?, Update::content(book)?)
            .await
    }

    /// Set `available` on every book, leaving other fields alone.
    pub async fn set_all_available(&self, available: bool) -> Result<Vec<Book>> {
        let patch = Patch::new().set("available", available)?;
        self.client
            .update::<Book>(BOOK_TABLE, Update::merge(patch))
            .await?
            .collect()
    }

    pub async fn books_by(&self, author: &str) -> Result<Vec<Book>> {
        let mut vars = Vars::new();
        vars.insert("author".to_string(), json!(author));
        self.client
            .query_with(BOOKS_BY_AUTHOR, vars)
            .await?
            .take(0)?
            .records::<Book>()
            .collect()
    }

    /// Publishers `book` is related to through `published_by`
    pub async fn publishers_of(&self, book: &Book) -> Result<Vec<Publisher>> {
        let id = stored_id(book)?;
        let mut vars = Vars::new();
        vars.insert("tb".to_string(), json!(id.table()));
        vars.insert("key".to_string(), key_value(id.key()));

        let targets: Vec<RecordId> = self
            .client
            .query_with(PUBLISHERS_OF, vars)
            .await?
            .take(0)?
            .records()
            .collect::<Result<_>>()?;

        let mut publishers = Vec::with_capacity(targets.len());
        for target in &targets {
            if let Some(publisher) = self.client.select_record::<Publisher>(target).await? {
                publishers.push(publisher);
            }
        }
        Ok(publishers)
    }

    /// Remove every book and the given publisher.
    pub async fn clear(&self, publisher: &Publisher) -> Result<()> {
        self.client.delete(BOOK_TABLE).await?;
        self.client.delete(stored_id(publisher)?).await
    }
}

fn stored_id<T: Record>(record: &T) -> Result<&RecordId> {
    record
        .id()
        .ok_or_else(|| Error::Rejected(format!("{} has not been stored", std::any::type_name::<T>())))
}

fn single<T>(mut records: Vec<T>) -> Result<T> {
    match records.len() {
        1 => Ok(records.remove(0)),
        n => Err(Error::Rejected(format!("expected one record, store returned {n}"))),
    }
}

fn key_value(key: &RecordKey) -> Value {
    match key {
        RecordKey::Number(n) => json!(n),
        RecordKey::String(s) => json!(s),
    }
}
