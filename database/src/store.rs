use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection, Database};
use nerdmath_config::MongoConfig;
use std::time::Duration;

use crate::errors::DatabaseResult;

/// Connected MongoDB client bound to the configured database.
#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connect and ping the admin database before handing out the store.
    pub async fn connect(config: &MongoConfig) -> DatabaseResult<Self> {
        let uri = config.require_uri()?;
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some("nerdmath".to_string());
        options.server_selection_timeout = Some(Duration::from_millis(config.timeout_ms));
        options.connect_timeout = Some(Duration::from_millis(config.timeout_ms));

        let client = Client::with_options(options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;

        tracing::info!(database = %config.database, "MongoDB connection established");
        let db = client.database(&config.database);
        Ok(Self { client, db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn name(&self) -> &str {
        self.db.name()
    }

    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }

    pub async fn ping(&self) -> DatabaseResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    pub async fn list_collections(&self) -> DatabaseResult<Vec<String>> {
        let mut names = self.db.list_collection_names(None).await?;
        names.sort();
        Ok(names)
    }

    pub async fn count(&self, collection: &str) -> DatabaseResult<u64> {
        Ok(self.collection(collection).count_documents(doc! {}, None).await?)
    }

    /// Newest documents first, by `_id`.
    pub async fn latest(&self, collection: &str, limit: i64) -> DatabaseResult<Vec<Document>> {
        let options = FindOptions::builder()
            .sort(doc! { "_id": -1 })
            .limit(limit)
            .build();
        let cursor = self.collection(collection).find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Delete every document, then insert `docs`. Returns the inserted count.
    pub async fn replace_all(&self, collection: &str, docs: Vec<Document>) -> DatabaseResult<usize> {
        let coll = self.collection(collection);
        let deleted = coll.delete_many(doc! {}, None).await?.deleted_count;
        if deleted > 0 {
            tracing::info!(collection, deleted, "Removed existing documents");
        }
        if docs.is_empty() {
            return Ok(0);
        }
        let result = coll.insert_many(docs, None).await?;
        Ok(result.inserted_ids.len())
    }
}
