use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use aws_sdk_s3::Client;

use crate::error::StorageError;
use crate::objects;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Body and metadata of a stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

/// Condition a write must meet to take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition<'a> {
    /// Unconditional overwrite.
    None,
    /// The stored object still carries this ETag.
    IfMatch(&'a str),
    /// Nothing is stored under the key yet.
    IfAbsent,
}

/// Flat key/value object storage with ETag preconditions.
pub trait ObjectStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<StoredObject, StorageError>>;

    /// Write `body` under `key`. Returns the new ETag, or
    /// `StorageError::PreconditionFailed` when the condition does not hold.
    fn put<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        content_type: Option<&'a str>,
        precondition: Precondition<'a>,
    ) -> BoxFuture<'a, Result<String, StorageError>>;

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Keys under `prefix`, in lexicographic order.
    fn list<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>, StorageError>>;

    /// A URL the object can be fetched from for `expires_in`.
    fn download_url<'a>(
        &'a self,
        key: &'a str,
        expires_in: Duration,
    ) -> BoxFuture<'a, Result<String, StorageError>>;
}

/// S3 bucket backend.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl ObjectStore for S3ObjectStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<StoredObject, StorageError>> {
        Box::pin(objects::get_object(&self.client, &self.bucket, key))
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        content_type: Option<&'a str>,
        precondition: Precondition<'a>,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(objects::put_object(
            &self.client,
            &self.bucket,
            key,
            body,
            content_type,
            precondition,
        ))
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(objects::delete_object(&self.client, &self.bucket, key))
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>, StorageError>> {
        Box::pin(async move {
            let mut keys = objects::list_objects(&self.client, &self.bucket, prefix).await?;
            keys.sort();
            Ok(keys)
        })
    }

    fn download_url<'a>(
        &'a self,
        key: &'a str,
        expires_in: Duration,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(objects::presign_get(
            &self.client,
            &self.bucket,
            key,
            expires_in,
        ))
    }
}
