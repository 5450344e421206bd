//! Storage module
//!
//! One `object_store` view over the places records are read from and tables
//! are written to.
//!
//! # Supported locations
//!
//! - `/local/path/` or `./path/` or `file:///path` - Local filesystem
//! - `s3://bucket/path/` (also `s3a://`, `s3n://`) - AWS S3
//! - `r2://bucket/path/` - Cloudflare R2 (S3-compatible, needs an endpoint)
//! - `gs://bucket/path/` - Google Cloud Storage
//! - `az://container/path/` - Azure Blob Storage
//!
//! Credentials come from [`StorageOptions`] when set, otherwise from the
//! backend's own default chain. Nothing is written to the process environment.

mod pattern;

pub use pattern::PathPattern;

use crate::error::{Error, Result};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Explicit connection settings for cloud backends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Access key id (S3/R2)
    pub access_key_id: Option<String>,
    /// Secret access key (S3/R2)
    pub secret_access_key: Option<String>,
    /// Session token (S3)
    pub session_token: Option<String>,
    /// Region (S3)
    pub region: Option<String>,
    /// Custom endpoint, required for R2 and S3-compatible servers
    pub endpoint: Option<String>,
    /// Allow plain HTTP endpoints
    pub allow_http: bool,
}

/// A storage root: an object store plus the path prefix everything lives under
#[derive(Debug, Clone)]
pub struct Storage {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path within the bucket/container
    prefix: ObjectPath,
    /// URL scheme for logging (s3, r2, gs, az, file)
    scheme: String,
    /// Location as configured
    location: String,
}

impl Storage {
    /// Open an existing location for reading
    pub fn open(location: &str, options: &StorageOptions) -> Result<Self> {
        Self::open_with(location, options, false)
    }

    /// Open a location for writing, creating local directories as needed
    pub fn open_for_write(location: &str, options: &StorageOptions) -> Result<Self> {
        Self::open_with(location, options, true)
    }

    fn open_with(location: &str, options: &StorageOptions, create: bool) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(Error::config("Storage location is empty"));
        }

        match Url::parse(location) {
            Ok(url) => match url.scheme() {
                "s3" | "s3a" | "s3n" => Self::open_s3(location, &url, options, false),
                "r2" => Self::open_s3(location, &url, options, true),
                "gs" | "gcs" => Self::open_gcs(location, &url),
                "az" | "azure" => Self::open_azure(location, &url),
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|()| Error::config(format!("Invalid file URL: {location}")))?;
                    Self::open_local(location, path, create)
                }
                // Windows drive letters parse as one-letter schemes
                scheme if scheme.len() == 1 => {
                    Self::open_local(location, PathBuf::from(location), create)
                }
                scheme => Err(Error::config(format!(
                    "Unsupported storage scheme '{scheme}' in {location}"
                ))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Self::open_local(location, PathBuf::from(location), create)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Bucket (or container) and prefix from a cloud URL
    fn split_url(location: &str, url: &Url) -> Result<(String, ObjectPath)> {
        let bucket = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::config(format!("Missing bucket in {location}")))?;
        let prefix = ObjectPath::from(url.path().trim_matches('/'));
        Ok((bucket.to_string(), prefix))
    }

    /// Open S3 or R2
    fn open_s3(location: &str, url: &Url, options: &StorageOptions, is_r2: bool) -> Result<Self> {
        let scheme = if is_r2 { "r2" } else { "s3" };
        let (bucket, prefix) = Self::split_url(location, url)?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(key) = &options.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(secret) = &options.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(token) = &options.session_token {
            builder = builder.with_token(token);
        }
        if let Some(region) = &options.region {
            builder = builder.with_region(region);
        }
        match &options.endpoint {
            Some(endpoint) => builder = builder.with_endpoint(endpoint),
            None if is_r2 => {
                return Err(Error::missing_field("storage.endpoint"));
            }
            None => {}
        }
        if options.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: scheme.to_string(),
            location: location.to_string(),
        })
    }

    /// Open Google Cloud Storage
    fn open_gcs(location: &str, url: &Url) -> Result<Self> {
        let (bucket, prefix) = Self::split_url(location, url)?;
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "gs".to_string(),
            location: location.to_string(),
        })
    }

    /// Open Azure Blob Storage
    fn open_azure(location: &str, url: &Url) -> Result<Self> {
        let (container, prefix) = Self::split_url(location, url)?;
        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "az".to_string(),
            location: location.to_string(),
        })
    }

    /// Open a local directory
    fn open_local(location: &str, path: PathBuf, create: bool) -> Result<Self> {
        if create {
            std::fs::create_dir_all(&path).map_err(|e| {
                Error::config(format!("Failed to create directory {}: {e}", path.display()))
            })?;
        } else if !path.is_dir() {
            return Err(Error::source_read(location, "directory does not exist"));
        }

        let store = LocalFileSystem::new_with_prefix(&path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: ObjectPath::default(),
            scheme: "file".to_string(),
            location: location.to_string(),
        })
    }

    /// Check if this is a cloud location (not local)
    pub fn is_cloud(&self) -> bool {
        self.scheme != "file"
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Location as configured
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Human-readable form of a relative path, for logs and errors
    pub fn display(&self, relative: &ObjectPath) -> String {
        format!("{}/{relative}", self.location.trim_end_matches('/'))
    }

    /// Absolute object path for a path relative to this root
    fn absolute(&self, relative: &ObjectPath) -> ObjectPath {
        ObjectPath::from_iter(self.prefix.parts().chain(relative.parts()))
    }

    /// Path relative to this root
    fn relative(&self, absolute: &ObjectPath) -> ObjectPath {
        match absolute.prefix_match(&self.prefix) {
            Some(parts) => ObjectPath::from_iter(parts),
            None => absolute.clone(),
        }
    }

    /// List every object under a relative prefix, sorted by path
    pub async fn list(&self, relative_prefix: &ObjectPath) -> Result<Vec<ObjectPath>> {
        let absolute = self.absolute(relative_prefix);
        let prefix = (!absolute.as_ref().is_empty()).then_some(&absolute);

        let metas: Vec<_> = self.store.list(prefix).try_collect().await?;
        let mut paths: Vec<ObjectPath> = metas
            .into_iter()
            .map(|meta| self.relative(&meta.location))
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// List objects matching a wildcard pattern, sorted by path
    pub async fn list_matching(&self, pattern: &PathPattern) -> Result<Vec<ObjectPath>> {
        let prefix = ObjectPath::from(pattern.literal_prefix());
        let paths = self
            .list(&prefix)
            .await
            .map_err(|e| Error::source_read(self.location.clone(), e.to_string()))?;

        let matched: Vec<ObjectPath> = paths
            .into_iter()
            .filter(|p| pattern.matches(p.as_ref()))
            .collect();
        debug!(
            pattern = pattern.as_str(),
            files = matched.len(),
            "Listed input files"
        );
        Ok(matched)
    }

    /// Check whether anything exists under a relative prefix
    pub async fn exists(&self, relative_prefix: &ObjectPath) -> Result<bool> {
        let absolute = self.absolute(relative_prefix);
        let mut stream = self.store.list(Some(&absolute));
        match stream.next().await {
            Some(Ok(_)) => Ok(true),
            Some(Err(e)) => Err(e.into()),
            None => Ok(false),
        }
    }

    /// Read an object fully
    pub async fn get(&self, relative: &ObjectPath) -> Result<Bytes> {
        let path = self.absolute(relative);
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| Error::source_read(self.display(relative), e.to_string()))?;
        result
            .bytes()
            .await
            .map_err(|e| Error::source_read(self.display(relative), e.to_string()))
    }

    /// Write an object, returning its display path
    pub async fn put(&self, relative: &ObjectPath, data: Bytes) -> Result<String> {
        let path = self.absolute(relative);
        let target = self.display(relative);
        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::write(target.clone(), e.to_string()))?;
        debug!(path = %target, "Wrote object");
        Ok(target)
    }

    /// Delete every object under a relative prefix, returning how many went
    pub async fn delete_prefix(&self, relative_prefix: &ObjectPath) -> Result<usize> {
        let paths = self.list(relative_prefix).await?;
        for path in &paths {
            self.store
                .delete(&self.absolute(path))
                .await
                .map_err(|e| Error::write(self.display(path), e.to_string()))?;
        }
        Ok(paths.len())
    }
}
