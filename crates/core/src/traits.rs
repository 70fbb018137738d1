//! Collaborator traits
//!
//! The pipeline talks to the object store and to the local filesystem only
//! through these traits, so the S3 adapter and the tests can plug in their
//! own implementations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Error, Result};

/// Canned access policy applied to an uploaded object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectAcl {
    Private,
    #[default]
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl ObjectAcl {
    /// Canonical S3 name of the policy
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectAcl::Private => "private",
            ObjectAcl::PublicRead => "public-read",
            ObjectAcl::PublicReadWrite => "public-read-write",
            ObjectAcl::AuthenticatedRead => "authenticated-read",
            ObjectAcl::BucketOwnerRead => "bucket-owner-read",
            ObjectAcl::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }
}

impl fmt::Display for ObjectAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectAcl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(ObjectAcl::Private),
            "public-read" => Ok(ObjectAcl::PublicRead),
            "public-read-write" => Ok(ObjectAcl::PublicReadWrite),
            "authenticated-read" => Ok(ObjectAcl::AuthenticatedRead),
            "bucket-owner-read" => Ok(ObjectAcl::BucketOwnerRead),
            "bucket-owner-full-control" => Ok(ObjectAcl::BucketOwnerFullControl),
            other => Err(Error::Config(format!("unknown ACL '{other}'"))),
        }
    }
}

/// A single object upload
#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub cache_control: String,
    pub acl: ObjectAcl,
}

/// Remote object store
///
/// Implementations own their transport and retry behavior; the pipeline
/// calls `put_object` once per file and treats any error as that file's
/// failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `request.body` under `request.key` in `request.bucket`
    async fn put_object(&self, request: PutObjectRequest) -> Result<()>;
}

/// Local filesystem the pipeline reads from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalFs: Send + Sync {
    /// List every regular file under `root`, failing with `Error::Filesystem`
    async fn list_regular_files(&self, root: &Path) -> Result<Vec<PathBuf>>;

    /// Read a whole file, failing with `Error::Read`
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acl_round_trip_names() {
        for acl in [
            ObjectAcl::Private,
            ObjectAcl::PublicRead,
            ObjectAcl::PublicReadWrite,
            ObjectAcl::AuthenticatedRead,
            ObjectAcl::BucketOwnerRead,
            ObjectAcl::BucketOwnerFullControl,
        ] {
            assert_eq!(acl.as_str().parse::<ObjectAcl>().unwrap(), acl);
        }
    }

    #[test]
    fn test_acl_default_and_parse() {
        assert_eq!(ObjectAcl::default(), ObjectAcl::PublicRead);
        assert_eq!(" Public-Read ".parse::<ObjectAcl>().unwrap(), ObjectAcl::PublicRead);
        assert!(matches!("world-writable".parse::<ObjectAcl>(), Err(Error::Config(_))));
    }
}
