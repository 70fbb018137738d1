//! wp-s3: S3 SDK adapter for wasabi-push
//!
//! This crate implements the `ObjectStore` trait from wp-core using aws-sdk-s3.
//! It works with Wasabi, AWS S3 and other S3-compatible servers.

pub mod client;

pub use client::{S3Client, canned_acl};
