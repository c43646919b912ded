//! Social publishing for accepted images.
//!
//! This crate provides:
//! - The [`Publisher`] trait (credentials + post image)
//! - A profile-image publisher over HTTP
//! - OAuth 1.0a HMAC-SHA1 request signing

pub mod client;
pub mod error;
pub mod oauth;

pub use client::{ProfileImagePublisher, Publisher, PublisherConfig};
pub use error::{PublishError, PublishResult};
pub use oauth::OAuthCredentials;
