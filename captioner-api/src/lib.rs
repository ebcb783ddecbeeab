//! Captioner API service.
//!
//! A thin HTTP service that accepts image uploads, stores them in a Google
//! Cloud Storage bucket, asks the Cloud Vision API for label annotations, and
//! turns the top labels into a short caption. At startup the service grants
//! public read access on the bucket through a bounded retry loop with
//! exponential backoff; the server does not accept requests until that grant
//! has been applied.

pub mod config;
pub mod retry;
pub mod routes;
pub mod startup;
pub mod storage;
pub mod vision;
