//! GPU CRM - role-gated CRM service for GPU-compute sales teams
//!
//! Tracks customers, companies, the GPU hardware catalog and rental,
//! purchase and project demands. Every read and write passes through the
//! access policy in [`policy`], which decides row, field and module
//! visibility from the caller's role and team.

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod policy;
pub mod util;
