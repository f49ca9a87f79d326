//! # Analysis Overview Engine
//!
//! Computes, caches, rehydrates, and exports statistical overview reports for
//! work tasks and functional test cases.
//!
//! ## Features
//!
//! - **Templates**: 14 task and 14 case report templates, each bound to one
//!   concrete report type
//! - **Live or snapshot**: an analysis either computes through its query
//!   collaborators or serves a stored, checksummed snapshot
//! - **Export**: any report's detail rows project to a grid or an `.xlsx`
//!   workbook
//!
//! ## Architecture
//!
//! - [`models`]: ids, analyses, templates, snapshot records
//! - [`overview`]: aggregate count blocks, detail rows, report types
//! - [`registry`]: compute-side and decode-side template tables
//! - [`services`]: overview computer, snapshot codec, export, service layer
//! - [`db`]: repository traits and the local / Postgres backends
//! - [`config`]: engine settings
//! - [`api`]: public re-export surface

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod overview;
pub mod registry;
pub mod services;
