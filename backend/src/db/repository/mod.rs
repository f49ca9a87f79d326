//! Repository trait definitions for analysis storage.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`analysis`]: CRUD operations for analysis configurations
//! - [`snapshot`]: Keyed storage for serialized overview snapshots
//!
//! For functions that need both, use the [`FullRepository`] bound:
//!
//! ```ignore
//! async fn drop_analysis<R: FullRepository + ?Sized>(repo: &R, id: AnalysisId) -> RepositoryResult<()> {
//!     repo.delete_analyses(&[id]).await?;
//!     repo.delete_snapshots(&[id]).await?;
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod error;
pub mod snapshot;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use analysis::AnalysisRepository;
pub use snapshot::AnalysisSnapshotRepository;

/// Composite bound for a complete repository implementation.
pub trait FullRepository: AnalysisRepository + AnalysisSnapshotRepository {}

impl<T> FullRepository for T where T: AnalysisRepository + AnalysisSnapshotRepository {}
