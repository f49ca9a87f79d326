//! Service layer for overview computation and orchestration.
//!
//! Services sit between the repositories and callers: the computer decides
//! live vs snapshot, the codec turns overviews into snapshot blobs and back,
//! the export projector turns them into grids and workbooks, and the
//! analysis service ties those to stored analyses.

pub mod analysis;
pub mod codec;
pub mod computer;
pub mod error;
pub mod export;
pub mod query;

pub use analysis::AnalysisService;
pub use computer::OverviewComputer;
pub use error::{AnalysisError, AnalysisResult, CodecError, ExportError, QueryError};
pub use export::{Grid, NamedGrid, Workbook};
pub use query::{FuncCaseQuery, OverviewParams, QueryResult, TaskQuery};
