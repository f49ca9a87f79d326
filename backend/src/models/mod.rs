pub mod analysis;
pub mod macros;
pub mod template;

pub use analysis::*;
pub use template::*;

crate::define_id_type!(i64, AnalysisId);
crate::define_id_type!(i64, ProjectId);
crate::define_id_type!(i64, PlanId);
crate::define_id_type!(i64, OrgId);
crate::define_id_type!(i64, UserId);
