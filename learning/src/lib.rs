//! Diagnostic analysis and learning path assembly.
//!
//! A submitted diagnostic is scored per unit, the weakest units become weak
//! concepts, and each weak concept is expanded backwards over `PRECEDES` so
//! that prerequisites are studied before the concept that needs them.

pub mod comment;
pub mod diagnostic;
pub mod errors;
pub mod express;
pub mod path_builder;
pub mod units;

pub use comment::{template_comment, CommentContext, CommentWriter};
pub use diagnostic::{classify_learner, overall_level, DiagnosticService};
pub use errors::{LearningError, LearningResult};
pub use express::ExpressDiagnosticFlow;
pub use path_builder::LearningPathBuilder;
pub use units::{chapter_for_problem, ResolvedUnit, UnitResolver};
