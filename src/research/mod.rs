//! Report research workflow
//!
//! Three nested graphs, composed leaf to root:
//!
//! - [`SearchUnit`] picks search tool calls for one topic and runs the new ones
//! - [`ResearcherUnit`] fans out search units over a section's topics and writes it
//! - [`ReportCoordinator`] plans, routes, runs both writing waves and assembles
//!   the report

pub mod coordinator;
pub mod planner;
pub mod prompts;
pub mod report;
pub mod researcher;
pub mod search_unit;
pub mod writer;

pub use coordinator::ReportCoordinator;
pub use planner::PlanGenerator;
pub use researcher::ResearcherUnit;
pub use search_unit::SearchUnit;
pub use writer::SectionWriter;
