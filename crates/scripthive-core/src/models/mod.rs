//! Data models for ScriptHive backend entities.
//!
//! - `Envelope`, `DataEnvelope`: the backend's response wrappers
//! - `User`, `UserProfile`, `ProfileUpdate`: accounts and the profile editor
//! - `Project`, `Transaction`: posted scripts and M-Pesa payments
//! - `FeeLimit`, `FeeLimitKind`, `Role`: registration fees and budget limits
//! - `DashboardStats`: aggregates computed from the lists above

pub mod dashboard;
pub mod de;
pub mod envelope;
pub mod limit;
pub mod project;
pub mod status;
pub mod transaction;
pub mod user;

pub use dashboard::{CategoryCount, DashboardStats, MonthlyRevenue};
pub use envelope::{DataEnvelope, Envelope};
pub use limit::{FeeLimit, FeeLimitKind, FeeLimitRequest, Role};
pub use project::Project;
pub use status::StatusKind;
pub use transaction::Transaction;
pub use user::{ProfileUpdate, User, UserProfile};
