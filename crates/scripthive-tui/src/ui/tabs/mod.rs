pub mod dashboard;
pub mod limits;
pub mod payments;
pub mod profile;
pub mod scripts;
pub mod users;
