pub mod backup_exchange;
pub mod core;
pub mod grades;
pub mod history;
pub mod reports;
pub mod roster;
pub mod session;
pub mod setup;
pub mod subjects;
