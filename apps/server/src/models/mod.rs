//! Domain models read from the academy store

pub mod academy;

pub use academy::{AcademyRecord, Address, GeoLocation, ProgramEntry};
