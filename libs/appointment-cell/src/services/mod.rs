pub mod conflict;
pub mod doctor_sequence;
pub mod engine;
pub mod identity;
pub mod person;
pub mod records;
pub mod reminder;
pub mod time_index;

pub use engine::SchedulingEngine;
