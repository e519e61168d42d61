pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;

pub use error::SchedulingError;
pub use models::{Appointment, AppointmentStatus, AppointmentView, InitialStatus, SchedulingStats};
pub use router::appointment_routes;
pub use services::SchedulingEngine;
pub use state::AppState;
