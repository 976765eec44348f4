//! Repository implementations for database operations.

pub mod attendance;
pub mod event;
pub mod feedback;
pub mod registration;

pub use attendance::AttendanceRepository;
pub use event::EventRepository;
pub use feedback::FeedbackRepository;
pub use registration::RegistrationRepository;
