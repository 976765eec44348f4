//! Domain models for campus events.

pub mod attendance;
pub mod event;
pub mod feedback;
pub mod principal;
pub mod registration;

pub use attendance::{
    Attendance, AttendanceResponse, MarkAttendanceRequest, MarkOutcome, TokenCheckInRequest,
};
pub use event::{
    CreateEventRequest, Event, EventPatch, EventSummary, FeaturesInput, ListEventsQuery, NewEvent,
    UpdateEventRequest,
};
pub use feedback::{Feedback, NewFeedback, SubmitFeedbackRequest};
pub use principal::{CheckInPolicy, Principal, Role};
pub use registration::{
    generate_registration_token, AlreadyRegisteredResponse, NewRegistration, RegisterRequest,
    RegisterResponse, Registration, RegistrationStatus, RegistrationWithEvent,
    StudentRegistrationsQuery,
};
