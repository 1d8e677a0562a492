pub mod errors;
pub mod polling_synchronizer;
pub mod readiness_service;
pub mod result_service;
pub mod session_lifecycle;
pub mod session_service;
pub mod state_machine;
pub mod termination_detector;
