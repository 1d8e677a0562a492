pub mod identity_errors;
pub mod session_service_errors;
