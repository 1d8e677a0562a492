pub mod errors;
pub mod in_memory_session_repository;
pub mod session_repository;
