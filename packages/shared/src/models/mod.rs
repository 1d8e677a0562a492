pub mod identity;
pub mod lifecycle;
pub mod results;
pub mod session;
