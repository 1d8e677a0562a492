#[derive(Debug, Clone, PartialEq)]
pub enum IdentityError {
    MissingToken,
    MalformedToken(String),
    MissingSubject,
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::MissingToken => write!(f, "No bearer token provided"),
            IdentityError::MalformedToken(msg) => write!(f, "Malformed bearer token: {}", msg),
            IdentityError::MissingSubject => write!(f, "Bearer token has no subject claim"),
        }
    }
}

impl std::error::Error for IdentityError {}
