use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access-JWT payload. Refresh credentials are opaque database rows, so no
/// token-kind discriminator is needed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,     // user ID
    pub email: String, // profile subset carried in the token
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
    pub iss: String,   // issuer
    pub aud: String,   // audience
}
