//! Password hashing, token issuance and per-request session verification.

pub mod password;
pub mod session;
pub mod tokens;

pub use password::PasswordHashing;
pub use session::{authenticate, require_admin, session_cookies, ACCESS_COOKIE, REFRESH_COOKIE};
pub use tokens::{AccessClaims, RefreshClaims, TokenIssuer, TokenPair};
