//! Supabase-backed authentication
//!
//! Handles:
//! - The identity authority seam and its Supabase Auth client
//! - Session cookie encoding
//! - Caller extraction for handlers
//! - Password login and logout

mod authority;
mod login;
mod middleware;
pub mod session;
mod supabase;

#[cfg(test)]
pub use authority::MockIdentityAuthority;
pub use authority::{AuthUser, IdentityAuthority};
pub use login::auth_router;
pub use middleware::{CurrentUser, MaybeUser};
pub use session::{SessionCookieSettings, SessionTokens};
pub use supabase::SupabaseAuth;
