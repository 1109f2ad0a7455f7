//! # Wardmap Auth
//!
//! JWT claims and token helpers. Three token kinds exist:
//!
//! - **Access** ([`Claims`]): short-lived, signed with `JWT_SECRET`, carried as a bearer token
//! - **Refresh** ([`RefreshTokenClaims`]): long-lived, signed with `JWT_REFRESH_SECRET`, stored on the user row
//! - **Password reset** ([`PasswordResetClaims`]): minutes-long, issued after a correct secret answer
//!
//! Verification only checks signature and expiry. Whether the subject is
//! still an active user is the caller's concern.

pub mod claims;
pub mod jwt;

pub use claims::{Claims, PasswordResetClaims, RefreshTokenClaims};
pub use jwt::{
    create_access_token, create_password_reset_token, create_refresh_token, verify_password_reset_token,
    verify_refresh_token, verify_token,
};
