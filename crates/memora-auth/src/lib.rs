//! memora-auth
//!
//! Console sign-in: ID token verification and staff account provisioning
//! in the Cognito user pool.

pub mod client;
pub mod error;
pub mod jwt;
pub mod users;
