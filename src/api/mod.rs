//! # API Module
//!
//! HTTP endpoints of the local server that receives the OAuth redirect.
//!
//! - [`callback`] - Completes the PKCE flow: takes the authorization code from
//!   the redirect, exchanges it together with the stored code verifier and
//!   leaves the token in the shared state the login flow is polling.
//!
//! The router itself lives in [`crate::server`].

mod callback;

pub use callback::callback;
