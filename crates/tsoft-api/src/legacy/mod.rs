// Legacy form API
//
// The original T-Soft REST surface: every call is a form-encoded POST
// carrying the token in three places.

pub mod client;

pub use client::LegacyClient;
