// JSON API
//
// The newer catalog/customer/order surface: bearer-authenticated GETs
// with query strings and JSON POSTs.

pub mod client;

pub use client::ModernClient;
