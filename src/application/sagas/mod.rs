//! Built-in saga definitions

pub mod account_registration;
