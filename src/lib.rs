pub mod brevo;
pub mod config;
pub mod contact;
pub mod metrics;
pub mod relay;
pub mod signup;
