pub mod auth;
pub mod chemistry;
pub mod config;
pub mod invitations;
pub mod mailer;
pub mod tenancy;
