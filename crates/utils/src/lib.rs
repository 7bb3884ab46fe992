pub mod response;
pub mod sentry;
pub mod server_timing;
pub mod text;
