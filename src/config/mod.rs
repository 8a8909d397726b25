/// Database configuration and connection management
pub mod database;

/// Payment gateway credentials and endpoint configuration
pub mod gateway;

/// Pricing plan table and class-label price resolution
pub mod pricing;
