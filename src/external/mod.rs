//! Clients for third-party HTTP services

pub mod postal;
pub mod qr;

pub use postal::{Address, PostalClient, PostalError};
pub use qr::{QrClient, QrError};
