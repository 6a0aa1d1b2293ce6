//! Encryption of personal data stored by the service.

pub mod encryption;

pub use encryption::Encryptor;
