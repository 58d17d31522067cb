//! Background services

pub mod verify;

pub use verify::{VerifierHandle, VerifierService};
