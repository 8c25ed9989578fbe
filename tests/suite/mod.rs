//! End-to-end test modules.

mod resources;
mod session;
mod verifier;
mod wizard;
