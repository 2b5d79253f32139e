//! Contract validation for producer events.
//!
//! Contract violations are producer bugs: callers treat every failure
//! reported here as terminal, whatever the message text says.

mod validator;

pub use validator::{validate_event, ContractValidator};
