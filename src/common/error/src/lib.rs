//! Error types and result aliases for quarry.
//!
//! Every rewriting pass returns [`QuarryResult`]; evaluation failures are the
//! only errors that may be captured as data instead of propagated.

mod error;

pub use error::{GenericError, QuarryError, QuarryResult};
