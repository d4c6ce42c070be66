//! Core types, errors, billing periods, clock and repository seam.
//!
//! Every other module builds on these: decoders produce the record types
//! defined here and the reconciliation engine talks to persistence only
//! through [`TustRepository`].

mod clock;
mod error;
mod period;
mod repository;
mod types;

pub use clock::*;
pub use error::*;
pub use period::*;
pub use repository::*;
pub use types::*;
