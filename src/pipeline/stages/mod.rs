//! Stage functions. Each takes the state by value and returns the updated state
//! together with the event it emits.

pub(crate) mod finalize;
pub(crate) mod gate;
pub(crate) mod generate;
pub(crate) mod init;
pub(crate) mod research;
pub(crate) mod score;

pub use gate::QualityPolicy;
