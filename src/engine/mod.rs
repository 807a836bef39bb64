// src/engine/mod.rs

pub mod admission;
pub mod clock;
pub mod error;
pub mod scoring;
pub mod validator;

pub use admission::SubmissionService;
pub use clock::{Clock, SystemClock};
pub use error::SubmissionError;
pub use scoring::{Score, score_submission};
pub use validator::validate_submission;
