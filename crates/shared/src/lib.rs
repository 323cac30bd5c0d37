pub mod cue;
pub mod domain;
pub mod error;
pub mod protocol;
