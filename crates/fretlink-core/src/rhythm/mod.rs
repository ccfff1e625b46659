//! Note scheduling, hit evaluation and scoring.

mod engine;
mod judge;
mod note;

pub use engine::*;
pub use judge::*;
pub use note::*;
