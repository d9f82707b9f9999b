// src/core/mod.rs

pub mod html;
pub mod vischars;
pub mod net;
pub mod sanitize;
pub mod scalar;

pub use html::{Document, Table};
pub use scalar::{Scalar, Unit};
pub use vischars::VisChars;
