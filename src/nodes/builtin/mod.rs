//! Built-in node implementations.
//!
//! Each module exposes a `metadata()` and a `process()` function that
//! [`NodeKind`](crate::nodes::NodeKind) dispatches to.

pub mod io;
pub mod point;
pub mod convolution;
pub mod median;
pub mod histogram;
pub mod difference;
