//! Sizing of fixed-size image segments.
//!
//! [`parse_size`] turns text such as `"512K"` into a byte count, and
//! [`size_file`] produces an output file of exactly that many bytes from an
//! optional input and a fill byte.

pub mod image;
pub mod util;

pub use image::{size_file, PadMode, PadRequest};
pub use util::{parse_fill, parse_size, parse_size_strict, Error, Result};
