//! Low-level JSON text: escaping, number formatting and scanning.

mod scan;
mod write;

pub(crate) use scan::{validate, Scanner, Token};
pub(crate) use write::{format_float, write_str};
