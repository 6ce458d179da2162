//! Helpers shared by unit tests
mod common;

pub(crate) use common::*;
