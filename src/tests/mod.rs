//! Crate-level test suite: shared doubles and whole-frame scenarios.

pub(crate) mod support;
