//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in bonobo-core on top of `embedded-hal` 1.0:
//!
//! - Stepper bank driving step/dir/enable outputs and reading limit inputs

#![no_std]
#![deny(unsafe_code)]

pub mod stepper;
