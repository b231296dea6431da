//! The diff core of a version-control library.
//!
//! Synthesizes sorted lists of file deltas between any two of three content
//! sources (a committed tree, the staged index, the working directory) and
//! renders them either as a structured delta list or as a unified patch.

#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate bitflags;

#[macro_use]
extern crate log;

#[cfg(test)]
pub mod test_utils;

pub mod attr;
pub mod diff;
pub mod error;
pub mod hash;
pub mod ignore;
pub mod index;
pub mod obj;
pub mod odb;
pub mod patch;
pub mod path;
pub mod pathspec;
pub mod print;
pub mod repo;
pub mod xdiff;
