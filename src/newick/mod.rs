//! Newick format writer for simulated trees.
//!
//! # Format
//! The Newick format has the following simple grammar:
//! * `tree ::= vertex ';'`
//! * `vertex ::= leaf | internal_vertex`
//! * `internal_vertex ::= '(' vertex ',' vertex ')' [branch_length]`
//! * `leaf ::= label [branch_length]`
//! * `branch_length ::= ':' number`
//!
//! Trees compiled from a lineage history carry the stem length on their
//! root, so the string ends in e.g. `):0.0;`.

mod escape;
mod writer;

pub use self::escape::escape_label;
pub use self::writer::{NewickStyle, to_newick};
