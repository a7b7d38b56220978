//! Finite-automaton regular expressions.
//!
//! A pattern parses into a [`Regex`] syntax tree, translates into a
//! (generally nondeterministic) [`Automaton`], is determinized by subset
//! construction and minimized with Hopcroft's algorithm, and compiles into
//! a flat-table [`RunAutomaton`] that runs in time linear in the input.
//!
//! ```
//! use resfa::{Regex, RunAutomaton};
//!
//! let mut a = "ab(c|d)*".parse::<Regex>().unwrap().to_automaton().unwrap();
//! let run = RunAutomaton::new(&mut a, false);
//! assert!(run.run("abcdcd"));
//!
//! let mut m = run.matcher("xx abcc abd");
//! assert!(m.find());
//! assert_eq!(m.group().unwrap(), "abcc");
//! ```

pub use crate::automaton::{Automaton, CodePoint, State, StateId, Transition};
pub use crate::error::Error;
pub use crate::regex::Regex;
pub use crate::run::{Matcher, RunAutomaton};

/// The regular expression syntax tree, parser, printer and translation.
pub mod regex;
/// Automaton representation and structural operations.
pub mod automaton;
/// Subset-construction determinization, totalization and minimization.
pub mod dfa;
/// Content-keyed state sets memoizing the subset construction.
pub mod state_set;
/// Slab-backed linked lists with O(1) removal, for partition refinement.
pub mod state_list;
/// Compiled transition tables and the leftmost-longest matcher.
pub mod run;
/// Error types.
pub mod error;

#[cfg(test)] mod tests;
