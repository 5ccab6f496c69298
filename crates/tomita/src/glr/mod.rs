//! # GLR Engine
//!
//! Tomita-style generalized LR parsing over precompiled tables.
//!
//! ## Overview
//!
//! All live interpretations of the input share one graph-structured stack
//! ([`stack`]). Semantic values hang off its links as a lazily evaluated
//! action forest ([`forest`]). The driver ([`Parser`]) alternates between:
//!
//! 1. a deterministic fast path, used while one state is active and the
//!    next reduction lies on an unbranched chain
//! 2. a full GLR round: ordered reductions, merge-policy pruning, accepts
//!    and parallel shifts
//! 3. minimum-edit-distance error repair when no state can shift
//!
//! ## Ambiguity
//!
//! Two derivations of the same span between the same two stack nodes share a
//! single link and are chained in the forest. Rules may declare a merge policy
//! against a sibling rule; violated policies prune nodes at the end of a
//! round. Whatever survives to acceptance is expanded, wherever in the
//! forest the chains occur, and returned as [`Accepted::Ambiguous`] together
//! with a warning that carries the number of derivations.

mod config;
pub mod disambiguation;
pub mod distance;
mod fast_path;
pub mod forest;
mod parser;
pub mod queue;
mod recovery;
pub mod simulate;
pub mod stack;
mod step;

pub use config::ParserConfig;
pub use forest::{Action, ActionId, Derivations, Evaluation, Forest, SemanticActions};
pub use parser::{Accepted, ParseMetrics, Parsed, Parser};
pub use stack::{Frontier, Gss, Link, LinkId, Node, NodeId, Path};
