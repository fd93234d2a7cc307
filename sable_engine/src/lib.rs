//! The search, evaluation and UCI layer of the Sable chess engine.
//!
//! This crate drives the [`sable`] board library with an iterative
//! deepening, lazy-SMP principal variation search, a hand-crafted tapered
//! evaluation, and a lock-free shared transposition table.

#[macro_use]
extern crate lazy_static;

pub mod consts;
pub mod eval;
pub mod eval_cache;
pub mod movepick;
pub mod search;
pub mod tables;
pub mod tablebases;
pub mod threads;
pub mod time;
pub mod tt;
pub mod uci;
