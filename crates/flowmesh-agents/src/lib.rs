//! # Flowmesh Agents
//!
//! Arithmetic agents for Flowmesh graphs:
//!
//! | Kind | Inputs | Publishes |
//! |---|---|---|
//! | `IncAgent` | 1 | `x + 1` on every value |
//! | `DecAgent` | 1 | `x - 1` on every value |
//! | `PlusAgent` | 2 | `a + b` per completed round |
//! | `MulAgent` | 2 | `a * b` per completed round |
//! | `DivAgent` | 2 | `a / b` per completed round, fails on a zero operand |
//!
//! [`builtin_factory`] returns a factory that builds all of them by kind name.

pub mod binary;
pub mod builtin;
pub mod naming;
pub mod unary;

#[cfg(test)]
mod test_support;

pub use binary::{BinOpAgent, CheckedOp, DIV_KIND, MUL_KIND, PLUS_KIND, RoundState};
pub use builtin::{builtin_factory, register_builtins};
pub use unary::{DEC_KIND, INC_KIND, UnaryAgent};
