#![recursion_limit = "256"]
//! Attentional factorization machines for click-through-rate
//! prediction on burn: heterogeneous field embeddings, pairwise
//! attention pooling, a bilinear residual network, and a
//! trainer with checkpointing.

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ml;

pub use error::{CtrError, CtrResult};
