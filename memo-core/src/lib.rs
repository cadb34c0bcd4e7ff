#![warn(missing_docs)]
//! # memo-core
//!
//! Core traits for the `memo` concurrent memoizing cache.
//!
//! This crate holds the abstractions shared by every memoization strategy in
//! the `memo` crate, so that callers and test drivers can be written once
//! against a trait instead of a concrete cache:
//!
//! - **Compute** values for keys ([`Compute`]), the expensive and possibly
//!   failing function being memoized
//! - **Fetch** memoized values ([`Memoize`]), the caller-facing contract
//! - **Bound** key and value types ([`MemoKey`], [`MemoValue`])
//!

/// The memoized computation.
///
/// Provides [`Compute`](compute::Compute), implemented by any async closure
/// returning a `Result`.
pub mod compute;

/// Caller-facing memoization contract.
///
/// Provides [`Memoize`](memoize::Memoize) and the bounds placed on keys and
/// values.
pub mod memoize;

pub use compute::Compute;
pub use memoize::{MemoKey, MemoValue, Memoize};
