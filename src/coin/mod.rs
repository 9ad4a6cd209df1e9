//! # Coin Records
//!
//! The catalogue entity served by the API and guarded by optimistic
//! concurrency. A coin is created by the store (which assigns `id`,
//! `created_at` and `version = 1`), mutated only as a whole through a
//! version-checked update, and hard-deleted.

pub mod model;
pub mod runtime;
pub mod validator;

pub use model::{Coin, CoinDraft, CoinPatch, NewCoin};
pub use runtime::{Runtime, RuntimeFormatError};
pub use validator::{validate_coin, validate_draft, Validator};
