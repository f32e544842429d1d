//! # Funding Engine
//!
//! Pure domain core of the crowdfunding platform. It owns the rules that the
//! rest of the system merely transports:
//!
//! | Concern        | Module                               |
//! |----------------|--------------------------------------|
//! | Domain types   | [`types`]                            |
//! | Money          | [`money`] (exact decimal arithmetic) |
//! | Admission      | [`ledger`] (who may invest, when)    |
//! | State machine  | [`lifecycle`]                        |
//! | Error taxonomy | [`errors`]                           |
//!
//! ## Architecture
//!
//! Everything in this crate is a pure function over [`types`] values — no
//! I/O, no ambient clock (callers pass `now`), no persistence. The `api`
//! service crate layers storage, HTTP, and the payment processor on top and
//! is the only place where these rules meet the outside world.

pub mod errors;
pub mod ledger;
pub mod lifecycle;
pub mod money;
pub mod types;

#[cfg(test)]
mod test_lifecycle;
#[cfg(test)]
mod test_money;

pub use errors::FundingError;
pub use types::{
    Investment, PaymentMethod, PaymentStatus, Principal, Project, ProjectStatus, Role,
};
