//! Domain validation errors for synchronized entities.
//!
//! Provider payloads are validated before they reach the cache. Any of these
//! errors rejects the whole merge, so the cache never holds a partial batch.
//!
//! # Examples
//!
//! ```
//! use oddsync::domain::error::DomainError;
//! use oddsync::domain::entity::{Entity, EntityKind, Quote};
//! use oddsync::domain::id::FixtureId;
//!
//! let quote = Quote::new(FixtureId::new("1"), "p0:moneyline", vec![]);
//! let result = Entity::Quote(quote).validate(EntityKind::Quote);
//!
//! assert!(matches!(result, Err(DomainError::EmptySelections { .. })));
//! ```

use thiserror::Error;

use super::entity::EntityKind;

/// Errors that occur when entity invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Entity ids must be non-blank.
    #[error("{kind} entity has an empty id")]
    EmptyId {
        /// Kind of the offending entity.
        kind: EntityKind,
    },

    /// A batch for one kind contained an entity of another kind.
    #[error("expected {expected} entity, got {actual}")]
    KindMismatch {
        /// Kind the batch was submitted for.
        expected: EntityKind,
        /// Kind of the offending entity.
        actual: EntityKind,
    },

    /// Quotes must price at least one selection.
    #[error("quote {id} has no selections")]
    EmptySelections {
        /// Id of the offending quote.
        id: String,
    },

    /// Prices must be strictly positive.
    #[error("quote {id} has non-positive price {price} for {side}")]
    NonPositivePrice {
        /// Id of the offending quote.
        id: String,
        /// Selection side carrying the price.
        side: String,
        /// The invalid price.
        price: rust_decimal::Decimal,
    },
}
