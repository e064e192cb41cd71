//! # SCRU128: Sortable, Clock and Random number-based Unique identifier
//!
//! SCRU128 ID is a decentralized, globally unique, time-ordered 128-bit identifier for the users
//! who need sortable surrogate keys without a central allocator.
//!
//! ```rust
//! use scru128::{scru128, scru128_string};
//!
//! // generate a new identifier object
//! let x = scru128();
//! println!("{}", x); // e.g., "036z951mhjikzik2gsl81gr7l"
//! println!("{}", x.to_u128()); // as a 128-bit unsigned integer
//!
//! // generate a textual representation directly
//! println!("{}", scru128_string()); // e.g., "036z951mhzx67t63mq9xe6q0j"
//! ```
//!
//! # Field and bit layout
//!
//! A SCRU128 ID is a 128-bit unsigned integer consisting of four fields, packed in big-endian
//! order:
//!
//! | Field        | Bits | Description                                       |
//! | ------------ | ---- | ------------------------------------------------- |
//! | `timestamp`  | 48   | Unix timestamp in milliseconds                    |
//! | `counter_hi` | 24   | Randomly initialized at most once a second        |
//! | `counter_lo` | 24   | Randomly initialized whenever `timestamp` changes |
//! | `entropy`    | 32   | Random number generated for each ID               |
//!
//! The canonical text form is the 25-digit Base36 (`0-9a-z`) representation of the 128-bit
//! integer, left-padded with `0`. Because the digits are ordered consistently with their values
//! and the length is fixed, the byte-wise, numeric, and textual orderings of IDs are identical.
//!
//! `counter_lo` is incremented by one for each new ID generated within the same `timestamp`, and
//! `counter_hi` is incremented when `counter_lo` overflows. In the very rare circumstances where
//! both counters reach their maximum values, the generator increments `timestamp`; therefore, the
//! `timestamp` may have a larger value than that of the real-time clock. The generator goes on
//! with such larger `timestamp` values caused by counter overflows and system clock rollbacks as
//! long as the difference from the system clock is small enough. If the system clock moves back
//! more than ten seconds, the default generator resets its state and thus breaks the monotonic
//! order of generated identifiers.
//!
//! # Crate features
//!
//! Default features:
//!
//! - `global_gen`: enables the process-wide global generator behind [`scru128()`] and
//!   [`scru128_string()`].
//!
//! Optional features:
//!
//! - `default_rng`: enables [`DefaultRng`], the buffered cryptographically strong random number
//!   generator used by the global generator.
//! - `serde`: enables serialization and deserialization of [`Scru128Id`] via serde.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod id;
pub use id::{ParseError, Scru128Id, MAX_COUNTER_HI, MAX_COUNTER_LO, MAX_TIMESTAMP};

pub mod generator;
pub use generator::{
    GenerateError, GeneratorStatus, RandSource, RandSourceError, Scru128Generator,
    DEFAULT_ROLLBACK_ALLOWANCE,
};

#[cfg(feature = "default_rng")]
pub use generator::default_rng::DefaultRng;

mod global_gen;
#[cfg(feature = "global_gen")]
pub use global_gen::{scru128, scru128_string};
