//! SCRU128 generator and related types.

use parking_lot::Mutex;

use crate::id::{Scru128Id, MAX_COUNTER_HI, MAX_COUNTER_LO, MAX_TIMESTAMP};

#[cfg(feature = "default_rng")]
pub mod default_rng;

pub mod with_rand08;


/// The default amount of timestamp rollback, in milliseconds, that the generator tolerates
/// before treating it as significant.
pub const DEFAULT_ROLLBACK_ALLOWANCE: u64 = 10_000; // 10 seconds

/// A trait that defines the minimum random number generator interface for [`Scru128Generator`].
///
/// The source should be cryptographically strong and securely seeded. It may be backed by I/O
/// and is therefore allowed to fail; the generator propagates failures to its caller.
pub trait RandSource {
    /// Returns the next random `u32`, or an error if the source is unavailable.
    fn try_next_u32(&mut self) -> Result<u32, RandSourceError>;
}

/// Error reported by a [`RandSource`] that could not produce random data.
#[derive(Debug, thiserror::Error)]
#[error("random number generator failed: {0}")]
pub struct RandSourceError(#[source] Box<dyn std::error::Error + Send + Sync + 'static>);

impl RandSourceError {
    /// Wraps an arbitrary error raised by a random source.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self(err.into())
    }
}

/// Error returned by the generator functions that may abort.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The clock moved backward by more than the rollback allowance; the generator state is left
    /// untouched.
    #[error("clock went backward by more than the rollback allowance")]
    ClockRollback,

    /// The random source failed.
    #[error(transparent)]
    RandSource(#[from] RandSourceError),
}

/// Status code reported by [`Scru128Generator::last_status()`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum GeneratorStatus {
    /// Indicates that the generator has yet to generate an ID.
    #[default]
    NotExecuted,

    /// Indicates that the latest `timestamp` was used because it was greater than the previous
    /// one.
    NewTimestamp,

    /// Indicates that `counter_lo` was incremented because the latest `timestamp` was no greater
    /// than the previous one.
    CounterLoInc,

    /// Indicates that `counter_hi` was incremented because `counter_lo` reached its maximum
    /// value.
    CounterHiInc,

    /// Indicates that the previous `timestamp` was incremented because `counter_hi` reached its
    /// maximum value.
    TimestampInc,

    /// Indicates that the monotonic order of generated IDs was broken because the latest
    /// `timestamp` was less than the previous one by more than the rollback allowance.
    ClockRollback,
}

/// Mutable part of the generator, always updated as one unit.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
struct State<R> {
    timestamp: u64,
    counter_hi: u32,
    counter_lo: u32,

    /// The timestamp at the last renewal of `counter_hi` field.
    ts_counter_hi: u64,

    /// The status code reported at the last generation.
    last_status: GeneratorStatus,

    /// The random number generator used by the generator.
    rng: R,
}

/// Represents a SCRU128 ID generator that encapsulates the monotonic counters and other internal
/// states.
///
/// The generator guarantees the monotonic order of the IDs it produces, even under concurrent
/// callers, by serializing every state transition behind an internal lock. Only the IDs produced
/// by the same generator instance are ordered relative to each other.
///
/// # Examples
///
/// ```rust
/// use scru128::Scru128Generator;
/// use std::thread;
///
/// let g = Scru128Generator::with_rand08(rand::rngs::OsRng);
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = &g;
///         s.spawn(move || {
///             for _ in 0..8 {
///                 println!("{} by thread {}", g.generate().unwrap(), i);
///                 thread::yield_now();
///             }
///         });
///     }
/// });
/// ```
///
/// # Generator functions
///
/// The generator offers the following flavors:
///
/// | Flavor                     | Timestamp | Locking  | On big clock rewind          |
/// | -------------------------- | --------- | -------- | ---------------------------- |
/// | [`generate`]               | Now       | Internal | Resets generator             |
/// | [`generate_or_abort_now`]  | Now       | Internal | Returns `ClockRollback`      |
/// | [`generate_or_reset`]      | Argument  | Internal | Resets generator             |
/// | [`generate_or_abort`]      | Argument  | Internal | Returns `ClockRollback`      |
/// | [`generate_core`]          | Now       | `&mut`   | Resets generator             |
/// | [`generate_or_reset_core`] | Argument  | `&mut`   | Resets generator             |
/// | [`generate_or_abort_core`] | Argument  | `&mut`   | Returns `ClockRollback`      |
///
/// All of them return a monotonically increasing ID by reusing the previous `timestamp` even if
/// the one provided is smaller than the immediately preceding ID's. However, when such a clock
/// rollback is considered significant (by default, more than ten seconds):
///
/// 1.  `reset` flavors reset the generator and return a new ID based on the given `timestamp`,
///     breaking the increasing order of IDs.
/// 2.  `abort` flavors return [`GenerateError::ClockRollback`] and leave the generator state
///     untouched.
///
/// The `core` functions take `&mut self` and therefore skip the internal lock; exclusive access
/// is already proven by the borrow.
///
/// [`generate`]: Scru128Generator::generate
/// [`generate_or_abort_now`]: Scru128Generator::generate_or_abort_now
/// [`generate_or_reset`]: Scru128Generator::generate_or_reset
/// [`generate_or_abort`]: Scru128Generator::generate_or_abort
/// [`generate_core`]: Scru128Generator::generate_core
/// [`generate_or_reset_core`]: Scru128Generator::generate_or_reset_core
/// [`generate_or_abort_core`]: Scru128Generator::generate_or_abort_core
#[derive(Debug, Default)]
pub struct Scru128Generator<R> {
    state: Mutex<State<R>>,
}

impl<R: RandSource> Scru128Generator<R> {
    /// Creates a generator object with a specified random number generator.
    pub fn new(rng: R) -> Self {
        Self {
            state: Mutex::new(State {
                timestamp: 0,
                counter_hi: 0,
                counter_lo: 0,
                ts_counter_hi: 0,
                last_status: GeneratorStatus::NotExecuted,
                rng,
            }),
        }
    }

    /// Generates a new SCRU128 ID object from the current `timestamp`, or resets the generator
    /// upon significant timestamp rollback.
    ///
    /// This method is thread-safe; multiple threads can call it concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error only if the random number generator fails.
    pub fn generate(&self) -> Result<Scru128Id, RandSourceError> {
        self.state
            .lock()
            .generate_or_reset(unix_ts_ms(), DEFAULT_ROLLBACK_ALLOWANCE)
    }

    /// Generates a new SCRU128 ID object from the current `timestamp`, or returns
    /// [`GenerateError::ClockRollback`] upon significant timestamp rollback.
    ///
    /// This method is thread-safe; multiple threads can call it concurrently.
    pub fn generate_or_abort_now(&self) -> Result<Scru128Id, GenerateError> {
        self.state
            .lock()
            .generate_or_abort(unix_ts_ms(), DEFAULT_ROLLBACK_ALLOWANCE)
    }

    /// Generates a new SCRU128 ID object from the `timestamp` passed, or resets the generator
    /// upon significant timestamp rollback.
    ///
    /// This method is thread-safe. The `rollback_allowance` parameter specifies the amount of
    /// `timestamp` rollback that is considered significant. A suggested value is
    /// [`DEFAULT_ROLLBACK_ALLOWANCE`].
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` is not a 48-bit positive integer or `rollback_allowance` is greater
    /// than the maximum 48-bit value.
    pub fn generate_or_reset(
        &self,
        timestamp: u64,
        rollback_allowance: u64,
    ) -> Result<Scru128Id, RandSourceError> {
        self.state
            .lock()
            .generate_or_reset(timestamp, rollback_allowance)
    }

    /// Generates a new SCRU128 ID object from the `timestamp` passed, or returns
    /// [`GenerateError::ClockRollback`] upon significant timestamp rollback.
    ///
    /// This method is thread-safe. See [`Scru128Generator::generate_or_reset`] for the meaning of
    /// `rollback_allowance`.
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` is not a 48-bit positive integer or `rollback_allowance` is greater
    /// than the maximum 48-bit value.
    pub fn generate_or_abort(
        &self,
        timestamp: u64,
        rollback_allowance: u64,
    ) -> Result<Scru128Id, GenerateError> {
        self.state
            .lock()
            .generate_or_abort(timestamp, rollback_allowance)
    }

    /// Generates a new SCRU128 ID object from the current `timestamp` without taking the internal
    /// lock, or resets the generator upon significant timestamp rollback.
    pub fn generate_core(&mut self) -> Result<Scru128Id, RandSourceError> {
        self.state
            .get_mut()
            .generate_or_reset(unix_ts_ms(), DEFAULT_ROLLBACK_ALLOWANCE)
    }

    /// Lock-free counterpart of [`Scru128Generator::generate_or_reset`].
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` is not a 48-bit positive integer or `rollback_allowance` is greater
    /// than the maximum 48-bit value.
    pub fn generate_or_reset_core(
        &mut self,
        timestamp: u64,
        rollback_allowance: u64,
    ) -> Result<Scru128Id, RandSourceError> {
        self.state
            .get_mut()
            .generate_or_reset(timestamp, rollback_allowance)
    }

    /// Lock-free counterpart of [`Scru128Generator::generate_or_abort`].
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` is not a 48-bit positive integer or `rollback_allowance` is greater
    /// than the maximum 48-bit value.
    pub fn generate_or_abort_core(
        &mut self,
        timestamp: u64,
        rollback_allowance: u64,
    ) -> Result<Scru128Id, GenerateError> {
        self.state
            .get_mut()
            .generate_or_abort(timestamp, rollback_allowance)
    }

    /// Returns a [`GeneratorStatus`] code that indicates the internal state involved in the last
    /// successful generation of an ID.
    ///
    /// Note that the generator keeps the status of the last successful call; a call that returns
    /// an error does not update it.
    pub fn last_status(&self) -> GeneratorStatus {
        self.state.lock().last_status
    }
}

impl<R: RandSource> State<R> {
    fn generate_or_reset(
        &mut self,
        timestamp: u64,
        rollback_allowance: u64,
    ) -> Result<Scru128Id, RandSourceError> {
        match self.generate_or_abort(timestamp, rollback_allowance) {
            Ok(value) => Ok(value),
            Err(GenerateError::RandSource(err)) => Err(err),
            Err(GenerateError::ClockRollback) => {
                log::warn!(
                    "clock moved backward from {} to {}; resetting generator state",
                    self.timestamp,
                    timestamp
                );

                // reset state and resume
                self.timestamp = 0;
                self.ts_counter_hi = 0;
                match self.generate_or_abort(timestamp, rollback_allowance) {
                    Ok(value) => {
                        self.last_status = GeneratorStatus::ClockRollback;
                        Ok(value)
                    }
                    Err(GenerateError::RandSource(err)) => Err(err),
                    Err(GenerateError::ClockRollback) => {
                        unreachable!("timestamp must be greater than zero after reset")
                    }
                }
            }
        }
    }

    fn generate_or_abort(
        &mut self,
        timestamp: u64,
        rollback_allowance: u64,
    ) -> Result<Scru128Id, GenerateError> {
        assert!(
            0 < timestamp && timestamp <= MAX_TIMESTAMP,
            "`timestamp` must be a 48-bit positive integer"
        );
        assert!(
            rollback_allowance <= MAX_TIMESTAMP,
            "`rollback_allowance` out of reasonable range"
        );

        let status;
        if timestamp > self.timestamp {
            let counter_lo = self.rng.try_next_u32()? & MAX_COUNTER_LO;
            self.timestamp = timestamp;
            self.counter_lo = counter_lo;
            status = GeneratorStatus::NewTimestamp;
        } else if timestamp + rollback_allowance >= self.timestamp {
            // go on with previous timestamp if new one is not much smaller
            if self.counter_lo < MAX_COUNTER_LO {
                self.counter_lo += 1;
                status = GeneratorStatus::CounterLoInc;
            } else if self.counter_hi < MAX_COUNTER_HI {
                self.counter_lo = 0;
                self.counter_hi += 1;
                status = GeneratorStatus::CounterHiInc;
            } else {
                // increment timestamp at counter overflow
                let counter_lo = self.rng.try_next_u32()? & MAX_COUNTER_LO;
                log::debug!(
                    "counters exhausted at {}; borrowing next millisecond",
                    self.timestamp
                );
                self.timestamp += 1;
                self.counter_hi = 0;
                self.counter_lo = counter_lo;
                status = GeneratorStatus::TimestampInc;
            }
        } else {
            // abort if clock went backwards to unbearable extent
            return Err(GenerateError::ClockRollback);
        }

        if self.ts_counter_hi == 0 || self.timestamp - self.ts_counter_hi >= 1_000 {
            let counter_hi = self.rng.try_next_u32()? & MAX_COUNTER_HI;
            self.ts_counter_hi = self.timestamp;
            self.counter_hi = counter_hi;
        }

        let entropy = self.rng.try_next_u32()?;
        self.last_status = status;
        Ok(Scru128Id::from_fields(
            self.timestamp,
            self.counter_hi,
            self.counter_lo,
            entropy,
        ))
    }
}

#[cfg(feature = "default_rng")]
#[cfg_attr(docsrs, doc(cfg(feature = "default_rng")))]
impl Scru128Generator<default_rng::DefaultRng> {
    /// Creates a generator object with the default random number generator.
    pub fn with_default_rng() -> Self {
        Self::new(Default::default())
    }
}

/// Returns the current Unix time in milliseconds.
fn unix_ts_ms() -> u64 {
    use std::time;
    time::SystemTime::now()
        .duration_since(time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
        .clamp(1, MAX_TIMESTAMP)
}

/// Supports operations as an infinite iterator that produces a new SCRU128 ID object for each
/// call of `next()`.
///
/// The iterator ends only if the random number generator fails.
///
/// # Examples
///
/// ```rust
/// use scru128::Scru128Generator;
///
/// Scru128Generator::with_rand08(rand::thread_rng())
///     .enumerate()
///     .skip(4)
///     .take(4)
///     .for_each(|(i, e)| println!("[{i}] {e}"));
/// ```
impl<R: RandSource> Iterator for Scru128Generator<R> {
    type Item = Scru128Id;

    fn next(&mut self) -> Option<Self::Item> {
        self.generate_core().ok()
    }
}
