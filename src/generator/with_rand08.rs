//! Integration with `rand` (v0.8) crate.

use super::{RandSource, RandSourceError, Scru128Generator};
use rand::RngCore;

/// An adapter that implements [`RandSource`] for [`RngCore`] types.
///
/// Random values are drawn through [`RngCore::try_fill_bytes`] so that a failing source (e.g.,
/// [`rand::rngs::OsRng`] without available entropy) is reported rather than causing a panic.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Adapter<T>(/** The wrapped [`RngCore`] type. */ pub T);

impl<T: RngCore> RandSource for Adapter<T> {
    fn try_next_u32(&mut self) -> Result<u32, RandSourceError> {
        let mut buffer = [0u8; 4];
        self.0
            .try_fill_bytes(&mut buffer)
            .map_err(RandSourceError::new)?;
        Ok(u32::from_le_bytes(buffer))
    }
}

impl<T: RngCore> Scru128Generator<Adapter<T>> {
    /// Creates a generator object with a specified random number generator that implements
    /// [`RngCore`] from `rand` (v0.8) crate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scru128::Scru128Generator;
    ///
    /// let g = Scru128Generator::with_rand08(rand::thread_rng());
    /// println!("{}", g.generate()?);
    /// # Ok::<(), scru128::RandSourceError>(())
    /// ```
    pub fn with_rand08(rng: T) -> Self {
        Self::new(Adapter(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::Adapter;
    use crate::RandSource;
    use rand::{rngs::mock::StepRng, Error, RngCore};

    /// Draws little-endian `u32` values from the wrapped generator
    #[test]
    fn draws_u32_values_from_the_wrapped_generator() {
        let mut rng = Adapter(StepRng::new(0x0102_0304, 0));
        assert_eq!(rng.try_next_u32().unwrap(), 0x0102_0304);
    }

    /// Propagates failures of the wrapped generator
    #[test]
    fn propagates_failures_of_the_wrapped_generator() {
        struct Broken;
        impl RngCore for Broken {
            fn next_u32(&mut self) -> u32 {
                unimplemented!()
            }
            fn next_u64(&mut self) -> u64 {
                unimplemented!()
            }
            fn fill_bytes(&mut self, _: &mut [u8]) {
                unimplemented!()
            }
            fn try_fill_bytes(&mut self, _: &mut [u8]) -> Result<(), Error> {
                Err(Error::new("entropy source unavailable"))
            }
        }

        let err = Adapter(Broken).try_next_u32().unwrap_err();
        assert!(err.to_string().contains("entropy source unavailable"));
    }
}
