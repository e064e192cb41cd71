//! Default random number generator used by [`Scru128Generator`](super::Scru128Generator).

#![cfg_attr(docsrs, doc(cfg(feature = "default_rng")))]

use rand::rngs::{adapter::ReseedingRng, OsRng};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha12Core;

use super::{RandSource, RandSourceError};

/// Number of bytes generated before the core is reseeded from the operating system.
const RESEED_THRESHOLD: u64 = 1024 * 64;

/// The default random number generator used by [`Scru128Generator`](super::Scru128Generator).
///
/// Reading the operating system's entropy source for every four bytes is slow on some platforms,
/// so this generator buffers a [`ChaCha12Core`] block stream seeded from [`OsRng`] and
/// periodically reseeds it, emulating the strategy used by [`rand::rngs::ThreadRng`].
#[derive(Clone, Debug)]
pub struct DefaultRng(ReseedingRng<ChaCha12Core, OsRng>);

impl DefaultRng {
    /// Creates a generator seeded from the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system's entropy source is unavailable.
    pub fn try_new() -> Result<Self, RandSourceError> {
        let core = ChaCha12Core::from_rng(OsRng).map_err(RandSourceError::new)?;
        Ok(Self(ReseedingRng::new(core, RESEED_THRESHOLD, OsRng)))
    }
}

impl Default for DefaultRng {
    /// Creates a generator seeded from the operating system.
    ///
    /// # Panics
    ///
    /// Panics if the operating system's entropy source is unavailable.
    fn default() -> Self {
        Self(ReseedingRng::new(
            ChaCha12Core::from_entropy(),
            RESEED_THRESHOLD,
            OsRng,
        ))
    }
}

impl RandSource for DefaultRng {
    fn try_next_u32(&mut self) -> Result<u32, RandSourceError> {
        let mut buffer = [0u8; 4];
        self.0
            .try_fill_bytes(&mut buffer)
            .map_err(RandSourceError::new)?;
        Ok(u32::from_le_bytes(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::DefaultRng;
    use crate::RandSource;

    /// Sets random bits at ~50% probability
    #[test]
    fn sets_random_bits_at_50_percent_probability() {
        const N_SAMPLES: usize = 10_000;
        let mut rng = DefaultRng::try_new().unwrap();
        let mut bins = [0u32; 32];
        for _ in 0..N_SAMPLES {
            let mut num = rng.try_next_u32().unwrap();
            for e in bins.iter_mut() {
                *e += num & 1;
                num >>= 1;
            }
        }

        // set margin based on binom dist 99.999% confidence interval
        let margin = 4.417173 * (0.5 * 0.5 / N_SAMPLES as f64).sqrt();
        for (i, e) in bins.iter().enumerate() {
            let p = *e as f64 / N_SAMPLES as f64;
            assert!((p - 0.5).abs() < margin, "random bit {i}: {p}");
        }
    }
}
