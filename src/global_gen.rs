//! Default generator and entry point functions.

#![cfg(feature = "global_gen")]
#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

use std::sync;

use crate::Scru128Id;
use inner::GlobalGenInner;

/// Returns the lock handle of process-wide global generator, creating one if none exists.
fn lock_global_gen() -> sync::MutexGuard<'static, GlobalGenInner> {
    static G: sync::OnceLock<sync::Mutex<GlobalGenInner>> = sync::OnceLock::new();
    G.get_or_init(Default::default)
        .lock()
        .unwrap_or_else(sync::PoisonError::into_inner)
}

/// Generates a new SCRU128 ID object using the global generator.
///
/// This function is thread-safe; multiple threads can call it concurrently. It guarantees the
/// process-wide monotonic order of IDs unless the system clock moves back significantly. On Unix,
/// this function resets the generator when the process ID changes (i.e., upon process forks) to
/// prevent collisions across processes.
///
/// # Panics
///
/// Panics if the random number generator fails.
///
/// # Examples
///
/// ```rust
/// let x = scru128::scru128();
/// println!("{}", x); // e.g., "036z951mhjikzik2gsl81gr7l"
/// println!("{}", x.to_u128()); // as a 128-bit unsigned integer
/// ```
pub fn scru128() -> Scru128Id {
    lock_global_gen()
        .get_mut()
        .generate_core()
        .expect("scru128: random number generator failed")
}

/// Generates a new SCRU128 ID encoded in the 25-digit canonical string representation using the
/// global generator.
///
/// Use this to quickly get a new SCRU128 ID as a string.
///
/// # Panics
///
/// Panics if the random number generator fails.
///
/// # Examples
///
/// ```rust
/// let x = scru128::scru128_string();
/// println!("{}", x); // e.g., "036z951mhzx67t63mq9xe6q0j"
/// ```
pub fn scru128_string() -> String {
    scru128().into()
}

mod inner {
    use crate::{DefaultRng, Scru128Generator};

    /// A thin wrapper to reset the state when the process ID changes (i.e., upon Unix forks).
    #[derive(Debug, Default)]
    pub struct GlobalGenInner {
        #[cfg(unix)]
        pid: Option<u32>,
        generator: Scru128Generator<DefaultRng>,
    }

    impl GlobalGenInner {
        /// Returns a mutable reference to the inner [`Scru128Generator`] instance, resetting the
        /// generator state on Unix if the process ID has changed.
        pub fn get_mut(&mut self) -> &mut Scru128Generator<DefaultRng> {
            #[cfg(unix)]
            {
                let pid = std::process::id();
                match self.pid {
                    None => self.pid = Some(pid),
                    Some(last) if last != pid => {
                        log::warn!("process id changed from {last} to {pid}; resetting generator");
                        *self = Self {
                            pid: Some(pid),
                            generator: Default::default(),
                        };
                    }
                    Some(_) => {}
                }
            }
            &mut self.generator
        }
    }
}
