//! Memo table for targets.
//!
//! A [`BuildCache`] remembers the target built for each key, so a target
//! reached through several dependency paths is built once. Each entry is
//! tagged with a fingerprint; looking a key up with a different fingerprint
//! discards the old entry and builds again.
//!
//! The cache is an ordinary value owned by whoever drives the build and passed
//! by reference. It holds targets only for the lifetime of that owner.

use std::collections::HashMap;
use std::hash::Hash as StdHash;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::debug;

use crate::target::Target;
use crate::trace::Hash;

type Slot<T, A> = Arc<OnceLock<Target<T, A>>>;

struct CacheEntry<T, A> {
  fingerprint: Hash,
  slot: Slot<T, A>,
}

/// Targets keyed by `K`, each built at most once per fingerprint.
pub struct BuildCache<K, T, A = ()> {
  entries: Mutex<HashMap<K, CacheEntry<T, A>>>,
}

impl<K, T, A> BuildCache<K, T, A>
where
  K: Eq + StdHash + Clone + std::fmt::Debug,
  T: Clone,
  A: Clone,
{
  pub fn new() -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
    }
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<T, A>>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Return the target cached for `key`, building it with `build` if there is
  /// none or its fingerprint differs.
  ///
  /// Concurrent callers asking for the same key and fingerprint share one
  /// call to `build`. `build` may itself look up other keys; looking up the
  /// key being built from within `build` is a dependency cycle and deadlocks.
  pub fn get_or_build<F>(&self, key: K, fingerprint: Hash, build: F) -> Target<T, A>
  where
    F: FnOnce() -> Target<T, A>,
  {
    let slot = {
      let mut entries = self.entries();
      let fresh = entries
        .get(&key)
        .filter(|entry| entry.fingerprint == fingerprint)
        .map(|entry| entry.slot.clone());

      match fresh {
        Some(slot) => slot,
        None => {
          if entries.contains_key(&key) {
            debug!(key = ?key, fingerprint = %fingerprint, "fingerprint changed, rebuilding");
          }
          let slot: Slot<T, A> = Arc::new(OnceLock::new());
          entries.insert(
            key,
            CacheEntry {
              fingerprint,
              slot: slot.clone(),
            },
          );
          slot
        }
      }
    };

    slot.get_or_init(build).clone()
  }

  /// The cached target for `key`, if it has been built.
  pub fn get(&self, key: &K) -> Option<Target<T, A>> {
    self.entries().get(key).and_then(|entry| entry.slot.get().cloned())
  }

  /// Drop the entry for `key`. Returns true if there was one.
  pub fn invalidate(&self, key: &K) -> bool {
    self.entries().remove(key).is_some()
  }

  pub fn clear(&self) {
    self.entries().clear();
  }

  pub fn len(&self) -> usize {
    self.entries().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries().is_empty()
  }
}

impl<K, T, A> Default for BuildCache<K, T, A>
where
  K: Eq + StdHash + Clone + std::fmt::Debug,
  T: Clone,
  A: Clone,
{
  fn default() -> Self {
    Self::new()
  }
}
