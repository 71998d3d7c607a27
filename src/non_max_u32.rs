//! [`NonMaxU32`], the index type behind [`Handle`].
//!
//! An `Option<Handle<T>>` should stay as small as a bare handle, so the index
//! gives up one value to serve as the niche. Giving up [`u32::MAX`] rather than
//! zero keeps index zero usable, which matters since expression arenas are
//! almost always indexed from their start.
//!
//! [`Handle`]: crate::arena::Handle

use std::num::NonZeroU32;

/// An unsigned 32-bit value known not to be [`u32::MAX`].
///
/// Stored biased by one inside a [`NonZeroU32`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NonMaxU32(NonZeroU32);

impl NonMaxU32 {
    /// Construct a [`NonMaxU32`] whose value is `n`, if `n` is not `u32::MAX`.
    pub const fn new(n: u32) -> Option<Self> {
        match NonZeroU32::new(n.wrapping_add(1)) {
            Some(biased) => Some(NonMaxU32(biased)),
            None => None,
        }
    }

    /// Construct a [`NonMaxU32`] from an arena position.
    ///
    /// Returns `None` if `index` does not fit.
    pub fn from_usize(index: usize) -> Option<Self> {
        u32::try_from(index).ok().and_then(Self::new)
    }

    pub const fn get(self) -> u32 {
        self.0.get() - 1
    }

    pub fn checked_add(self, n: u32) -> Option<Self> {
        // `self.0 + n` wraps to zero exactly when `self + n` would be `u32::MAX`.
        Some(NonMaxU32(self.0.checked_add(n)?))
    }
}

impl std::fmt::Debug for NonMaxU32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.get().fmt(f)
    }
}

impl std::fmt::Display for NonMaxU32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.get().fmt(f)
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for NonMaxU32 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.get())
    }
}

#[cfg(feature = "deserialize")]
impl<'de> serde::Deserialize<'de> for NonMaxU32 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let n = <u32 as serde::Deserialize>::deserialize(deserializer)?;
        NonMaxU32::new(n).ok_or_else(|| {
            <D::Error as serde::de::Error>::invalid_value(
                serde::de::Unexpected::Unsigned(n as u64),
                &"an index below 4294967295",
            )
        })
    }
}
