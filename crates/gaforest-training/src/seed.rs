//! Reproducible randomness for training runs.
//!
//! A run is identified by a 128-bit [`RunSeed`]. The seed initializes one master generator,
//! and every stage and operator call forks its own child generator from that master
//! [`SeedStream`]. Given the same seed, parameters and data, a sequential run reproduces the
//! same ensembles.

use std::{fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seed of a training run, written as a 32-digit hexadecimal string.
///
/// # Examples
///
/// ```
/// use gaforest_training::seed::RunSeed;
///
/// let seed: RunSeed = "000102030405060708090a0b0c0d0e0f".parse().unwrap();
/// assert_eq!(seed.to_string(), "000102030405060708090a0b0c0d0e0f");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunSeed([u8; 16]);

/// Substream id of the noise drawn when augmenting the sample pool.
pub const AUGMENT_STREAM: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseSeedError {
    #[display("invalid seed: expected 32 hex characters, got {len}")]
    Length { len: usize },
    #[display("invalid seed: {value} is not hexadecimal")]
    NotHex { value: String },
}

impl RunSeed {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// Creates the master generator of a run.
    #[must_use]
    pub fn stream(self) -> SeedStream {
        SeedStream {
            master: Pcg32::from_seed(self.0),
        }
    }

    /// Creates a master generator on PCG stream `id`, disjoint from [`stream`](Self::stream)
    /// for any nonzero `id`.
    ///
    /// Randomness consumed before training (such as augmentation noise) draws from its own
    /// substream so that it does not replay the trainer's forks.
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn substream(self, id: u64) -> SeedStream {
        let value = u128::from_le_bytes(self.0);
        let state = value as u64;
        let increment = (value >> 64) as u64;
        SeedStream {
            master: Pcg32::new(state, (increment >> 1) ^ id),
        }
    }
}

impl fmt::Display for RunSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for RunSeed {
    type Err = ParseSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(ParseSeedError::Length { len: s.len() });
        }
        let num = u128::from_str_radix(s, 16).map_err(|_| ParseSeedError::NotHex {
            value: s.to_owned(),
        })?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for RunSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RunSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random seeds with `rng.random()`.
impl Distribution<RunSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> RunSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        RunSeed(seed)
    }
}

/// Master generator handing out independent child generators.
#[derive(Debug, Clone)]
pub struct SeedStream {
    master: Pcg32,
}

impl SeedStream {
    /// Derives a new generator from the master stream.
    pub fn fork(&mut self) -> Pcg32 {
        Pcg32::from_rng(&mut self.master)
    }
}
