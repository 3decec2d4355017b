use std::{collections::VecDeque, fmt::Write as _, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{InvalidPieceChar, PieceKind};

/// Supplies the pieces of a game, one at a time.
///
/// Returning `None` means the supply is exhausted and the game ends.
pub trait PieceSource {
    fn next_piece(&mut self) -> Option<PieceKind>;
}

impl<S> PieceSource for &mut S
where
    S: PieceSource + ?Sized,
{
    fn next_piece(&mut self) -> Option<PieceKind> {
        (**self).next_piece()
    }
}

/// Endless piece supply using the 7-bag randomization algorithm.
///
/// Every consecutive group of 7 pieces contains each piece kind exactly once, in a
/// shuffled order. The bag is refilled with a freshly shuffled set whenever 7 or fewer
/// pieces remain, so at least 7 pieces can always be previewed.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
///
/// use tetro_engine::{PieceBag, PieceSeed, PieceSource as _};
///
/// let mut bag = PieceBag::with_seed(PieceSeed::from_u64(7));
/// let first_bag: HashSet<_> = (0..7).map(|_| bag.next_piece().unwrap()).collect();
/// assert_eq!(first_bag.len(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct PieceBag {
    rng: Pcg32,
    bag: VecDeque<PieceKind>,
}

impl PieceBag {
    /// Creates a bag whose sequence is fully determined by `seed`.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        let rng = Pcg32::from_seed(seed.0);
        let bag = VecDeque::with_capacity(PieceKind::LEN * 2);
        let mut this = Self { rng, bag };
        this.fill_bag();
        this
    }

    fn fill_bag(&mut self) {
        while self.bag.len() <= PieceKind::LEN {
            let mut new_bag = PieceKind::ALL;
            new_bag.shuffle(&mut self.rng);
            self.bag.extend(new_bag);
        }
    }

    /// Returns an iterator over the upcoming pieces, next piece first.
    pub fn upcoming(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.bag.iter().copied()
    }
}

impl PieceSource for PieceBag {
    fn next_piece(&mut self) -> Option<PieceKind> {
        self.fill_bag();
        self.bag.pop_front()
    }
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed for the [`PieceBag`] random number generator; the same seed always yields
/// the same piece sequence. Serialized as a 32-character hex string.
///
/// ```
/// use rand::{Rng as _, SeedableRng as _};
/// use rand_pcg::Pcg32;
/// use tetro_engine::PieceSeed;
///
/// let mut rng = Pcg32::seed_from_u64(1);
/// let seed: PieceSeed = rng.random();
/// let json = serde_json::to_string(&seed).unwrap();
/// assert_eq!(json.len(), 32 + 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    /// Widens a small integer seed, as given on a command line.
    #[must_use]
    pub fn from_u64(seed: u64) -> Self {
        Self(u128::from(seed).to_be_bytes())
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{num:032x}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex: {hex_str} ({e})")))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

/// A fixed, finite piece order.
///
/// Parsed from a string of piece letters (`"IOTSZJL"`); whitespace is ignored.
///
/// ```
/// use tetro_engine::{PieceKind, PieceSequence, PieceSource as _};
///
/// let mut pieces: PieceSequence = "IO T".parse().unwrap();
/// assert_eq!(pieces.next_piece(), Some(PieceKind::I));
/// assert_eq!(pieces.remaining(), 2);
/// assert!("IOX".parse::<PieceSequence>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceSequence {
    pieces: Vec<PieceKind>,
    next: usize,
}

impl PieceSequence {
    #[must_use]
    pub fn new(pieces: impl IntoIterator<Item = PieceKind>) -> Self {
        Self {
            pieces: pieces.into_iter().collect(),
            next: 0,
        }
    }

    /// Number of pieces not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pieces.len() - self.next
    }
}

impl FromStr for PieceSequence {
    type Err = InvalidPieceChar;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pieces = s
            .chars()
            .enumerate()
            .filter(|(_, c)| !c.is_whitespace())
            .map(|(position, c)| {
                PieceKind::from_char(c).ok_or(InvalidPieceChar { found: c, position })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(pieces))
    }
}

impl PieceSource for PieceSequence {
    fn next_piece(&mut self) -> Option<PieceKind> {
        let piece = self.pieces.get(self.next).copied()?;
        self.next += 1;
        Some(piece)
    }
}
