//! Fixed-key AES random number generator.

use crate::{aes::ctr::ctr_stream_blocks, Aes128, Block};
use rand::{CryptoRng, Error, Rng, RngCore, SeedableRng};
use rand_core::block::{BlockRng64, BlockRngCore};

// Blocks produced per refill of the buffered RNG.
const BLOCK_COUNT: usize = 8;

/// Implementation of a random number generator based on AES in counter
/// mode, with the counter always starting at zero.
#[derive(Clone, Debug)]
pub struct AesRng(BlockRng64<AesRngCore>);

impl RngCore for AesRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }
    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }
    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }
    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.0.try_fill_bytes(dest)
    }
}

impl SeedableRng for AesRng {
    type Seed = <AesRngCore as SeedableRng>::Seed;

    #[inline]
    fn from_seed(seed: Self::Seed) -> Self {
        AesRng(BlockRng64::<AesRngCore>::from_seed(seed))
    }
    #[inline]
    fn from_rng<R: RngCore>(rng: R) -> Result<Self, Error> {
        BlockRng64::<AesRngCore>::from_rng(rng).map(AesRng)
    }
}

impl CryptoRng for AesRng {}

impl AesRng {
    /// Create a new random number generator using a random seed from
    /// `rand::random`.
    #[inline]
    pub fn new() -> Self {
        let seed = rand::random::<Block>();
        AesRng::from_seed(seed)
    }

    /// Create a new RNG using a random seed from this one.
    #[inline]
    pub fn fork(&mut self) -> Self {
        let seed = self.gen::<Block>();
        AesRng::from_seed(seed)
    }

    /// Fill `out` with random blocks.
    pub fn fill_blocks(&mut self, out: &mut [Block]) {
        for block in out.iter_mut() {
            *block = self.gen();
        }
    }
}

impl Default for AesRng {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// The core of `AesRng`, used with `BlockRng`.
#[derive(Clone, Debug)]
pub struct AesRngCore {
    aes: Aes128,
    counter: u64,
}

impl BlockRngCore for AesRngCore {
    type Item = u64;
    type Results = [u64; BLOCK_COUNT * 2];

    // Compute `E(state)` eight times, where `state` is a counter.
    #[inline]
    fn generate(&mut self, results: &mut Self::Results) {
        let mut blocks = [Block::ZERO; BLOCK_COUNT];
        ctr_stream_blocks(&self.aes, &mut self.counter, &mut blocks);
        *results = bytemuck::cast(blocks);
    }
}

impl SeedableRng for AesRngCore {
    type Seed = Block;

    #[inline]
    fn from_seed(seed: Self::Seed) -> Self {
        AesRngCore {
            aes: Aes128::new(seed),
            counter: 0,
        }
    }
}

impl CryptoRng for AesRngCore {}

impl From<AesRngCore> for AesRng {
    #[inline]
    fn from(core: AesRngCore) -> Self {
        AesRng(BlockRng64::new(core))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate() {
        let mut rng = AesRng::new();
        let a = rng.gen::<[Block; 8]>();
        let b = rng.gen::<[Block; 8]>();
        assert_ne!(a, b);
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let seed = rand::random::<Block>();
        let mut x = AesRng::from_seed(seed);
        let mut y = AesRng::from_seed(seed);
        let mut a = [Block::ZERO; 5];
        let mut b = [Block::ZERO; 5];
        x.fill_blocks(&mut a);
        y.fill_blocks(&mut b);
        assert_eq!(a, b);
        assert_ne!(x.fork().gen::<Block>(), x.gen::<Block>());
    }

    #[test]
    fn test_output_is_the_ctr_keystream() {
        let seed = rand::random::<Block>();
        let mut rng = AesRng::from_seed(seed);
        let mut counter = 0;
        let mut expected = [Block::ZERO; 2];
        ctr_stream_blocks(&Aes128::new(seed), &mut counter, &mut expected);
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        assert_eq!(&bytes[..], bytemuck::cast_slice::<Block, u8>(&expected));
    }
}
