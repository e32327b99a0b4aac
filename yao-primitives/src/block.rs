// -*- mode: rust; -*-
//
// This file is part of `yao-primitives`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Defines a block as a 128-bit value, and implements block-related functions.

use bytemuck::{Pod, Zeroable};
use subtle::{Choice, ConditionallySelectable};

/// A 128-bit chunk.
///
/// Byte `0` of the little-endian encoding holds the least significant bit,
/// which doubles as the permute bit of a wire label.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct Block(pub u128);

impl Block {
    /// The all-zero block.
    pub const ZERO: Block = Block(0);

    /// Return the least significant bit.
    #[inline]
    pub fn lsb(&self) -> bool {
        self.0 & 1 == 1
    }

    /// Set the least significant bit.
    #[inline]
    pub fn set_lsb(&self) -> Block {
        Block(self.0 | 1)
    }

    /// Flip all bits.
    #[inline]
    pub fn flip(&self) -> Self {
        Block(!self.0)
    }

    /// Return `self` if `bit` is set and the zero block otherwise, in constant
    /// time.
    #[inline]
    pub fn and_bit(&self, bit: bool) -> Block {
        Block::conditional_select(&Block::ZERO, self, Choice::from(bit as u8))
    }

    /// Try to create a `Block` from a slice of bytes. The slice must have exactly 16 bytes.
    #[inline]
    pub fn try_from_slice(bytes_slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 16] = bytes_slice.try_into().ok()?;
        Some(Block::from(bytes))
    }
}

impl AsRef<[u8]> for Block {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl AsMut<[u8]> for Block {
    #[inline]
    fn as_mut(&mut self) -> &mut [u8] {
        bytemuck::bytes_of_mut(self)
    }
}

impl std::ops::BitAnd for Block {
    type Output = Block;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Block(self.0 & rhs.0)
    }
}

impl std::ops::BitXor for Block {
    type Output = Block;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        Block(self.0 ^ rhs.0)
    }
}

impl std::ops::BitXorAssign for Block {
    #[inline]
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl ConditionallySelectable for Block {
    #[inline]
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Block(u128::conditional_select(&a.0, &b.0, choice))
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let block: [u8; 16] = (*self).into();
        for byte in block.iter() {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl rand::distributions::Distribution<Block> for rand::distributions::Standard {
    #[inline]
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Block {
        Block::from(rng.gen::<u128>())
    }
}

impl From<Block> for u128 {
    #[inline]
    fn from(m: Block) -> u128 {
        m.0
    }
}

impl From<u128> for Block {
    #[inline]
    fn from(m: u128) -> Self {
        Block(m)
    }
}

impl From<Block> for [u8; 16] {
    #[inline]
    fn from(m: Block) -> [u8; 16] {
        m.0.to_le_bytes()
    }
}

impl From<[u8; 16]> for Block {
    #[inline]
    fn from(m: [u8; 16]) -> Self {
        Block(u128::from_le_bytes(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and() {
        let x = rand::random::<Block>();
        let y = x & Block::from([0u8; 16]);
        assert_eq!(y, Block::ZERO);
    }

    #[test]
    fn test_lsb() {
        let x = rand::random::<Block>();
        let x = x.set_lsb();
        assert!(x.lsb());
        assert!(!Block::from(2).lsb());
        assert_eq!(Block::from([1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]), Block(1));
    }

    #[test]
    fn test_and_bit() {
        let x = rand::random::<Block>();
        assert_eq!(x.and_bit(true), x);
        assert_eq!(x.and_bit(false), Block::ZERO);
    }

    #[test]
    fn test_byte_roundtrip_is_little_endian() {
        let x = Block::from(0x0102);
        let bytes: [u8; 16] = x.into();
        assert_eq!(&bytes[..2], &[0x02, 0x01]);
        assert_eq!(x.as_ref(), &bytes[..]);
        assert_eq!(Block::try_from_slice(&bytes), Some(x));
        assert_eq!(Block::try_from_slice(&bytes[1..]), None);
    }

    #[test]
    fn test_display_hex() {
        let x = Block::from([0xAB; 16]);
        assert_eq!(format!("{}", x), "AB".repeat(16));
    }
}
