// -*- mode: rust; -*-
//
// This file is part of `yao-primitives`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use crate::Block;
use ::aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use lazy_static::lazy_static;

/// Size of an AES block in bytes.
pub const AES_BLOCK_SIZE: usize = 16;
/// Size of an AES-128 key in bytes.
pub const AES_KEY_SIZE: usize = 16;
/// Size of the expanded AES-128 key schedule (11 round keys) in bytes.
pub const AES_ROUND_KEYS_SIZE: usize = 176;

// Number of blocks handed to the backend at once.
const PAR_BLOCKS: usize = 8;

const RCON: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1B, 0x36];

#[rustfmt::skip]
const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

/// Expand a 128-bit key into the AES-128 round-key schedule (FIPS-197, §5.2).
pub fn key_expansion(key: &[u8; AES_KEY_SIZE]) -> [u8; AES_ROUND_KEYS_SIZE] {
    let mut w = [0u8; AES_ROUND_KEYS_SIZE];
    w[..AES_KEY_SIZE].copy_from_slice(key);
    for i in 4..AES_ROUND_KEYS_SIZE / 4 {
        let mut temp = [0u8; 4];
        temp.copy_from_slice(&w[4 * (i - 1)..4 * i]);
        if i % 4 == 0 {
            temp.rotate_left(1);
            for byte in temp.iter_mut() {
                *byte = SBOX[*byte as usize];
            }
            temp[0] ^= RCON[i / 4 - 1];
        }
        for j in 0..4 {
            w[4 * i + j] = w[4 * (i - 4) + j] ^ temp[j];
        }
    }
    w
}

/// AES-128, encryption only.
#[derive(Clone)]
pub struct Aes128 {
    key: [u8; AES_KEY_SIZE],
    cipher: ::aes::Aes128,
}

impl Aes128 {
    /// Create a new `Aes128` object, using `key` as the AES key.
    #[inline]
    pub fn new(key: Block) -> Self {
        let key: [u8; AES_KEY_SIZE] = key.into();
        let cipher = ::aes::Aes128::new(GenericArray::from_slice(&key));
        Aes128 { key, cipher }
    }

    /// The expanded key schedule of this cipher.
    pub fn round_keys(&self) -> [u8; AES_ROUND_KEYS_SIZE] {
        key_expansion(&self.key)
    }

    /// Encrypt a block, outputting the ciphertext.
    #[inline]
    pub fn encrypt(&self, m: Block) -> Block {
        let mut block = GenericArray::from(<[u8; AES_BLOCK_SIZE]>::from(m));
        self.cipher.encrypt_block(&mut block);
        to_block(&block)
    }

    /// Encrypt four blocks at a time, outputting the ciphertexts.
    #[inline]
    pub fn encrypt4(&self, mut blocks: [Block; 4]) -> [Block; 4] {
        self.encrypt_blocks(&mut blocks);
        blocks
    }

    /// Encrypt eight blocks at a time, outputting the ciphertexts.
    #[inline]
    pub fn encrypt8(&self, mut blocks: [Block; 8]) -> [Block; 8] {
        self.encrypt_blocks(&mut blocks);
        blocks
    }

    /// Encrypt `blocks` in place.
    pub fn encrypt_blocks(&self, blocks: &mut [Block]) {
        let mut buf: [::aes::Block; PAR_BLOCKS] = Default::default();
        for chunk in blocks.chunks_mut(PAR_BLOCKS) {
            for (b, m) in buf.iter_mut().zip(chunk.iter()) {
                *b = GenericArray::from(<[u8; AES_BLOCK_SIZE]>::from(*m));
            }
            self.cipher.encrypt_blocks(&mut buf[..chunk.len()]);
            for (m, b) in chunk.iter_mut().zip(buf.iter()) {
                *m = to_block(b);
            }
        }
    }
}

impl std::fmt::Debug for Aes128 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Aes128").finish_non_exhaustive()
    }
}

#[inline]
fn to_block(b: &::aes::Block) -> Block {
    let mut bytes = [0u8; AES_BLOCK_SIZE];
    bytes.copy_from_slice(b.as_slice());
    Block::from(bytes)
}

lazy_static! {
    /// Fixed-key AES-128.
    pub static ref FIXED_KEY_AES128: Aes128 = Aes128::new(Block::from(0x15B5_32C2_F193_1C94));
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIPS_197_KEY: [u8; 16] = [
        0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f,
        0x3c,
    ];

    #[test]
    fn test_aes_128() {
        let key = Block::from(0x3C4FCF098815F7ABA6D2AE2816157E2B);
        let pt = Block::from(0x2A179373117E3DE9969F402EE2BEC16B);
        let cipher = Aes128::new(key);
        let ct = cipher.encrypt(pt);
        assert_eq!(ct, Block::from(0x97EF6624F3CA9EA860367A0DB47BD73A));
    }

    #[test]
    fn test_key_expansion_fips_197() {
        let expected = hex::decode(concat!(
            "2b7e151628aed2a6abf7158809cf4f3c",
            "a0fafe1788542cb123a339392a6c7605",
            "f2c295f27a96b9435935807a7359f67f",
            "3d80477d4716fe3e1e237e446d7a883b",
            "ef44a541a8525b7fb671253bdb0bad00",
            "d4d1c6f87c839d87caf2b8bc11f915bc",
            "6d88a37a110b3efddbf98641ca0093fd",
            "4e54f70e5f5fc9f384a64fb24ea6dc4f",
            "ead27321b58dbad2312bf5607f8d292f",
            "ac7766f319fadc2128d12941575c006e",
            "d014f9a8c9ee2589e13f0cc8b6630ca6",
        ))
        .unwrap();
        let round_keys = key_expansion(&FIPS_197_KEY);
        assert_eq!(&round_keys[..], &expected[..]);
        assert_eq!(round_keys, key_expansion(&FIPS_197_KEY));
        assert_eq!(Aes128::new(Block::from(FIPS_197_KEY)).round_keys(), round_keys);
    }

    #[test]
    fn test_batch_matches_single() {
        let aes = Aes128::new(rand::random::<Block>());
        let blocks = rand::random::<[Block; 8]>();
        let mut many: Vec<Block> = blocks.iter().chain(blocks[..3].iter()).copied().collect();
        aes.encrypt_blocks(&mut many);
        for (m, c) in blocks.iter().chain(blocks[..3].iter()).zip(many.iter()) {
            assert_eq!(aes.encrypt(*m), *c);
        }
        assert_eq!(aes.encrypt8(blocks)[..], many[..8]);
        let four = [blocks[0], blocks[1], blocks[2], blocks[3]];
        assert_eq!(aes.encrypt4(four)[..], many[..4]);
    }
}
