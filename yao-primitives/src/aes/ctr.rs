//! AES in counter mode, used as a keystream for masking correlated randomness.
//!
//! Keystream block `i` is `AES_k(counter + i)`, where the counter is encoded
//! as a little-endian `u64` in the low eight bytes of the block and the high
//! eight bytes are zero. Every entry point advances `counter` by the number
//! of blocks it produced, so calls can be chained.

use super::aes128::{Aes128, AES_BLOCK_SIZE};
use crate::Block;

#[inline]
fn counter_block(counter: u64) -> Block {
    Block::from(counter as u128)
}

/// Fill `output` with keystream blocks.
pub fn ctr_stream_blocks(aes: &Aes128, counter: &mut u64, output: &mut [Block]) {
    for block in output.iter_mut() {
        *block = counter_block(*counter);
        *counter = counter.wrapping_add(1);
    }
    aes.encrypt_blocks(output);
}

/// Write `num_blocks` keystream blocks into the byte buffer `output`, which
/// may start at any alignment.
///
/// # Panics
/// Panics if `output` is shorter than `num_blocks * 16` bytes.
pub fn ctr_stream_blocks_unaligned(
    aes: &Aes128,
    counter: &mut u64,
    output: &mut [u8],
    num_blocks: usize,
) {
    assert!(
        output.len() >= num_blocks * AES_BLOCK_SIZE,
        "output buffer holds fewer than {} blocks",
        num_blocks
    );
    let mut blocks = vec![Block::ZERO; num_blocks];
    ctr_stream_blocks(aes, counter, &mut blocks);
    output[..num_blocks * AES_BLOCK_SIZE].copy_from_slice(bytemuck::cast_slice(&blocks));
}

/// Write a single keystream block into the first 16 bytes of `output`.
///
/// # Panics
/// Panics if `output` is shorter than 16 bytes.
pub fn ctr_stream_single_block_unaligned(aes: &Aes128, counter: &mut u64, output: &mut [u8]) {
    let block = aes.encrypt(counter_block(*counter));
    *counter = counter.wrapping_add(1);
    output[..AES_BLOCK_SIZE].copy_from_slice(block.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = [
        0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f,
        0x3c,
    ];

    fn expected_keystream() -> Vec<u8> {
        hex::decode(concat!(
            "7df76b0c1ab899b33e42f047b91b546f",
            "7e59379b5233969d25a5ad2ce335cb3e",
            "1fb0c23bd209ac911ee3ab8a2d85ebcd",
            "c24bfea9b560ce46c787e9ed29e7160f",
            "cda43d7c6c56b627a96930a1f0b9916b",
            "c936b3351ac001f736169eb1a0b202c0",
            "2ef95bd96883ef6682c2de66c7763a24",
            "4c5a8bbf09e3c38c43573d56c33f83a9",
        ))
        .unwrap()
    }

    #[test]
    fn test_ctr_aligned() {
        let aes = Aes128::new(Block::from(KEY));
        let expected = expected_keystream();
        for n in 1..=8 {
            let mut counter = 0;
            let mut blocks = vec![Block::ZERO; n];
            ctr_stream_blocks(&aes, &mut counter, &mut blocks);
            assert_eq!(counter, n as u64);
            let bytes: &[u8] = bytemuck::cast_slice(&blocks);
            assert_eq!(bytes, &expected[..n * 16]);
        }
    }

    #[test]
    fn test_ctr_unaligned() {
        let aes = Aes128::new(Block::from(KEY));
        let expected = expected_keystream();
        for n in 1..=8 {
            let mut counter = 0;
            // Offset by one byte so the output is never 16-byte aligned.
            let mut buf = vec![0u8; n * 16 + 1];
            ctr_stream_blocks_unaligned(&aes, &mut counter, &mut buf[1..], n);
            assert_eq!(counter, n as u64);
            assert_eq!(&buf[1..], &expected[..n * 16]);
        }
    }

    #[test]
    fn test_ctr_single_blocks() {
        let aes = Aes128::new(Block::from(KEY));
        let expected = expected_keystream();
        for n in 1..=8 {
            let mut counter = 0;
            let mut buf = vec![0u8; n * 16 + 3];
            for i in 0..n {
                ctr_stream_single_block_unaligned(&aes, &mut counter, &mut buf[3 + i * 16..]);
            }
            assert_eq!(&buf[3..], &expected[..n * 16]);
        }
    }

    #[test]
    fn test_ctr_chaining() {
        let aes = Aes128::new(rand::random::<Block>());
        let mut counter = 5;
        let mut whole = [Block::ZERO; 6];
        ctr_stream_blocks(&aes, &mut counter, &mut whole);
        let mut counter = 5;
        let mut first = [Block::ZERO; 2];
        let mut rest = [Block::ZERO; 4];
        ctr_stream_blocks(&aes, &mut counter, &mut first);
        ctr_stream_blocks(&aes, &mut counter, &mut rest);
        assert_eq!(&whole[..2], &first);
        assert_eq!(&whole[2..], &rest);
    }

    proptest::proptest! {
        #[test]
        fn test_batched_equals_single_blocks(
            key in proptest::prelude::any::<u128>(),
            start in proptest::prelude::any::<u64>(),
            n in 0usize..20,
        ) {
            let aes = Aes128::new(Block::from(key));
            let mut counter = start;
            let mut batched = vec![Block::ZERO; n];
            ctr_stream_blocks(&aes, &mut counter, &mut batched);
            let mut single_counter = start;
            let mut bytes = vec![0u8; n * AES_BLOCK_SIZE];
            for chunk in bytes.chunks_mut(AES_BLOCK_SIZE) {
                ctr_stream_single_block_unaligned(&aes, &mut single_counter, chunk);
            }
            proptest::prop_assert_eq!(counter, single_counter);
            proptest::prop_assert_eq!(bytemuck::cast_slice::<Block, u8>(&batched), &bytes[..]);
        }
    }
}
