//! Half-gates garbling of AND (Zahur, Rosulek, Evans,
//! <https://eprint.iacr.org/2014/756>), two ciphertexts per gate.

use yao_primitives::{AesHash, Block};

/// Per-slot tweak: gate id in the high half, slot index in the low half.
#[inline]
pub(crate) fn tweak(gate_id: usize, index: usize) -> Block {
    Block::from(((gate_id as u128) << 64) | index as u128)
}

/// Garble one AND slot with input zero labels `a0` and `b0`. Returns the zero
/// label of the output and the generator and evaluator ciphertexts.
#[inline]
pub(crate) fn garble_and(
    hash: &AesHash,
    delta: Block,
    a0: Block,
    b0: Block,
    tweak: Block,
) -> (Block, [Block; 2]) {
    let pa = a0.lsb();
    let pb = b0.lsb();
    let [ha0, ha1, hb0, hb1] = hash.tmmo_batch_4(tweak, [a0, a0 ^ delta, b0, b0 ^ delta]);
    // Generator half: a AND pb.
    let tg = ha0 ^ ha1 ^ delta.and_bit(pb);
    let wg0 = ha0 ^ tg.and_bit(pa);
    // Evaluator half: a AND (b XOR pb).
    let te = hb0 ^ hb1 ^ a0;
    let we0 = hb0 ^ (te ^ a0).and_bit(pb);
    (wg0 ^ we0, [tg, te])
}

/// Evaluate one AND slot on active labels `a` and `b`.
#[inline]
pub(crate) fn evaluate_and(
    hash: &AesHash,
    a: Block,
    b: Block,
    table: [Block; 2],
    tweak: Block,
) -> Block {
    let [ha, hb] = hash.tmmo_batch(tweak, [a, b]);
    let wg = ha ^ table[0].and_bit(a.lsb());
    let we = hb ^ (table[1] ^ a).and_bit(b.lsb());
    wg ^ we
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use yao_primitives::AES_HASH;

    fn any_block() -> impl Strategy<Value = Block> {
        any::<u128>().prop_map(Block::from)
    }

    proptest! {
        #[test]
        fn test_half_gate_truth_table(
            delta in any_block(),
            a0 in any_block(),
            b0 in any_block(),
            gate_id in 0usize..1 << 20,
            index in 0usize..64,
        ) {
            let delta = delta.set_lsb();
            let t = tweak(gate_id, index);
            let (w0, table) = garble_and(&AES_HASH, delta, a0, b0, t);
            for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
                let la = a0 ^ delta.and_bit(a);
                let lb = b0 ^ delta.and_bit(b);
                let w = evaluate_and(&AES_HASH, la, lb, table, t);
                prop_assert_eq!(w, w0 ^ delta.and_bit(a && b));
            }
        }
    }

    #[test]
    fn test_tweak_layout() {
        assert_eq!(tweak(1, 2), Block::from((1u128 << 64) | 2));
        assert_ne!(tweak(1, 0), tweak(0, 1));
    }

    #[test]
    fn test_wrong_tweak_breaks_evaluation() {
        let delta = rand::random::<Block>().set_lsb();
        let (a0, b0) = (rand::random::<Block>(), rand::random::<Block>());
        let (w0, table) = garble_and(&AES_HASH, delta, a0, b0, tweak(3, 0));
        let w = evaluate_and(&AES_HASH, a0 ^ delta, b0 ^ delta, table, tweak(3, 1));
        assert_ne!(w, w0 ^ delta);
    }
}
