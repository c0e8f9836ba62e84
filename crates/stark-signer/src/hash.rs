//! Pedersen hash chains over call data.
//!
//! Every function here is a pure function of its inputs. The pairwise
//! compression `H` is the Starkware Pedersen hash; operand order matters
//! everywhere and must not be changed.

use starknet_crypto::pedersen_hash;

use crate::felt::Felt;

/// The pairwise compression function `H(x, y)`.
pub fn pair_hash(x: &Felt, y: &Felt) -> Felt {
    pedersen_hash(x, y)
}

/// Right-fold hash chain over call arguments.
///
/// - `[]` hashes to `0`
/// - `[a]` hashes to `a`
/// - `[a0, a1, ..., an]` hashes to `H(hash_calldata([a1, ..., an]), a0)`
///
/// The tail digest is always the first operand. The fold walks the slice
/// backwards instead of recursing.
pub fn hash_calldata(calldata: &[Felt]) -> Felt {
    let Some((last, rest)) = calldata.split_last() else {
        return Felt::ZERO;
    };

    rest.iter()
        .rev()
        .fold(*last, |acc, element| pair_hash(&acc, element))
}

/// Digest authenticating a single call from `sender` at `nonce`.
///
/// `H(H(H(H(to, selector), hash_calldata(calldata)), sender), nonce)`
pub fn hash_message(
    to: &Felt,
    selector: &Felt,
    calldata: &[Felt],
    sender: &Felt,
    nonce: &Felt,
) -> Felt {
    let res = pair_hash(to, selector);
    let res = pair_hash(&res, &hash_calldata(calldata));
    let res = pair_hash(&res, sender);
    pair_hash(&res, nonce)
}

/// Left-fold hash chain seeded with zero and closed with the length:
/// `H(H(...H(H(0, d0), d1)..., dn), len)`.
pub fn hash_on_elements(data: &[Felt]) -> Felt {
    let acc = data
        .iter()
        .fold(Felt::ZERO, |acc, element| pair_hash(&acc, element));

    pair_hash(&acc, &Felt::from(data.len()))
}
