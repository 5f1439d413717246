//! Defines the ecrecover trait. Callers pack `(hash, v, r, s)` into the 128-byte
//! layout of the `ecRecover` precompile and hand it to a backend, which may be the
//! precompile itself or a native secp256k1 implementation.

/// The number of bytes in a hash digest
pub const HASH_OUTPUT_SIZE: usize = 32;

/// The number of bytes it takes to represent an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The byte length of the input to the `ecRecover` precompile
pub const EC_RECOVER_INPUT_LEN: usize = 128;

/// The number of bytes it takes to represent an unsigned 256-bit integer
pub const NUM_BYTES_U256: usize = 32;

/// The last byte of the `ecRecover` precompile address, 0x01
pub const EC_RECOVER_ADDRESS_LAST_BYTE: u8 = 1;

/// An error that occurs during ECDSA recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("ecdsa recovery failed")]
pub struct EcdsaError;

pub trait EcRecoverTrait {
    fn ecrecover(
        message_hash: &[u8; HASH_OUTPUT_SIZE],
        v: u8,
        r: &[u8; NUM_BYTES_U256],
        s: &[u8; NUM_BYTES_U256],
    ) -> Result<[u8; NUM_BYTES_ADDRESS], EcdsaError> {
        // input[0..32] = message_hash
        // input[32..64] = v (big-endian)
        // input[64..96] = r (big-endian)
        // input[96..128] = s (big-endian)
        let mut input = [0_u8; EC_RECOVER_INPUT_LEN];
        input[..NUM_BYTES_U256].copy_from_slice(message_hash);
        // `v` may arrive as a raw recovery id (0 or 1); the precompile wants 27 or 28
        if v <= 1 {
            input[2 * NUM_BYTES_U256 - 1] = v + 27;
        } else {
            input[2 * NUM_BYTES_U256 - 1] = v;
        }
        input[2 * NUM_BYTES_U256..3 * NUM_BYTES_U256].copy_from_slice(r);
        input[3 * NUM_BYTES_U256..].copy_from_slice(s);

        Self::ecrecover_implementation(input)
    }

    fn ecrecover_implementation(
        input: [u8; EC_RECOVER_INPUT_LEN],
    ) -> Result<[u8; NUM_BYTES_ADDRESS], EcdsaError>;
}
