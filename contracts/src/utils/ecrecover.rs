//! Recovers the signer address natively with k256, following revm's `ecrecover`
//! precompile: https://github.com/bluealloy/revm/blob/main/crates/precompile/src/secp256k1.rs

use alloy_primitives::{keccak256, B256, B512};
use common::crypto::ecrecover::{
    EcRecoverTrait, EcdsaError, EC_RECOVER_INPUT_LEN, NUM_BYTES_ADDRESS,
};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

pub struct NativeEcRecover;

impl EcRecoverTrait for NativeEcRecover {
    fn ecrecover_implementation(
        input: [u8; EC_RECOVER_INPUT_LEN],
    ) -> Result<[u8; NUM_BYTES_ADDRESS], EcdsaError> {
        // `v` must be a 32-byte big-endian integer equal to 27 or 28.
        if !(input[32..63].iter().all(|&b| b == 0) && matches!(input[63], 27 | 28)) {
            return Ok([0; NUM_BYTES_ADDRESS]);
        }

        let msg = B256::from_slice(&input[0..32]);
        let mut recid = input[63] - 27;
        let sig = B512::from_slice(&input[64..128]);

        let mut sig = Signature::from_slice(sig.as_slice()).map_err(|_| EcdsaError)?;

        // normalize signature and flip recovery id if needed.
        if let Some(sig_normalized) = sig.normalize_s() {
            sig = sig_normalized;
            recid ^= 1;
        }
        let recid = RecoveryId::from_byte(recid).ok_or(EcdsaError)?;

        let recovered_key =
            VerifyingKey::recover_from_prehash(msg.as_slice(), &sig, recid).map_err(|_| EcdsaError)?;
        let hash = keccak256(
            &recovered_key
                .to_encoded_point(/* compress = */ false)
                .as_bytes()[1..],
        );

        // the address is the last 20 bytes of the key hash
        hash[12..].try_into().map_err(|_| EcdsaError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

    fn address_of(public_key: &PublicKey) -> [u8; NUM_BYTES_ADDRESS] {
        let hash = keccak256(&public_key.serialize_uncompressed()[1..]);
        let mut address = [0u8; NUM_BYTES_ADDRESS];
        address.copy_from_slice(&hash[12..32]);
        address
    }

    fn sign(secret_key: &SecretKey, hash: &B256) -> (u8, [u8; 32], [u8; 32]) {
        let secp = Secp256k1::new();
        let msg = Message::from_digest_slice(hash.as_slice()).unwrap();
        let (rec_id, sig_bytes) = secp
            .sign_ecdsa_recoverable(&msg, secret_key)
            .serialize_compact();
        let r: [u8; 32] = sig_bytes[0..32].try_into().unwrap();
        let s: [u8; 32] = sig_bytes[32..64].try_into().unwrap();
        (rec_id.to_i32() as u8 + 27, r, s)
    }

    #[test]
    fn recovers_signer_address() {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&[0x42; 32]).unwrap();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        let hash = keccak256("Hello, tokenforge!".as_bytes());
        let (v, r, s) = sign(&secret_key, &hash);

        let result = NativeEcRecover::ecrecover(&hash.0, v, &r, &s).unwrap();
        assert_eq!(result, address_of(&public_key));
    }

    #[test]
    fn raw_recovery_id_is_accepted() {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&[0x07; 32]).unwrap();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        let hash = keccak256(b"raw v");
        let (v, r, s) = sign(&secret_key, &hash);
        let result = NativeEcRecover::ecrecover(&hash.0, v - 27, &r, &s).unwrap();
        assert_eq!(result, address_of(&public_key));
    }

    #[test]
    fn malformed_v_recovers_zero_address() {
        let hash = keccak256(b"bad v");
        let result = NativeEcRecover::ecrecover(&hash.0, 29, &[1; 32], &[1; 32]).unwrap();
        assert_eq!(result, [0; NUM_BYTES_ADDRESS]);
    }

    #[test]
    fn garbage_signature_does_not_recover_signer() {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&[0x42; 32]).unwrap();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        let hash = keccak256(b"tampered");
        let (v, r, mut s) = sign(&secret_key, &hash);
        s[31] ^= 0x01;
        match NativeEcRecover::ecrecover(&hash.0, v, &r, &s) {
            Ok(address) => assert_ne!(address, address_of(&public_key)),
            Err(EcdsaError) => {}
        }
    }
}
