#![allow(dead_code)]

use alloy_primitives::{keccak256, Address, B256, U256};
use common::units::parse_ether;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use tokenforge::{Chain, TokenConfig};

pub const FACTORY_OWNER: Address = Address::repeat_byte(0x0f);
pub const TREASURY: Address = Address::repeat_byte(0x7e);
pub const ALICE: Address = Address::repeat_byte(0xa1);
pub const BOB: Address = Address::repeat_byte(0xb0);
pub const CAROL: Address = Address::repeat_byte(0xc4);

pub fn ether(amount: &str) -> U256 {
    parse_ether(amount).unwrap()
}

pub fn tokens(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18))
}

pub struct Fixture {
    pub chain: Chain,
    pub factory: Address,
}

impl Fixture {
    /// Factory charging 0.01 ether, with ALICE and BOB funded.
    pub fn new() -> Self {
        let mut chain = Chain::default();
        let factory = chain
            .deploy_factory(FACTORY_OWNER, TREASURY, ether("0.01"))
            .unwrap()
            .output;
        chain.fund(ALICE, ether("10")).unwrap();
        chain.fund(BOB, ether("10")).unwrap();
        Self { chain, factory }
    }

    pub fn fee(&self) -> U256 {
        self.chain.factory(self.factory).unwrap().platform_fee()
    }

    /// Deploys `config` from `sender`, paying exactly the fee.
    pub fn create(&mut self, sender: Address, config: TokenConfig) -> Address {
        let fee = self.fee();
        self.chain
            .create_token(sender, self.factory, fee, config)
            .unwrap()
            .output
    }
}

/// An externally owned account that can sign permits.
pub struct Signer {
    secret_key: SecretKey,
    pub address: Address,
}

impl Signer {
    pub fn new(seed: u8) -> Self {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&[seed; 32]).unwrap();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        let hash = keccak256(&public_key.serialize_uncompressed()[1..]);
        Self {
            secret_key,
            address: Address::from_slice(&hash[12..]),
        }
    }

    pub fn sign(&self, digest: B256) -> (u8, B256, B256) {
        let secp = Secp256k1::new();
        let msg = Message::from_digest_slice(digest.as_slice()).unwrap();
        let (rec_id, sig) = secp
            .sign_ecdsa_recoverable(&msg, &self.secret_key)
            .serialize_compact();
        (
            rec_id.to_i32() as u8 + 27,
            B256::from_slice(&sig[..32]),
            B256::from_slice(&sig[32..]),
        )
    }
}
