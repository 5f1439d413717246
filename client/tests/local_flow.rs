use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use common::units::parse_ether;
use tokenforge::Chain;
use tokenforge_client::{
    ChainBackend, ClientConfig, ClientError, CreateTokenParams, FactoryClient, LocalBackend,
    Rejection, TokenClient, TxStatus,
};

const FACTORY_OWNER: Address = Address::repeat_byte(0x0f);
const TREASURY: Address = Address::repeat_byte(0x7e);
const ALICE: Address = Address::repeat_byte(0xa1);
const BOB: Address = Address::repeat_byte(0xb0);

fn config() -> ClientConfig {
    ClientConfig {
        poll_interval_ms: 10,
        confirmation_timeout_ms: 500,
        ..Default::default()
    }
}

fn setup() -> (Arc<LocalBackend>, FactoryClient<Arc<LocalBackend>>) {
    let mut chain = Chain::default();
    let factory = chain
        .deploy_factory(FACTORY_OWNER, TREASURY, parse_ether("0.01").unwrap())
        .unwrap()
        .output;
    chain.fund(ALICE, parse_ether("5").unwrap()).unwrap();

    let backend = Arc::new(LocalBackend::new(chain));
    backend.connect(ALICE);
    let mut config = config();
    config.set_factory_address(backend.chain_id(), factory);
    let client = FactoryClient::for_network(Arc::clone(&backend), config).unwrap();
    (backend, client)
}

fn params(features: &[&str]) -> CreateTokenParams {
    let mut params = CreateTokenParams::new("Forge", "FRG");
    params.initial_supply = "1000000".into();
    params.features = features.iter().map(|f| f.to_string()).collect();
    params
}

#[tokio::test]
async fn create_token_end_to_end() -> eyre::Result<()> {
    let (backend, client) = setup();
    let before = backend.with_chain(|chain| chain.balance_of(ALICE));

    let result = client
        .create_token(&params(&["mintable", "pausable"]), Some(parse_ether("1")?))
        .await;
    assert!(result.success, "{:?}", result.error);
    let token = result.token_address.expect("token address");
    assert!(result.transaction_hash.is_some());

    let fee = client.platform_fee()?;
    assert_eq!(backend.with_chain(|chain| chain.balance_of(ALICE)), before - fee);

    let mine = client.my_tokens()?;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].address, token);
    assert_eq!(mine[0].display_supply(), "1000000");
    assert_eq!(mine[0].features, vec!["mintable", "pausable"]);
    let created = backend.with_chain(|chain| chain.timestamp());
    assert_eq!(mine[0].created_at, created * 1_000);
    assert_eq!(client.get_tokens_by_owner(ALICE)?.len(), 1);
    assert!(client.get_tokens_by_owner(BOB)?.is_empty());
    Ok(())
}

#[tokio::test]
async fn token_operations_surface_reverts_after_submission() -> eyre::Result<()> {
    let (backend, client) = setup();
    let result = client
        .create_token(&params(&["mintable", "pausable", "burnable"]), None)
        .await;
    let token = TokenClient::connect(
        Arc::clone(&backend),
        result.token_address.expect("deployed"),
        config(),
    )?;

    token.mint(BOB, "2.5").await?;
    assert_eq!(token.balance(BOB)?, "2.5");
    token.burn("0.5").await?;
    assert_eq!(token.balance(ALICE)?, "999999.5");

    token.pause().await?;
    let err = token.transfer(BOB, "1").await.unwrap_err();
    assert!(!err.is_rejected());
    match &err {
        ClientError::Reverted { reason, .. } => assert!(reason.contains("paused"), "{reason}"),
        other => panic!("expected a revert, got {other:?}"),
    }
    assert!(token.info()?.paused);

    let err = token.pause().await.unwrap_err();
    assert!(matches!(err, ClientError::Reverted { .. }));
    token.unpause().await?;
    token.transfer(BOB, "1").await?;
    assert_eq!(token.balance(BOB)?, "3.5");
    Ok(())
}

#[tokio::test]
async fn a_failed_refund_is_reported_with_its_hash() {
    let (backend, client) = setup();
    backend.with_chain(|chain| chain.set_rejects_value(ALICE, true));

    let result = client
        .create_token(&params(&[]), Some(parse_ether("0.5").unwrap()))
        .await;
    assert!(!result.success);
    assert!(result.transaction_hash.is_some());
    assert!(result.token_address.is_none());
    assert!(result.error.unwrap().contains("could not refund"));
    assert!(client.get_all_tokens().unwrap().is_empty());
}

#[tokio::test]
async fn disconnected_wallets_are_rejected_up_front() {
    let (backend, client) = setup();
    backend.disconnect();
    let result = client.create_token(&params(&[]), None).await;
    assert!(!result.success);
    assert!(result.transaction_hash.is_none());
    assert_eq!(result.error.as_deref(), Some("rejected: wallet not connected"));
}

#[tokio::test]
async fn pending_transactions_confirm_once_mined() -> eyre::Result<()> {
    let (backend, client) = setup();
    backend.set_automine(false);

    let hash = client.submit_create_token(&params(&[]), None)?;
    assert_eq!(backend.status(hash), TxStatus::Pending);
    assert!(client.get_all_tokens()?.is_empty());

    let miner = Arc::clone(&backend);
    let mined = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        miner.mine()
    });
    let receipt = client.wait_for_confirmation(hash).await?;
    assert_eq!(mined.await?, 1);
    assert!(receipt.token_address.is_some());
    assert_eq!(client.get_all_tokens()?.len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dropped_and_stuck_transactions() -> eyre::Result<()> {
    let (backend, client) = setup();
    backend.set_automine(false);

    let dropped = client.submit_create_token(&params(&[]), None)?;
    assert!(backend.drop_pending(dropped));
    assert_eq!(
        client.wait_for_confirmation(dropped).await.unwrap_err(),
        ClientError::Dropped(dropped)
    );

    let stuck = client.submit_create_token(&params(&[]), None)?;
    assert!(matches!(
        client.wait_for_confirmation(stuck).await,
        Err(ClientError::Timeout { .. })
    ));
    // it can still land later
    assert_eq!(backend.mine(), 1);
    assert!(client.wait_for_confirmation(stuck).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn pagination_errors_are_rejections() -> eyre::Result<()> {
    let (_backend, client) = setup();
    for _ in 0..3 {
        assert!(client.create_token(&params(&[]), None).await.success);
    }
    assert_eq!(client.get_tokens_paginated(1, 10)?.len(), 2);
    assert!(matches!(
        client.get_tokens_paginated(4, 1),
        Err(ClientError::Rejected(Rejection::Query(_)))
    ));
    assert_eq!(client.backend().platform_fee(Address::ZERO), None::<U256>);
    Ok(())
}
