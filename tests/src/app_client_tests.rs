//! Integration tests for the game contract client.
//!
//! Every method call is cross-checked against the raw box bytes read back from
//! the ledger and decoded with an explicit ABI type:
//! - Registration (user profile box)
//! - Funding the in-game balance with a grouped payment
//! - Admin asset upserts
//! - Asset purchases (balance debit, user-asset quantity)
//! - Greeting and simulation

use anyhow::Result;
use game_client::{Error, TransactionParameters};
use game_types::boxes::{asset_box_name, asset_id, user_asset_box_name, user_box_name};
use game_types::{AbiValue, Asset};

use crate::utils::{
    catalog, decode_box, ensure_catalog, player, read_asset, read_box, read_quantity, read_user,
    session,
};

const USER_ABI: &str = "(uint64,string,uint64)";
const ASSET_ABI: &str = "(string,string,uint64)";

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register() -> Result<()> {
    let session = session().await?;
    let box_name = user_box_name(&session.account.address());

    let user = session
        .client
        .register("Alice", TransactionParameters::with_boxes([box_name.clone()]))
        .await?
        .return_value;

    assert!(user.registered_at > 0);
    assert_eq!(user.name, "Alice");
    assert_eq!(user.balance, 0);

    let stored = decode_box(USER_ABI, &read_box(&session.client, &box_name).await?)?;
    assert_eq!(
        stored,
        AbiValue::Tuple(vec![
            AbiValue::Uint(user.registered_at),
            AbiValue::from("Alice"),
            AbiValue::Uint(0),
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_register_twice_rejected() -> Result<()> {
    let session = session().await?;
    let (account, client) = player(session, "twice").await?;
    let box_name = user_box_name(&account.address());

    client
        .register("Misty", TransactionParameters::with_boxes([box_name.clone()]))
        .await?;
    let err = client
        .register("Brock", TransactionParameters::with_boxes([box_name.clone()]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("User already registered"), "{err}");

    assert_eq!(read_user(&client, &box_name).await?.name, "Misty");
    Ok(())
}

#[tokio::test]
async fn test_missing_box_reference_rejected() -> Result<()> {
    let session = session().await?;
    let (account, client) = player(session, "no_refs").await?;

    let err = client
        .register("Gary", TransactionParameters::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("box not referenced"), "{err}");

    let missing = read_box(&client, &user_box_name(&account.address()))
        .await
        .unwrap_err();
    assert!(missing.is_not_found());
    Ok(())
}

// =============================================================================
// Funding
// =============================================================================

#[tokio::test]
async fn test_fund_account() -> Result<()> {
    let session = session().await?;
    let (account, client) = player(session, "test").await?;
    let box_name = user_box_name(&account.address());

    let user = client
        .register("Bob", TransactionParameters::with_boxes([box_name.clone()]))
        .await?
        .return_value;
    let balance_before = user.balance;

    let payment = client.payment(&account, 10_000).await?;
    let balance_returned = client
        .fund_account(payment, TransactionParameters::with_boxes([box_name.clone()]))
        .await?
        .return_value;
    assert_eq!(balance_before + 10_000, balance_returned);

    let stored = decode_box(USER_ABI, &read_box(&client, &box_name).await?)?;
    let fields = stored.into_tuple().expect("user tuple");
    assert_eq!(fields[2].as_u64(), Some(balance_before + 10_000));
    Ok(())
}

#[tokio::test]
async fn test_fund_unregistered_rejected() -> Result<()> {
    let session = session().await?;
    let (account, client) = player(session, "unregistered_funder").await?;
    let box_name = user_box_name(&account.address());

    let payment = client.payment(&account, 10_000).await?;
    let err = client
        .fund_account(payment, TransactionParameters::with_boxes([box_name]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("User not registered"), "{err}");
    Ok(())
}

// =============================================================================
// Assets
// =============================================================================

#[tokio::test]
async fn test_admin_upsert_asset() -> Result<()> {
    let session = session().await?;

    for asset in catalog() {
        let box_name = asset_box_name(&asset_id(&asset.name)?);
        let params = TransactionParameters {
            note: b"test_admin_upsert_asset".to_vec(),
            ..TransactionParameters::with_boxes([box_name.clone()])
        };
        session.client.admin_upsert_asset(&asset, params).await?;

        let stored = decode_box(ASSET_ABI, &read_box(&session.client, &box_name).await?)?;
        assert_eq!(
            stored,
            AbiValue::Tuple(vec![
                AbiValue::from(asset.name.as_str()),
                AbiValue::from(asset.description.as_str()),
                AbiValue::Uint(asset.price),
            ])
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_non_creator_upsert_rejected() -> Result<()> {
    let session = session().await?;
    let (_, client) = player(session, "impostor").await?;
    let asset = Asset::new("MASTERBALL", "Never fails", 1);
    let box_name = asset_box_name(&asset_id(&asset.name)?);

    let err = client
        .admin_upsert_asset(&asset, TransactionParameters::with_boxes([box_name.clone()]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unauthorized"), "{err}");
    assert!(read_box(&client, &box_name).await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_buy_asset() -> Result<()> {
    let session = session().await?;
    ensure_catalog(session).await?;
    let (account, client) = player(session, "test_buyer").await?;

    let user_box = user_box_name(&account.address());
    client
        .register("Ash", TransactionParameters::with_boxes([user_box.clone()]))
        .await?;

    let pokeball = asset_id("POKEBALL")?;
    let asset_box = asset_box_name(&pokeball);
    let price = read_asset(&client, &asset_box).await?.price;

    let payment = client.payment(&account, price * 2).await?;
    client
        .fund_account(payment, TransactionParameters::with_boxes([user_box.clone()]))
        .await?;

    let balance_before = read_user(&client, &user_box).await?.balance;
    let user_asset_box = user_asset_box_name(&account.address(), &pokeball);
    let quantity_before = read_quantity(&client, &user_asset_box).await?;

    let refs = || {
        TransactionParameters::with_boxes([
            asset_box.clone(),
            user_box.clone(),
            user_asset_box.clone(),
        ])
    };
    client.buy_asset(pokeball, 1, refs()).await?;
    client.buy_asset(pokeball, 1, refs()).await?;

    let balance_after = read_user(&client, &user_box).await?.balance;
    assert_eq!(balance_before - price * 2, balance_after);

    let quantity_after = read_quantity(&client, &user_asset_box).await?;
    assert_eq!(quantity_after - 2, quantity_before);
    Ok(())
}

#[tokio::test]
async fn test_register_fund_buy_scenario() -> Result<()> {
    let session = session().await?;
    ensure_catalog(session).await?;
    let (account, client) = player(session, "scenario").await?;

    let pokeball = asset_id("POKEBALL")?;
    let user_box = user_box_name(&account.address());
    let user_asset_box = user_asset_box_name(&account.address(), &pokeball);
    let refs = TransactionParameters::with_boxes([
        asset_box_name(&pokeball),
        user_box.clone(),
        user_asset_box.clone(),
    ]);

    client
        .register("Alice", TransactionParameters::with_boxes([user_box.clone()]))
        .await?;
    let payment = client.payment(&account, 10_000).await?;
    client
        .fund_account(payment, TransactionParameters::with_boxes([user_box.clone()]))
        .await?;

    client.buy_asset(pokeball, 1, refs.clone()).await?;
    assert_eq!(read_user(&client, &user_box).await?.balance, 9_800);
    assert_eq!(read_quantity(&client, &user_asset_box).await?, 1);

    client.buy_asset(pokeball, 2, refs).await?;
    assert_eq!(read_user(&client, &user_box).await?.balance, 9_400);
    assert_eq!(read_quantity(&client, &user_asset_box).await?, 3);
    Ok(())
}

#[tokio::test]
async fn test_buy_insufficient_balance_leaves_state() -> Result<()> {
    let session = session().await?;
    ensure_catalog(session).await?;
    let (account, client) = player(session, "broke").await?;

    let pokeball = asset_id("POKEBALL")?;
    let user_box = user_box_name(&account.address());
    let user_asset_box = user_asset_box_name(&account.address(), &pokeball);

    client
        .register("Jessie", TransactionParameters::with_boxes([user_box.clone()]))
        .await?;
    let payment = client.payment(&account, 100).await?;
    client
        .fund_account(payment, TransactionParameters::with_boxes([user_box.clone()]))
        .await?;

    let err = client
        .buy_asset(
            pokeball,
            1,
            TransactionParameters::with_boxes([
                asset_box_name(&pokeball),
                user_box.clone(),
                user_asset_box.clone(),
            ]),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Insufficient balance"), "{err}");

    assert_eq!(read_user(&client, &user_box).await?.balance, 100);
    assert!(read_box(&client, &user_asset_box).await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_buy_zero_quantity_rejected() -> Result<()> {
    let session = session().await?;
    ensure_catalog(session).await?;
    let (account, client) = player(session, "zero_buyer").await?;

    let potion = asset_id("POTION")?;
    let user_box = user_box_name(&account.address());
    client
        .register("James", TransactionParameters::with_boxes([user_box.clone()]))
        .await?;

    let err = client
        .buy_asset(
            potion,
            0,
            TransactionParameters::with_boxes([
                asset_box_name(&potion),
                user_box,
                user_asset_box_name(&account.address(), &potion),
            ]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Algod { status: 400, .. }), "{err}");
    assert!(err.to_string().contains("quantity"), "{err}");
    Ok(())
}

// =============================================================================
// Greeting and simulation
// =============================================================================

#[tokio::test]
async fn test_hello() -> Result<()> {
    let session = session().await?;
    let greeting = session.client.hello("World").await?;
    assert_eq!(greeting.return_value, "Hello, World");
    assert!(greeting.confirmed_round > 0);
    Ok(())
}

#[tokio::test]
async fn test_hello_simulate_leaves_no_state() -> Result<()> {
    let session = session().await?;
    let (account, client) = player(session, "simulator").await?;
    let user_box = user_box_name(&account.address());

    let result = client
        .compose()
        .hello("World")
        .register("Dry Run", TransactionParameters::with_boxes([user_box.clone()]))
        .simulate()
        .await?;

    assert!(result.budget_consumed > 0);
    assert_eq!(result.budget_added, 1_400);
    assert_eq!(
        result.method_results[0].value,
        Some(AbiValue::from("Hello, World"))
    );
    let registered = result.method_results[1]
        .value
        .clone()
        .and_then(AbiValue::into_tuple)
        .expect("user tuple");
    assert_eq!(registered[1], AbiValue::from("Dry Run"));

    assert!(read_box(&client, &user_box).await.unwrap_err().is_not_found());
    Ok(())
}
