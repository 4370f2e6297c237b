//! Deployment policy tests: idempotent redeploys and app replacement.

use anyhow::Result;
use game_client::account::DEFAULT_ACCOUNT_FUNDING;
use game_client::{
    get_account, AppSpec, DeployOutcome, Error, GameClient, OnSchemaBreak, OnUpdate, StateSchema,
};
use std::sync::Arc;

use crate::utils::{new_session, session, setup_localnet, APP_FUNDING};

async fn deployer(name: &str) -> Result<GameClient> {
    let session = session().await?;
    let account = get_account(
        session.ledger.as_ref(),
        &session.keys,
        name,
        DEFAULT_ACCOUNT_FUNDING,
    )
    .await?;
    Ok(GameClient::new(Arc::clone(&session.ledger), account, None))
}

#[tokio::test]
async fn test_deploy_idempotent() -> Result<()> {
    let mut client = deployer("deployer_idempotent").await?;

    let first = client
        .deploy(OnSchemaBreak::Fail, OnUpdate::Fail)
        .await?;
    assert!(matches!(first, DeployOutcome::Created { .. }));

    let second = client
        .deploy(OnSchemaBreak::Fail, OnUpdate::Fail)
        .await?;
    assert_eq!(second, DeployOutcome::Unchanged { app_id: first.app_id() });
    assert_eq!(client.app_id(), first.app_id());
    Ok(())
}

#[tokio::test]
async fn test_deploy_update_appends_app() -> Result<()> {
    let mut client = deployer("deployer_update").await?;
    let original = client
        .deploy(OnSchemaBreak::AppendApp, OnUpdate::AppendApp)
        .await?
        .app_id();

    let v2 = AppSpec {
        approval_program: b"\x0agame:approval:v2".to_vec(),
        ..AppSpec::game()
    };
    let mut client = client.with_spec(v2);

    let refused = client.deploy(OnSchemaBreak::Fail, OnUpdate::Fail).await;
    assert!(matches!(refused, Err(Error::Deploy(_))));
    assert_eq!(client.app_id(), original);

    let appended = client
        .deploy(OnSchemaBreak::Fail, OnUpdate::AppendApp)
        .await?;
    assert_eq!(
        appended,
        DeployOutcome::Appended {
            app_id: appended.app_id(),
            previous: original,
        }
    );
    assert_ne!(appended.app_id(), original);

    client.fund_app(1_000_000).await?;
    assert_eq!(client.hello("v2").await?.return_value, "Hello, v2");
    Ok(())
}

#[tokio::test]
async fn test_deploy_schema_break() -> Result<()> {
    let mut client = deployer("deployer_schema").await?;
    let original = client
        .deploy(OnSchemaBreak::Fail, OnUpdate::Fail)
        .await?
        .app_id();

    let wider = AppSpec {
        global_schema: StateSchema::new(1, 1),
        ..AppSpec::game()
    };
    let mut client = client.with_spec(wider);
    assert!(client
        .deploy(OnSchemaBreak::Fail, OnUpdate::AppendApp)
        .await
        .is_err());

    let outcome = client
        .deploy(OnSchemaBreak::AppendApp, OnUpdate::Fail)
        .await?;
    assert!(matches!(outcome, DeployOutcome::Appended { previous, .. } if previous == original));
    Ok(())
}

#[tokio::test]
async fn test_session_app_funded() -> Result<()> {
    let session = session().await?;
    let balance = session
        .ledger
        .account_balance(&session.client.app_address())
        .await?;
    assert!(balance >= APP_FUNDING);
    Ok(())
}

#[tokio::test]
async fn test_session_on_fresh_ledger() -> Result<()> {
    let fresh = new_session(setup_localnet()).await?;
    assert_ne!(fresh.client.app_id(), 0);
    let app_balance = fresh
        .ledger
        .account_balance(&fresh.client.app_address())
        .await?;
    assert_eq!(app_balance, APP_FUNDING);
    assert_eq!(fresh.client.hello("fresh").await?.return_value, "Hello, fresh");
    Ok(())
}

#[tokio::test]
async fn test_deploy_matches_by_name() -> Result<()> {
    let mut game = deployer("deployer_named").await?;
    let game_id = game
        .deploy(OnSchemaBreak::Fail, OnUpdate::Fail)
        .await?
        .app_id();

    let other = AppSpec {
        name: "other".to_string(),
        approval_program: b"\x0agame:approval:other".to_vec(),
        ..AppSpec::game()
    };
    let mut other_client = game.with_spec(other);
    let other_outcome = other_client
        .deploy(OnSchemaBreak::Fail, OnUpdate::Fail)
        .await?;
    assert!(matches!(other_outcome, DeployOutcome::Created { .. }));

    let mut game = other_client.with_spec(AppSpec::game());
    let again = game.deploy(OnSchemaBreak::Fail, OnUpdate::Fail).await?;
    assert_eq!(again, DeployOutcome::Unchanged { app_id: game_id });
    Ok(())
}
