use std::env;

use anyhow::Result;
use ec2sign_core::{Context, ErrorKind, OsEnv};
use ec2sign_ec2_query::{Client, Config};
use ec2sign_http_send_reqwest::ReqwestHttpSend;
use log::{debug, warn};

/// Build a client against real EC2 from `EC2SIGN_EC2_QUERY_*` and `AWS_*` envs.
fn init_live_client() -> Option<(Context, Config)> {
    super::init_logger();
    let _ = dotenv::dotenv();

    if env::var("EC2SIGN_EC2_QUERY_TEST").ok().as_deref() != Some("on") {
        return None;
    }

    let ctx = Context::new()
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv);
    let mut config = Config::new().with_debug(true);
    if let Ok(v) = env::var("EC2SIGN_EC2_QUERY_ACCESS_KEY") {
        config = config.with_access_key_id(v);
    }
    if let Ok(v) = env::var("EC2SIGN_EC2_QUERY_SECRET_KEY") {
        config = config.with_secret_access_key(v);
    }
    if let Ok(v) = env::var("EC2SIGN_EC2_QUERY_REGION") {
        config = config.with_region(v);
    }
    let config = config.from_env(&ctx);

    Some((ctx, config))
}

#[tokio::test]
async fn test_live_describe_regions() -> Result<()> {
    let Some((ctx, config)) = init_live_client() else {
        warn!("EC2SIGN_EC2_QUERY_TEST is not set, skipped");
        return Ok(());
    };
    let client = Client::new(ctx, config)?;

    let tree = client.send([("Action", "DescribeRegions")]).await?;
    debug!("got response: {tree:?}");

    let regions = tree
        .get("regionInfo")
        .and_then(|v| v.get("item"))
        .and_then(|v| v.as_list())
        .expect("regionInfo.item must be a list");
    assert!(!regions.is_empty());
    assert!(regions
        .iter()
        .any(|r| r.get("regionName").and_then(|v| v.as_str()) == Some(client.region())));
    Ok(())
}

#[tokio::test]
async fn test_live_wrong_secret_is_rejected() -> Result<()> {
    let Some((ctx, config)) = init_live_client() else {
        warn!("EC2SIGN_EC2_QUERY_TEST is not set, skipped");
        return Ok(());
    };
    let client = Client::new(ctx, config.with_secret_access_key("not-the-secret"))?;

    let err = client
        .send([("Action", "DescribeRegions")])
        .await
        .expect_err("request signed with a wrong secret must fail");
    debug!("got error: {err:?}");

    assert!(matches!(err.kind(), ErrorKind::Transport | ErrorKind::Api));
    assert!(err.body().is_some_and(|b| b.contains("AuthFailure")));
    Ok(())
}
