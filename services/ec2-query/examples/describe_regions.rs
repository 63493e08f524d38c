//! Example calling DescribeRegions with credentials taken from the environment.
//!
//! ```shell
//! AWS_ACCESS_KEY_ID=... AWS_SECRET_ACCESS_KEY=... cargo run --example describe_regions
//! ```

use ec2sign_core::{Context, OsEnv};
use ec2sign_ec2_query::{Client, Config};
use ec2sign_http_send_reqwest::ReqwestHttpSend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger with debug level so the string to sign is visible.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let ctx = Context::new()
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv);
    let config = Config::new().with_debug(true).from_env(&ctx);
    println!("Using config: {config:?}");

    let client = Client::new(ctx, config)?;
    let resp = client.send([("Action", "DescribeRegions")]).await?;

    let regions = resp
        .get("regionInfo")
        .and_then(|v| v.get("item"))
        .map(|v| v.items())
        .unwrap_or_default();
    for region in regions {
        println!(
            "{:<20} {}",
            region.get("regionName").and_then(|v| v.as_str()).unwrap_or("-"),
            region
                .get("regionEndpoint")
                .and_then(|v| v.as_str())
                .unwrap_or("-")
        );
    }

    Ok(())
}
