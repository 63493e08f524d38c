use std::collections::BTreeMap;

use anyhow::Result;
use ec2sign_core::hash::base64_hmac_sha256;
use ec2sign_core::time::parse_timestamp;
use ec2sign_core::ErrorKind;
use ec2sign_ec2_query::{percent_encode, string_to_sign};
use http::StatusCode;
use percent_encoding::percent_decode_str;
use pretty_assertions::assert_eq;

use super::logged_lines;
use super::mock::{init_client, init_client_with_debug, MockHttpSend, ACCESS_KEY, SECRET_KEY};

const HOST: &str = "ec2.us-east-1.amazonaws.com";

const DESCRIBE_REGIONS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeRegionsResponse xmlns="http://ec2.amazonaws.com/doc/2012-07-20/">
   <requestId>59dbff89-35bd-4eac-99ed-be587EXAMPLE</requestId>
   <regionInfo>
      <item>
         <regionName>us-east-1</regionName>
         <regionEndpoint>ec2.us-east-1.amazonaws.com</regionEndpoint>
      </item>
   </regionInfo>
</DescribeRegionsResponse>"#;

/// Recompute the signature of a sent form and compare it with the one it carries.
fn assert_signed(form: &BTreeMap<String, String>) -> String {
    let sts = string_to_sign(HOST, "/", form).expect("string to sign must build");
    assert_eq!(
        base64_hmac_sha256(SECRET_KEY.as_bytes(), sts.as_bytes()),
        form["Signature"]
    );
    sts
}

#[tokio::test]
async fn test_describe_regions_end_to_end() -> Result<()> {
    let http = MockHttpSend::ok(DESCRIBE_REGIONS);
    let client = init_client(http.clone());

    let tree = client
        .send([("Action", "DescribeRegions"), ("RegionName.1", "us-east-1")])
        .await?;
    assert_eq!(
        tree.get("requestId").and_then(|v| v.as_str()),
        Some("59dbff89-35bd-4eac-99ed-be587EXAMPLE")
    );

    let forms = http.forms();
    assert_eq!(forms.len(), 1);
    let form = &forms[0];

    let sts = assert_signed(form);
    let lines: Vec<&str> = sts.split('\n').collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "POST");
    assert_eq!(lines[1], HOST);
    assert_eq!(lines[2], "/");
    assert!(lines[3].starts_with(&format!("AWSAccessKeyId={ACCESS_KEY}&Action=DescribeRegions&")));

    let keys: Vec<&str> = lines[3]
        .split('&')
        .map(|kv| kv.split_once('=').map(|(k, _)| k).unwrap_or(kv))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
    assert_eq!(
        keys,
        vec![
            "AWSAccessKeyId",
            "Action",
            "RegionName.1",
            "SignatureMethod",
            "SignatureVersion",
            "Timestamp",
            "Version",
        ]
    );

    let timestamp = parse_timestamp(&form["Timestamp"])?;
    let drift = chrono::Utc::now() - timestamp;
    assert!(drift.num_seconds().abs() < 60, "timestamp {timestamp} is not now");
    assert!(form["Timestamp"].ends_with('Z'));
    Ok(())
}

#[tokio::test]
async fn test_params_are_sorted_regardless_of_input_order() -> Result<()> {
    let http = MockHttpSend::ok(DESCRIBE_REGIONS);
    let client = init_client(http.clone());

    client
        .send(vec![
            ("zeta", "1"),
            ("Filter.2.Name", "instance-type"),
            ("Filter.10.Name", "tag:Name"),
            ("Action", "DescribeInstances"),
            ("MaxResults", "5"),
            ("alpha", "2"),
        ])
        .await?;

    let sts = assert_signed(&http.forms()[0]);
    let query = sts.rsplit('\n').next().unwrap_or_default();
    let keys: Vec<&str> = query
        .split('&')
        .filter_map(|kv| kv.split_once('=').map(|(k, _)| k))
        .collect();
    assert_eq!(
        keys,
        vec![
            "AWSAccessKeyId",
            "Action",
            "Filter.10.Name",
            "Filter.2.Name",
            "MaxResults",
            "SignatureMethod",
            "SignatureVersion",
            "Timestamp",
            "Version",
            "alpha",
            "zeta",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_reserved_characters_round_trip() -> Result<()> {
    let value = "web & db = 1 / ü 日本 ~ok+";
    let http = MockHttpSend::ok(DESCRIBE_REGIONS);
    let client = init_client(http.clone());

    client
        .send([("Action", "CreateTags"), ("Tag.1.Value", value)])
        .await?;

    let form = &http.forms()[0];
    assert_eq!(form["Tag.1.Value"], value);

    let sts = assert_signed(form);
    let encoded = percent_encode(value);
    assert!(sts.contains(&format!("Tag.1.Value={encoded}")));
    assert!(!encoded.contains(' ') && !encoded.contains('+'));
    assert_eq!(percent_decode_str(&encoded).decode_utf8()?, value);
    Ok(())
}

#[tokio::test]
async fn test_missing_action_sends_nothing() {
    let http = MockHttpSend::ok(DESCRIBE_REGIONS);
    let client = init_client(http.clone());

    let err = client
        .send([("RegionName.1", "us-east-1")])
        .await
        .expect_err("Action is required");
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(err.is_local());
    assert_eq!(http.calls(), 0);
}

#[tokio::test]
async fn test_errors_on_success_status() {
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<Response><Errors><Error><Code>AuthFailure</Code><Message>AWS was not able to validate the provided access credentials</Message></Error></Errors><RequestID>ea966190-f9aa-478e-9ede-example</RequestID></Response>"#;
    let http = MockHttpSend::ok(body);
    let client = init_client(http.clone());

    let err = client
        .send([("Action", "DescribeRegions")])
        .await
        .expect_err("Errors must fail the call");
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.body(), Some(body));
    assert!(err.message().contains("AuthFailure"));
    assert_eq!(http.calls(), 1);
}

#[tokio::test]
async fn test_server_error_status() {
    let http = MockHttpSend::new(StatusCode::INTERNAL_SERVER_ERROR, "We encountered an internal error.");
    let client = init_client(http.clone());

    let err = client
        .send([("Action", "DescribeRegions")])
        .await
        .expect_err("500 must fail the call");
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(err.status_text(), Some("Internal Server Error"));
    assert_eq!(err.body(), Some("We encountered an internal error."));
}

#[tokio::test]
async fn test_concurrent_sends_do_not_mix() -> Result<()> {
    let http = MockHttpSend::ok(DESCRIBE_REGIONS);
    let client = init_client(http.clone());

    let a = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .send([("Action", "DescribeRegions"), ("RegionName.1", "us-east-1")])
                .await
        })
    };
    let b = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .send([("Action", "DescribeInstances"), ("InstanceId.1", "i-1234567890abcdef0")])
                .await
        })
    };
    a.await??;
    b.await??;

    let forms = http.forms();
    assert_eq!(forms.len(), 2);
    for form in &forms {
        assert_signed(form);
        match form["Action"].as_str() {
            "DescribeRegions" => {
                assert_eq!(form.get("RegionName.1").map(String::as_str), Some("us-east-1"));
                assert!(!form.contains_key("InstanceId.1"));
            }
            "DescribeInstances" => {
                assert_eq!(
                    form.get("InstanceId.1").map(String::as_str),
                    Some("i-1234567890abcdef0")
                );
                assert!(!form.contains_key("RegionName.1"));
            }
            other => panic!("unexpected action {other}"),
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_debug_logging_is_gated() -> Result<()> {
    let quiet = init_client_with_debug(MockHttpSend::ok(DESCRIBE_REGIONS), false);
    quiet
        .send([("Action", "DescribeRegions"), ("RegionName.1", "quiet-7f3a1c")])
        .await?;
    assert_eq!(logged_lines("quiet-7f3a1c"), Vec::<String>::new());

    let http = MockHttpSend::ok(DESCRIBE_REGIONS);
    let loud = init_client_with_debug(http.clone(), true);
    loud.send([("Action", "DescribeRegions"), ("RegionName.1", "loud-9b2e4d")])
        .await?;

    let sts = assert_signed(&http.forms()[0]);
    let lines = logged_lines("loud-9b2e4d");
    assert!(
        lines.iter().any(|line| line.contains(&sts)),
        "string to sign must be logged, got {lines:?}"
    );
    Ok(())
}
