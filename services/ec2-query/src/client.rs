// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Uri};
use log::debug;

use crate::constants::FORM_CONTENT_TYPE;
use crate::{Config, Credential, RequestSigner, ResponseTree, SignedEnvelope};
use ec2sign_core::{Context, Error, Result};

/// Client sends signed EC2 Query API requests.
///
/// The client is cheap to clone and safe to share between tasks: its
/// configuration is fixed at construction and every call signs its own
/// parameters with its own timestamp.
///
/// ```no_run
/// use ec2sign_core::{Context, OsEnv};
/// use ec2sign_ec2_query::{Client, Config};
/// use ec2sign_http_send_reqwest::ReqwestHttpSend;
///
/// # async fn example() -> ec2sign_core::Result<()> {
/// let ctx = Context::new()
///     .with_http_send(ReqwestHttpSend::default())
///     .with_env(OsEnv);
/// let client = Client::new(ctx.clone(), Config::new().from_env(&ctx))?;
///
/// let resp = client
///     .send([("Action", "DescribeRegions"), ("RegionName.1", "us-east-1")])
///     .await?;
/// for region in resp.get("regionInfo").and_then(|v| v.get("item")).into_iter().flat_map(|v| v.items()) {
///     println!("{:?}", region.get("regionName"));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    ctx: Context,
    inner: Arc<Inner>,
}

#[derive(Debug, Clone)]
struct Inner {
    credential: Credential,
    signer: RequestSigner,
    endpoint: String,
    region: String,
    version: String,
    debug: bool,
}

impl Client {
    /// Create a new client.
    ///
    /// Returns a [`ConfigInvalid`](ec2sign_core::ErrorKind::ConfigInvalid) error if
    /// the access key or secret key is missing, or if the endpoint is not an
    /// absolute url.
    pub fn new(ctx: Context, config: Config) -> Result<Self> {
        let mut credential = Credential::new(
            config.access_key_id.as_deref().unwrap_or_default(),
            config.secret_access_key.as_deref().unwrap_or_default(),
        );
        if !credential.is_valid() {
            return Err(Error::config_invalid(
                "access_key_id and secret_access_key are required",
            ));
        }
        if let Some(token) = config.session_token.as_deref().filter(|v| !v.is_empty()) {
            credential = credential.with_session_token(token);
        }

        let endpoint = config.endpoint_or_default();
        let uri: Uri = endpoint.parse()?;
        if uri.scheme().is_none() {
            return Err(Error::config_invalid(format!(
                "endpoint {endpoint} must be an absolute url"
            )));
        }
        let host = uri
            .host()
            .ok_or_else(|| Error::config_invalid(format!("endpoint {endpoint} has no host")))?;

        let version = config.version_or_default().to_string();
        let signer = RequestSigner::new(host, &version);

        Ok(Self {
            ctx,
            inner: Arc::new(Inner {
                credential,
                signer,
                endpoint,
                region: config.region_or_default().to_string(),
                version,
                debug: config.debug,
            }),
        })
    }

    /// Specify the signing time.
    ///
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: ec2sign_core::time::DateTime) -> Self {
        let inner = Arc::make_mut(&mut self.inner);
        inner.signer = inner.signer.clone().with_time(time);
        self
    }

    /// The url requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// The configured region.
    pub fn region(&self) -> &str {
        &self.inner.region
    }

    /// The API version sent with every request.
    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// Sign `params` without sending them.
    pub fn sign<I, K, V>(&self, params: I) -> Result<SignedEnvelope>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.signer.sign(&self.inner.credential, params)
    }

    /// Sign `params`, post them to the endpoint and parse the response.
    ///
    /// `params` must carry a non-empty `Action`. Fields the signer owns
    /// (`AWSAccessKeyId`, `Timestamp`, `Version`, `SignatureVersion`,
    /// `SignatureMethod`, `SecurityToken`, `Signature`) are rejected. If a key
    /// appears more than once, the last value is used.
    ///
    /// # Errors
    ///
    /// - `RequestInvalid` if `params` is not acceptable, before any I/O.
    /// - `Transport` if the request could not be sent or the status is not 2xx.
    /// - `Api` if the service reports `Errors` in a 2xx response.
    /// - `Unexpected` if a 2xx response is not well-formed XML.
    ///
    /// The errors carrying a response expose its status and raw body.
    pub async fn send<I, K, V>(&self, params: I) -> Result<ResponseTree>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let envelope = self.sign(params)?;
        let action = envelope.action().to_string();

        if self.inner.debug {
            debug!("calculated string to sign: {}", envelope.string_to_sign());
            debug!("sending {action} to {}", self.inner.endpoint);
        }

        let req = http::Request::builder()
            .method(Method::POST)
            .uri(&self.inner.endpoint)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(Bytes::from(envelope.to_form_body()))?;

        let (parts, body) = self.ctx.http_send_as_string(req).await?.into_parts();
        let status = parts.status;
        if !status.is_success() {
            return Err(
                Error::transport(format!("{action} failed with http status {status}"))
                    .with_status(status)
                    .with_body(body),
            );
        }

        let tree = match ResponseTree::parse(&body) {
            Ok(tree) => tree,
            Err(err) => return Err(err.with_status(status).with_body(body)),
        };

        if let Some((code, message)) = tree.first_error() {
            return Err(Error::api(format!(
                "{action} failed with error {}: {}",
                code.unwrap_or("unknown"),
                message.unwrap_or("no message")
            ))
            .with_status(status)
            .with_body(body));
        }

        Ok(tree)
    }
}
