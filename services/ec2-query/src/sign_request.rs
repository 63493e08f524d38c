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

use std::collections::BTreeMap;
use std::fmt::Write;

use percent_encoding::utf8_percent_encode;

use crate::constants::*;
use crate::Credential;
use ec2sign_core::hash::base64_hmac_sha256;
use ec2sign_core::time::{format_timestamp, now, DateTime};
use ec2sign_core::{Error, Result};

/// RequestSigner that implement AWS Signature Version 2 for the EC2 Query API.
///
/// - [Signature Version 2 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-2.html)
#[derive(Debug, Clone)]
pub struct RequestSigner {
    host: String,
    version: String,

    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for requests sent to `host` with API `version`.
    ///
    /// `host` is lowercased since the service lowercases it before verifying.
    pub fn new(host: &str, version: &str) -> Self {
        Self {
            host: host.to_ascii_lowercase(),
            version: version.into(),

            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Build the signed envelope for `params`.
    ///
    /// `params` must contain a non-empty `Action` and none of the envelope
    /// fields the signer owns. Duplicate keys keep the last value.
    pub fn sign<I, K, V>(&self, cred: &Credential, params: I) -> Result<SignedEnvelope>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let now = self.time.unwrap_or_else(now);
        let mut params: BTreeMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let action = match params.remove(ACTION) {
            Some(v) if !v.is_empty() => v,
            _ => return Err(Error::request_invalid("parameter Action is required")),
        };
        if let Some(k) = RESERVED_PARAMS.iter().find(|k| params.contains_key(**k)) {
            return Err(Error::request_invalid(format!(
                "parameter {k} is set by the signer and must not be supplied"
            )));
        }

        params.insert(ACTION.into(), action);
        params.insert(AWS_ACCESS_KEY_ID_PARAM.into(), cred.access_key_id.clone());
        params.insert(TIMESTAMP.into(), format_timestamp(now));
        params.insert(VERSION.into(), self.version.clone());
        params.insert(SIGNATURE_VERSION_PARAM.into(), SIGNATURE_VERSION.into());
        params.insert(SIGNATURE_METHOD_PARAM.into(), SIGNATURE_METHOD.into());
        if let Some(token) = &cred.session_token {
            params.insert(SECURITY_TOKEN.into(), token.clone());
        }

        let string_to_sign = string_to_sign(&self.host, "/", &params)?;
        let signature = base64_hmac_sha256(
            cred.secret_access_key.as_bytes(),
            string_to_sign.as_bytes(),
        );
        params.insert(SIGNATURE.into(), signature);

        Ok(SignedEnvelope {
            params,
            string_to_sign,
        })
    }
}

/// The exact set of form fields sent to the service, `Signature` included.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    params: BTreeMap<String, String>,
    string_to_sign: String,
}

impl SignedEnvelope {
    /// All fields sorted by name.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Get a single field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The action this envelope invokes.
    pub fn action(&self) -> &str {
        self.get(ACTION).unwrap_or_default()
    }

    /// The `Timestamp` field, like `2012-07-20T12:00:00Z`.
    pub fn timestamp(&self) -> &str {
        self.get(TIMESTAMP).unwrap_or_default()
    }

    /// The computed base64 signature.
    pub fn signature(&self) -> &str {
        self.get(SIGNATURE).unwrap_or_default()
    }

    /// The string the signature was computed over.
    ///
    /// It embeds every parameter value, treat it as sensitive.
    pub fn string_to_sign(&self) -> &str {
        &self.string_to_sign
    }

    /// Render the envelope as an `application/x-www-form-urlencoded` body.
    pub fn to_form_body(&self) -> String {
        canonical_query(&self.params)
    }
}

/// Percent-encode `s` as RFC 3986 requires: every byte of its UTF-8 form
/// except `A-Z a-z 0-9 - _ . ~` is encoded, space becomes `%20`.
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, &AWS_QUERY_ENCODE_SET).to_string()
}

/// Build the Signature Version 2 string to sign.
///
/// ```text
/// POST
/// ec2.us-east-1.amazonaws.com
/// /
/// AWSAccessKeyId=...&Action=DescribeRegions&...
/// ```
///
/// Parameters are sorted by their raw name, case-sensitive, and the result
/// has no trailing newline. A `Signature` entry in `params` is skipped.
pub fn string_to_sign(host: &str, path: &str, params: &BTreeMap<String, String>) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    writeln!(f, "POST")?;
    writeln!(f, "{}", host.to_ascii_lowercase())?;
    writeln!(f, "{path}")?;
    write!(
        f,
        "{}",
        canonical_query(params.iter().filter(|(k, _)| k.as_str() != SIGNATURE))
    )?;

    Ok(f)
}

fn canonical_query<'a>(params: impl IntoIterator<Item = (&'a String, &'a String)>) -> String {
    params
        .into_iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
