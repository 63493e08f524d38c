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

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

// Env values used to configure the client.
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const AWS_REGION: &str = "AWS_REGION";
pub const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const AWS_ENDPOINT_URL_EC2: &str = "AWS_ENDPOINT_URL_EC2";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_VERSION: &str = "2012-07-20";

pub const SIGNATURE_VERSION: &str = "2";
pub const SIGNATURE_METHOD: &str = "HmacSHA256";

// Envelope fields.
pub const ACTION: &str = "Action";
pub const AWS_ACCESS_KEY_ID_PARAM: &str = "AWSAccessKeyId";
pub const TIMESTAMP: &str = "Timestamp";
pub const VERSION: &str = "Version";
pub const SIGNATURE_VERSION_PARAM: &str = "SignatureVersion";
pub const SIGNATURE_METHOD_PARAM: &str = "SignatureMethod";
pub const SECURITY_TOKEN: &str = "SecurityToken";
pub const SIGNATURE: &str = "Signature";

/// Envelope fields owned by the signer; callers may not set them.
pub const RESERVED_PARAMS: &[&str] = &[
    AWS_ACCESS_KEY_ID_PARAM,
    TIMESTAMP,
    VERSION,
    SIGNATURE_VERSION_PARAM,
    SIGNATURE_METHOD_PARAM,
    SECURITY_TOKEN,
    SIGNATURE,
];

/// Elements that always parse into a list.
pub const FORCE_LIST_ELEMENTS: &[&str] = &["item", "Errors"];

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// AsciiSet for [AWS UriEncode](https://docs.aws.amazon.com/AWSEC2/latest/APIReference/Query-Requests.html)
///
/// - URI encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
pub static AWS_QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
