// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::str::FromStr;

use anyhow::bail;
use url::Url;

/// An http(s) URL for the relayer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidUrl(Url);

impl ValidUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl FromStr for ValidUrl {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Relayer url must be http or https, got '{}'", url.scheme());
        }
        Ok(ValidUrl(url))
    }
}

impl From<ValidUrl> for Url {
    fn from(value: ValidUrl) -> Self {
        value.0
    }
}

impl From<ValidUrl> for String {
    fn from(value: ValidUrl) -> Self {
        value.0.to_string()
    }
}
