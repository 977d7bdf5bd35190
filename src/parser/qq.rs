//! Parser for the Tencent QQ for Linux download page.
//!
//! The page embeds its download links in an inline script:
//!
//! ```text
//! var params = {"x64DownloadUrl":{"deb":"https://.../QQ_3.2.19_250904_amd64_01.deb", ...},
//!               "armDownloadUrl":{"deb":"..."},
//!               "loongarchDownloadUrl":{"deb":"..."} | "...",
//!               "mipsDownloadUrl":{"deb":"..."} | "..."};
//! ```
//!
//! The version is not published separately; it is read from the x86_64 file
//! name, which follows `QQ_<version>_amd64`.

use super::VersionProbe;
use crate::core::Architecture;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

/// [`VersionProbe`] for `https://im.qq.com/linuxqq/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QqProbe;

fn params_regex() -> Option<&'static Regex> {
    static PARAMS: OnceLock<Option<Regex>> = OnceLock::new();
    PARAMS.get_or_init(|| Regex::new(r"(?s)var params\s*=\s*(\{.*?\});").ok()).as_ref()
}

fn version_regex() -> Option<&'static Regex> {
    static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
    VERSION.get_or_init(|| Regex::new(r"QQ_([\d._]+)_amd64").ok()).as_ref()
}

impl QqProbe {
    /// Decode the `var params = {...};` object, if the page has one.
    fn params(response: &str) -> Option<Value> {
        let literal = params_regex()?.captures(response)?.get(1)?.as_str();
        match serde_json::from_str(literal) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Failed to decode QQ params object: {}", e);
                None
            }
        }
    }

    /// Upstream key holding the download entry for `arch`.
    const fn field_for(arch: Architecture) -> &'static str {
        match arch {
            Architecture::X86_64 => "x64DownloadUrl",
            Architecture::Aarch64 => "armDownloadUrl",
            Architecture::Loong64 => "loongarchDownloadUrl",
            Architecture::Mips64el => "mipsDownloadUrl",
        }
    }
}

/// Entries are either `{"deb": "<url>", ...}` or a bare `"<url>"`.
fn deb_url(entry: &Value) -> Option<String> {
    let url = match entry {
        Value::String(url) => url.as_str(),
        Value::Object(map) => map.get("deb")?.as_str()?,
        _ => return None,
    };
    (!url.is_empty()).then(|| url.to_string())
}

impl VersionProbe for QqProbe {
    fn parse_version(&self, response: &str) -> Option<String> {
        let url = self.parse_download_url(Architecture::X86_64, response)?;
        let version = version_regex()?.captures(&url)?.get(1)?.as_str().to_string();
        Some(version)
    }

    fn parse_download_url(&self, arch: Architecture, response: &str) -> Option<String> {
        let params = Self::params(response)?;
        deb_url(params.get(Self::field_for(arch))?)
    }
}
