use super::host::{BrowserHost, TabId};
use crate::error::HostError;
use url::Url;

/// Schemes browsers never let extensions script.
const RESTRICTED_SCHEMES: &[&str] = &[
    "about",
    "chrome",
    "chrome-extension",
    "chrome-search",
    "chrome-untrusted",
    "data",
    "devtools",
    "edge",
    "file",
    "moz-extension",
    "resource",
    "view-source",
];

/// Extension gallery hosts, scripting is blocked there too.
const RESTRICTED_HOSTS: &[&str] = &[
    "chromewebstore.google.com",
    "microsoftedge.microsoft.com",
    "addons.mozilla.org",
];

/// Whether injection into `page_url` is expected to be refused by the browser.
pub fn is_restricted_page(page_url: &str) -> bool {
    let Ok(url) = Url::parse(page_url) else {
        return true;
    };
    if RESTRICTED_SCHEMES.contains(&url.scheme()) {
        return true;
    }
    let Some(host) = url.host_str() else {
        return true;
    };
    if host == "chrome.google.com" {
        return url.path().starts_with("/webstore");
    }
    RESTRICTED_HOSTS.contains(&host)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Injected,
    /// Injection was refused on a page class that never allows it.
    Suppressed,
}

/// Inject the selector into `tab`, swallowing refusals on restricted pages.
///
/// Anything else is logged and handed back to the caller.
pub async fn activate_selector(
    host: &dyn BrowserHost,
    tab: TabId,
    page_url: Option<&str>,
) -> Result<Activation, HostError> {
    match host.inject_selector(tab).await {
        Ok(()) => {
            tracing::debug!(tab, "selector injected");
            Ok(Activation::Injected)
        }
        Err(HostError::Unscriptable { url }) => {
            tracing::debug!(tab, %url, "page refuses scripting; skipping");
            Ok(Activation::Suppressed)
        }
        Err(error) if page_url.is_none_or(is_restricted_page) => {
            tracing::debug!(tab, %error, "injection refused on restricted page");
            Ok(Activation::Suppressed)
        }
        Err(error) => {
            tracing::warn!(
                tab,
                url = page_url.unwrap_or_default(),
                %error,
                "selector injection failed"
            );
            Err(error)
        }
    }
}
