use super::host::{BrowserHost, NewTab};
use crate::config::{OpenMode, clamp_max_tabs};
use crate::messaging::{OpenLinksOutcome, OpenLinksRequest};

/// Open `request.links` under its open mode, never more than `max_tabs`.
///
/// Creation calls are issued in input order. A failed tab is logged and the
/// rest of the batch still opens; nothing already opened is rolled back.
pub async fn open_links(host: &dyn BrowserHost, request: &OpenLinksRequest) -> OpenLinksOutcome {
    let cap = clamp_max_tabs(i64::from(request.max_tabs)) as usize;
    let links: Vec<&str> = request.links.iter().take(cap).map(String::as_str).collect();
    let count = links.len();

    if request.links.len() > count {
        tracing::debug!(
            requested = request.links.len(),
            cap,
            "truncating link batch to tab cap"
        );
    }

    let success = match request.open_mode {
        OpenMode::NewWindow => open_in_new_window(host, &links).await,
        OpenMode::NewTab => {
            open_as_tabs(host, &links, true).await;
            true
        }
        OpenMode::BackgroundTab => {
            open_as_tabs(host, &links, false).await;
            true
        }
    };

    tracing::info!(mode = %request.open_mode, count, success, "dispatched links");
    OpenLinksOutcome {
        success,
        count: if success { count } else { 0 },
    }
}

/// First link opens the window; the rest join it in the background.
/// Returns `false` only when the window itself could not be created.
async fn open_in_new_window(host: &dyn BrowserHost, links: &[&str]) -> bool {
    let Some((first, rest)) = links.split_first() else {
        return true;
    };

    let window_id = match host.create_window(first).await {
        Ok(id) => id,
        Err(error) => {
            tracing::warn!(url = %first, %error, "failed to open window");
            return false;
        }
    };

    for url in rest {
        let tab = NewTab {
            url: (*url).to_string(),
            window_id: Some(window_id),
            active: false,
        };
        if let Err(error) = host.create_tab(tab).await {
            tracing::warn!(%url, window_id, %error, "failed to open tab in new window");
        }
    }
    true
}

/// One tab per link; with `focus_first` only the first one becomes active.
async fn open_as_tabs(host: &dyn BrowserHost, links: &[&str], focus_first: bool) {
    for (index, url) in links.iter().enumerate() {
        let tab = NewTab {
            url: (*url).to_string(),
            window_id: None,
            active: focus_first && index == 0,
        };
        if let Err(error) = host.create_tab(tab).await {
            tracing::warn!(%url, %error, "failed to open tab");
        }
    }
}
