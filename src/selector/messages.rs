//! Localized text shown on the page.

use super::page::{ConfirmPrompt, Notice};
use crate::config::OpenMode;
use crate::messaging::RegisterReason;
use std::time::Duration;

/// How long a permission notice stays up unless clicked away.
pub const NOTICE_DISMISS_AFTER: Duration = Duration::from_millis(5000);

pub fn link_count_label(count: usize) -> String {
    t!("selector.link_count", count = count).into_owned()
}

pub fn open_mode_label(mode: OpenMode) -> String {
    match mode {
        OpenMode::NewTab => t!("selector.mode.new_tab"),
        OpenMode::BackgroundTab => t!("selector.mode.background_tab"),
        OpenMode::NewWindow => t!("selector.mode.new_window"),
    }
    .into_owned()
}

pub fn confirm_prompt(count: usize, mode: OpenMode) -> ConfirmPrompt {
    ConfirmPrompt {
        message: t!(
            "selector.confirm_message",
            count = count,
            mode = open_mode_label(mode)
        )
        .into_owned(),
        open_label: t!("selector.confirm_open").into_owned(),
        cancel_label: t!("selector.confirm_cancel").into_owned(),
    }
}

/// Notice for a refused registration. Only an explicit denial gets the
/// "re-enable from the toolbar" wording.
pub fn permission_notice(reason: RegisterReason) -> Notice {
    let text = match reason {
        RegisterReason::UserDenied => t!("selector.notice.user_denied"),
        RegisterReason::InvalidOrigin | RegisterReason::Unknown => {
            t!("selector.notice.permission_required")
        }
    };
    Notice {
        text: text.into_owned(),
        dismiss_after: NOTICE_DISMISS_AFTER,
    }
}
