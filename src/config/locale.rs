const SUPPORTED: [&str; 2] = ["en", "ko"];

fn detect_system_locale() -> Option<String> {
    std::env::var("LANG")
        .or_else(|_| std::env::var("LC_MESSAGES"))
        .ok()
        .map(|lang| lang.trim().to_lowercase())
        .filter(|lang| !lang.is_empty())
}

/// Detect locale: `LINKSWEEP_LANG` env -> `--locale` flag -> system `LANG` -> `"en"`.
/// Unsupported languages fall back to `"en"`.
fn detect_locale(requested: Option<&str>) -> String {
    let candidate = std::env::var("LINKSWEEP_LANG")
        .ok()
        .map(|lang| lang.trim().to_lowercase())
        .filter(|lang| !lang.is_empty())
        .or_else(|| {
            requested
                .map(|lang| lang.trim().to_lowercase())
                .filter(|lang| !lang.is_empty())
        })
        .or_else(detect_system_locale);

    match candidate.map(|raw| normalise_locale(&raw)) {
        Some(lang) if SUPPORTED.contains(&lang.as_str()) => lang,
        _ => "en".into(),
    }
}

/// Normalise `"ko_KR.UTF-8"` -> `"ko"`, `"en_US"` -> `"en"`, passthrough `"ko"`.
fn normalise_locale(raw: &str) -> String {
    let base = raw.split('.').next().unwrap_or(raw);
    let lang = base.split(['_', '-']).next().unwrap_or(base);
    lang.to_string()
}

/// Pick the UI language and install it for every `t!` lookup.
pub fn apply_locale(requested: Option<&str>) -> String {
    let locale = detect_locale(requested);
    rust_i18n::set_locale(&locale);
    locale
}
