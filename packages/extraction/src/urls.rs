//! URL helpers: submission validation, applicant-tracking platform
//! detection, and Google Forms recognition.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

use crate::types::record::ExtractionKind;

/// Why a submitted URL was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("invalid URL '{url}': {reason}")]
    Malformed { url: String, reason: String },

    #[error("unsupported scheme '{scheme}' in {url}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("not a Google Forms URL: {url}")]
    NotGoogleForm { url: String },
}

/// Parse an absolute http(s) URL.
pub fn parse_http_url(raw: &str) -> Result<Url, UrlError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|e| UrlError::Malformed {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(UrlError::UnsupportedScheme {
                url: raw.to_string(),
                scheme: scheme.to_string(),
            })
        }
    }
    if url.host_str().is_none() {
        return Err(UrlError::Malformed {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

/// Validate a URL for a batch of `kind`.
pub fn validate_for_kind(raw: &str, kind: ExtractionKind) -> Result<Url, UrlError> {
    let url = parse_http_url(raw)?;
    if kind == ExtractionKind::GoogleForm && !is_google_form_url(&url) {
        return Err(UrlError::NotGoogleForm {
            url: raw.trim().to_string(),
        });
    }
    Ok(url)
}

/// Hosted applicant-tracking systems recognised by URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtsPlatform {
    Greenhouse,
    Lever,
    Ashby,
    Workday,
    SuccessFactors,
    Icims,
    BambooHr,
}

impl AtsPlatform {
    const DOMAINS: [(&'static str, AtsPlatform); 7] = [
        ("greenhouse.io", AtsPlatform::Greenhouse),
        ("lever.co", AtsPlatform::Lever),
        ("ashbyhq.com", AtsPlatform::Ashby),
        ("myworkdayjobs.com", AtsPlatform::Workday),
        ("successfactors.com", AtsPlatform::SuccessFactors),
        ("icims.com", AtsPlatform::Icims),
        ("bamboohr.com", AtsPlatform::BambooHr),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AtsPlatform::Greenhouse => "greenhouse",
            AtsPlatform::Lever => "lever",
            AtsPlatform::Ashby => "ashby",
            AtsPlatform::Workday => "workday",
            AtsPlatform::SuccessFactors => "successfactors",
            AtsPlatform::Icims => "icims",
            AtsPlatform::BambooHr => "bamboohr",
        }
    }
}

impl fmt::Display for AtsPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Detect the applicant-tracking platform hosting `url`.
pub fn detect_ats_platform(url: &Url) -> Option<AtsPlatform> {
    let host = url.host_str()?.to_ascii_lowercase();
    if host_matches(&host, "workday.com") {
        return Some(AtsPlatform::Workday);
    }
    AtsPlatform::DOMAINS
        .iter()
        .find(|(domain, _)| host_matches(&host, domain))
        .map(|(_, platform)| *platform)
}

/// `docs.google.com/forms/...`, `forms.gle/...` or `forms.google.com/...`.
pub fn is_google_form_url(url: &Url) -> bool {
    match url.host_str().map(|h| h.to_ascii_lowercase()) {
        Some(host) if host == "docs.google.com" => url.path().starts_with("/forms"),
        Some(host) => host == "forms.gle" || host == "forms.google.com",
        None => false,
    }
}

/// `/forms/d/<id>` and `/forms/d/e/<id>` paths. `None` only if the literal
/// fails to compile.
static FORM_ID_PATH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/forms/d/(?:e/)?([A-Za-z0-9_-]+)").ok());

/// Form id from a long-form Google Forms URL, or the short-link slug.
pub fn google_form_id(url: &Url) -> Option<String> {
    if !is_google_form_url(url) {
        return None;
    }
    let pattern = FORM_ID_PATH.as_ref()?;
    if let Some(caps) = pattern.captures(url.path()) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    if let Some((_, key)) = url.query_pairs().find(|(k, _)| k == "formkey") {
        return Some(key.into_owned());
    }
    if url.host_str() == Some("forms.gle") {
        return url
            .path_segments()
            .and_then(|mut s| s.next())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }
    None
}

/// Short label for logs: the ATS platform of a job URL or the id of a form.
pub fn source_label(kind: ExtractionKind, raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    match kind {
        ExtractionKind::JobPosting => detect_ats_platform(&url).map(|p| p.to_string()),
        ExtractionKind::GoogleForm => google_form_id(&url).map(|id| format!("form {}", id)),
    }
}
