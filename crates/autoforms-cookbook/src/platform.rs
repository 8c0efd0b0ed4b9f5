//! Hosted-platform detection from a target URL.

use url::Url;

/// Known applicant-tracking platforms, matched by host suffix.
const PLATFORM_HOSTS: &[(&str, &str)] = &[
    ("myworkdayjobs.com", "workday"),
    ("myworkday.com", "workday"),
    ("greenhouse.io", "greenhouse"),
    ("lever.co", "lever"),
    ("ashbyhq.com", "ashby"),
    ("icims.com", "icims"),
    ("smartrecruiters.com", "smartrecruiters"),
    ("taleo.net", "taleo"),
    ("bamboohr.com", "bamboohr"),
    ("jobvite.com", "jobvite"),
    ("linkedin.com", "linkedin"),
];

/// Platform tag for `url`, or `None` for an unrecognized host.
pub fn detect_platform(url: &str) -> Option<&'static str> {
    let host = Url::parse(url).ok()?.host_str()?.to_ascii_lowercase();
    PLATFORM_HOSTS
        .iter()
        .find(|(suffix, _)| host == *suffix || host.ends_with(&format!(".{}", suffix)))
        .map(|(_, platform)| *platform)
}
