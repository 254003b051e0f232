//! Social profile lookup.
//!
//! Lookup only — builds profile URLs, no scraping.

use reqwest::blocking::Client;

pub trait SocialProvider {
    /// Resolve the HTTP stack without calling any service.
    fn probe(&self) -> bool;
    fn profile_url(&self, username: &str) -> String;
}

pub struct Instagram;

impl Instagram {
    pub fn new() -> Self {
        Self
    }
}

impl SocialProvider for Instagram {
    fn probe(&self) -> bool {
        Client::builder().build().is_ok()
    }

    fn profile_url(&self, username: &str) -> String {
        format!(
            "https://www.instagram.com/{}",
            username.trim().trim_start_matches('@')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_profile_url() {
        let social = Instagram::new();
        assert_eq!(social.profile_url("nasa"), "https://www.instagram.com/nasa");
        assert_eq!(social.profile_url("@nasa"), "https://www.instagram.com/nasa");
    }
}
