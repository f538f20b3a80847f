//! Crawler detection
//!
//! A request is treated as a crawler when its User-Agent contains one of
//! the known bot substrings, or when a `Signature-Agent` header carries a
//! known agent marker (used by AI assistants browsing on behalf of a
//! user).

/// Known crawler/bot User-Agent substrings, matched case-insensitively.
///
/// Covers the major search engines, social link-preview fetchers, SEO
/// crawlers and AI assistant fetchers.
pub const BOT_SIGNATURES: &[&str] = &[
    // Search engines
    "googlebot",
    "bingbot",
    "slurp",
    "duckduckbot",
    "baiduspider",
    "yandexbot",
    "sogou",
    "exabot",
    "applebot",
    "petalbot",
    // Social link previews
    "facebookexternalhit",
    "facebot",
    "twitterbot",
    "linkedinbot",
    "whatsapp",
    "telegrambot",
    "slackbot",
    "discordbot",
    "pinterestbot",
    // SEO and archive crawlers
    "ia_archiver",
    "semrushbot",
    "ahrefsbot",
    "mj12bot",
    "dotbot",
    "ccbot",
    // AI assistant fetchers
    "gptbot",
    "chatgpt-user",
    "oai-searchbot",
    "claudebot",
    "claude-web",
    "perplexitybot",
    "youbot",
    "bytespider",
    "amazonbot",
    // Generic markers
    "crawler",
    "spider",
];

/// Markers accepted in the `Signature-Agent` header
const SIGNATURE_AGENT_MARKERS: &[&str] = &["chatgpt", "claude", "operator", "agent"];

/// Decide whether a request comes from a crawler.
pub fn is_crawler(user_agent: Option<&str>, signature_agent: Option<&str>) -> bool {
    if let Some(ua) = user_agent {
        let ua = ua.to_lowercase();
        if BOT_SIGNATURES.iter().any(|bot| ua.contains(bot)) {
            return true;
        }
    }

    if let Some(sig) = signature_agent {
        let sig = sig.to_lowercase();
        if SIGNATURE_AGENT_MARKERS.iter().any(|m| sig.contains(m)) {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_bots_detected() {
        let agents = [
            "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
            "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
            "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)",
            "Twitterbot/1.0",
            "Mozilla/5.0 AppleWebKit/537.36 (compatible; GPTBot/1.1)",
            "Slackbot-LinkExpanding 1.0",
        ];
        for agent in agents {
            assert!(is_crawler(Some(agent), None), "should detect {}", agent);
        }
    }

    #[test]
    fn test_browsers_not_detected() {
        let agents = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Version/17.0 Safari/605.1.15",
            "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
        ];
        for agent in agents {
            assert!(!is_crawler(Some(agent), None), "should not detect {}", agent);
        }
    }

    #[test]
    fn test_signature_agent_header() {
        assert!(is_crawler(
            Some("Mozilla/5.0 Chrome/120.0"),
            Some("\"https://chatgpt.com\"")
        ));
        assert!(!is_crawler(Some("Mozilla/5.0 Chrome/120.0"), Some("unrelated")));
    }

    #[test]
    fn test_missing_headers() {
        assert!(!is_crawler(None, None));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(is_crawler(Some("GOOGLEBOT/2.1"), None));
    }
}
