// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for webhook requests.

use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Generate dotted event names of varying depth.
pub fn generate_event_names(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 3 {
            0 => format!("event{}", i),
            1 => format!("group.event{}", i),
            _ => format!("group.v{}.event{}", i % 5, i),
        })
        .collect()
}

/// A WAHA-style payload for an event.
pub fn payload(event: &str, from_me: bool) -> Value {
    json!({
        "id": "evt_01",
        "session": "default",
        "event": event,
        "payload": {
            "fromMe": from_me,
            "body": "hello",
        },
        "me": { "id": "15551234567@c.us" },
    })
}

/// User agents of crawlers and link previewers.
pub fn bot_user_agents() -> Vec<&'static str> {
    vec![
        "Googlebot/2.1 (+http://www.google.com/bot.html)",
        "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
        "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)",
        "Slackbot-LinkExpanding 1.0 (+https://api.slack.com/robots)",
        "Twitterbot/1.0",
        "Mozilla/5.0 (compatible; YandexBot/3.0)",
        "curl/8.4.0",
        "python-requests/2.31.0",
    ]
}

/// User agents of ordinary HTTP clients.
pub fn client_user_agents() -> Vec<&'static str> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
        "axios/1.6.2",
        "WAHA/2024.12",
    ]
}

/// Header values that differ from `expected` in ways a naive comparison might miss.
pub fn near_miss_keys(expected: &str) -> Vec<String> {
    vec![
        expected.to_uppercase(),
        format!("{} ", expected),
        format!(" {}", expected),
        format!("{}x", expected),
        expected[..expected.len().saturating_sub(1)].to_string(),
        String::new(),
        format!("Bearer {}", expected),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_generate_event_names() {
        let names = generate_event_names(9);
        assert_eq!(names.len(), 9);
        assert!(names.iter().any(|n| n.matches('.').count() == 2));
    }

    #[test]
    fn test_near_miss_keys_never_match() {
        let expected = "s3cret-key";
        assert!(near_miss_keys(expected).iter().all(|k| k != expected));
    }
}
