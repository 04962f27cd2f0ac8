//! Pattern detectors for the built-in info types.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::info_type::{InfoType, Likelihood};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}\b")
        .expect("valid email regex")
});

// International numbers: +CC followed by up to five digit groups. Otherwise a
// North-American 3-3-4 layout.
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\+\d{1,3}(?:[ .-]?(?:\(\d{1,4}\)|\d{1,4})){2,5}|(?:\(\d{3}\)|\b\d{3})[ .-]?\d{3}[ .-]?\d{4}\b",
    )
    .expect("valid phone regex")
});

static CREDIT_CARD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d[ -]?){12,18}\d\b").expect("valid credit card regex"));

static DIGIT_GROUP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("valid digit group regex"));

static SSN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3})-(\d{2})-(\d{4})\b").expect("valid SSN regex"));

static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})\b").expect("valid IPv4 regex")
});

/// Controls what the inspector looks for and what it reports.
#[derive(Debug, Clone)]
pub struct InspectConfig {
    /// Info types to detect. Empty means every built-in type.
    pub info_types: Vec<InfoType>,
    /// Findings rated below this are dropped.
    pub min_likelihood: Likelihood,
    /// Maximum findings reported per object; 0 means unlimited.
    pub max_findings: usize,
    /// Whether findings carry the matched text.
    pub include_quote: bool,
}

impl Default for InspectConfig {
    fn default() -> Self {
        InspectConfig {
            info_types: InfoType::ALL.to_vec(),
            min_likelihood: Likelihood::Possible,
            max_findings: 0,
            include_quote: true,
        }
    }
}

/// A single detected occurrence of an info type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub info_type: InfoType,
    pub likelihood: Likelihood,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    /// Byte offset of the match within the inspected text.
    pub offset: usize,
}

/// Runs the configured detectors over text.
#[derive(Debug, Clone)]
pub struct Inspector {
    config: InspectConfig,
}

impl Inspector {
    pub fn new(mut config: InspectConfig) -> Self {
        if config.info_types.is_empty() {
            config.info_types = InfoType::ALL.to_vec();
        }
        config.info_types.sort();
        config.info_types.dedup();
        Inspector { config }
    }

    pub fn config(&self) -> &InspectConfig {
        &self.config
    }

    /**
        Inspects `text` and returns the findings ordered by offset.

        Card-number candidates are always located first, even when
        `CREDIT_CARD_NUMBER` was not requested, so their digit groups are never
        reported as phone numbers.
    */
    pub fn inspect(&self, text: &str) -> Vec<Finding> {
        let cards = credit_card_spans(text);
        let mut raw: Vec<(InfoType, Likelihood, Range<usize>)> = Vec::new();

        for &info_type in &self.config.info_types {
            match info_type {
                InfoType::EmailAddress => {
                    for m in EMAIL_REGEX.find_iter(text) {
                        raw.push((info_type, Likelihood::Likely, m.range()));
                    }
                }
                InfoType::PhoneNumber => {
                    for m in PHONE_REGEX.find_iter(text) {
                        let span = m.range();
                        if cards.iter().any(|c| overlaps(c, &span)) {
                            continue;
                        }
                        if let Some(likelihood) = rate_phone(m.as_str()) {
                            raw.push((info_type, likelihood, span));
                        }
                    }
                }
                InfoType::CreditCardNumber => {
                    for span in &cards {
                        raw.push((info_type, Likelihood::VeryLikely, span.clone()));
                    }
                }
                InfoType::UsSocialSecurityNumber => {
                    for caps in SSN_REGEX.captures_iter(text) {
                        if valid_ssn(&caps[1], &caps[2], &caps[3]) {
                            if let Some(m) = caps.get(0) {
                                raw.push((info_type, Likelihood::Likely, m.range()));
                            }
                        }
                    }
                }
                InfoType::IpAddress => {
                    for caps in IPV4_REGEX.captures_iter(text) {
                        let octets_ok = (1..=4).all(|i| {
                            caps.get(i)
                                .and_then(|o| o.as_str().parse::<u16>().ok())
                                .is_some_and(|v| v <= 255)
                        });
                        if let (true, Some(m)) = (octets_ok, caps.get(0)) {
                            raw.push((info_type, Likelihood::Likely, m.range()));
                        }
                    }
                }
            }
        }

        raw.retain(|(_, likelihood, _)| *likelihood >= self.config.min_likelihood);
        raw.sort_by(|a, b| a.2.start.cmp(&b.2.start).then(a.0.cmp(&b.0)));
        if self.config.max_findings > 0 {
            raw.truncate(self.config.max_findings);
        }

        raw.into_iter()
            .map(|(info_type, likelihood, span)| Finding {
                info_type,
                likelihood,
                quote: self
                    .config
                    .include_quote
                    .then(|| text[span.clone()].to_string()),
                offset: span.start,
            })
            .collect()
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn credit_card_spans(text: &str) -> Vec<Range<usize>> {
    CREDIT_CARD_REGEX
        .find_iter(text)
        .filter_map(|m| {
            best_card_in(m.as_str()).map(|span| m.start() + span.start..m.start() + span.end)
        })
        .collect()
}

/**
    Finds the longest run of whole digit groups within a candidate that forms a
    Luhn-valid card number of 13 to 19 digits.

    The candidate regex is greedy, so an expiry date or CVV written after the
    number ends up in the same match. Cuts only fall between groups; the
    earliest run wins a tie.
*/
fn best_card_in(candidate: &str) -> Option<Range<usize>> {
    let groups: Vec<Range<usize>> = DIGIT_GROUP_REGEX
        .find_iter(candidate)
        .map(|m| m.range())
        .collect();

    let mut best: Option<(usize, Range<usize>)> = None;
    for (i, first) in groups.iter().enumerate() {
        let mut digits = String::new();
        for last in &groups[i..] {
            digits.push_str(&candidate[last.clone()]);
            if digits.len() > 19 {
                break;
            }
            let longer = best.as_ref().map_or(true, |(len, _)| digits.len() > *len);
            if digits.len() >= 13 && longer && luhn_valid(&digits) {
                best = Some((digits.len(), first.start..last.end));
            }
        }
    }
    best.map(|(_, span)| span)
}

/// Rates a phone candidate, or rejects it when the digit count is implausible.
fn rate_phone(candidate: &str) -> Option<Likelihood> {
    let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
    if !(10..=15).contains(&digits) {
        return None;
    }
    let formatted = candidate
        .chars()
        .any(|c| matches!(c, '+' | '(' | '-' | '.' | ' '));
    Some(if formatted {
        Likelihood::Likely
    } else {
        Likelihood::Possible
    })
}

fn valid_ssn(area: &str, group: &str, serial: &str) -> bool {
    area != "000" && area != "666" && !area.starts_with('9') && group != "00" && serial != "0000"
}

/**
    Returns true if the digit string passes the Luhn checksum.

    # Examples

    ```
    use s3inspect::detector::luhn_valid;
    assert!(luhn_valid("4111111111111111"));
    assert!(!luhn_valid("4111111111111112"));
    ```
*/
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(digit) = c.to_digit(10) else {
            return false;
        };
        let value = if i % 2 == 1 { digit * 2 } else { digit };
        sum += if value > 9 { value - 9 } else { value };
    }
    !digits.is_empty() && sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(findings: &[Finding]) -> Vec<InfoType> {
        findings.iter().map(|f| f.info_type).collect()
    }

    #[test]
    fn test_detects_email() {
        let inspector = Inspector::new(InspectConfig::default());
        let findings = inspector.inspect("My email is gary@somedomain.com, thanks.");
        assert_eq!(types(&findings), vec![InfoType::EmailAddress]);
        assert_eq!(findings[0].quote.as_deref(), Some("gary@somedomain.com"));
        assert_eq!(findings[0].likelihood, Likelihood::Likely);
        assert_eq!(findings[0].offset, 12);
    }

    #[test]
    fn test_no_findings_in_harmless_text() {
        let inspector = Inspector::new(InspectConfig::default());
        let findings = inspector.inspect("This file is mostly harmless.\n");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_restricts_to_requested_info_types() {
        let inspector = Inspector::new(InspectConfig {
            info_types: vec![InfoType::EmailAddress],
            ..Default::default()
        });
        let findings = inspector.inspect("Call (223) 456-7890 or mail jack@example.org");
        assert_eq!(types(&findings), vec![InfoType::EmailAddress]);
    }

    #[test]
    fn test_empty_info_types_means_all() {
        let inspector = Inspector::new(InspectConfig {
            info_types: Vec::new(),
            ..Default::default()
        });
        assert_eq!(inspector.config().info_types, InfoType::ALL.to_vec());
    }

    #[test]
    fn test_credit_card_requires_luhn() {
        let inspector = Inspector::new(InspectConfig::default());
        let findings = inspector.inspect("card: 4111 1111 1111 1111");
        assert_eq!(types(&findings), vec![InfoType::CreditCardNumber]);
        assert_eq!(findings[0].likelihood, Likelihood::VeryLikely);

        let findings = inspector.inspect("card: 4111 1111 1111 1112");
        assert!(!types(&findings).contains(&InfoType::CreditCardNumber));
    }

    #[test]
    fn test_credit_card_followed_by_expiry() {
        let inspector = Inspector::new(InspectConfig::default());
        let findings = inspector.inspect("Card 4111 1111 1111 1111 12/25");
        let cards: Vec<_> = findings
            .iter()
            .filter(|f| f.info_type == InfoType::CreditCardNumber)
            .collect();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].quote.as_deref(), Some("4111 1111 1111 1111"));
        assert_eq!(cards[0].offset, 5);
        assert_eq!(cards[0].likelihood, Likelihood::VeryLikely);
    }

    #[test]
    fn test_credit_card_followed_by_cvv() {
        let inspector = Inspector::new(InspectConfig {
            info_types: vec![InfoType::CreditCardNumber],
            ..Default::default()
        });
        let findings = inspector.inspect("4111111111111111 123");
        assert_eq!(types(&findings), vec![InfoType::CreditCardNumber]);
        assert_eq!(findings[0].quote.as_deref(), Some("4111111111111111"));
    }

    #[test]
    fn test_credit_card_after_leading_digits() {
        let inspector = Inspector::new(InspectConfig {
            info_types: vec![InfoType::CreditCardNumber],
            ..Default::default()
        });
        let findings = inspector.inspect("ref 12 4012 8888 8888 1881");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].quote.as_deref(), Some("4012 8888 8888 1881"));
    }

    #[test]
    fn test_best_card_in_cuts_only_between_groups() {
        assert_eq!(best_card_in("4111 1111 1111 1111 12"), Some(0..19));
        // 17 contiguous digits cannot be cut inside the run.
        assert_eq!(best_card_in("41111111111111112"), None);
    }

    #[test]
    fn test_international_phone() {
        let inspector = Inspector::new(InspectConfig {
            info_types: vec![InfoType::PhoneNumber],
            ..Default::default()
        });
        let findings = inspector.inspect("Call +44 20 7946 0958 today");
        assert_eq!(types(&findings), vec![InfoType::PhoneNumber]);
        assert_eq!(findings[0].quote.as_deref(), Some("+44 20 7946 0958"));
        assert_eq!(findings[0].likelihood, Likelihood::Likely);

        let findings = inspector.inspect("Büro: +49 (30) 901820");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].quote.as_deref(), Some("+49 (30) 901820"));
    }

    #[test]
    fn test_short_international_number_rejected() {
        let inspector = Inspector::new(InspectConfig {
            info_types: vec![InfoType::PhoneNumber],
            ..Default::default()
        });
        assert!(inspector.inspect("ext +1 22 333").is_empty());
    }

    #[test]
    fn test_card_digits_not_reported_as_phone() {
        let inspector = Inspector::new(InspectConfig {
            info_types: vec![InfoType::PhoneNumber],
            ..Default::default()
        });
        assert!(inspector.inspect("4012-8888-8888-1881").is_empty());
    }

    #[test]
    fn test_phone_likelihood_depends_on_formatting() {
        let inspector = Inspector::new(InspectConfig {
            info_types: vec![InfoType::PhoneNumber],
            min_likelihood: Likelihood::VeryUnlikely,
            ..Default::default()
        });
        let formatted = inspector.inspect("phone: (223) 456-7890");
        assert_eq!(formatted.len(), 1);
        assert_eq!(formatted[0].likelihood, Likelihood::Likely);

        let bare = inspector.inspect("phone: 2234567890");
        assert_eq!(bare.len(), 1);
        assert_eq!(bare[0].likelihood, Likelihood::Possible);
    }

    #[test]
    fn test_min_likelihood_filters() {
        let inspector = Inspector::new(InspectConfig {
            min_likelihood: Likelihood::VeryLikely,
            ..Default::default()
        });
        let findings =
            inspector.inspect("jack@example.org 4111111111111111 (223) 456-7890");
        assert_eq!(types(&findings), vec![InfoType::CreditCardNumber]);
    }

    #[test]
    fn test_ssn_validation() {
        let inspector = Inspector::new(InspectConfig {
            info_types: vec![InfoType::UsSocialSecurityNumber],
            ..Default::default()
        });
        assert_eq!(inspector.inspect("SSN 222-22-2222").len(), 1);
        assert!(inspector.inspect("SSN 666-22-2222").is_empty());
        assert!(inspector.inspect("SSN 912-22-2222").is_empty());
        assert!(inspector.inspect("SSN 222-00-2222").is_empty());
    }

    #[test]
    fn test_ip_address_octets() {
        let inspector = Inspector::new(InspectConfig {
            info_types: vec![InfoType::IpAddress],
            ..Default::default()
        });
        assert_eq!(inspector.inspect("host 10.0.12.254 up").len(), 1);
        assert!(inspector.inspect("host 10.0.12.256 up").is_empty());
    }

    #[test]
    fn test_findings_ordered_and_truncated() {
        let inspector = Inspector::new(InspectConfig {
            max_findings: 2,
            ..Default::default()
        });
        let findings = inspector.inspect("a@example.com b@example.com c@example.com");
        assert_eq!(findings.len(), 2);
        assert!(findings[0].offset < findings[1].offset);
        assert_eq!(findings[1].quote.as_deref(), Some("b@example.com"));
    }

    #[test]
    fn test_quotes_can_be_omitted() {
        let inspector = Inspector::new(InspectConfig {
            include_quote: false,
            ..Default::default()
        });
        let findings = inspector.inspect("jack@example.org");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].quote.is_none());
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4012888888881881"));
        assert!(luhn_valid("378282246310005"));
        assert!(!luhn_valid("1234567812345678"));
        assert!(!luhn_valid(""));
        assert!(!luhn_valid("41x1"));
    }
}
