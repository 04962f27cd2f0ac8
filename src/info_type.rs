//! Info types the inspector can detect and the likelihood scale findings are rated on.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::InspectError;

/// A category of sensitive data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfoType {
    EmailAddress,
    PhoneNumber,
    CreditCardNumber,
    UsSocialSecurityNumber,
    IpAddress,
}

impl InfoType {
    /// Every built-in info type. Used when the caller asks for none in particular.
    pub const ALL: [InfoType; 5] = [
        InfoType::EmailAddress,
        InfoType::PhoneNumber,
        InfoType::CreditCardNumber,
        InfoType::UsSocialSecurityNumber,
        InfoType::IpAddress,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InfoType::EmailAddress => "EMAIL_ADDRESS",
            InfoType::PhoneNumber => "PHONE_NUMBER",
            InfoType::CreditCardNumber => "CREDIT_CARD_NUMBER",
            InfoType::UsSocialSecurityNumber => "US_SOCIAL_SECURITY_NUMBER",
            InfoType::IpAddress => "IP_ADDRESS",
        }
    }
}

impl fmt::Display for InfoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InfoType {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        InfoType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| InspectError::UnknownInfoType(wanted.to_string()))
    }
}

/// How confident a detector is that a match is really of its info type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl Likelihood {
    const ALL: [Likelihood; 5] = [
        Likelihood::VeryUnlikely,
        Likelihood::Unlikely,
        Likelihood::Possible,
        Likelihood::Likely,
        Likelihood::VeryLikely,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Likelihood::VeryUnlikely => "VERY_UNLIKELY",
            Likelihood::Unlikely => "UNLIKELY",
            Likelihood::Possible => "POSSIBLE",
            Likelihood::Likely => "LIKELY",
            Likelihood::VeryLikely => "VERY_LIKELY",
        }
    }
}

impl Default for Likelihood {
    fn default() -> Self {
        Likelihood::Possible
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Likelihood {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Likelihood::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| InspectError::UnknownLikelihood(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info_type_case_insensitive() {
        assert_eq!(
            "email_address".parse::<InfoType>().unwrap(),
            InfoType::EmailAddress
        );
        assert_eq!(
            " CREDIT_CARD_NUMBER ".parse::<InfoType>().unwrap(),
            InfoType::CreditCardNumber
        );
    }

    #[test]
    fn test_parse_unknown_info_type() {
        let err = "FIRST_NAME".parse::<InfoType>().unwrap_err();
        assert!(matches!(err, InspectError::UnknownInfoType(name) if name == "FIRST_NAME"));
    }

    #[test]
    fn test_likelihood_ordering() {
        assert!(Likelihood::VeryUnlikely < Likelihood::Possible);
        assert!(Likelihood::Likely < Likelihood::VeryLikely);
        assert_eq!(Likelihood::default(), Likelihood::Possible);
    }

    #[test]
    fn test_likelihood_round_trips_through_name() {
        for l in Likelihood::ALL {
            assert_eq!(l.name().parse::<Likelihood>().unwrap(), l);
        }
    }

    #[test]
    fn test_serialize_uses_canonical_names() {
        let json = serde_json::to_string(&InfoType::UsSocialSecurityNumber).unwrap();
        assert_eq!(json, "\"US_SOCIAL_SECURITY_NUMBER\"");
        let json = serde_json::to_string(&Likelihood::VeryLikely).unwrap();
        assert_eq!(json, "\"VERY_LIKELY\"");
    }
}
