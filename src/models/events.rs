use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Entry of the advertiser registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdvertiserRecord {
    pub advertiser_id: String,
}

/// One observed product view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductView {
    pub advertiser_id: String,
    pub product_id: String,
}

/// Kind of ad event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AdEventType {
    Impression,
    Click,
}

impl AdEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdEventType::Impression => "impression",
            AdEventType::Click => "click",
        }
    }
}

impl Display for AdEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "impression" => Ok(AdEventType::Impression),
            "click" => Ok(AdEventType::Click),
            other => Err(format!("unknown ad event type '{}'", other)),
        }
    }
}

/// One observed ad event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdView {
    pub advertiser_id: String,
    pub product_id: String,
    #[serde(rename = "type")]
    pub event_type: AdEventType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_parse_is_case_insensitive() {
        assert_eq!("impression".parse::<AdEventType>(), Ok(AdEventType::Impression));
        assert_eq!(" Click ".parse::<AdEventType>(), Ok(AdEventType::Click));
        assert!("conversion".parse::<AdEventType>().is_err());
    }

    #[test]
    fn test_ad_view_serializes_type_column() {
        let view = AdView {
            advertiser_id: "A1".to_string(),
            product_id: "P1".to_string(),
            event_type: AdEventType::Click,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "click");
    }
}
