use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvisoryAction {
    SellImmediately,
    SellSoon,
    Hold,
    Monitor,
    Prepare,
}

impl AdvisoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisoryAction::SellImmediately => "SELL_IMMEDIATELY",
            AdvisoryAction::SellSoon => "SELL_SOON",
            AdvisoryAction::Hold => "HOLD",
            AdvisoryAction::Monitor => "MONITOR",
            AdvisoryAction::Prepare => "PREPARE",
        }
    }
}

impl std::fmt::Display for AdvisoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Info => "info",
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Urgency::Info => "ℹ",
            Urgency::Low => "·",
            Urgency::Medium => "→",
            Urgency::High => "⚠",
            Urgency::Critical => "!",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub action: AdvisoryAction,
    pub message: String,
    pub urgency: Urgency,
}

impl Advisory {
    pub fn new(action: AdvisoryAction, urgency: Urgency, message: impl Into<String>) -> Self {
        Self {
            action,
            message: message.into(),
            urgency,
        }
    }
}
