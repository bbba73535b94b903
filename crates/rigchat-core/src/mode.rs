use serde::{Deserialize, Serialize};

/// What the assistant is being asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    #[serde(rename = "product-recommendation")]
    Recommendation,
    #[serde(rename = "order-inquiry")]
    OrderInquiry,
}

impl Mode {
    /// Wire name sent as the request `type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Recommendation => "product-recommendation",
            Mode::OrderInquiry => "order-inquiry",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "product-recommendation" | "recommendation" | "recommend" | "product" | "products" => {
                Some(Mode::Recommendation)
            }
            "order-inquiry" | "order" | "orders" | "inquiry" => Some(Mode::OrderInquiry),
            _ => None,
        }
    }

    pub fn all() -> Vec<Mode> {
        vec![Mode::Recommendation, Mode::OrderInquiry]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Recommendation => "Product recommendations",
            Mode::OrderInquiry => "Order inquiries",
        }
    }

    /// Seed message for a fresh transcript in this mode.
    pub fn welcome_message(&self) -> &'static str {
        match self {
            Mode::Recommendation => {
                "Hi! I can help you pick mining hardware. Tell me your budget, \
                 power cost and which coin you want to mine."
            }
            Mode::OrderInquiry => {
                "Hi! Ask me about your recent orders, shipping status or returns."
            }
        }
    }
}
