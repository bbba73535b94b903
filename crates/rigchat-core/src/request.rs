use serde::Serialize;
use serde_json::Value;

use crate::mode::Mode;
use crate::state::{ChatMessage, Transcript};

/// Auxiliary data supplied by the catalog and order-history providers.
///
/// The values are opaque to the streaming core and forwarded as-is.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub products: Vec<Value>,
    pub orders: Vec<Value>,
    pub user_id: Option<String>,
}

impl RequestContext {
    pub fn with_products(mut self, products: Vec<Value>) -> Self {
        self.products = products;
        self
    }

    pub fn with_orders(mut self, orders: Vec<Value>) -> Self {
        self.orders = orders;
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Outbound body for the completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(rename = "type")]
    pub mode: Mode,
    pub messages: Vec<ChatMessage>,
    pub product_data: Option<Vec<Value>>,
    pub order_data: Option<Vec<Value>>,
}

impl ChatRequest {
    /// Assemble the body for `mode` from the whole transcript.
    ///
    /// Products are attached in recommendation mode. Orders are attached in
    /// order-inquiry mode, and only for a known user.
    pub fn build(mode: Mode, transcript: &Transcript, context: &RequestContext) -> Self {
        let product_data = match mode {
            Mode::Recommendation => Some(context.products.clone()),
            Mode::OrderInquiry => None,
        };
        let order_data = match (mode, &context.user_id) {
            (Mode::OrderInquiry, Some(_)) => Some(context.orders.clone()),
            _ => None,
        };

        Self {
            mode,
            messages: transcript.messages().to_vec(),
            product_data,
            order_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transcript() -> Transcript {
        let mut transcript = Transcript::seeded("Welcome");
        transcript.push_user("Cheapest ASIC?");
        transcript
    }

    #[test]
    fn test_recommendation_body_shape() {
        let context = RequestContext::default()
            .with_products(vec![json!({"name": "Antminer S19", "price": 1999})])
            .with_orders(vec![json!({"id": 1})])
            .with_user("u-1");
        let request = ChatRequest::build(Mode::Recommendation, &transcript(), &context);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["type"], "product-recommendation");
        assert_eq!(body["messages"][0], json!({"role": "assistant", "content": "Welcome"}));
        assert_eq!(body["messages"][1], json!({"role": "user", "content": "Cheapest ASIC?"}));
        assert_eq!(body["productData"][0]["name"], "Antminer S19");
        assert!(body["orderData"].is_null());
    }

    #[test]
    fn test_order_inquiry_attaches_orders_for_known_user() {
        let context = RequestContext::default()
            .with_products(vec![json!({"name": "x"})])
            .with_orders(vec![json!({"id": "ord-9", "status": "shipped"})])
            .with_user("u-1");
        let body = serde_json::to_value(ChatRequest::build(
            Mode::OrderInquiry,
            &transcript(),
            &context,
        ))
        .unwrap();

        assert_eq!(body["type"], "order-inquiry");
        assert!(body["productData"].is_null());
        assert_eq!(body["orderData"][0]["status"], "shipped");
    }

    #[test]
    fn test_order_inquiry_without_user_has_no_orders() {
        let context = RequestContext::default().with_orders(vec![json!({"id": 1})]);
        let request = ChatRequest::build(Mode::OrderInquiry, &transcript(), &context);
        assert_eq!(request.order_data, None);
    }
}
