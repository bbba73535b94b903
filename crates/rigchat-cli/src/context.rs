//! Product catalogue and order history loaded from JSON files.

use anyhow::{bail, Context, Result};
use rigchat_core::RequestContext;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Read a JSON array of records. A single object is accepted as a
/// one-element list.
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    match value {
        Value::Array(records) => Ok(records),
        Value::Object(_) => Ok(vec![value]),
        _ => bail!("{} must contain a JSON array of records", path.display()),
    }
}

pub fn build_context(
    products: Option<&Path>,
    orders: Option<&Path>,
    user: Option<&str>,
) -> Result<RequestContext> {
    let mut context = RequestContext::default();
    if let Some(path) = products {
        let records = load_records(path)?;
        tracing::debug!(count = records.len(), "loaded products");
        context = context.with_products(records);
    }
    if let Some(path) = orders {
        let records = load_records(path)?;
        tracing::debug!(count = records.len(), "loaded orders");
        context = context.with_orders(records);
    }
    if let Some(user) = user {
        context = context.with_user(user);
    }
    Ok(context)
}
