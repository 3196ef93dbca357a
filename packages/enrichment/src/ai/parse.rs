//! Reading structured model replies.
//!
//! Models wrap JSON in code fences or prose now and then; both are
//! tolerated. Anything else that does not match the expected shape is a
//! generation-format error for the item.

use openai_client::{extract_json_object, strip_code_blocks};
use serde_json::{Map, Value};

use crate::error::{ItemError, ItemResult};
use crate::types::product::ExtractionResult;

/// Locate and parse the JSON object in a reply.
pub fn reply_object(reply: &str) -> ItemResult<Map<String, Value>> {
    let span = extract_json_object(strip_code_blocks(reply)).ok_or_else(|| {
        ItemError::GenerationFormat("the AI reply contained no JSON object".into())
    })?;

    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ItemError::GenerationFormat(
            "the AI reply was not a JSON object".into(),
        )),
        Err(_) => Err(ItemError::GenerationFormat(
            "the AI reply was not valid JSON".into(),
        )),
    }
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| match map.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Description text from `{"description": ...}` (or `descricao`).
pub fn description(reply: &str) -> ItemResult<String> {
    let map = reply_object(reply)?;
    let text = text_field(&map, &["description", "descricao"]);
    if text.is_empty() {
        return Err(ItemError::GenerationFormat(
            "the AI reply had no description text".into(),
        ));
    }
    Ok(text)
}

/// Product attributes from a vision reply.
///
/// Accepts English and Portuguese keys. `specifications` may be a list of
/// strings or an object of key/value pairs.
pub fn vision_product(reply: &str) -> ItemResult<ExtractionResult> {
    let map = reply_object(reply)?;

    let specifications = match map.get("specifications").or_else(|| map.get("especificacoes")) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::Object(pairs)) => pairs
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| format!("{}: {}", k, v.trim())))
            .collect(),
        _ => Vec::new(),
    };

    Ok(ExtractionResult {
        title: text_field(&map, &["title", "nome_produto", "name"]),
        price: text_field(&map, &["price", "preco"]),
        brand: text_field(&map, &["brand", "marca"]),
        ean: text_field(&map, &["ean", "gtin"]),
        image_urls: Vec::new(),
        specifications,
        description: None,
        source_url: None,
    })
}
