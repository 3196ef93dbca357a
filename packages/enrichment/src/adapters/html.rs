//! Product page scraper.
//!
//! Fetches a product page with reqwest and reads it with `scraper`:
//! - JSON-LD `Product` blocks (name, brand, GTIN, offers, images, properties)
//! - OpenGraph / `product:` meta tags
//! - `<h1>` and `<title>` as a last resort for the name
//!
//! No JavaScript rendering; pages that build the product client-side yield
//! whatever their server-rendered meta tags carry.
//!
//! A page only counts as a product when it has a price, a structured name,
//! or a heading backed by specifications or an EAN. A bare `<title>` is
//! what error and landing pages have too.

use async_trait::async_trait;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use serde_json::Value;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::adapters::retailer::Retailer;
use crate::error::{ConfigError, ConfigResult, ItemError, ItemResult};
use crate::price::format_price;
use crate::traits::adapter::{Extracted, ExtractionAdapter};
use crate::types::input::{InputUnit, SourceType};
use crate::types::product::ExtractionResult;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Request timeout for one page fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

static EAN_IN_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"(?:ean|gtin13|gtin)"\s*:\s*"?(\d{8,14})"#).expect("static regex")
});

/// Where a parsed title came from, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TitleSource {
    Structured,
    Heading,
    DocumentTitle,
    Missing,
}

/// Scrapes product pages of one retailer.
pub struct HtmlProductAdapter {
    client: reqwest::Client,
    retailer: Retailer,
}

impl HtmlProductAdapter {
    /// Adapter with its own HTTP client.
    pub fn new(retailer: Retailer) -> ConfigResult<Self> {
        Ok(Self::with_client(retailer, default_client()?))
    }

    /// Adapter sharing an existing client.
    pub fn with_client(retailer: Retailer, client: reqwest::Client) -> Self {
        Self { client, retailer }
    }

    pub fn retailer(&self) -> Retailer {
        self.retailer
    }

    async fn fetch_html(&self, url: &str) -> ItemResult<String> {
        let host = host_of(url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ItemError::transport(&host, describe_reqwest(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ItemError::transport(&host, format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| ItemError::transport(&host, describe_reqwest(&e)))
    }

    /// Read product attributes from a page's HTML.
    pub fn parse(&self, html: &str, page_url: &str) -> ExtractionResult {
        self.parse_page(html, page_url).0
    }

    fn parse_page(&self, html: &str, page_url: &str) -> (ExtractionResult, TitleSource) {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();

        let mut result = ExtractionResult::new().with_source_url(page_url);
        let mut image_candidates: Vec<String> = Vec::new();

        if let Some(product) = json_ld_products(&document).into_iter().next() {
            apply_json_ld(&mut result, &product, self.retailer, &mut image_candidates);
        }

        // OpenGraph fills what JSON-LD left empty
        if result.title.is_empty() {
            result.title = meta_content(&document, "og:title").unwrap_or_default();
        }
        if result.price.is_empty() {
            if let Some(amount) = meta_content(&document, "product:price:amount")
                .and_then(|a| Decimal::from_str(a.trim()).ok())
            {
                let currency = meta_content(&document, "product:price:currency")
                    .unwrap_or_else(|| "BRL".to_string());
                result.price = format_price(amount, &currency);
            }
        }
        if result.brand.is_empty() {
            result.brand = meta_content(&document, "product:brand").unwrap_or_default();
        }
        image_candidates.extend(meta_contents(&document, "og:image"));

        let title_source = if !result.title.trim().is_empty() {
            TitleSource::Structured
        } else if let Some(heading) = first_text(&document, "h1") {
            result.title = heading;
            TitleSource::Heading
        } else if let Some(title) = first_text(&document, "title") {
            result.title = title;
            TitleSource::DocumentTitle
        } else {
            TitleSource::Missing
        };

        if result.ean.is_empty() {
            if let Some(caps) = EAN_IN_SOURCE.captures(html) {
                result.ean = caps[1].to_string();
            }
        }

        if result.specifications.is_empty() {
            result.specifications = table_specifications(&document);
        }

        image_candidates.extend(img_sources(&document));
        let absolute = image_candidates
            .iter()
            .filter_map(|src| absolutize(base.as_ref(), src));
        result.image_urls = self.retailer.select_images(absolute);

        (result, title_source)
    }
}

fn is_product_page(product: &ExtractionResult, title_source: TitleSource) -> bool {
    if !product.price.trim().is_empty() {
        return true;
    }
    match title_source {
        TitleSource::Structured => true,
        TitleSource::Heading => !product.specifications.is_empty() || !product.ean.is_empty(),
        TitleSource::DocumentTitle | TitleSource::Missing => false,
    }
}

#[async_trait]
impl ExtractionAdapter for HtmlProductAdapter {
    fn source_type(&self) -> SourceType {
        SourceType::Url
    }

    async fn extract(&self, input: &InputUnit) -> ItemResult<Extracted> {
        let Some(url) = input.as_url() else {
            panic!(
                "{} adapter received a {} input",
                self.retailer.key(),
                input.source_type()
            );
        };

        let html = self.fetch_html(url).await?;
        let (product, title_source) = self.parse_page(&html, url);

        debug!(
            retailer = self.retailer.key(),
            url = %url,
            title = %product.title,
            images = product.image_urls.len(),
            "Scraped product page"
        );

        if !is_product_page(&product, title_source) {
            return Err(ItemError::ExtractionEmpty(format!(
                "the page at {} has no product title or price",
                host_of(url)
            )));
        }

        Ok(Extracted::scraped(product))
    }
}

/// HTTP client with a browser user agent and a 15 s timeout.
pub fn default_client() -> ConfigResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        reqwest::header::HeaderValue::from_static("pt-BR,pt;q=0.9,en;q=0.8"),
    );

    reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ConfigError::Invalid {
            key: "http_client".into(),
            reason: e.to_string(),
        })
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

fn describe_reqwest(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "the request timed out".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else if e.is_builder() {
        "invalid URL".to_string()
    } else {
        "the response could not be read".to_string()
    }
}

fn absolutize(base: Option<&Url>, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return None;
    }
    match base {
        Some(base) => base.join(src).ok().map(String::from),
        None => Some(src.to_string()),
    }
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Meta tags are matched on `property` or `name`.
fn meta_contents(document: &Html, key: &str) -> Vec<String> {
    let selector = match Selector::parse(&format!(
        r#"meta[property="{key}"], meta[name="{key}"]"#
    )) {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn meta_content(document: &Html, key: &str) -> Option<String> {
    meta_contents(document, key).into_iter().next()
}

fn img_sources(document: &Html) -> Vec<String> {
    let selector = match Selector::parse("img") {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    let mut sources = Vec::new();
    for el in document.select(&selector) {
        for attr in ["src", "data-src"] {
            if let Some(value) = el.value().attr(attr) {
                sources.push(value.to_string());
            }
        }
        for attr in ["srcset", "data-srcset"] {
            if let Some(value) = el.value().attr(attr) {
                sources.push(first_srcset_entry(value).to_string());
            }
        }
    }
    sources
}

/// First URL of a `srcset` value (`"a.jpg 1x, b.jpg 2x"` -> `"a.jpg"`).
fn first_srcset_entry(srcset: &str) -> &str {
    srcset
        .split(", ")
        .next()
        .and_then(|entry| entry.split_whitespace().next())
        .unwrap_or("")
}

fn table_specifications(document: &Html) -> Vec<String> {
    let (Ok(rows), Ok(cells)) = (Selector::parse("table tr"), Selector::parse("th, td")) else {
        return vec![];
    };

    document
        .select(&rows)
        .filter_map(|row| {
            let texts: Vec<String> = row
                .select(&cells)
                .map(|c| collapse_whitespace(&c.text().collect::<String>()))
                .collect();
            match texts.as_slice() {
                [key, value] if !key.is_empty() && !value.is_empty() => {
                    Some(format!("{}: {}", key, value))
                }
                _ => None,
            }
        })
        .collect()
}

/// All JSON-LD objects typed `Product`, including ones nested in `@graph`.
fn json_ld_products(document: &Html) -> Vec<Value> {
    let selector = match Selector::parse(r#"script[type="application/ld+json"]"#) {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    let mut products = Vec::new();
    for script in document.select(&selector) {
        let text = script.text().collect::<String>();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(value) => collect_products(value, &mut products),
            Err(e) => debug!(error = %e, "Skipping unreadable JSON-LD block"),
        }
    }
    products
}

fn collect_products(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_products(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                collect_products(graph, out);
            }
            let is_product = match map.get("@type") {
                Some(Value::String(t)) => t == "Product",
                Some(Value::Array(types)) => types.iter().any(|t| t == "Product"),
                _ => false,
            };
            if is_product {
                out.push(Value::Object(map));
            }
        }
        _ => {}
    }
}

/// A string, or a number rendered as a string.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decimal(value: &Value) -> Option<Decimal> {
    scalar(value).and_then(|s| Decimal::from_str(&s).ok())
}

fn apply_json_ld(
    result: &mut ExtractionResult,
    product: &Value,
    retailer: Retailer,
    images: &mut Vec<String>,
) {
    if let Some(name) = product.get("name").and_then(scalar) {
        result.title = collapse_whitespace(&name);
    }

    result.brand = match product.get("brand") {
        Some(Value::Object(brand)) => brand.get("name").and_then(scalar),
        Some(other) => scalar(other),
        None => None,
    }
    .unwrap_or_default();

    result.ean = ["gtin13", "gtin", "ean", "gtin14", "gtin12", "gtin8"]
        .iter()
        .find_map(|key| product.get(*key).and_then(scalar))
        .unwrap_or_default();

    let offers: Vec<&Value> = match product.get("offers") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(offer @ Value::Object(_)) => vec![offer],
        _ => vec![],
    };
    if let Some((amount, currency)) = offers.iter().find_map(|o| offer_price(o, retailer)) {
        result.price = format_price(amount, &currency);
    }

    match product.get("image") {
        Some(Value::Array(items)) => images.extend(items.iter().filter_map(image_url)),
        Some(other) => images.extend(image_url(other)),
        None => {}
    }

    if let Some(Value::Array(props)) = product.get("additionalProperty") {
        result.specifications = props
            .iter()
            .filter_map(|p| {
                let name = p.get("name").and_then(scalar)?;
                let value = p.get("value").and_then(scalar)?;
                Some(format!("{}: {}", name, value))
            })
            .collect();
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(scalar),
        _ => None,
    }
}

/// Price and currency of one offer.
///
/// Decathlon lists variant ranges as `lowPrice`/`highPrice`; the highest
/// figure is the list price there.
fn offer_price(offer: &Value, retailer: Retailer) -> Option<(Decimal, String)> {
    let currency = offer
        .get("priceCurrency")
        .and_then(scalar)
        .unwrap_or_else(|| "BRL".to_string());

    let base = offer
        .get("price")
        .and_then(decimal)
        .or_else(|| offer.get("lowPrice").and_then(decimal));

    let amount = match (retailer, base, offer.get("highPrice").and_then(decimal)) {
        (Retailer::Decathlon, Some(base), Some(high)) => base.max(high),
        (_, Some(base), _) => base,
        (_, None, high) => high?,
    };

    Some((amount, currency))
}
