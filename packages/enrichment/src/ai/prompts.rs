//! Prompt templates for description and vision calls.

use crate::adapters::Retailer;
use crate::traits::generator::GenerationContext;
use crate::types::product::ExtractionResult;

/// System prompt for description generation.
pub const DESCRIPTION_SYSTEM: &str = "You are an e-commerce copywriter writing product \
descriptions in Brazilian Portuguese for online marketplaces.";

/// System prompt for reading product photos.
pub const VISION_SYSTEM: &str = "You read product labels, price tags and packaging \
from photos and report exactly what is printed. Never invent numbers.";

/// What the copy for one store emphasizes.
struct CopyBrief {
    task: &'static str,
    /// Paragraph topics; `{brand}` is replaced with the product brand.
    paragraphs: [&'static str; 3],
    impersonal: bool,
    technical_summary: bool,
}

const CONVERSION: CopyBrief = CopyBrief {
    task: "high-conversion copywriter",
    paragraphs: [
        "Design and appearance.",
        "Technical benefits.",
        "Where and how to use it.",
    ],
    impersonal: false,
    technical_summary: false,
};

const PROFESSIONAL: CopyBrief = CopyBrief {
    task: "professional copywriter for a home improvement store",
    paragraphs: [
        "Physical aspects and design.",
        "Functions and technical differentiators.",
        "Recommended uses and benefits.",
    ],
    impersonal: true,
    technical_summary: true,
};

const SPORTING_GOODS: CopyBrief = CopyBrief {
    task: "high-conversion copywriter for sporting goods",
    paragraphs: [
        "Design and ergonomics (focus on comfort and looks).",
        "Technical differentiators (highlight the technologies of {brand}).",
        "Experience of use (where and how this gear transforms the adventure).",
    ],
    impersonal: false,
    technical_summary: false,
};

const WHOLESALE: CopyBrief = CopyBrief {
    task: "copywriter for a wholesale club",
    paragraphs: [
        "Physical characteristics and packaging.",
        "Functions and technical details.",
        "Recommended uses and benefits.",
    ],
    impersonal: true,
    technical_summary: true,
};

fn brief_for(integration_key: &str) -> &'static CopyBrief {
    match Retailer::from_key(integration_key) {
        Some(Retailer::Sodimac) => &PROFESSIONAL,
        Some(Retailer::Decathlon) => &SPORTING_GOODS,
        Some(Retailer::SamsClub) => &WHOLESALE,
        Some(Retailer::LeroyMerlin) | Some(Retailer::Generic) | None => &CONVERSION,
    }
}

/// User prompt asking for a three-paragraph description.
pub fn description_prompt(product: &ExtractionResult, context: &GenerationContext<'_>) -> String {
    let brief = brief_for(&context.integration.key);
    let store = &context.integration.display_name;

    let brand = product.effective_brand();
    let mut facts = format!("TASK: {}.\nPRODUCT: {}\n", brief.task, product.display_name());
    if !brand.is_empty() {
        facts.push_str(&format!("BRAND: {}\n", brand));
    }
    if !product.ean.is_empty() {
        facts.push_str(&format!("EAN: {}\n", product.ean));
    }
    if let Some(url) = &product.source_url {
        facts.push_str(&format!("URL: {}\n", url));
    }
    if !product.specifications.is_empty() {
        facts.push_str("SPECIFICATIONS:\n");
        for spec in &product.specifications {
            facts.push_str(&format!("- {}\n", spec));
        }
    }

    let brand_name = if brand.is_empty() { "the brand" } else { brand.as_str() };
    let paragraphs = brief
        .paragraphs
        .iter()
        .enumerate()
        .map(|(i, topic)| format!("{}. {}", i + 1, topic.replace("{brand}", brand_name)))
        .collect::<Vec<_>>()
        .join("\n");

    let mut rules = String::from("RULES: ");
    if brief.impersonal {
        rules.push_str("impersonal tone, ");
    }
    rules.push_str(&format!(
        "no emojis, no HTML, no prices, do not mention the store {store}."
    ));
    if brief.technical_summary {
        rules.push_str("\nEnd the text with a line-by-line technical summary.");
    }

    let mut prompt = format!(
        "{facts}
Write a description in at least three clear paragraphs:
{paragraphs}

{rules}
"
    );
    if let Some(instructions) = context.instructions {
        prompt.push_str(&format!("ADDITIONAL INSTRUCTIONS: {}\n", instructions));
    }
    prompt.push_str("Reply with JSON only: {\"description\": \"...\"}");
    prompt
}

/// User prompt for reading one product from several photos.
pub fn vision_prompt(image_count: usize) -> String {
    format!(
        "The {image_count} photos below show the SAME product in any order: a price tag \
(always present), possibly the packaging, and the product itself.

From the price tag read:
- title: full product name (brand + type + size/volume)
- price: price as printed, e.g. \"R$ 1.190,43\"
- ean: the 13-digit barcode number
From the packaging, or from what is visible when there is none:
- brand
- specifications: list of \"key: value\" technical details

Always fill every field, using an empty string when nothing is legible.
Reply with JSON only:
{{\"title\": \"\", \"price\": \"\", \"ean\": \"\", \"brand\": \"\", \"specifications\": []}}"
    )
}
