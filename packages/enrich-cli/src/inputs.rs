//! Turning files on disk into batch inputs.

use anyhow::{Context, Result};
use enrichment::{group_images, ImageBlob, InputUnit};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One URL per line. Blank lines and `#` comments are skipped.
///
/// Text after ` | ` is passed to the description writer as instructions
/// for that product.
pub fn parse_url_list(text: &str) -> Vec<InputUnit> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once(" | ") {
            Some((url, instructions)) => InputUnit::url(url).with_instructions(instructions),
            None => InputUnit::url(line),
        })
        .collect()
}

pub async fn read_url_list(path: &Path) -> Result<Vec<InputUnit>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read URL list {}", path.display()))?;
    Ok(parse_url_list(&text))
}

/// Image files in `dir`, in filename order, grouped per product.
///
/// A `productN.txt` file holds instructions for product `productN`. Other
/// files that are not images (by extension) are ignored.
pub async fn read_image_dir(dir: &Path) -> Result<Vec<InputUnit>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read image directory {}", dir.display()))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut blobs = Vec::with_capacity(paths.len());
    let mut notes: HashMap<String, String> = HashMap::new();
    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt")) {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            notes.insert(stem.to_lowercase(), text);
            continue;
        }
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let blob = ImageBlob::new(name, bytes);
        if blob.is_image() {
            blobs.push(blob);
        } else {
            debug!(file = %name, "Skipping non-image file");
        }
    }

    let inputs = group_images(blobs)
        .into_iter()
        .map(|unit| match notes.remove(unit.id()) {
            Some(text) => unit.with_instructions(text),
            None => unit,
        })
        .collect();
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_list_skips_blanks_and_comments() {
        let inputs = parse_url_list(
            "# leroy\nhttps://a.example/p/1\n\n  https://a.example/p/2  \n#done\n",
        );
        let ids: Vec<&str> = inputs.iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec!["https://a.example/p/1", "https://a.example/p/2"]);
        assert!(inputs.iter().all(|i| i.instructions().is_none()));
    }

    #[test]
    fn test_url_list_instructions_after_bar() {
        let inputs = parse_url_list("https://a.example/p/1 | Destacar a garantia de 5 anos\n");
        assert_eq!(inputs[0].id(), "https://a.example/p/1");
        assert_eq!(inputs[0].instructions(), Some("Destacar a garantia de 5 anos"));
    }

    #[tokio::test]
    async fn test_image_dir_groups_by_product_prefix() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["product2_a.jpg", "product1_b.png", "product1_a.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), [1u8, 2, 3]).unwrap();
        }

        let inputs = read_image_dir(dir.path()).await.unwrap();

        let ids: Vec<&str> = inputs.iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec!["product1", "product2"]);
        assert_eq!(inputs[0].images().len(), 2);
        assert_eq!(inputs[0].images()[0].filename, "product1_a.jpg");
        assert!(inputs[0].instructions().is_none());
    }

    #[tokio::test]
    async fn test_image_dir_reads_product_notes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("product1_a.jpg"), [1u8]).unwrap();
        std::fs::write(dir.path().join("product2_a.jpg"), [1u8]).unwrap();
        std::fs::write(dir.path().join("Product1.txt"), "Produto importado\n").unwrap();

        let inputs = read_image_dir(dir.path()).await.unwrap();

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].instructions(), Some("Produto importado"));
        assert_eq!(inputs[1].instructions(), None);
    }
}
