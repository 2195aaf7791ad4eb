use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio::fs;
use url::Url;

use super::Fetcher;
use crate::text::slugify;

/// Download `url` to `<dest_dir>/<slug>.jpg` and return the file name.
pub async fn download_image<F: Fetcher>(
    fetcher: &F,
    url: &Url,
    name: &str,
    dest_dir: impl AsRef<Path>,
) -> Result<String> {
    let slug = slugify(name);
    if slug.is_empty() {
        bail!("no name to derive an image filename from ({})", url);
    }
    let file_name = format!("{}.jpg", slug);
    let dest_dir = dest_dir.as_ref();
    fs::create_dir_all(dest_dir)
        .await
        .with_context(|| format!("creating {:?}", dest_dir))?;

    let dest_path = dest_dir.join(&file_name);
    if dest_path.parent() != Some(dest_dir) {
        bail!("image path {:?} is outside {:?}", dest_path, dest_dir);
    }

    let bytes = fetcher.bytes(url).await?;
    fs::write(&dest_path, &bytes)
        .await
        .with_context(|| format!("writing {:?}", dest_path))?;

    Ok(file_name)
}
