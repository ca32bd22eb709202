//! Summary image renderer.
//!
//! Renders the post-refresh `SummarySnapshot` as an 800x600 SVG document and
//! writes it to `<cache_dir>/summary.svg`. Each render stages into its own
//! temp file in the same directory and is renamed into place, so readers
//! never see a partial image and overlapping renders do not collide.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use orbis_domain::SummarySnapshot;
use orbis_sync::{RenderError, SummaryRenderer};

/// File name of the summary image inside the cache directory.
pub const SUMMARY_FILE_NAME: &str = "summary.svg";

/// Content type served for the summary image.
pub const SUMMARY_CONTENT_TYPE: &str = "image/svg+xml";

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

/// Writes the summary image into a cache directory.
#[derive(Debug, Clone)]
pub struct SvgSummaryRenderer {
    cache_dir: PathBuf,
}

impl SvgSummaryRenderer {
    /// Create a renderer writing into `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Where the image is (or will be) written.
    pub fn summary_path(&self) -> PathBuf {
        summary_path(&self.cache_dir)
    }
}

/// Summary image location for a cache directory.
pub fn summary_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(SUMMARY_FILE_NAME)
}

/// Stage `document` in a fresh temp file under `cache_dir`, then rename it over `target`.
fn write_atomically(cache_dir: &Path, target: &Path, document: &[u8]) -> std::io::Result<()> {
    let mut staged = NamedTempFile::new_in(cache_dir)?;
    staged.write_all(document)?;
    staged.as_file().sync_all()?;
    staged.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl SummaryRenderer for SvgSummaryRenderer {
    async fn render(&self, snapshot: &SummarySnapshot) -> Result<PathBuf, RenderError> {
        let document = render_svg(snapshot);
        let bytes = document.len();

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let target = self.summary_path();
        let cache_dir = self.cache_dir.clone();
        let destination = target.clone();
        tokio::task::spawn_blocking(move || {
            write_atomically(&cache_dir, &destination, document.as_bytes())
        })
        .await
        .map_err(|e| RenderError::Render(e.to_string()))??;

        debug!(path = %target.display(), bytes, "Summary image written");
        Ok(target)
    }
}

/// GDP in billions, `$X.XX B`, or `N/A` when unknown.
pub fn format_gdp(gdp: Option<f64>) -> String {
    match gdp {
        Some(value) => format!("${:.2} B", value / 1e9),
        None => "N/A".to_string(),
    }
}

/// Render the snapshot to an SVG document.
pub fn render_svg(snapshot: &SummarySnapshot) -> String {
    let mut lines: Vec<(u32, u32, String)> = Vec::with_capacity(snapshot.top.len() + 3);
    let mut y = 50;

    lines.push((50, y, format!("Total Countries: {}", snapshot.total_countries)));
    y += 50;
    lines.push((50, y, "Top 5 Countries by GDP:".to_string()));
    y += 30;
    for country in &snapshot.top {
        lines.push((70, y, format!("{}: {}", country.name, format_gdp(country.estimated_gdp))));
        y += 30;
    }
    lines.push((50, y + 30, format!("Last Updated: {}", snapshot.generated_at.to_rfc3339())));

    let header = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let background = r#"  <rect width="100%" height="100%" fill="white"/>"#.to_string();
    let body = lines.into_iter().map(|(x, y, text)| {
        format!(
            r#"  <text x="{}" y="{}" font-family="Arial, sans-serif" font-size="24" fill="black">{}</text>"#,
            x,
            y,
            escape_xml(&text)
        )
    });

    let mut svg: Vec<String> = vec![header, background];
    svg.extend(body);
    svg.push("</svg>\n".to_string());
    svg.join("\n")
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
