use scraper::Html;

use crate::parse::{create_selector, element_text};
use crate::Result;

/// The browsing session every profile page is read through.
///
/// Lookups run against the rendered HTML returned by [`PageAdapter::content`],
/// so a selector without a match is `None` (or an empty `Vec`), never an error.
#[allow(async_fn_in_trait)]
pub trait PageAdapter {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// HTML of the current page as rendered right now.
    async fn content(&self) -> Result<String>;

    /// Clicks the first element matching `selector`. Returns whether anything was clicked.
    async fn click_if_present(&mut self, selector: &str) -> Result<bool>;

    async fn scroll_to_bottom(&mut self) -> Result<()>;

    async fn scroll_height(&self) -> Result<u64>;

    async fn find_text(&self, selector: &str) -> Result<Option<String>> {
        let selector = create_selector(selector)?;
        let html = self.content().await?;
        let doc = Html::parse_document(&html);
        let text = doc.select(&selector).next().and_then(element_text);
        Ok(text)
    }

    /// `attr` of every element matching `selector`, in document order.
    async fn find_all_attr(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        let selector = create_selector(selector)?;
        let html = self.content().await?;
        let doc = Html::parse_document(&html);
        let values = doc
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(str::to_string)
            .collect();
        Ok(values)
    }
}
