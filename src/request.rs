use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::gate::Probe;
use crate::page::PageAdapter;
use crate::Result;

/// A [`PageAdapter`] over plain HTTP requests.
///
/// Static documents are already fully expanded and don't grow when scrolled,
/// so clicking and scrolling do nothing.
pub struct HttpPage {
    client: Client,
    html: String,
}

impl HttpPage {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            html: String::new(),
        }
    }
}

impl PageAdapter for HttpPage {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.html = request_page_html(&self.client, url).await?;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.html.clone())
    }

    async fn click_if_present(&mut self, _selector: &str) -> Result<bool> {
        Ok(false)
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        Ok(self.html.len() as u64)
    }
}

/// Requests a page and returns a `Result<String>` containing the HTML.
async fn request_page_html(client: &Client, url: &str) -> Result<String> {
    let res = client.get(url).send().await?.error_for_status()?;
    let html = res.text().await?;
    Ok(html)
}

/// Checks the site's root answers with `200 OK`.
pub struct HttpProbe {
    client: Client,
    root: String,
}

impl HttpProbe {
    pub fn new(client: Client, root: impl Into<String>) -> Self {
        Self {
            client,
            root: root.into(),
        }
    }
}

impl Probe for HttpProbe {
    async fn is_reachable(&self) -> bool {
        match self.client.get(&self.root).send().await {
            Ok(res) => res.status() == StatusCode::OK,
            Err(e) => {
                debug!("probe of {} failed: {e}", self.root);
                false
            }
        }
    }
}
