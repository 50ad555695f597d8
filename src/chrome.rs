use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use headless_chrome::{Browser, LaunchOptions, Tab};
use tokio::task::spawn_blocking;

use crate::page::PageAdapter;
use crate::{Error, Result};

/// A [`PageAdapter`] driving one Chrome tab.
///
/// Pointing `user_data_dir` at an existing browser profile reuses its login.
/// The browser calls block, so each one runs on the blocking pool.
pub struct ChromePage {
    // Closing the browser closes the tab.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromePage {
    pub fn launch(user_data_dir: Option<PathBuf>, headless: bool) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .user_data_dir(user_data_dir)
            .build()
            .map_err(browser_error)?;
        let browser = Browser::new(options).map_err(browser_error)?;
        let tab = browser.new_tab().map_err(browser_error)?;
        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    async fn on_tab<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tab) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        spawn_blocking(move || f(&tab)).await?
    }
}

impl PageAdapter for ChromePage {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let url = url.to_string();
        self.on_tab(move |tab| {
            tab.navigate_to(&url)
                .and_then(|tab| tab.wait_until_navigated())
                .map_err(browser_error)?;
            Ok(())
        })
        .await
    }

    async fn content(&self) -> Result<String> {
        self.on_tab(|tab| tab.get_content().map_err(browser_error))
            .await
    }

    async fn click_if_present(&mut self, selector: &str) -> Result<bool> {
        let selector = selector.to_string();
        self.on_tab(move |tab| match tab.find_element(&selector) {
            Ok(element) => {
                element.click().map_err(browser_error)?;
                Ok(true)
            }
            Err(_) => Ok(false),
        })
        .await
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.on_tab(|tab| {
            tab.evaluate("window.scrollTo(0, document.body.scrollHeight);", false)
                .map_err(browser_error)?;
            Ok(())
        })
        .await
    }

    async fn scroll_height(&self) -> Result<u64> {
        self.on_tab(|tab| {
            let height = tab
                .evaluate("document.body.scrollHeight", false)
                .map_err(browser_error)?
                .value
                .and_then(|value| value.as_f64())
                .unwrap_or(0.0);
            Ok(height as u64)
        })
        .await
    }
}

fn browser_error(e: impl Display) -> Error {
    Error::Browser(e.to_string())
}
