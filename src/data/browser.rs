use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use crate::data::reader::{PageReader, PageRequest, PageText, ScrapeError};

/// Headless Chromium driven over the DevTools protocol.
///
/// Every `read` launches its own browser and closes it before returning.
pub struct ChromeReader {
    headless: bool,
    executable: Option<PathBuf>,
}

impl ChromeReader {
    pub fn new(headless: bool, executable: Option<PathBuf>) -> Self {
        Self {
            headless,
            executable,
        }
    }

    fn browser_config(&self, request: &PageRequest) -> Result<BrowserConfig, ScrapeError> {
        let mut builder = BrowserConfig::builder().request_timeout(request.navigation_timeout);
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(ScrapeError::Launch)
    }
}

#[async_trait]
impl PageReader for ChromeReader {
    async fn read(&self, request: &PageRequest) -> Result<PageText, ScrapeError> {
        let config = self.browser_config(request)?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = read_page(&browser, request).await;

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        events.abort();

        result
    }
}

async fn read_page(browser: &Browser, request: &PageRequest) -> Result<PageText, ScrapeError> {
    let navigation = async {
        let page = browser.new_page(request.url.as_str()).await?;
        page.wait_for_navigation().await?;
        Ok::<_, chromiumoxide::error::CdpError>(page)
    };

    let page = timeout(request.navigation_timeout, navigation)
        .await
        .map_err(|_| ScrapeError::Timeout(request.navigation_timeout))?
        .map_err(|e| ScrapeError::Navigation {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

    wait_until_ready(&page, request).await;

    let raw: String = page
        .evaluate_expression(EvaluateParams::new(build_script(request)))
        .await
        .map_err(|e| ScrapeError::Script(e.to_string()))?
        .into_value()
        .map_err(|e| ScrapeError::Script(e.to_string()))?;

    if let Err(e) = page.close().await {
        debug!("Failed to close page: {}", e);
    }

    serde_json::from_str(&raw).map_err(|e| ScrapeError::Script(e.to_string()))
}

/// Poll for the row selector until it matches or the settle timeout runs out.
async fn wait_until_ready(page: &Page, request: &PageRequest) {
    let deadline = Instant::now() + request.settle_timeout;
    loop {
        if page.find_element(request.rows.as_str()).await.is_ok() {
            debug!("Rows present on {}", request.url);
            return;
        }
        if Instant::now() >= deadline {
            warn!(
                "No rows matched `{}` within {:?}, reading page as-is",
                request.rows, request.settle_timeout
            );
            return;
        }
        sleep(request.poll_interval).await;
    }
}

/// Script returning the requested text as a JSON string shaped like [`PageText`].
fn build_script(request: &PageRequest) -> String {
    let rows = serde_json::Value::from(request.rows.as_str());
    let fields = serde_json::Value::from(request.fields.clone());
    let labels = serde_json::Value::from(request.labels.clone());

    format!(
        r#"(() => {{
  const text = (el) => (el && typeof el.innerText === "string") ? el.innerText : null;
  const fields = {fields};
  const labels = {labels};
  const rows = Array.from(document.querySelectorAll({rows})).slice(0, {limit});
  return JSON.stringify({{
    rows: rows.map((r) => fields.map((f) => text(r.querySelector(f)))),
    labels: labels.map((l) => text(document.querySelector(l))),
  }});
}})()"#,
        limit = request.row_limit,
    )
}
