//! Chromium browser collaborator.
//!
//! Uses chromiumoxide (CDP) to drive a local or remote Chrome. The place page
//! throttles obvious automation, so the stealth engine patches the usual
//! detection points after each navigation.

mod page;

pub use page::ChromiumPage;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::BrowserEngineConfig;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Evasion scripts injected after navigation by the stealth engine.
const STEALTH_SCRIPTS: &[&str] = &[
    // Remove webdriver property
    r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
    "#,
    r#"
    window.chrome = window.chrome || {
        runtime: {},
        loadTimes: function() {},
        csi: function() {},
        app: {}
    };
    "#,
    r#"
    Object.defineProperty(navigator, 'plugins', {
        get: () => [
            { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer', description: 'Portable Document Format' },
            { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai', description: '' }
        ],
        configurable: true
    });
    "#,
    r#"
    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Array;
    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Promise;
    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Symbol;
    "#,
];

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/google/chrome/google-chrome",
];

/// A running (or connected) browser.
pub struct BrowserSession {
    config: BrowserEngineConfig,
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// Connect to `remote_url` if configured, otherwise launch a local Chrome.
    pub async fn start(config: &BrowserEngineConfig) -> Result<Self> {
        match config.remote_url.clone() {
            Some(url) => Self::connect_remote(config, &url).await,
            None => Self::launch(config).await,
        }
    }

    async fn launch(config: &BrowserEngineConfig) -> Result<Self> {
        info!("Launching browser (headless={})", config.headless);
        let chrome_path = find_chrome()?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(std::time::Duration::from_secs(config.timeout));

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg(format!("--lang={}", config.language))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        Ok(Self {
            config: config.clone(),
            browser,
            handler: spawn_handler(handler),
        })
    }

    async fn connect_remote(config: &BrowserEngineConfig, url: &str) -> Result<Self> {
        info!("Connecting to remote browser at {}", url);

        // The WebSocket URL comes from the /json/version endpoint
        let http_url = url.replace("ws://", "http://").replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .context("Failed to connect to remote browser")?
            .json()
            .await
            .context("Failed to parse browser version info")?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("No webSocketDebuggerUrl in response"))?;

        debug!("Connecting to WebSocket: {}", ws_url);
        let (browser, handler) = Browser::connect(ws_url)
            .await
            .context("Failed to connect to remote browser")?;

        Ok(Self {
            config: config.clone(),
            browser,
            handler: spawn_handler(handler),
        })
    }

    /// Open a blank tab ready for navigation.
    pub async fn open_page(&self) -> Result<ChromiumPage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open browser tab")?;

        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(USER_AGENT)
            .accept_language(self.config.language.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid user agent override: {}", e))?;
        page.execute(user_agent)
            .await
            .context("Failed to set user agent")?;

        Ok(ChromiumPage::new(page, self.config.clone()))
    }

    /// Close the browser and stop the CDP handler.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        self.handler.abort();
    }
}

fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    })
}

/// Find a Chrome executable in the usual locations or on `PATH`.
fn find_chrome() -> Result<PathBuf> {
    for path in CHROME_PATHS {
        let p = std::path::Path::new(path);
        if p.exists() {
            info!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in &[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    info!("Found Chrome in PATH: {}", path);
                    return Ok(PathBuf::from(path));
                }
            }
        }
    }

    Err(anyhow::anyhow!(
        "Chrome/Chromium not found. Install it or set BROWSER_URL to a running instance:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium"
    ))
}
