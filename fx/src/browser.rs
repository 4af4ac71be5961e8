//! Headless rendering sessions.
//!
//! A session is acquired by a [`SessionLauncher`], used to load one page and
//! released when it is dropped. Release runs on every path out of
//! [`render_page`], including navigation and capture errors,
//! so no browser process outlives the fetch that started it.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, warn};

use crate::config::{ScrapeConfig, DEFAULT_ACCEPT_LANGUAGE};
use crate::error::{FxError, FxResult};

/// One live page-rendering session.
pub trait RenderSession {
    /// Navigate to `url` and wait for the load, bounded by `timeout`.
    fn load(&mut self, url: &str, timeout: Duration) -> FxResult<()>;

    /// Fully rendered page source.
    fn page_source(&self) -> FxResult<String>;
}

/// Starts rendering sessions.
pub trait SessionLauncher: Send + Sync + 'static {
    type Session: RenderSession;

    /// Acquire a fresh session presenting `user_agent`.
    fn launch(&self, user_agent: &str) -> FxResult<Self::Session>;
}

/// Acquire a session, load the page, let client-side scripts settle and
/// capture the result. Blocking.
pub fn render_page<L: SessionLauncher + ?Sized>(
    launcher: &L,
    config: &ScrapeConfig,
) -> FxResult<String> {
    let mut session = launcher.launch(&config.user_agent)?;
    session.load(&config.url, config.page_load_timeout)?;
    if !config.settle.is_zero() {
        std::thread::sleep(config.settle);
    }
    session.page_source()
}

/// Launches headless Chrome configured for containers.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    /// Explicit browser binary; autodetected when `None`.
    pub chrome_path: Option<PathBuf>,
}

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self, user_agent: &str) -> FxResult<ChromeSession> {
        let agent_arg = format!("--user-agent={user_agent}");
        let args: Vec<&OsStr> = vec![
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
            OsStr::new(agent_arg.as_str()),
        ];

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(self.chrome_path.clone())
            .args(args)
            .build()
            .map_err(|e| FxError::Render(format!("invalid launch options: {e}")))?;

        let browser =
            Browser::new(options).map_err(|e| FxError::Render(format!("launch failed: {e}")))?;
        let tab = browser
            .new_tab()
            .map_err(|e| FxError::Render(format!("no tab: {e}")))?;
        tab.set_user_agent(user_agent, Some(DEFAULT_ACCEPT_LANGUAGE), None)
            .map_err(|e| FxError::Render(format!("user agent override failed: {e}")))?;

        debug!("Rendering session acquired");
        Ok(ChromeSession { browser, tab })
    }
}

/// A running Chrome process and its single tab.
pub struct ChromeSession {
    browser: Browser,
    tab: Arc<Tab>,
}

impl RenderSession for ChromeSession {
    fn load(&mut self, url: &str, timeout: Duration) -> FxResult<()> {
        self.tab.set_default_timeout(timeout);
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| FxError::Render(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    fn page_source(&self) -> FxResult<String> {
        self.tab
            .get_content()
            .map_err(|e| FxError::Render(format!("capture failed: {e}")))
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            warn!(error = %e, "Tab close failed, terminating browser anyway");
        }
        // Dropping `browser` kills the child process.
        debug!(
            pid = ?self.browser.get_process_id(),
            "Rendering session released"
        );
    }
}

/// Launcher serving a fixed page, for tests.
///
/// `None` makes every navigation fail. Counts launches and releases so
/// tests can check that no session leaks.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct StaticPageLauncher {
    page: Option<String>,
    launched: Arc<std::sync::atomic::AtomicUsize>,
    released: Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(any(test, feature = "test-utils"))]
impl StaticPageLauncher {
    /// Launcher whose sessions render `page`.
    pub fn serving(page: impl Into<String>) -> Self {
        Self {
            page: Some(page.into()),
            ..Default::default()
        }
    }

    /// Launcher whose sessions never finish loading.
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Sessions acquired so far.
    pub fn launched(&self) -> usize {
        self.launched.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Sessions released so far.
    pub fn released(&self) -> usize {
        self.released.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl SessionLauncher for StaticPageLauncher {
    type Session = StaticPageSession;

    fn launch(&self, _user_agent: &str) -> FxResult<StaticPageSession> {
        self.launched.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(StaticPageSession {
            page: self.page.clone(),
            loaded: false,
            released: Arc::clone(&self.released),
        })
    }
}

/// Session handed out by [`StaticPageLauncher`].
#[cfg(any(test, feature = "test-utils"))]
pub struct StaticPageSession {
    page: Option<String>,
    loaded: bool,
    released: Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RenderSession for StaticPageSession {
    fn load(&mut self, url: &str, _timeout: Duration) -> FxResult<()> {
        if self.page.is_none() {
            return Err(FxError::Render(format!("navigation to {url} timed out")));
        }
        self.loaded = true;
        Ok(())
    }

    fn page_source(&self) -> FxResult<String> {
        match (&self.page, self.loaded) {
            (Some(page), true) => Ok(page.clone()),
            _ => Err(FxError::Render("page not loaded".to_string())),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Drop for StaticPageSession {
    fn drop(&mut self) {
        self.released.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
