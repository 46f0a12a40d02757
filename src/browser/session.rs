use crate::browser::config::LaunchOptions;
use crate::buffer::BufferSet;
use crate::config::SyncOptions;
use crate::dom::DomTree;
use crate::error::{Result, SyncError};
use crate::preview::PreviewFrame;
use crate::transport::{Outbox, PreviewMessage};
use headless_chrome::{Browser, Tab};
use log::debug;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// A Chrome instance rendering preview documents in a single tab
pub struct PreviewBrowser {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    tab: Arc<Tab>,

    options: SyncOptions,
}

impl PreviewBrowser {
    /// Launch a new browser instance with the given options
    pub fn launch(launch: LaunchOptions, options: SyncOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));

        // Rendering is driven interactively; keep the browser around between renders
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = launch.headless;
        launch_opts.window_size = Some((launch.window_width, launch.window_height));

        if let Some(path) = launch.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = launch.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = launch.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| SyncError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| SyncError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser, tab, options })
    }

    /// Launch a browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default(), SyncOptions::default())
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Load a full HTML document and wait for it to settle
    pub fn load_document(&self, document: &str) -> Result<()> {
        self.tab
            .navigate_to("about:blank")
            .map_err(|e| SyncError::NavigationFailed(format!("Failed to open blank page: {}", e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| SyncError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        // A JSON string literal is a valid JS string literal
        let literal = serde_json::to_string(document)
            .map_err(|e| SyncError::EvaluationFailed(format!("Failed to encode document: {}", e)))?;
        let write_js = format!(
            "(function() {{ document.open(); document.write({}); document.close(); return true; }})()",
            literal
        );

        self.tab
            .evaluate(&write_js, false)
            .map_err(|e| SyncError::EvaluationFailed(format!("Failed to write document: {}", e)))?;

        std::thread::sleep(self.options.settle());
        debug!("Loaded preview document ({} bytes)", document.len());

        Ok(())
    }

    /// Render the buffers as the sandboxed preview would
    pub fn render(&self, buffers: &BufferSet) -> Result<()> {
        self.load_document(&buffers.preview_document())
    }

    /// Extract the DOM tree from the rendered document
    pub fn extract_dom(&self) -> Result<DomTree> {
        DomTree::from_tab(&self.tab)
    }

    /// Render the buffers and wrap the resulting DOM as a preview context
    pub fn render_frame(&self, buffers: &BufferSet, outbox: Outbox<PreviewMessage>) -> Result<PreviewFrame> {
        self.render(buffers)?;
        let tree = self.extract_dom()?;
        Ok(PreviewFrame::new(tree, outbox, self.options.clone()))
    }

    /// Close the preview tab; the browser itself exits on drop
    pub fn close(&self) -> Result<()> {
        self.tab
            .close(false)
            .map_err(|e| SyncError::NavigationFailed(format!("Failed to close tab: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // Ignore by default, run with: cargo test -- --ignored
    fn test_launch_browser() {
        let result = PreviewBrowser::launch(LaunchOptions::new().headless(true), SyncOptions::default());
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_load_document() {
        let browser = PreviewBrowser::new().expect("Failed to launch browser");
        browser.load_document("<!DOCTYPE html><html><body><p>Hi</p></body></html>").unwrap();

        let tree = browser.extract_dom().unwrap();
        assert_eq!(tree.elements_by_tag("p").len(), 1);
    }
}
