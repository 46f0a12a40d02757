//! Headless Chrome preview renderer
//!
//! Loads a composed preview document into a real browser so fingerprints
//! carry render-order indices and browser-inserted elements exactly as a
//! live preview would see them.

pub mod config;
pub mod session;

pub use config::LaunchOptions;
pub use session::PreviewBrowser;
