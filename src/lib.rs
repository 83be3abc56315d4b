//! Stylestack: layered, mode-aware visual style settings for a drawing viewer.
//!
//! Every styleable entity category (lines, text, grips, grid, rulers, cursor)
//! keeps a general layer, per-mode specific and override layers, and a
//! template override. Consumers ask for the *effective* record of a category
//! in a viewer mode; the store resolves the layers, a single-writer runtime
//! publishes changes to derived caches, and a debounced saver persists them.
//!
//! # Quick start
//!
//! ```no_run
//! use stylestack::mode::ViewerMode;
//! use stylestack::persist::{MemoryDriver, PersistenceGateway, DEFAULT_DEBOUNCE};
//! use stylestack::runtime::open_runtime;
//! use stylestack::settings::LineSettings;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let gateway = PersistenceGateway::new(Arc::new(MemoryDriver::new()));
//! let (handle, _report) = open_runtime(gateway, DEFAULT_DEBOUNCE, None).await;
//! let hover = handle.effective::<LineSettings>(ViewerMode::Hover);
//! println!("{}", hover.color);
//! handle.shutdown().await.unwrap();
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod mode;
pub mod persist;
pub mod render;
pub mod resolve;
pub mod runtime;
pub mod settings;
pub mod store;
pub mod sync;
#[cfg(test)]
pub mod testsupport;
