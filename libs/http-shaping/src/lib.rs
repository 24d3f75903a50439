//! Window-based HTTP traffic shaping.
//!
//! A [`ShapingFilter`] sits between a reverse proxy and an upstream service.
//! It sums the declared inbound and outbound byte volume over repeating
//! fixed-length windows and answers `429 Too Many Requests` once a configured
//! quota has been reached within the current window.
//!
//! # Example
//! ```
//! use http::{Request, Response};
//! use http_shaping::{ShapingConfig, ShapingFilter};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ShapingConfig::new(60, "10GiB", "10GiB", true);
//! let filter = ShapingFilter::new(&config)?;
//!
//! let request = Request::new(String::new());
//! let response = filter
//!     .handle(request, |_req| async {
//!         Ok::<_, std::convert::Infallible>(Response::new(String::from("hello")))
//!     })
//!     .await?;
//! assert_eq!(response.status(), 200);
//! # Ok(())
//! # }
//! ```

pub mod byte_quantity;
pub mod clock;
pub mod config;
pub mod decision;
pub mod filter;
pub mod layer;
pub mod window;

pub use byte_quantity::{parse_byte_quantity, ByteQuantityError, ByteUnit};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ShapingConfig, ShapingLimits, DEFAULT_FILTER_NAME};
pub use decision::{evaluate, Decision};
pub use filter::{declared_length, ShapingFilter, REJECTION_BODY};
pub use layer::{Shaping, ShapingLayer};
pub use window::{Window, WindowSnapshot};
