//! `permalinks` — build permalinks from compact `:placeholder` patterns.
//!
//! A pattern such as `:date(file, "YYYY/MM/DD")/:stem/index.html` is first
//! converted to a Handlebars template, then rendered against data assembled
//! from a [`File`], registered helpers, presets and caller locals.
//!
//! ```
//! use permalinks::{File, Permalinks};
//! use serde_json::Map;
//!
//! let permalinks = Permalinks::new();
//! let url = permalinks
//!     .format("blog/:stem/index.html", &File::new("src/about.hbs"), &Map::new())
//!     .unwrap();
//! assert_eq!(url, "blog/about/index.html");
//! ```

pub mod convert;
pub mod error;
pub mod file;
pub mod helpers;
pub mod permalinks;
pub mod util;

pub use convert::{convert, convert_segment, split};
pub use error::{ConvertError, Error, Result};
pub use file::{File, PathInfo};
pub use helpers::{Call, builtins::register_text_helpers};
pub use permalinks::{Options, Permalinks};
