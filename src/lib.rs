//! # Process Text Sender
//!
//! Types text into the window of a running process by synthesizing keyboard
//! input.
//!
//! ## Features
//!
//! - Target a process by name, optionally narrowed by a window-title substring
//! - Backslash escapes in payloads (`\n`, `\t`, `\u00E9`, `\U0001F600`, ...)
//! - Literal payloads sent exactly as given
//! - Clipboard-paste delivery for text synthetic keys cannot carry
//! - Foreground window and clipboard restored after every delivery
//! - JSON job files
//! - Windows (SendInput), Linux (xdotool) and macOS (osascript)
//!
//! ## Example
//!
//! ```no_run
//! use process_text_sender::{Desktop, InputPayload, KeySender, SendOptions, TargetSpec};
//!
//! let sender = KeySender::new(Desktop::detect().unwrap(), SendOptions::default());
//! let target = TargetSpec::new("notepad").with_title("Untitled");
//! let report = sender
//!     .send(&target, &[InputPayload::escaped("Hello\\nWorld")])
//!     .unwrap();
//! assert!(report.is_success());
//! ```
//!
//! ## Configuration
//!
//! Jobs can be provided via JSON files:
//!
//! ```json
//! {
//!   "process_name": "notepad",
//!   "payloads": [{"text": "Hello\\tWorld"}],
//!   "delivery_mode": "auto"
//! }
//! ```

pub mod config;
pub mod desktop;
pub mod error;
pub mod focus;
pub mod key_sender;
pub mod markup_keys;
pub mod payload;
pub mod process_finder;
pub mod transcoder;

pub use config::{Config, DeliveryMode, FailurePolicy};
pub use desktop::{Desktop, WindowHandle};
pub use error::{PtsError, Result};
pub use key_sender::{DeliveryReport, KeySender, SendOptions};
pub use payload::{parse_payload_args, InputPayload, TargetSpec};
pub use process_finder::ProcessFinder;
pub use transcoder::{Platform, Transcoded};
