//! Normalization pipeline for HTML email bodies.
//!
//! [`parse_message`] takes the raw HTML of a message and returns two cleaned
//! renditions: `complete_html` with the full conversation history, and
//! `parsed_message_html` with quoted replies and signatures removed. The
//! passes in between (structure repair, tracker and script stripping,
//! remote-content blocking, autolinking, whitespace collapse) are driven by
//! [`ParseMessageOptions`].

mod autolink;
mod constants;
mod error;
mod options;
mod parse_message;
mod quotation;
mod quote_string;
mod repair;
mod rewrite;
mod signature;
mod walker;
mod whitespace;

pub use error::{MailtoolsError, Result};
pub use options::{ParseMessageOptions, ReplacementOptions};
pub use parse_message::{ParseResult, parse_message};
pub use quote_string::extract_reply_plaintext;
