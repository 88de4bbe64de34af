use crate::constants::{GENERIC_URL_PLACEHOLDER, TRANSPARENT_PIXEL};

/// Configuration for [`parse_message`](crate::parse_message). Every field is
/// independently optional; the default performs only the always-on hygiene
/// steps (repair, comment/script/tracker stripping, whitespace collapse).
#[derive(Debug, Clone, Default)]
pub struct ParseMessageOptions {
    /// Remove quoted reply history, keeping quotes the author typed inline.
    pub clean_quotations: bool,
    /// Extract and remove signature blocks.
    pub clean_signatures: bool,
    /// Turn bare URLs, email addresses and phone numbers in text into anchors.
    pub autolink: bool,
    /// Add missing schemes and audit titles to existing anchors.
    pub enhance_links: bool,
    /// Replace any viewport meta tags with one carrying this `content` value.
    pub force_viewport: Option<String>,
    /// Replace remote-fetch URLs with placeholders.
    pub no_remote_content: bool,
    /// Placeholders used when `no_remote_content` is set.
    pub remote_content_replacements: ReplacementOptions,
    /// CSS appended to the document head in a `<style>` element.
    pub include_style: Option<String>,
    /// Strip layout-breaking properties from every inline `style` attribute.
    pub clean_styles: bool,
    /// Property names removed by `clean_styles`; `None` uses the default set.
    pub cleaned_style_properties: Option<Vec<String>>,
}

/// Replacement values for blocked remote content.
#[derive(Debug, Clone, Default)]
pub struct ReplacementOptions {
    /// Used for image-semantic attributes (src, srcset, poster, background, ...).
    pub image: Option<String>,
    /// Used for everything else (stylesheet hrefs, form actions, ...).
    pub other: Option<String>,
}

impl ReplacementOptions {
    pub fn image_placeholder(&self) -> &str {
        self.image.as_deref().unwrap_or(TRANSPARENT_PIXEL)
    }

    pub fn other_placeholder(&self) -> &str {
        self.other.as_deref().unwrap_or(GENERIC_URL_PLACEHOLDER)
    }
}
