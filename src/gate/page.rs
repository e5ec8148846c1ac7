//! The only page effects the gate performs: visibility, one hidden form field, and
//! navigation away.

use std::collections::BTreeMap;

pub trait PageSurface {
    /// Makes gated content invisible (it stays in the document).
    fn hide_content(&mut self);

    fn reveal_content(&mut self);

    /// Writes the value into the named hidden input, appending the input if missing.
    fn set_hidden_field(&mut self, name: &str, value: &str);

    /// Replaces the current location; nothing on the page runs afterwards.
    fn redirect(&mut self, target: &str);
}

/// Page without a DOM that records what the gate did to it.
#[derive(Debug, Clone)]
pub struct HeadlessPage {
    content_visible: bool,
    ever_hidden: bool,
    hidden_fields: BTreeMap<String, String>,
    location: Option<String>,
}

impl Default for HeadlessPage {
    fn default() -> Self {
        Self {
            content_visible: true,
            ever_hidden: false,
            hidden_fields: BTreeMap::new(),
            location: None,
        }
    }
}

impl HeadlessPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_content_visible(&self) -> bool {
        self.content_visible
    }

    /// Whether content was hidden at any point during the load.
    #[must_use]
    pub fn was_hidden(&self) -> bool {
        self.ever_hidden
    }

    #[must_use]
    pub fn hidden_field(&self, name: &str) -> Option<&str> {
        self.hidden_fields.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn redirected_to(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl PageSurface for HeadlessPage {
    fn hide_content(&mut self) {
        self.content_visible = false;
        self.ever_hidden = true;
    }

    fn reveal_content(&mut self) {
        // A redirected page is gone.
        if self.location.is_none() {
            self.content_visible = true;
        }
    }

    fn set_hidden_field(&mut self, name: &str, value: &str) {
        self.hidden_fields
            .insert(name.to_string(), value.to_string());
    }

    fn redirect(&mut self, target: &str) {
        self.content_visible = false;
        self.location = Some(target.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_visibility_and_fields() {
        let mut page = HeadlessPage::new();
        assert!(page.is_content_visible());
        assert!(!page.was_hidden());

        page.hide_content();
        assert!(!page.is_content_visible());
        page.set_hidden_field("browser_fingerprint", "abc");
        page.set_hidden_field("browser_fingerprint", "def");
        page.reveal_content();

        assert!(page.is_content_visible());
        assert!(page.was_hidden());
        assert_eq!(page.hidden_field("browser_fingerprint"), Some("def"));
        assert_eq!(page.redirected_to(), None);
    }

    #[test]
    fn redirect_is_terminal() {
        let mut page = HeadlessPage::new();
        page.redirect("/fingerprint_error");
        page.reveal_content();

        assert!(!page.is_content_visible());
        assert_eq!(page.redirected_to(), Some("/fingerprint_error"));
    }
}
