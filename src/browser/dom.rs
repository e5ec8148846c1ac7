use crate::gate::{PageSurface, SessionError, SessionStore};
use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlInputElement, Storage, Window};

/// Element ids and selectors the dashboard templates use.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    pub content: String,
    pub field_id: String,
    pub form_id: String,
}

impl PageSelectors {
    #[must_use]
    pub fn login() -> Self {
        Self {
            content: ".login-container".to_string(),
            field_id: "browserFingerprintInput".to_string(),
            form_id: "loginForm".to_string(),
        }
    }

    #[must_use]
    pub fn verification() -> Self {
        Self {
            content: ".verify-container".to_string(),
            field_id: "browserFingerprintInput".to_string(),
            form_id: "otpForm".to_string(),
        }
    }
}

/// The live document.
pub struct DomPage {
    window: Window,
    document: Document,
    selectors: PageSelectors,
}

impl DomPage {
    #[must_use]
    pub fn new(window: Window, selectors: PageSelectors) -> Option<Self> {
        let document = window.document()?;
        Some(Self {
            window,
            document,
            selectors,
        })
    }

    fn content(&self) -> Option<HtmlElement> {
        self.document
            .query_selector(&self.selectors.content)
            .ok()
            .flatten()?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    fn set_opacity(&self, value: &str) {
        if let Some(content) = self.content() {
            if content.style().set_property("opacity", value).is_err() {
                warn!("failed to set content opacity");
            }
        }
    }

    fn append_hidden_field(&self, name: &str, value: &str) {
        let Some(form) = self.document.get_element_by_id(&self.selectors.form_id) else {
            warn!(form = %self.selectors.form_id, "form not found for fingerprint field");
            return;
        };
        let Ok(input) = self
            .document
            .create_element("input")
            .map_err(|_| ())
            .and_then(|element| element.dyn_into::<HtmlInputElement>().map_err(|_| ()))
        else {
            warn!("failed to create fingerprint field");
            return;
        };
        input.set_type("hidden");
        input.set_name(name);
        input.set_id(&self.selectors.field_id);
        input.set_value(value);
        if form.append_child(&input).is_err() {
            warn!("failed to append fingerprint field");
        }
    }
}

impl PageSurface for DomPage {
    fn hide_content(&mut self) {
        self.set_opacity("0");
    }

    fn reveal_content(&mut self) {
        self.set_opacity("1");
    }

    fn set_hidden_field(&mut self, name: &str, value: &str) {
        let existing = self
            .document
            .get_element_by_id(&self.selectors.field_id)
            .and_then(|element| element.dyn_into::<HtmlInputElement>().ok());
        match existing {
            Some(input) => input.set_value(value),
            None => self.append_hidden_field(name, value),
        }
    }

    fn redirect(&mut self, target: &str) {
        if self.window.location().replace(target).is_err() {
            warn!("location replace failed");
        }
    }
}

/// `window.sessionStorage`.
pub struct BrowserSession {
    storage: Option<Storage>,
}

impl BrowserSession {
    #[must_use]
    pub fn new(window: &Window) -> Self {
        Self {
            storage: window.session_storage().ok().flatten(),
        }
    }
}

impl SessionStore for BrowserSession {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let storage = self.storage.as_ref().ok_or(SessionError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|err| SessionError::Write(err.as_string().unwrap_or_else(|| format!("{err:?}"))))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = self.storage.as_ref() {
            let _ = storage.remove_item(key);
        }
    }
}
