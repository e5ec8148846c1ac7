use crate::fingerprint::{
    components::{audio_signature, processor_count},
    ComponentError, GpuInfo, ScreenGeometry, SignalSource,
};
use js_sys::{Array, Date, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    AudioContext, CanvasRenderingContext2d, Document, HtmlCanvasElement, Navigator,
    WebGlRenderingContext, Window,
};

const UNMASKED_VENDOR_WEBGL: u32 = 0x9245;
const UNMASKED_RENDERER_WEBGL: u32 = 0x9246;
const CANVAS_TEXT: &str = "Browser fingerprint";

/// Live signals from the current window.
pub struct BrowserSignals {
    window: Window,
    document: Document,
}

impl BrowserSignals {
    /// `None` outside a document context (e.g. a worker).
    #[must_use]
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    fn navigator(&self) -> Navigator {
        self.window.navigator()
    }

    fn create_canvas(&self) -> Result<HtmlCanvasElement, ComponentError> {
        self.document
            .create_element("canvas")
            .map_err(probe_error)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| ComponentError::Probe("not a canvas element".to_string()))
    }

    fn webgl_context(&self) -> Result<Option<WebGlRenderingContext>, ComponentError> {
        for kind in ["webgl", "experimental-webgl"] {
            if let Some(context) = self.create_canvas()?.get_context(kind).map_err(probe_error)? {
                let context = context
                    .dyn_into::<WebGlRenderingContext>()
                    .map_err(|_| ComponentError::Probe("unexpected 3d context".to_string()))?;
                return Ok(Some(context));
            }
        }
        Ok(None)
    }
}

fn probe_error(err: JsValue) -> ComponentError {
    ComponentError::Probe(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl SignalSource for BrowserSignals {
    fn user_agent(&self) -> Result<String, ComponentError> {
        self.navigator().user_agent().map_err(probe_error)
    }

    fn screen(&self) -> Result<ScreenGeometry, ComponentError> {
        let screen = self.window.screen().map_err(probe_error)?;
        let dimension = |value: Result<i32, JsValue>| {
            value
                .map_err(probe_error)
                .map(|value| u32::try_from(value).unwrap_or_default())
        };
        Ok(ScreenGeometry {
            width: dimension(screen.width())?,
            height: dimension(screen.height())?,
            color_depth: dimension(screen.color_depth())?,
        })
    }

    fn time_zone(&self) -> Result<String, ComponentError> {
        let format = js_sys::Intl::DateTimeFormat::new(&Array::new(), &Object::new());
        let options = format.resolved_options();
        Ok(Reflect::get(&options, &JsValue::from_str("timeZone"))
            .map_err(probe_error)?
            .as_string()
            .unwrap_or_default())
    }

    fn utc_offset_minutes(&self) -> Result<i32, ComponentError> {
        #[allow(clippy::cast_possible_truncation)]
        Ok(Date::new_0().get_timezone_offset() as i32)
    }

    fn language(&self) -> Result<String, ComponentError> {
        Ok(self.navigator().language().unwrap_or_default())
    }

    fn languages(&self) -> Result<Vec<String>, ComponentError> {
        Ok(self
            .navigator()
            .languages()
            .iter()
            .filter_map(|value| value.as_string())
            .collect())
    }

    fn platform(&self) -> Result<String, ComponentError> {
        self.navigator().platform().map_err(probe_error)
    }

    fn hardware_concurrency(&self) -> Result<Option<u32>, ComponentError> {
        Ok(processor_count(self.navigator().hardware_concurrency()))
    }

    fn device_memory(&self) -> Result<Option<f64>, ComponentError> {
        // Not exposed by every engine, so read it untyped.
        Ok(Reflect::get(&self.navigator(), &JsValue::from_str("deviceMemory"))
            .map_err(probe_error)?
            .as_f64())
    }

    fn canvas(&self) -> Result<String, ComponentError> {
        let canvas = self.create_canvas()?;
        canvas.set_width(200);
        canvas.set_height(50);

        let context = canvas
            .get_context("2d")
            .map_err(probe_error)?
            .ok_or(ComponentError::Unsupported)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| ComponentError::Probe("unexpected 2d context".to_string()))?;

        context.set_text_baseline("top");
        context.set_font("14px Arial");
        context.set_text_baseline("alphabetic");
        context.set_fill_style_str("#f60");
        context.fill_rect(125.0, 1.0, 62.0, 20.0);
        context.set_fill_style_str("#069");
        context
            .fill_text(CANVAS_TEXT, 2.0, 15.0)
            .map_err(probe_error)?;
        context.set_fill_style_str("rgba(102, 204, 0, 0.7)");
        context
            .fill_text(CANVAS_TEXT, 4.0, 17.0)
            .map_err(probe_error)?;

        canvas.to_data_url().map_err(probe_error)
    }

    fn gpu(&self) -> Result<Option<GpuInfo>, ComponentError> {
        let Some(context) = self.webgl_context()? else {
            return Ok(None);
        };
        if context
            .get_extension("WEBGL_debug_renderer_info")
            .map_err(probe_error)?
            .is_none()
        {
            return Ok(None);
        }

        let read = |parameter| {
            context
                .get_parameter(parameter)
                .map_err(probe_error)
                .map(|value| value.as_string().unwrap_or_default())
        };
        Ok(Some(GpuInfo {
            vendor: read(UNMASKED_VENDOR_WEBGL)?,
            renderer: read(UNMASKED_RENDERER_WEBGL)?,
        }))
    }

    fn audio(&self) -> Result<String, ComponentError> {
        let context = AudioContext::new().map_err(probe_error)?;
        let probe = probe_audio(&context);
        // Released whether or not the probe succeeded.
        let _ = context.close();
        probe
    }
}

/// Oscillator -> analyser -> muted gain -> destination; reads the analyser's
/// `frequencyData` length.
fn probe_audio(context: &AudioContext) -> Result<String, ComponentError> {
    let oscillator = context.create_oscillator().map_err(probe_error)?;
    let analyser = context.create_analyser().map_err(probe_error)?;
    let gain = context.create_gain().map_err(probe_error)?;

    gain.gain().set_value(0.0);
    oscillator
        .connect_with_audio_node(&analyser)
        .map_err(probe_error)?;
    analyser
        .connect_with_audio_node(&gain)
        .map_err(probe_error)?;
    gain.connect_with_audio_node(&context.destination())
        .map_err(probe_error)?;

    oscillator.start().map_err(probe_error)?;
    let length = Reflect::get(&analyser, &JsValue::from_str("frequencyData"))
        .ok()
        .filter(|data| !data.is_undefined() && !data.is_null())
        .and_then(|data| Reflect::get(&data, &JsValue::from_str("length")).ok())
        .and_then(|length| length.as_f64());
    oscillator.stop().map_err(probe_error)?;

    audio_signature(length)
}
