//! Signal collection. Every signal is read through [`SignalSource`] and resolved to a
//! string before joining, so a failing probe degrades to its sentinel instead of
//! aborting the whole fingerprint.

use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Separator placed between components before hashing.
pub const DELIMITER: &str = "|";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("signal not supported")]
    Unsupported,
    #[error("signal probe failed: {0}")]
    Probe(String),
}

/// Signals in hashing order. Reordering changes every existing fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    UserAgent,
    Screen,
    TimeZone,
    UtcOffset,
    Language,
    Languages,
    Platform,
    HardwareConcurrency,
    DeviceMemory,
    Canvas,
    Gpu,
    Audio,
}

impl Signal {
    pub const ORDER: [Signal; 12] = [
        Signal::UserAgent,
        Signal::Screen,
        Signal::TimeZone,
        Signal::UtcOffset,
        Signal::Language,
        Signal::Languages,
        Signal::Platform,
        Signal::HardwareConcurrency,
        Signal::DeviceMemory,
        Signal::Canvas,
        Signal::Gpu,
        Signal::Audio,
    ];

    /// Placeholder used when the signal cannot be collected.
    #[must_use]
    pub fn sentinel(self) -> &'static str {
        match self {
            Signal::Canvas => "canvas-error",
            Signal::Gpu => "webgl-error",
            Signal::Audio => "audio-error",
            _ => "",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Signal::UserAgent => "user_agent",
            Signal::Screen => "screen",
            Signal::TimeZone => "time_zone",
            Signal::UtcOffset => "utc_offset",
            Signal::Language => "language",
            Signal::Languages => "languages",
            Signal::Platform => "platform",
            Signal::HardwareConcurrency => "hardware_concurrency",
            Signal::DeviceMemory => "device_memory",
            Signal::Canvas => "canvas",
            Signal::Gpu => "gpu",
            Signal::Audio => "audio",
        }
    }
}

/// Screen width, height and color depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
}

impl fmt::Display for ScreenGeometry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}x{}x{}",
            self.width, self.height, self.color_depth
        )
    }
}

/// Unmasked vendor and renderer reported by a 3D context.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GpuInfo {
    pub vendor: String,
    pub renderer: String,
}

/// Read access to the raw browser/device signals.
///
/// Implementations that touch ephemeral resources (canvas, 3D context, audio graph)
/// must acquire and release them inside the call.
pub trait SignalSource {
    fn user_agent(&self) -> Result<String, ComponentError>;
    fn screen(&self) -> Result<ScreenGeometry, ComponentError>;
    fn time_zone(&self) -> Result<String, ComponentError>;
    /// Minutes as the browser reports them (positive west of UTC).
    fn utc_offset_minutes(&self) -> Result<i32, ComponentError>;
    fn language(&self) -> Result<String, ComponentError>;
    fn languages(&self) -> Result<Vec<String>, ComponentError>;
    fn platform(&self) -> Result<String, ComponentError>;
    fn hardware_concurrency(&self) -> Result<Option<u32>, ComponentError>;
    fn device_memory(&self) -> Result<Option<f64>, ComponentError>;
    fn canvas(&self) -> Result<String, ComponentError>;
    /// `Ok(None)` when no 3D context or debug extension exists; nothing is emitted then.
    fn gpu(&self) -> Result<Option<GpuInfo>, ComponentError>;
    fn audio(&self) -> Result<String, ComponentError>;
}

/// Ordered component strings, ready to be joined and hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintComponents {
    values: Vec<String>,
}

impl FingerprintComponents {
    #[must_use]
    pub fn from_values(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Collects every signal in [`Signal::ORDER`]. Never fails.
    pub fn collect<S: SignalSource + ?Sized>(source: &S) -> Self {
        let mut values = Vec::with_capacity(Signal::ORDER.len() + 1);

        for signal in Signal::ORDER {
            match signal {
                Signal::UserAgent => values.push(resolve(signal, source.user_agent())),
                Signal::Screen => values.push(resolve(
                    signal,
                    source.screen().map(|geometry| geometry.to_string()),
                )),
                Signal::TimeZone => values.push(resolve(signal, source.time_zone())),
                Signal::UtcOffset => values.push(resolve(
                    signal,
                    source.utc_offset_minutes().map(|offset| offset.to_string()),
                )),
                Signal::Language => values.push(resolve(signal, source.language())),
                Signal::Languages => values.push(resolve(
                    signal,
                    source.languages().map(|languages| languages.join(",")),
                )),
                Signal::Platform => values.push(resolve(signal, source.platform())),
                Signal::HardwareConcurrency => values.push(resolve(
                    signal,
                    source
                        .hardware_concurrency()
                        .map(|count| count.map(|count| count.to_string()).unwrap_or_default()),
                )),
                Signal::DeviceMemory => values.push(resolve(
                    signal,
                    source
                        .device_memory()
                        .map(|memory| memory.map(format_number).unwrap_or_default()),
                )),
                Signal::Canvas => values.push(resolve(signal, source.canvas())),
                Signal::Gpu => match source.gpu() {
                    Ok(Some(gpu)) => {
                        values.push(gpu.vendor);
                        values.push(gpu.renderer);
                    }
                    Ok(None) => debug!("gpu signal unavailable, no component emitted"),
                    Err(err) => {
                        debug!(signal = signal.name(), "component fallback: {err}");
                        values.push(signal.sentinel().to_string());
                    }
                },
                Signal::Audio => values.push(resolve(signal, source.audio())),
            }
        }

        Self { values }
    }

    #[must_use]
    pub fn joined(&self) -> String {
        self.values.join(DELIMITER)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn resolve(signal: Signal, outcome: Result<String, ComponentError>) -> String {
    outcome.unwrap_or_else(|err| {
        debug!(signal = signal.name(), "component fallback: {err}");
        signal.sentinel().to_string()
    })
}

/// Processor count as `navigator.hardwareConcurrency` reports it. Zero is a value.
#[must_use]
pub fn processor_count(reported: f64) -> Option<u32> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    (reported.is_finite() && reported >= 0.0).then(|| reported as u32)
}

/// Audio component from the length of an analyser's `frequencyData`.
///
/// `AnalyserNode` does not expose that property, so live browsers resolve this to the
/// `audio-error` sentinel. Stored legacy fingerprints carry that sentinel too.
///
/// # Errors
///
/// Returns [`ComponentError::Unsupported`] when the length is absent.
pub fn audio_signature(frequency_data_len: Option<f64>) -> Result<String, ComponentError> {
    frequency_data_len
        .map(format_number)
        .ok_or(ComponentError::Unsupported)
}

/// Formats like a JavaScript number: `8` rather than `8.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
