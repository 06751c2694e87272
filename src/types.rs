use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Milliseconds since the Unix epoch.
pub fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Standalone,
    Embed,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Standalone => "standalone",
            Mode::Embed => "embed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    Mouse,
    Trackpad,
    Touch,
    Unknown,
}

impl InputMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            InputMethod::Mouse => "mouse",
            InputMethod::Trackpad => "trackpad",
            InputMethod::Touch => "touch",
            InputMethod::Unknown => "unknown",
        }
    }
}

impl Default for InputMethod {
    fn default() -> Self {
        InputMethod::Unknown
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictClass {
    #[serde(rename = "BIOLOGICAL")]
    Biological,
    #[serde(rename = "UNCERTAIN")]
    Uncertain,
    #[serde(rename = "NON-BIOLOGICAL")]
    NonBiological,
}

impl VerdictClass {
    pub fn as_str(self) -> &'static str {
        match self {
            VerdictClass::Biological => "BIOLOGICAL",
            VerdictClass::Uncertain => "UNCERTAIN",
            VerdictClass::NonBiological => "NON-BIOLOGICAL",
        }
    }
}

/// One raw pointer observation in the standalone task, ms since navigation start.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub t: f64,
    pub x: f64,
    pub y: f64,
}

/// One raw accelerometer observation (device motion), same time base.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccelSample {
    pub t: f64,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
}

/// Phase timestamps reported by the standalone client, ms since navigation start.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phases {
    pub tracking_start: f64,
    pub dualtask_start: f64,
    pub test_end: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

/// One raw pointer observation in embed mode. `hover_t` is cumulative hover
/// time over observed elements; it only advances while the pointer is inside
/// one of them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedPointerSample {
    pub wall_t: f64,
    pub hover_t: f64,
    pub x: f64,
    pub y: f64,
    pub element_idx: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverInterval {
    pub element_idx: usize,
    pub start_wall: f64,
    pub end_wall: f64,
    pub start_hover: f64,
    pub end_hover: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub index: usize,
    pub rect: Rect,
}

/// Client-side log of which pulses it actually applied, on the hover axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulseLogEntry {
    pub index: usize,
    pub applied_at_hover_ms: f64,
}

/// Raw standalone verification submission.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySubmission {
    pub token: String,
    pub pointer: Vec<PointerSample>,
    #[serde(default)]
    pub accel: Option<Vec<AccelSample>>,
    #[serde(default)]
    pub phases: Option<Phases>,
    #[serde(default)]
    pub canvas: Option<Canvas>,
    #[serde(default)]
    pub input_method: Option<InputMethod>,
    #[serde(default)]
    pub cog_answer: Option<i64>,
}

/// Raw embed verification submission.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedSubmission {
    pub token: String,
    pub pointer: Vec<EmbedPointerSample>,
    #[serde(default)]
    pub accel: Option<Vec<AccelSample>>,
    #[serde(default)]
    pub hovers: Vec<HoverInterval>,
    #[serde(default)]
    pub pulse_log: Vec<PulseLogEntry>,
    #[serde(default)]
    pub elements: Vec<ElementRect>,
    #[serde(default)]
    pub input_method: Option<InputMethod>,
    #[serde(default)]
    pub device_profile: Option<String>,
}

/// Request-scoped metadata the handlers pass down to the engine.
#[derive(Clone, Debug, Default)]
pub struct RequestMeta {
    pub ip: String,
    pub user_agent: String,
}
