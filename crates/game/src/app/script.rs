//! Recorded pointer input replayed through the headless loop.
//!
//! ```json
//! {
//!   "window": [1280, 720],
//!   "frames": [
//!     { "cursor": [768, 360], "left": true },
//!     { "cursor": [768, 360], "repeat": 90 }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use engine::{InputSnapshot, PointerButton, Vec2};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_WINDOW: (u32, u32) = (1280, 720);

/// Demo session for the default world: drop the starting potion, open the
/// chest, walk while holding, talk to the npc, dismiss the dialog, pick the
/// potion back up, then try both cast buttons.
const DEMO_SCRIPT_JSON: &str = r#"{
  "window": [1280, 720],
  "frames": [
    { "cursor": [768, 360], "left": true },
    { "cursor": [768, 360], "repeat": 2 },
    { "cursor": [768, 360], "left": true },
    { "cursor": [768, 360], "repeat": 90 },
    { "cursor": [576, 424], "left": true, "repeat": 20 },
    { "cursor": [576, 424], "repeat": 10 },
    { "cursor": [544, 296], "left": true },
    { "cursor": [544, 296], "repeat": 120 },
    { "cursor": [900, 200], "left": true, "repeat": 3 },
    { "cursor": [900, 200], "repeat": 5 },
    { "cursor": [640, 360], "left": true },
    { "cursor": [640, 360], "repeat": 150 },
    { "cursor": [640, 360], "right": true },
    { "cursor": [640, 360], "left": true, "shift": true },
    { "cursor": [640, 360], "repeat": 2 }
  ]
}"#;

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("read input script '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse input script at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("input script validation failed at {path}: {message}")]
    Invalid { path: String, message: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InputScriptDoc {
    #[serde(default)]
    window: Option<[u32; 2]>,
    frames: Vec<ScriptFrame>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptFrame {
    #[serde(default)]
    cursor: Option<[f32; 2]>,
    #[serde(default)]
    left: bool,
    #[serde(default)]
    right: bool,
    #[serde(default)]
    shift: bool,
    #[serde(default = "default_repeat")]
    repeat: u32,
}

fn default_repeat() -> u32 {
    1
}

#[derive(Debug, Clone)]
pub(crate) struct InputScript {
    window_size: (u32, u32),
    frames: Vec<ScriptFrame>,
}

impl InputScript {
    pub(crate) fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub(crate) fn tick_count(&self) -> u64 {
        self.frames.iter().map(|frame| u64::from(frame.repeat)).sum()
    }

    /// One snapshot per tick, with `repeat` expanded.
    pub(crate) fn snapshots(&self) -> impl Iterator<Item = InputSnapshot> + '_ {
        let window_size = self.window_size;
        self.frames.iter().flat_map(move |frame| {
            let snapshot = InputSnapshot::empty()
                .with_window_size(window_size)
                .with_cursor_position_px(frame.cursor.map(|[x, y]| Vec2 { x, y }))
                .with_button_down(PointerButton::Left, frame.left)
                .with_button_down(PointerButton::Right, frame.right)
                .with_shift_down(frame.shift);
            std::iter::repeat(snapshot).take(frame.repeat as usize)
        })
    }
}

pub(crate) fn load_input_script(path: &Path) -> Result<InputScript, ScriptError> {
    let raw = fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_input_script(&raw)
}

pub(crate) fn demo_script() -> Result<InputScript, ScriptError> {
    parse_input_script(DEMO_SCRIPT_JSON)
}

pub(crate) fn parse_input_script(raw: &str) -> Result<InputScript, ScriptError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let doc = serde_path_to_error::deserialize::<_, InputScriptDoc>(&mut deserializer).map_err(
        |error| {
            let path = error.path().to_string();
            ScriptError::Parse {
                path,
                source: error.into_inner(),
            }
        },
    )?;
    validate(doc)
}

fn validate(doc: InputScriptDoc) -> Result<InputScript, ScriptError> {
    if doc.frames.is_empty() {
        return Err(invalid("frames", "expected at least one frame"));
    }

    let window_size = match doc.window {
        Some([width, height]) if width == 0 || height == 0 => {
            return Err(invalid(
                "window",
                format!("expected non-zero size, got {width}x{height}"),
            ));
        }
        Some([width, height]) => (width, height),
        None => DEFAULT_WINDOW,
    };

    for (index, frame) in doc.frames.iter().enumerate() {
        if frame.repeat == 0 {
            return Err(invalid(
                &format!("frames[{index}].repeat"),
                "expected at least 1",
            ));
        }
        if let Some([x, y]) = frame.cursor {
            if !x.is_finite() || !y.is_finite() {
                return Err(invalid(
                    &format!("frames[{index}].cursor"),
                    "expected finite coordinates",
                ));
            }
        }
    }

    Ok(InputScript {
        window_size,
        frames: doc.frames,
    })
}

fn invalid(path: &str, message: impl Into<String>) -> ScriptError {
    ScriptError::Invalid {
        path: path.to_string(),
        message: message.into(),
    }
}
