use std::sync::{Mutex, OnceLock};

/// Pipeline stage about to start (or the run finishing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Separate,
    Downmix,
    Transcribe,
    PostProcess,
    Finished,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Separate => "Separating vocals",
            Stage::Downmix => "Downmixing vocals to mono",
            Stage::Transcribe => "Converting vocals to MIDI",
            Stage::PostProcess => "Processing MIDI file",
            Stage::Finished => "Finished",
        }
    }
}

type StageCallback = Box<dyn Fn(Stage) + Send + 'static>;

static STAGE_PROGRESS_CB: OnceLock<Mutex<Option<StageCallback>>> = OnceLock::new();

/// Register the stage callback. Replaces any previously registered one.
pub fn set_stage_progress_callback(cb: impl Fn(Stage) + Send + 'static) {
    let slot = STAGE_PROGRESS_CB.get_or_init(|| Mutex::new(None));
    if let Ok(mut g) = slot.lock() {
        *g = Some(Box::new(cb));
    }
}

pub fn emit_stage(stage: Stage) {
    if let Some(m) = STAGE_PROGRESS_CB.get() {
        if let Ok(g) = m.lock() {
            if let Some(cb) = &*g {
                cb(stage);
            }
        }
    }
}

type ToolOutputCallback = Box<dyn Fn(&str, &str) + Send + 'static>;

static TOOL_OUTPUT_CB: OnceLock<Mutex<Option<ToolOutputCallback>>> = OnceLock::new();

/// Register a callback receiving `(tool, line)` for every line an external
/// tool prints. Replaces any previously registered one.
pub fn set_tool_output_callback(cb: impl Fn(&str, &str) + Send + 'static) {
    let slot = TOOL_OUTPUT_CB.get_or_init(|| Mutex::new(None));
    if let Ok(mut g) = slot.lock() {
        *g = Some(Box::new(cb));
    }
}

pub fn emit_tool_output(tool: &str, line: &str) {
    if let Some(m) = TOOL_OUTPUT_CB.get() {
        if let Ok(g) = m.lock() {
            if let Some(cb) = &*g {
                cb(tool, line);
            }
        }
    }
}
