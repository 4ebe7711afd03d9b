use std::io;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use engine::LoopConfig;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::cursor::{ActionDispatcher, CursorMovementSystem, RangeGateMode};
use super::net::{TcpCommandTransport, DEFAULT_OUTBOUND_CAP_BYTES};
use super::script::{demo_script, load_input_script, InputScript, ScriptError};
use super::session::{CursorScene, ScreenRect, UiOverlay};

const SERVER_ADDR_ENV_VAR: &str = "CURSOR_SERVER_ADDR";
const OUTBOUND_CAP_ENV_VAR: &str = "CURSOR_OUTBOUND_CAP_BYTES";
const RANGE_GATE_ENV_VAR: &str = "CURSOR_RANGE_GATE";
const INPUT_SCRIPT_ENV_VAR: &str = "CURSOR_INPUT_SCRIPT";
const TPS_ENV_VAR: &str = "CURSOR_TPS";
const REALTIME_ENV_VAR: &str = "CURSOR_REALTIME";
const DEFAULT_TPS: u32 = 60;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const HUD_STRIP_HEIGHT_PX: f32 = 40.0;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("invalid CURSOR_SERVER_ADDR '{value}': {source}")]
    InvalidServerAddr {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("connect to remote authority at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Script(#[from] ScriptError),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CursorConfig {
    pub(crate) server_addr: Option<SocketAddr>,
    pub(crate) outbound_cap_bytes: usize,
    pub(crate) range_gate: RangeGateMode,
    pub(crate) input_script: Option<PathBuf>,
    pub(crate) target_tps: u32,
    pub(crate) realtime: bool,
}

impl CursorConfig {
    fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_addr = match lookup(SERVER_ADDR_ENV_VAR).as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(value.parse::<SocketAddr>().map_err(|source| {
                AppError::InvalidServerAddr {
                    value: value.to_string(),
                    source,
                }
            })?),
        };

        let outbound_cap_bytes = match lookup(OUTBOUND_CAP_ENV_VAR).as_deref() {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(parsed) if parsed > 0 => parsed,
                _ => {
                    warn!(
                        value,
                        fallback = DEFAULT_OUTBOUND_CAP_BYTES,
                        "outbound_cap_invalid_using_default"
                    );
                    DEFAULT_OUTBOUND_CAP_BYTES
                }
            },
            None => DEFAULT_OUTBOUND_CAP_BYTES,
        };

        let range_gate = match lookup(RANGE_GATE_ENV_VAR).as_deref() {
            Some(value) => RangeGateMode::parse(value).unwrap_or_else(|| {
                warn!(value, fallback = "released", "range_gate_invalid_using_default");
                RangeGateMode::default()
            }),
            None => RangeGateMode::default(),
        };

        let input_script = lookup(INPUT_SCRIPT_ENV_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let target_tps = match lookup(TPS_ENV_VAR).as_deref() {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(parsed) if parsed > 0 => parsed,
                _ => {
                    warn!(value, fallback = DEFAULT_TPS, "tps_invalid_using_default");
                    DEFAULT_TPS
                }
            },
            None => DEFAULT_TPS,
        };

        let realtime = match lookup(REALTIME_ENV_VAR).as_deref().map(str::trim) {
            None | Some("") => false,
            Some("1" | "true" | "yes") => true,
            Some("0" | "false" | "no") => false,
            Some(value) => {
                warn!(value, fallback = false, "realtime_invalid_using_default");
                false
            }
        };

        Ok(Self {
            server_addr,
            outbound_cap_bytes,
            range_gate,
            input_script,
            target_tps,
            realtime,
        })
    }
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: CursorScene,
    pub(crate) script: InputScript,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Cursor Intent Startup ===");

    let config = CursorConfig::from_env()?;
    let script = match &config.input_script {
        Some(path) => {
            info!(path = %path.display(), "input_script_loading");
            load_input_script(path)?
        }
        None => demo_script()?,
    };

    let dispatcher = match config.server_addr {
        Some(addr) => {
            let transport =
                TcpCommandTransport::connect(addr, config.outbound_cap_bytes, CONNECT_TIMEOUT)
                    .map_err(|source| AppError::Connect { addr, source })?;
            info!(
                peer = %transport.peer(),
                cap_bytes = config.outbound_cap_bytes,
                "transport_connected"
            );
            ActionDispatcher::networked(Box::new(transport))
        }
        None => {
            info!("transport_disabled_local_mode");
            ActionDispatcher::local()
        }
    };

    let ui = UiOverlay::default().with_occluder(hud_strip(script.window_size()));
    let scene = CursorScene::new(
        CursorMovementSystem::new(dispatcher, config.range_gate),
        ui,
    );
    info!(
        target_tps = config.target_tps,
        realtime = config.realtime,
        ticks = script.tick_count(),
        "session_configured"
    );

    Ok(AppWiring {
        config: LoopConfig {
            target_tps: config.target_tps,
            realtime: config.realtime,
            ..LoopConfig::default()
        },
        scene,
        script,
    })
}

fn hud_strip(window_size: (u32, u32)) -> ScreenRect {
    let (width, height) = window_size;
    ScreenRect {
        x: 0.0,
        y: (height as f32 - HUD_STRIP_HEIGHT_PX).max(0.0),
        width: width as f32,
        height: HUD_STRIP_HEIGHT_PX,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
