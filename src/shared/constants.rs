pub const APP_NAME: &str = "terim";

pub const TERIM_CONFIG_FILE: &str = "terim.config";
pub const ERROR_LOG_FILE: &str = "error.log";
pub const DEBUG_LOG_FILE: &str = "debug.log";
pub const DEBUG_ENV_VAR: &str = "TERIM_DEBUG";

/// Frame rate used when a frame carries no (or a zero) duration.
pub const DEFAULT_FALLBACK_FPS: u32 = 30;

/// Terminals never expose more palette registers than this.
pub const MAX_COLOR_REGISTERS: u16 = 256;

/// Register 0 is kept as the foreground reference and never holds image data.
pub const RESERVED_REGISTER: u8 = 0;

pub const QUIT_KEY: char = 'q';
