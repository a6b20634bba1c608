use crate::shared::constants;
use lazy_static::lazy_static;
use std::backtrace::Backtrace;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Clone)]
struct LoggerPaths {
    error_path: String,
    debug_path: String,
}

lazy_static! {
    static ref LOGGER: Mutex<Option<LoggerPaths>> = Mutex::new(None);
}

fn append_line(path: &str, line: &str) {
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{}", line);
    }
}

fn truncate_with_banner(path: &Path, banner: &str) {
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
    {
        let _ = writeln!(file, "=== {} Started: {} ===", banner, chrono::Local::now());
    }
}

/// Install the panic hook and, when `enabled`, start the log files in the
/// working directory. With logging disabled every `log` call is a no-op.
pub fn init(enabled: bool) {
    let paths = if enabled {
        let mut error_path = std::env::current_dir().unwrap_or_default();
        error_path.push(constants::ERROR_LOG_FILE);

        let mut debug_path = PathBuf::from(&error_path);
        debug_path.set_file_name(constants::DEBUG_LOG_FILE);

        truncate_with_banner(&error_path, "Error Log");
        truncate_with_banner(&debug_path, "Debug Log");

        let paths = LoggerPaths {
            error_path: error_path.to_string_lossy().to_string(),
            debug_path: debug_path.to_string_lossy().to_string(),
        };
        if let Ok(mut logger) = LOGGER.lock() {
            *logger = Some(paths.clone());
        }
        Some(paths)
    } else {
        None
    };

    panic::set_hook(Box::new(move |info| {
        // Put the shell back first so the message below is readable.
        if crate::renderer::terminal::session_active() {
            crate::renderer::display::emergency_restore();
        }

        let backtrace = Backtrace::capture();
        let msg = match info.payload().downcast_ref::<&str>() {
            Some(s) => *s,
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<Any>",
            },
        };

        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());

        match &paths {
            Some(paths) => {
                let error_msg = format!(
                    "\nCRITICAL PANIC at {}:\nMessage: {}\nBacktrace:\n{:?}\n",
                    location, msg, backtrace
                );
                append_line(&paths.error_path, &error_msg);
                append_line(&paths.debug_path, &error_msg);
                eprintln!(
                    "{} crashed. See {} for details.",
                    constants::APP_NAME,
                    paths.error_path
                );
            }
            None => eprintln!("{} crashed at {}: {}", constants::APP_NAME, location, msg),
        }
    }));
}

pub fn log(level: &str, msg: &str) {
    let Ok(logger) = LOGGER.lock() else {
        return;
    };
    if let Some(paths) = logger.as_ref() {
        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
        let line = format!("[{}][{}] {}", timestamp, level, msg);
        append_line(&paths.debug_path, &line);

        if level == "ERROR" {
            append_line(&paths.error_path, &line);
        }
    }
}

pub fn info(msg: &str) {
    log("INFO", msg);
}

pub fn error(msg: &str) {
    log("ERROR", msg);
}

pub fn debug(msg: &str) {
    log("DEBUG", msg);
}
