// src/backend/utils/log.rs

/// Writes one tagged line to the replica debug log, or to stderr when the
/// crate runs off-chain (unit tests), where the replica API traps.
pub fn emit(level: &str, message: &str) {
    #[cfg(target_arch = "wasm32")]
    ic_cdk::println!("{}: {}", level, message);
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{}: {}", level, message);
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::utils::log::emit("INFO", &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::utils::log::emit("WARN", &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::utils::log::emit("ERROR", &format!($($arg)*))
    };
}
