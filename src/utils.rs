//! 运行时辅助：panic hook 与浏览器控制台日志。

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}

#[cfg(target_arch = "wasm32")]
pub fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

// Native builds (tests, tooling) have no JS console to call into.
#[cfg(not(target_arch = "wasm32"))]
pub fn log(_message: &str) {}

macro_rules! console_log {
    ($($arg:tt)*) => {
        $crate::utils::log(&format!($($arg)*))
    };
}

pub(crate) use console_log;
