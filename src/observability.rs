use std::panic::PanicHookInfo;

use anyhow::{Error, Result};
use once_cell::sync::OnceCell;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Tracing サブスクライバを一度だけ初期化する。
///
/// フィルタは `RUST_LOG` から読み込み、未設定なら `info`。ログは JSON 形式で
/// 標準エラーに出力する。
///
/// # Errors
/// サブスクライバの初期化に失敗した場合はエラーを返す。
pub fn init() -> Result<()> {
    TRACING_INIT.get_or_try_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .json();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e: tracing_subscriber::util::TryInitError| Error::msg(e.to_string()))?;
        info!(
            service = env!("CARGO_PKG_NAME"),
            version = env!("CARGO_PKG_VERSION"),
            "tracing initialized"
        );

        Ok::<(), Error>(())
    })?;
    Ok(())
}

/// パニックを stderr ではなく tracing の `error` イベントとして記録するフックを設定する。
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");
        let message = panic_message(panic_info);

        match panic_info.location() {
            Some(location) => error!(
                thread = thread_name,
                file = location.file(),
                line = location.line(),
                message,
                "analytics run panicked"
            ),
            None => error!(thread = thread_name, message, "analytics run panicked"),
        }
    }));
}

fn panic_message<'a>(panic_info: &'a PanicHookInfo<'_>) -> &'a str {
    let payload = panic_info.payload();
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
