//! Audible fallback when the alert sound cannot be played

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::AlertConfig;

/// Last-resort audible signal. Must never fail loudly.
pub trait FallbackBeep: Send + Sync {
    fn beep(&self);

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// ASCII bell on the controlling terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl FallbackBeep for TerminalBell {
    fn beep(&self) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
            warn!("Terminal bell failed: {}", e);
        }
    }

    fn name(&self) -> &'static str {
        "terminal-bell"
    }
}

/// Win32 `Beep` through the system speaker
#[cfg(windows)]
#[derive(Debug, Clone, Copy)]
pub struct ConsoleBeep {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

#[cfg(windows)]
impl FallbackBeep for ConsoleBeep {
    fn beep(&self) {
        // SAFETY: Beep takes plain integers and has no memory preconditions
        let result = unsafe {
            windows::Win32::System::Diagnostics::Debug::Beep(self.frequency_hz, self.duration_ms)
        };
        if let Err(e) = result {
            warn!("Console beep failed: {}", e);
            TerminalBell.beep();
        }
    }

    fn name(&self) -> &'static str {
        "console-beep"
    }
}

/// Pick the fallback for the current platform. Called once at startup.
pub fn platform_fallback(config: &AlertConfig) -> Arc<dyn FallbackBeep> {
    #[cfg(windows)]
    let fallback: Arc<dyn FallbackBeep> = Arc::new(ConsoleBeep {
        frequency_hz: config.beep_frequency_hz,
        duration_ms: config.beep_duration_ms,
    });

    #[cfg(not(windows))]
    let fallback: Arc<dyn FallbackBeep> = {
        let _ = config;
        Arc::new(TerminalBell)
    };

    debug!("Alert fallback: {}", fallback.name());
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn test_platform_fallback_is_terminal_bell() {
        let fallback = platform_fallback(&AlertConfig::default());
        assert_eq!(fallback.name(), "terminal-bell");
    }

    #[cfg(windows)]
    #[test]
    fn test_platform_fallback_is_console_beep() {
        let fallback = platform_fallback(&AlertConfig::default());
        assert_eq!(fallback.name(), "console-beep");
    }
}
