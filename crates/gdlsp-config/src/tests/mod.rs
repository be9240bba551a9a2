mod auto_reconnect;
mod log_level;

use std::env;

use tempfile::TempDir;

/// Sets one variable for the lifetime of the guard, then puts back whatever
/// was there before. Tests using it must be `#[serial]`.
pub(crate) struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub(crate) fn set(key: &str, value: &str) -> Self {
        let saved = vec![(key.to_string(), env::var(key).ok())];
        // SAFETY: callers are serialized, nothing else touches the environment
        unsafe { env::set_var(key, value) };
        Self { saved }
    }

    /// Remove every `GDLSP_*` variable so overrides from the shell don't leak in.
    fn clear_overrides() -> Self {
        let saved: Vec<_> = env::vars()
            .filter(|(key, _)| key.starts_with("GDLSP_"))
            .map(|(key, value)| (key, Some(value)))
            .collect();
        for (key, _) in &saved {
            // SAFETY: see `set`
            unsafe { env::remove_var(key) };
        }
        Self { saved }
    }

    fn into_saved(mut self) -> Vec<(String, Option<String>)> {
        std::mem::take(&mut self.saved)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            // SAFETY: see `set`
            unsafe {
                match value {
                    Some(value) => env::set_var(&key, value),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}

/// Empty config directory with GDLSP_CONFIG_DIR pointing at it.
pub(crate) fn setup_config_dir() -> (TempDir, EnvGuard) {
    let temp = TempDir::new().unwrap();
    let mut guard = EnvGuard::clear_overrides();
    let dir = EnvGuard::set(crate::CONFIG_DIR_ENV, temp.path().to_str().unwrap());
    guard.saved.extend(dir.into_saved());
    (temp, guard)
}
