use std::sync::Mutex;

use bytes::Bytes;

use crate::config::Settings;
use crate::session::ImageFile;

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let backup: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| ((*key).to_string(), std::env::var(key).ok()))
        .collect();
    for (key, value) in vars {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    f();
    for (key, value) in backup {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

pub fn test_settings(base_url: &str) -> Settings {
    Settings::default()
        .bria_api_token("test-token")
        .bria_base_url(base_url)
        .gemini_api_key("test-key")
        .gemini_base_url(base_url)
}

pub fn png_file(name: &str) -> ImageFile {
    ImageFile::new(name, "image/png", Bytes::from_static(b"\x89PNG\r\n"))
}
