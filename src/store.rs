//! [`ConfigStore`] backed by the JSON config file.
//!
//! The store only owns the `"transforms"."posy"` key.  Everything else in
//! the file, including sections this crate knows nothing about (the widget
//! list, for one), is carried through a write byte-for-byte in meaning.

use crate::config::Config;
use crate::geometry::Rect;
use crate::traits::ConfigStore;
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Errors produced by [`JsonConfigStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config root is not a JSON object")]
    NotAnObject,
}

pub struct JsonConfigStore {
    path: PathBuf,
    displays: RefCell<Vec<Rect>>,
    subscribers: RefCell<Vec<mpsc::Sender<Config>>>,
}

impl JsonConfigStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            displays: RefCell::new(Vec::new()),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Known display bounds, indexed by `transforms.display`.
    pub fn with_displays(self, displays: Vec<Rect>) -> Self {
        self.set_displays(displays);
        self
    }

    pub fn set_displays(&self, displays: Vec<Rect>) {
        *self.displays.borrow_mut() = displays;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn attach_display(&self, mut config: Config) -> Config {
        let index = config
            .transforms
            .display
            .filter(|d| *d >= 0.0)
            .map(|d| d as usize)
            .unwrap_or(0);
        let displays = self.displays.borrow();
        config.display_bounds = displays.get(index).or_else(|| displays.first()).copied();
        config
    }

    /// Raw file contents as a JSON object; a missing file reads as `{}`.
    fn read_raw(&self) -> Result<Map<String, Value>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject),
        }
    }

    fn write_raw(&self, root: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        let text = serde_json::to_string_pretty(root)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn notify(&self, config: &Config) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(config.clone()).is_ok());
    }
}

impl ConfigStore for JsonConfigStore {
    type Error = StoreError;

    /// A missing file is not an error: the launcher simply has not been
    /// configured yet.
    fn load(&self) -> Result<Config, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("{} not found, using defaults", self.path.display());
                return Ok(self.attach_display(Config::default()));
            }
            Err(e) => return Err(self.io_error(e)),
        };
        let config = Config::parse(&text)?;
        Ok(self.attach_display(config))
    }

    /// Defaults placed on the configured display.
    fn fallback(&self) -> Config {
        self.attach_display(Config::default())
    }

    fn save_anchor_offset(&self, offset: i32) -> Result<(), StoreError> {
        let mut root = self.read_raw()?;
        let transforms = root
            .entry("transforms")
            .or_insert_with(|| Value::Object(Map::new()));
        if !transforms.is_object() {
            *transforms = Value::Object(Map::new());
        }
        if let Value::Object(t) = transforms {
            t.insert("posy".into(), Value::from(offset));
        }
        self.write_raw(&root)?;
        debug!("saved anchor offset {} to {}", offset, self.path.display());

        // The offset is on disk even if an unrelated section is broken.
        match serde_json::from_value::<Config>(Value::Object(root)) {
            Ok(config) => self.notify(&self.attach_display(config)),
            Err(e) => warn!(
                "saved anchor offset, but {} does not parse ({}); subscribers not notified",
                self.path.display(),
                e
            ),
        }
        Ok(())
    }

    fn subscribe(&self) -> mpsc::Receiver<Config> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    /// A unique config path inside its own temp directory.
    fn tmp_config_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir()
            .join(format!("edgebar-store-test-{}-{}", std::process::id(), id))
            .join("config.json")
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn missing_file_reads_as_defaults() {
        let path = tmp_config_path();
        let display = Rect::new(0.0, 0.0, 2560.0, 1440.0);
        let store = JsonConfigStore::new(&path).with_displays(vec![display]);
        let cfg = store.load().unwrap();
        assert_eq!(cfg.transforms, Default::default());
        assert_eq!(cfg.display_bounds, Some(display));
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let path = tmp_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[1, 2").unwrap();
        let display = Rect::new(0.0, 0.0, 2560.0, 1440.0);
        let store = JsonConfigStore::new(&path).with_displays(vec![display]);
        assert!(store.load().is_err());

        let fallback = store.fallback();
        assert_eq!(fallback.transforms, Default::default());
        assert_eq!(fallback.display_bounds, Some(display));
        cleanup(&path);
    }

    #[test]
    fn display_bounds_follow_the_display_index() {
        let path = tmp_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "transforms": { "display": 1 } }"#).unwrap();

        let left = Rect::new(0.0, 0.0, 1920.0, 1080.0);
        let right = Rect::new(1920.0, 0.0, 2560.0, 1440.0);
        let store = JsonConfigStore::new(&path).with_displays(vec![left, right]);
        assert_eq!(store.load().unwrap().display_bounds, Some(right));

        // An index past the end falls back to the primary display.
        std::fs::write(&path, r#"{ "transforms": { "display": 5 } }"#).unwrap();
        assert_eq!(store.load().unwrap().display_bounds, Some(left));
        cleanup(&path);
    }

    #[test]
    fn saving_the_anchor_preserves_unknown_keys() {
        let path = tmp_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{
                "transforms": { "width": 380, "opacity": 0.9, "custom": "x" },
                "widgets": [{ "type": "app", "path": "/usr/bin/foot" }]
            }"#,
        )
        .unwrap();

        let store = JsonConfigStore::new(&path);
        store.save_anchor_offset(-75).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["transforms"]["posy"], Value::from(-75));
        assert_eq!(raw["transforms"]["width"], Value::from(380));
        assert_eq!(raw["transforms"]["custom"], Value::from("x"));
        assert_eq!(raw["widgets"][0]["path"], Value::from("/usr/bin/foot"));
        cleanup(&path);
    }

    #[test]
    fn saving_creates_the_file() {
        let path = tmp_config_path();
        let store = JsonConfigStore::new(&path);
        store.save_anchor_offset(10).unwrap();
        assert_eq!(store.load().unwrap().transforms.posy, Some(10.0));
        cleanup(&path);
    }

    #[test]
    fn broken_file_is_not_overwritten() {
        let path = tmp_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonConfigStore::new(&path);
        assert!(store.save_anchor_offset(1).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
        cleanup(&path);
    }

    #[test]
    fn saving_next_to_a_malformed_section_still_succeeds() {
        let path = tmp_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "gestures": { "travel_distance": "far" } }"#).unwrap();

        let store = JsonConfigStore::new(&path);
        let rx = store.subscribe();
        store.save_anchor_offset(-40).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["transforms"]["posy"], Value::from(-40));
        assert_eq!(raw["gestures"]["travel_distance"], Value::from("far"));
        assert!(rx.try_recv().is_err());
        cleanup(&path);
    }

    #[test]
    fn subscribers_see_saved_config() {
        let path = tmp_config_path();
        let store = JsonConfigStore::new(&path);
        let rx = store.subscribe();
        store.save_anchor_offset(33).unwrap();
        let cfg = rx.try_recv().unwrap();
        assert_eq!(cfg.transforms.posy, Some(33.0));
        cleanup(&path);
    }
}
