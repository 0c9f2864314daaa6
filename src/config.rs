use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "stagehand.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Editor tunables. Every field has a default, so partial files are accepted.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub assets_root: PathBuf,
    pub window_width: u32,
    pub window_height: u32,
    pub max_point_lights: usize,
    pub max_spot_lights: usize,
    pub directional_shadow_size: u32,
    pub omni_shadow_size: u32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    pub fov_y_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub gizmo_screen_factor: f32,
    pub icon_screen_factor: f32,
    pub thumbnail_size: u32,
    pub camera_move_speed: f32,
    pub camera_turn_speed: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("Assets"),
            window_width: 1366,
            window_height: 768,
            max_point_lights: 3,
            max_spot_lights: 3,
            directional_shadow_size: 2048,
            omni_shadow_size: 1024,
            shadow_near: 0.01,
            shadow_far: 100.0,
            fov_y_degrees: 60.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            gizmo_screen_factor: 0.15,
            icon_screen_factor: 0.05,
            thumbnail_size: 64,
            camera_move_speed: 5.0,
            camera_turn_speed: 0.2,
        }
    }
}

impl EditorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads `path`, falling back to defaults when the file is absent or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded editor config from {}", path.display());
                config
            }
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                log::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(err) => {
                log::warn!("{err}; using defaults");
                Self::default()
            }
        }
    }

    pub fn textures_dir(&self) -> PathBuf {
        self.assets_root.join("Textures")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.assets_root.join("Models")
    }
}

#[cfg(test)]
mod tests {
    use super::EditorConfig;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|value| value.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("stagehand_config_{name}_{nonce}.json"))
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let path = temp_path("partial");
        std::fs::write(&path, r#"{ "max_point_lights": 5, "assets_root": "Content" }"#)
            .expect("write config");

        let config = EditorConfig::load(&path).expect("load config");
        assert_eq!(config.max_point_lights, 5);
        assert_eq!(config.assets_root, std::path::PathBuf::from("Content"));
        assert_eq!(config.max_spot_lights, 3);
        assert_eq!(config.textures_dir(), std::path::PathBuf::from("Content").join("Textures"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{ not json").expect("write config");

        assert!(EditorConfig::load(&path).is_err());
        assert_eq!(EditorConfig::load_or_default(&path), EditorConfig::default());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = temp_path("missing");
        assert_eq!(EditorConfig::load_or_default(&path), EditorConfig::default());
    }
}
