use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HandnavConfig {
    pub camera: CameraConfig,
    pub gestures: GestureConfig,
    pub cursor: CursorConfig,
    pub capture: CaptureConfig,
    pub driver: DriverConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Requested camera resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second delivered by the camera
    #[serde(default = "default_camera_fps")]
    pub fps: u32,
}

/// Thresholds and hold times for gesture interpretation
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GestureConfig {
    /// Fist hold before a viewport capture, in milliseconds
    #[serde(default = "default_fist_hold_ms")]
    pub fist_hold_ms: u64,

    /// Palm hold before a full-page capture, in milliseconds
    #[serde(default = "default_palm_hold_ms")]
    pub palm_hold_ms: u64,

    /// Hover hold over a clickable element before clicking, in milliseconds
    #[serde(default = "default_click_hold_ms")]
    pub click_hold_ms: u64,

    /// How long the click confirmation stays visible, in milliseconds
    #[serde(default = "default_click_confirm_ms")]
    pub click_confirm_ms: u64,

    /// Minimum time between two scroll/swipe actions, in milliseconds
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Minimum normalized vertical movement for a scroll
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: f64,

    /// Pixels scrolled per accepted scroll gesture
    #[serde(default = "default_scroll_amount")]
    pub scroll_amount: f64,

    /// Minimum normalized horizontal movement for a swipe
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: f64,

    /// Length of the scroll and swipe position histories
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CursorConfig {
    /// Number of samples averaged for the cursor position
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,

    /// Gain applied to fingertip offsets from the frame center
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    /// Diameter of the cursor marker in pixels
    #[serde(default = "default_marker_size")]
    pub marker_size: f64,

    /// Viewport size used by the headless host (width, height)
    #[serde(default = "default_viewport")]
    pub viewport: (u32, u32),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Directory where captures are written
    #[serde(default = "default_capture_path")]
    pub path: String,

    /// Delay between hiding overlays and rasterizing, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Background color used behind transparent content
    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Rasterization scale factor
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Write a JSON metadata sidecar for each capture
    #[serde(default = "default_save_metadata")]
    pub save_metadata: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DriverConfig {
    /// Display refresh rate driving the frame loop
    #[serde(default = "default_refresh_hz")]
    pub refresh_hz: u32,

    /// Show the startup and gesture help notifications
    #[serde(default = "default_show_help")]
    pub show_help: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl GestureConfig {
    pub fn fist_hold(&self) -> Duration {
        Duration::from_millis(self.fist_hold_ms)
    }

    pub fn palm_hold(&self) -> Duration {
        Duration::from_millis(self.palm_hold_ms)
    }

    pub fn click_hold(&self) -> Duration {
        Duration::from_millis(self.click_hold_ms)
    }

    pub fn click_confirm(&self) -> Duration {
        Duration::from_millis(self.click_confirm_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl DriverConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.refresh_hz.max(1) as u64)
    }
}

impl HandnavConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("handnav.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("gestures.fist_hold_ms", default_fist_hold_ms())?
            .set_default("gestures.palm_hold_ms", default_palm_hold_ms())?
            .set_default("gestures.click_hold_ms", default_click_hold_ms())?
            .set_default("gestures.click_confirm_ms", default_click_confirm_ms())?
            .set_default("gestures.cooldown_ms", default_cooldown_ms())?
            .set_default("gestures.scroll_threshold", default_scroll_threshold())?
            .set_default("gestures.scroll_amount", default_scroll_amount())?
            .set_default("gestures.swipe_threshold", default_swipe_threshold())?
            .set_default(
                "gestures.history_capacity",
                default_history_capacity() as i64,
            )?
            .set_default(
                "cursor.smoothing_window",
                default_smoothing_window() as i64,
            )?
            .set_default("cursor.sensitivity", default_sensitivity())?
            .set_default("cursor.marker_size", default_marker_size())?
            .set_default(
                "cursor.viewport",
                vec![default_viewport().0, default_viewport().1],
            )?
            .set_default("capture.path", default_capture_path())?
            .set_default("capture.settle_ms", default_settle_ms())?
            .set_default("capture.background_color", default_background_color())?
            .set_default("capture.scale", default_scale())?
            .set_default("capture.save_metadata", default_save_metadata())?
            .set_default("driver.refresh_hz", default_refresh_hz())?
            .set_default("driver.show_help", default_show_help())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(Environment::with_prefix("HANDNAV").separator("__"))
            .build()?;

        let config: HandnavConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        let gestures = &self.gestures;
        if gestures.fist_hold_ms == 0 || gestures.palm_hold_ms == 0 || gestures.click_hold_ms == 0
        {
            return Err(ConfigError::Message(
                "Gesture hold times must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("scroll_threshold", gestures.scroll_threshold),
            ("scroll_amount", gestures.scroll_amount),
            ("swipe_threshold", gestures.swipe_threshold),
            ("sensitivity", self.cursor.sensitivity),
            ("scale", self.capture.scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Message(format!(
                    "{} must be a positive number",
                    name
                )));
            }
        }

        if gestures.history_capacity < 2 {
            return Err(ConfigError::Message(
                "Gesture history capacity must be at least 2".to_string(),
            ));
        }

        if self.cursor.smoothing_window == 0 {
            return Err(ConfigError::Message(
                "Cursor smoothing window must be greater than 0".to_string(),
            ));
        }

        if self.cursor.viewport.0 == 0 || self.cursor.viewport.1 == 0 {
            return Err(ConfigError::Message(
                "Viewport size must be greater than 0".to_string(),
            ));
        }

        if self.driver.refresh_hz == 0 {
            return Err(ConfigError::Message(
                "Driver refresh rate must be greater than 0".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for HandnavConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
            },
            gestures: GestureConfig::default(),
            cursor: CursorConfig::default(),
            capture: CaptureConfig {
                path: default_capture_path(),
                settle_ms: default_settle_ms(),
                background_color: default_background_color(),
                scale: default_scale(),
                save_metadata: default_save_metadata(),
            },
            driver: DriverConfig {
                refresh_hz: default_refresh_hz(),
                show_help: default_show_help(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            fist_hold_ms: default_fist_hold_ms(),
            palm_hold_ms: default_palm_hold_ms(),
            click_hold_ms: default_click_hold_ms(),
            click_confirm_ms: default_click_confirm_ms(),
            cooldown_ms: default_cooldown_ms(),
            scroll_threshold: default_scroll_threshold(),
            scroll_amount: default_scroll_amount(),
            swipe_threshold: default_swipe_threshold(),
            history_capacity: default_history_capacity(),
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            smoothing_window: default_smoothing_window(),
            sensitivity: default_sensitivity(),
            marker_size: default_marker_size(),
            viewport: default_viewport(),
        }
    }
}

// Default value functions
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_camera_fps() -> u32 {
    30
}

fn default_fist_hold_ms() -> u64 {
    2500
}
fn default_palm_hold_ms() -> u64 {
    2500
}
fn default_click_hold_ms() -> u64 {
    1500
}
fn default_click_confirm_ms() -> u64 {
    200
}
fn default_cooldown_ms() -> u64 {
    500
}
fn default_scroll_threshold() -> f64 {
    0.02
}
fn default_scroll_amount() -> f64 {
    500.0
}
fn default_swipe_threshold() -> f64 {
    0.16
}
fn default_history_capacity() -> usize {
    5
}

fn default_smoothing_window() -> usize {
    10
}
fn default_sensitivity() -> f64 {
    4.0
}
fn default_marker_size() -> f64 {
    16.0
}
fn default_viewport() -> (u32, u32) {
    (1280, 720)
}

fn default_capture_path() -> String {
    "./captures".to_string()
}
fn default_settle_ms() -> u64 {
    100
}
fn default_background_color() -> String {
    "#ffffff".to_string()
}
fn default_scale() -> f64 {
    1.0
}
fn default_save_metadata() -> bool {
    false
}

fn default_refresh_hz() -> u32 {
    60
}
fn default_show_help() -> bool {
    true
}

fn default_event_bus_capacity() -> usize {
    100
}
