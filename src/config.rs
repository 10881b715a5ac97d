use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use orderlens_cli::parse_delimiter;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

use crate::category::DEFAULT_TOP_CATEGORIES;
use crate::loader::{DEFAULT_DATA_PATH, DEFAULT_TIMESTAMP_FORMAT};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Default configuration template, every field commented out
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Read and parse `config.toml` in this directory; defaults if it does not exist
    pub fn load_file(&self) -> Result<AppConfig> {
        let config_path = self.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub data: DataConfig,
    pub dashboard: DashboardConfig,
    pub performance: PerformanceConfig,
    pub export: ExportConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    #[serde(deserialize_with = "deserialize_delimiter")]
    pub delimiter: Option<u8>,
    pub timestamp_format: String,
}

/// `delimiter = ";"` or `delimiter = 59`, same forms as `--delimiter`.
fn deserialize_delimiter<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDelimiter {
        Byte(u8),
        Text(String),
    }

    let raw = match Option::<RawDelimiter>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(RawDelimiter::Byte(b)) => b.to_string(),
        Some(RawDelimiter::Text(s)) => s,
    };
    parse_delimiter(&raw)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub top_categories: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub error: String,
    pub dimmed: String,
    pub background: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub card_border: String,
    pub input_active: String,
    pub revenue_bar: String,
    pub cancellation_rate: String,
    pub late: String,
    pub on_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            data: DataConfig::default(),
            dashboard: DashboardConfig::default(),
            performance: PerformanceConfig::default(),
            export: ExportConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATA_PATH),
            delimiter: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_categories: DEFAULT_TOP_CATEGORIES,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("charts"),
            width: 1200,
            height: 600,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: "auto".to_string(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            error: "red".to_string(),
            dimmed: "dark_gray".to_string(),
            background: "reset".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            card_border: "cyan".to_string(),
            input_active: "yellow".to_string(),
            revenue_bar: "#87ceeb".to_string(),
            cancellation_rate: "red".to_string(),
            late: "#e74c3c".to_string(),
            on_time: "#2ecc71".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let manager = ConfigManager::new(app_name)?;
        Self::load_from(&manager)
    }

    /// Load configuration layered over defaults from a specific config directory
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(manager.load_file()?);
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.data.merge(other.data);
        self.dashboard.merge(other.dashboard);
        self.performance.merge(other.performance);
        self.export.merge(other.export);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.dashboard.top_categories == 0 {
            return Err(eyre!("top_categories must be greater than 0"));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        if self.export.width == 0 || self.export.height == 0 {
            return Err(eyre!("export width and height must be greater than 0"));
        }

        if self.data.timestamp_format.trim().is_empty() {
            return Err(eyre!("timestamp_format must not be empty"));
        }

        match self.theme.color_mode.as_str() {
            "light" | "dark" | "auto" => {}
            _ => {
                return Err(eyre!(
                    "Invalid color_mode: {}. Must be 'light', 'dark', or 'auto'",
                    self.theme.color_mode
                ))
            }
        }

        for (name, value) in self.theme.colors.entries() {
            parse_color(value.trim())
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }

        Ok(())
    }
}

impl DataConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DataConfig::default();
        if other.path != default.path {
            self.path = other.path;
        }
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.timestamp_format != default.timestamp_format {
            self.timestamp_format = other.timestamp_format;
        }
    }
}

impl DashboardConfig {
    pub fn merge(&mut self, other: Self) {
        if other.top_categories != DashboardConfig::default().top_categories {
            self.top_categories = other.top_categories;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl ExportConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ExportConfig::default();
        if other.directory != default.directory {
            self.directory = other.directory;
        }
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.color_mode != default.color_mode {
            self.color_mode = other.color_mode;
        }
        self.colors.merge(other.colors);
    }

    /// `light`/`dark` as configured; `auto` looks at `COLORFGBG`.
    pub fn appearance(&self) -> Appearance {
        match self.color_mode.as_str() {
            "light" => Appearance::Light,
            "dark" => Appearance::Dark,
            _ => appearance_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref()),
        }
    }
}

/// Terminal background the palette is chosen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

/// `COLORFGBG` is `fg;bg` (rxvt puts a third field in the middle). Palette
/// slots 7 and 15 are light backgrounds; anything else, or no value, is dark.
fn appearance_from_colorfgbg(value: Option<&str>) -> Appearance {
    match value
        .and_then(|v| v.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok())
    {
        Some(7 | 15) => Appearance::Light,
        _ => Appearance::Dark,
    }
}

impl ColorConfig {
    /// (name, value) pairs in a fixed order; names are the keys used by `Theme::get`.
    pub fn entries(&self) -> [(&'static str, &str); 13] {
        [
            ("primary", &self.primary),
            ("error", &self.error),
            ("dimmed", &self.dimmed),
            ("background", &self.background),
            ("controls_bg", &self.controls_bg),
            ("text_primary", &self.text_primary),
            ("text_secondary", &self.text_secondary),
            ("card_border", &self.card_border),
            ("input_active", &self.input_active),
            ("revenue_bar", &self.revenue_bar),
            ("cancellation_rate", &self.cancellation_rate),
            ("late", &self.late),
            ("on_time", &self.on_time),
        ]
    }

    fn entries_mut(&mut self) -> [(&'static str, &mut String); 13] {
        [
            ("primary", &mut self.primary),
            ("error", &mut self.error),
            ("dimmed", &mut self.dimmed),
            ("background", &mut self.background),
            ("controls_bg", &mut self.controls_bg),
            ("text_primary", &mut self.text_primary),
            ("text_secondary", &mut self.text_secondary),
            ("card_border", &mut self.card_border),
            ("input_active", &mut self.input_active),
            ("revenue_bar", &mut self.revenue_bar),
            ("cancellation_rate", &mut self.cancellation_rate),
            ("late", &mut self.late),
            ("on_time", &mut self.on_time),
        ]
    }

    /// Palette used on light backgrounds when a color is left at its default.
    pub fn light() -> Self {
        Self {
            primary: "blue".to_string(),
            error: "red".to_string(),
            dimmed: "indexed(244)".to_string(),
            background: "reset".to_string(),
            controls_bg: "indexed(254)".to_string(),
            text_primary: "black".to_string(),
            text_secondary: "indexed(240)".to_string(),
            card_border: "blue".to_string(),
            input_active: "indexed(130)".to_string(),
            revenue_bar: "#1f77b4".to_string(),
            cancellation_rate: "red".to_string(),
            late: "#c0392b".to_string(),
            on_time: "#1e8449".to_string(),
        }
    }

    /// Colors to draw with: user overrides on top of the palette for `appearance`.
    pub fn resolve(&self, appearance: Appearance) -> Self {
        match appearance {
            Appearance::Dark => self.clone(),
            Appearance::Light => {
                let mut colors = Self::light();
                colors.merge(self.clone());
                colors
            }
        }
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        let defaults = default.entries();
        let others = other.entries();
        for (i, (_, slot)) in self.entries_mut().into_iter().enumerate() {
            if others[i].1 != defaults[i].1 {
                *slot = others[i].1.to_string();
            }
        }
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        if other.enabled {
            self.enabled = true;
        }
    }
}

/// Turns color strings into terminal colors for what stdout can show.
pub struct ColorParser {
    depth: ColorDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorDepth {
    NoColor,
    Indexed,
    TrueColor,
}

impl ColorParser {
    /// Honors `NO_COLOR`; hex colors fall back to the 256-color palette
    /// when the terminal has no true color.
    pub fn new() -> Self {
        let depth = if std::env::var_os("NO_COLOR").is_some() {
            ColorDepth::NoColor
        } else if supports_color::on(Stream::Stdout).is_some_and(|level| level.has_16m) {
            ColorDepth::TrueColor
        } else {
            ColorDepth::Indexed
        };
        Self { depth }
    }

    pub fn parse(&self, value: &str) -> Result<Color> {
        let color = parse_color(value.trim())?;
        Ok(match (self.depth, color) {
            (ColorDepth::NoColor, _) => Color::Reset,
            (ColorDepth::Indexed, Color::Rgb(r, g, b)) => Color::Indexed(nearest_xterm_index(r, g, b)),
            (_, color) => color,
        })
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `#rrggbb`, `indexed(N)` or a basic color name.
fn parse_color(value: &str) -> Result<Color> {
    if let Some(hex) = value.strip_prefix('#') {
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
        };
        return match (hex.len(), channel(0), channel(2), channel(4)) {
            (6, Some(r), Some(g), Some(b)) => Ok(Color::Rgb(r, g, b)),
            _ => Err(eyre!("Invalid hex color '{}', expected #rrggbb", value)),
        };
    }

    let name = value.to_ascii_lowercase().replace([' ', '-'], "_");
    if let Some(index) = name
        .strip_prefix("indexed(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return index
            .trim()
            .parse::<u8>()
            .map(Color::Indexed)
            .map_err(|_| eyre!("Invalid indexed color '{}', expected indexed(0-255)", value));
    }

    Ok(match name.as_str() {
        "reset" => Color::Reset,
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Gray,
        "dark_gray" | "dark_grey" => Color::DarkGray,
        _ => {
            return Err(eyre!(
                "Unknown color '{}': use a color name, indexed(N) or #rrggbb",
                value
            ))
        }
    })
}

/// Closest xterm palette entry: either the 6x6x6 cube or the gray ramp.
fn nearest_xterm_index(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    let level = |v: u8| {
        (0u8..6)
            .min_by_key(|&i| (i16::from(v) - i16::from(CUBE_LEVELS[usize::from(i)])).abs())
            .unwrap_or(0)
    };
    let distance = |(cr, cg, cb): (u8, u8, u8)| {
        let d = |a: u8, b: u8| (i32::from(a) - i32::from(b)).pow(2);
        d(r, cr) + d(g, cg) + d(b, cb)
    };

    let (ri, gi, bi) = (level(r), level(g), level(b));
    let cube = (
        CUBE_LEVELS[usize::from(ri)],
        CUBE_LEVELS[usize::from(gi)],
        CUBE_LEVELS[usize::from(bi)],
    );

    // gray ramp 232..=255 runs from 8 to 238 in steps of 10
    let avg = ((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8;
    let step = (avg.saturating_sub(3) / 10).min(23);
    let gray = 8 + 10 * step;

    if distance((gray, gray, gray)) < distance(cube) {
        232 + step
    } else {
        16 + 36 * ri + 6 * gi + bi
    }
}

/// Parsed colors, looked up by their config key.
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        Self::build(&config.colors.resolve(config.appearance()), &ColorParser::new())
    }

    fn build(colors: &ColorConfig, parser: &ColorParser) -> Result<Self> {
        let colors = colors
            .entries()
            .into_iter()
            .map(|(name, value)| Ok((name.to_string(), parser.parse(value)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { colors })
    }

    /// `Color::Reset` for unknown names.
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default()).unwrap_or_else(|_| Theme {
            colors: HashMap::new(),
        })
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(depth: ColorDepth) -> ColorParser {
        ColorParser { depth }
    }

    #[test]
    fn parse_named_indexed_and_hex() {
        let p = parser(ColorDepth::TrueColor);
        assert_eq!(p.parse("Red").unwrap(), Color::Red);
        assert_eq!(p.parse("dark gray").unwrap(), Color::DarkGray);
        assert_eq!(p.parse(" indexed(236) ").unwrap(), Color::Indexed(236));
        assert_eq!(p.parse("#2ecc71").unwrap(), Color::Rgb(0x2e, 0xcc, 0x71));
        assert!(p.parse("indexed(999)").is_err());
        assert!(p.parse("#2ecc7").is_err());
        assert!(p.parse("#zzzzzz").is_err());
        assert!(p.parse("chartreuse-ish").is_err());
    }

    #[test]
    fn no_color_still_validates() {
        let p = parser(ColorDepth::NoColor);
        assert_eq!(p.parse("red").unwrap(), Color::Reset);
        assert!(p.parse("nope").is_err());
    }

    #[test]
    fn hex_falls_back_to_palette() {
        let p = parser(ColorDepth::Indexed);
        assert_eq!(p.parse("#ff0000").unwrap(), Color::Indexed(196));
        assert_eq!(p.parse("cyan").unwrap(), Color::Cyan);
        assert_eq!(nearest_xterm_index(0, 0, 0), 16);
        assert_eq!(nearest_xterm_index(255, 255, 255), 231);
        assert_eq!(nearest_xterm_index(128, 128, 128), 244);
    }

    #[test]
    fn color_merge_only_overrides_changed_fields() {
        let mut base = ColorConfig::default();
        let other = ColorConfig {
            late: "magenta".to_string(),
            ..ColorConfig::default()
        };
        base.primary = "blue".to_string();
        base.merge(other);
        assert_eq!(base.late, "magenta");
        assert_eq!(base.primary, "blue");
    }

    #[test]
    fn color_mode_picks_palette() {
        let light = ThemeConfig {
            color_mode: "light".to_string(),
            ..ThemeConfig::default()
        };
        assert_eq!(light.appearance(), Appearance::Light);
        let theme = Theme::build(
            &light.colors.resolve(light.appearance()),
            &parser(ColorDepth::TrueColor),
        )
        .unwrap();
        assert_eq!(theme.get("text_primary"), Color::Black);
        assert_eq!(theme.get("card_border"), Color::Blue);

        let dark = ThemeConfig {
            color_mode: "dark".to_string(),
            ..ThemeConfig::default()
        };
        let theme = Theme::build(
            &dark.colors.resolve(dark.appearance()),
            &parser(ColorDepth::TrueColor),
        )
        .unwrap();
        assert_eq!(theme.get("text_primary"), Color::White);
        assert_eq!(theme.get("no_such_color"), Color::Reset);
    }

    #[test]
    fn light_palette_keeps_user_overrides() {
        let colors = ColorConfig {
            text_primary: "magenta".to_string(),
            ..ColorConfig::default()
        };
        let resolved = colors.resolve(Appearance::Light);
        assert_eq!(resolved.text_primary, "magenta");
        assert_eq!(resolved.primary, "blue");
        assert_eq!(colors.resolve(Appearance::Dark).primary, "cyan");
    }

    #[test]
    fn auto_mode_reads_terminal_background() {
        assert_eq!(appearance_from_colorfgbg(Some("0;15")), Appearance::Light);
        assert_eq!(appearance_from_colorfgbg(Some("0;default;7")), Appearance::Light);
        assert_eq!(appearance_from_colorfgbg(Some("15;0")), Appearance::Dark);
        assert_eq!(appearance_from_colorfgbg(Some("garbage")), Appearance::Dark);
        assert_eq!(appearance_from_colorfgbg(None), Appearance::Dark);
    }

    #[test]
    fn light_palette_is_valid() {
        for (name, value) in ColorConfig::light().entries() {
            assert!(parse_color(value).is_ok(), "{name}: {value}");
        }
    }
}
