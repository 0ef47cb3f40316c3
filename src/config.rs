use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const COUNTIES_URL: &str =
    "https://cdn.freecodecamp.org/testable-projects-fcc/data/choropleth_map/counties.json";
pub const EDUCATION_URL: &str =
    "https://cdn.freecodecamp.org/testable-projects-fcc/data/choropleth_map/for_user_education.json";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub render: RenderConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    /// URL or local path of the county boundary document (TopoJSON or GeoJSON).
    pub topology: String,
    /// URL or local path of the education records (JSON array or CSV).
    pub education: String,
    pub counties_object: String,
    pub states_object: String,
    pub timeout_secs: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            topology: COUNTIES_URL.to_string(),
            education: EDUCATION_URL.to_string(),
            counties_object: "counties".to_string(),
            states_object: "states".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    /// Nine equal-frequency buckets over the observed percentages.
    #[default]
    Quantile,
    /// Continuous blue ramp over 0..100.
    Sequential,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Source coordinates are already surface pixels.
    #[default]
    Identity,
    AlbersUsa,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// `1001`, `"1001"` and `"01001"` all name the same county.
    #[default]
    Normalize,
    /// Ids only match when both value and JSON type agree.
    Strict,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub scale: ScaleKind,
    pub buckets: usize,
    pub fallback_color: String,
    pub background: String,
    pub projection: ProjectionKind,
    /// Albers scale; ignored by the identity projection.
    pub projection_scale: f64,
    pub key_mode: KeyMode,
    pub legend_width: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 600,
            scale: ScaleKind::default(),
            buckets: 9,
            fallback_color: "#ccc".to_string(),
            background: "#e6f3ff".to_string(),
            projection: ProjectionKind::default(),
            projection_scale: 1000.0,
            key_mode: KeyMode::default(),
            legend_width: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Html,
    Svg,
    Png,
    Geojson,
}

impl OutputFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            OutputFormat::Html => "index.html",
            OutputFormat::Svg => "choropleth.svg",
            OutputFormat::Png => "choropleth.png",
            OutputFormat::Geojson => "counties.geojson",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub formats: Vec<OutputFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            formats: vec![OutputFormat::Html],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise falls back to the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_reproduce_the_published_map() {
        let config = AppConfig::default();
        assert_eq!(config.input.topology, COUNTIES_URL);
        assert_eq!(config.render.width, 960);
        assert_eq!(config.render.height, 600);
        assert_eq!(config.render.buckets, 9);
        assert_eq!(config.render.scale, ScaleKind::Quantile);
        assert_eq!(config.output.formats, vec![OutputFormat::Html]);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [input]
            education = "data/education.csv"

            [render]
            scale = "sequential"
            key_mode = "strict"

            [output]
            formats = ["svg", "png"]
            "#,
        )
        .unwrap();
        assert_eq!(config.input.education, "data/education.csv");
        assert_eq!(config.input.topology, COUNTIES_URL);
        assert_eq!(config.render.scale, ScaleKind::Sequential);
        assert_eq!(config.render.key_mode, KeyMode::Strict);
        assert_eq!(config.render.fallback_color, "#ccc");
        assert_eq!(config.output.formats, vec![OutputFormat::Svg, OutputFormat::Png]);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn load_from_file_reports_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render\nwidth = ").unwrap();
        let err = AppConfig::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
