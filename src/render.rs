//! The render pipeline: fetch → transform → join → draw.

use crate::config::{AppConfig, OutputFormat};
use crate::data::{load_data, Datasets, EducationIndex};
use crate::error::{Error, RenderError};
use crate::fetch::Fetcher;
use crate::processing::build_shapes;
use crate::projection::Projection;
use crate::scale::ColorScale;
use crate::scene::{Legend, MountPoints, Page, Tooltip};
use crate::types::{CountyGeometry, Rgb};
use crate::{export, html, raster};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Fetching,
    Rendered,
    Failed(String),
}

pub struct Renderer {
    config: AppConfig,
    fallback: Rgb,
    state: RenderState,
    page: Page,
    index: Option<EducationIndex>,
    geometry: Option<CountyGeometry>,
}

impl Renderer {
    /// Colours in the configuration are validated up front.
    pub fn new(config: AppConfig, mount: MountPoints) -> Result<Self, RenderError> {
        let parse = |hex: &str| Rgb::parse_hex(hex).ok_or_else(|| RenderError::InvalidColor(hex.to_string()));
        let fallback = parse(&config.render.fallback_color)?;
        let background = parse(&config.render.background)?;
        let page = Page::new(mount, config.render.width, config.render.height, background);
        Ok(Self {
            config,
            fallback,
            state: RenderState::Idle,
            page,
            index: None,
            geometry: None,
        })
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Education index of the last successful render.
    pub fn index(&self) -> Option<&EducationIndex> {
        self.index.as_ref()
    }

    /// Clears the page and draws `data` onto it.
    pub fn render(&mut self, data: &Datasets) -> Result<&Page, RenderError> {
        let render = &self.config.render;

        self.page.surface.clear();
        self.page.legend = None;
        self.page.tooltip = Tooltip::new(&self.page.mount.tooltip);

        if data.geometry.counties.is_empty() {
            return Err(RenderError::NoFeatures);
        }

        let index = EducationIndex::build(&data.education, render.key_mode);
        let scale = ColorScale::new(
            render.scale,
            data.education.iter().map(|r| r.bachelors_or_higher),
            render.buckets,
        );
        let projection = Projection::from_config(
            render.projection,
            render.projection_scale,
            render.width,
            render.height,
        );

        self.page.surface.shapes =
            build_shapes(&data.geometry.counties, &index, &scale, &projection, self.fallback);
        self.page.surface.borders = data
            .geometry
            .state_borders
            .as_ref()
            .map(|mesh| projection.multi_line(mesh));
        self.page.legend = Some(Legend::new(
            &self.page.mount.legend,
            render.scale,
            &scale,
            render.legend_width,
        ));

        self.index = Some(index);
        self.geometry = Some(data.geometry.clone());
        self.state = RenderState::Rendered;
        Ok(&self.page)
    }

    /// Full pipeline. Failures are logged, leave the renderer in
    /// [`RenderState::Failed`] and are returned to the caller.
    pub async fn run(&mut self, fetcher: &Fetcher) -> Result<&Page, Error> {
        self.state = RenderState::Fetching;
        let outcome = match load_data(&self.config.input, fetcher).await {
            Ok(data) => self.render(&data).map(|_| ()).map_err(Error::from),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => Ok(&self.page),
            Err(e) => {
                error!("Error creating choropleth: {}", e);
                self.state = RenderState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Writes every configured output format into `dir`.
    pub fn write_outputs(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if self.state != RenderState::Rendered {
            anyhow::bail!("nothing rendered yet (state {:?})", self.state);
        }
        fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory {:?}", dir))?;

        let mut written = Vec::new();
        for format in &self.config.output.formats {
            let path = dir.join(format.file_name());
            match format {
                OutputFormat::Html => fs::write(&path, html::page_html(&self.page))
                    .with_context(|| format!("Failed to write {:?}", path))?,
                OutputFormat::Svg => fs::write(&path, html::surface_svg(&self.page.surface))
                    .with_context(|| format!("Failed to write {:?}", path))?,
                OutputFormat::Png => raster::rasterize(&self.page.surface)
                    .save(&path)
                    .with_context(|| format!("Failed to write {:?}", path))?,
                OutputFormat::Geojson => {
                    let geometry = self.geometry.as_ref().context("no geometry retained")?;
                    let collection = export::feature_collection(geometry, &self.page.surface);
                    let body = serde_json::to_string(&collection).context("Failed to serialize GeoJSON")?;
                    fs::write(&path, body).with_context(|| format!("Failed to write {:?}", path))?
                }
            }
            info!("Wrote {:?}", path);
            written.push(path);
        }
        Ok(written)
    }
}
