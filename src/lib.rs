//! County-level educational attainment choropleth.
//!
//! Fetches a county boundary topology and per-county education records,
//! joins them by FIPS code and draws a coloured map with a tooltip and a
//! legend. [`render::Renderer`] drives the pipeline; the output writers
//! serialize its [`scene::Page`] as HTML, SVG, PNG or GeoJSON.

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod fetch;
pub mod html;
pub mod index;
pub mod processing;
pub mod projection;
pub mod raster;
pub mod render;
pub mod scale;
pub mod scene;
pub mod server;
pub mod topology;
pub mod types;
