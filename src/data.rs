use crate::config::{InputConfig, KeyMode};
use crate::error::{Error, RenderError};
use crate::fetch::{Fetcher, RawDatasets};
use crate::topology::decode_boundaries;
use crate::types::{CountyGeometry, CountyId, EducationRecord};
use std::collections::HashMap;
use tracing::{info, warn};

/// Key the education index is built on, derived from a [`CountyId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
    Number(u64),
    Text(String),
}

impl JoinKey {
    pub fn new(id: &CountyId, mode: KeyMode) -> Self {
        match (mode, id) {
            (KeyMode::Strict, CountyId::Numeric(n)) => JoinKey::Number(*n),
            (KeyMode::Strict, CountyId::Text(s)) => JoinKey::Text(s.clone()),
            (KeyMode::Normalize, id) => match id.as_number() {
                Some(n) => JoinKey::Number(n),
                None => JoinKey::Text(id.to_string().trim().to_string()),
            },
        }
    }
}

/// County id → education record, rebuilt for every render pass.
#[derive(Debug, Clone)]
pub struct EducationIndex {
    mode: KeyMode,
    records: HashMap<JoinKey, EducationRecord>,
}

impl EducationIndex {
    /// A later record with the same key replaces the earlier one.
    pub fn build(records: &[EducationRecord], mode: KeyMode) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for record in records {
            if let Some(previous) = index.insert(JoinKey::new(&record.fips, mode), record.clone()) {
                warn!(
                    "Duplicate education record for county {}; keeping {} over {}",
                    record.fips, record.area_name, previous.area_name
                );
            }
        }
        Self { mode, records: index }
    }

    pub fn get(&self, id: &CountyId) -> Option<&EducationRecord> {
        self.records.get(&JoinKey::new(id, self.mode))
    }

    pub fn percentage(&self, id: &CountyId) -> Option<f64> {
        self.get(id).map(|r| r.bachelors_or_higher)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record for a raw fips string as typed by a user or query string.
    /// Tried as text first, then as a number.
    pub fn lookup_str(&self, fips: &str) -> Option<&EducationRecord> {
        let fips = fips.trim();
        let numeric = fips.parse::<u64>().ok().map(CountyId::Numeric);
        self.get(&CountyId::Text(fips.to_string()))
            .or_else(|| numeric.and_then(|id| self.get(&id)))
    }
}

/// Decoded inputs for one render pass.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub geometry: CountyGeometry,
    pub education: Vec<EducationRecord>,
}

impl Datasets {
    pub fn decode(raw: RawDatasets, input: &InputConfig) -> Result<Self, RenderError> {
        let geometry = decode_boundaries(raw.topology, &input.counties_object, &input.states_object)?;
        info!(
            "Decoded {} county features{}",
            geometry.counties.len(),
            if geometry.state_borders.is_some() { " with state borders" } else { "" }
        );
        Ok(Self {
            geometry,
            education: raw.education,
        })
    }
}

/// Fetches both documents and decodes them.
pub async fn load_data(input: &InputConfig, fetcher: &Fetcher) -> Result<Datasets, Error> {
    let raw = fetcher.fetch_all(input).await?;
    Ok(Datasets::decode(raw, input)?)
}
