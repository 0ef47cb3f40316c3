//! Retrieval of the two input documents.
//!
//! A source is either an `http(s)://` URL or a local path. Both documents are
//! requested concurrently and the first failure aborts the pair; there is no
//! retry.

use crate::config::InputConfig;
use crate::error::FetchError;
use crate::types::EducationRecord;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::File(PathBuf::from(location))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Source::Url(url) => url.clone(),
            Source::File(path) => path.display().to_string(),
        }
    }

    /// CSV is chosen by a `.csv` suffix, ignoring any URL query string.
    pub fn is_csv(&self) -> bool {
        let name = match self {
            Source::Url(url) => url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url).to_string(),
            Source::File(path) => path.to_string_lossy().into_owned(),
        };
        name.to_ascii_lowercase().ends_with(".csv")
    }
}

/// Raw documents as they arrived, before any decoding into geometry.
#[derive(Debug, Clone)]
pub struct RawDatasets {
    pub topology: serde_json::Value,
    pub education: Vec<EducationRecord>,
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("edu-choropleth/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Request {
                url: "<client>".to_string(),
                source,
            })?;
        Ok(Self { client })
    }

    async fn bytes(&self, source: &Source) -> Result<Vec<u8>, FetchError> {
        match source {
            Source::Url(url) => {
                debug!("GET {}", url);
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| FetchError::Request { url: url.clone(), source: e })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }

                let body = response
                    .bytes()
                    .await
                    .map_err(|e| FetchError::Request { url: url.clone(), source: e })?;
                Ok(body.to_vec())
            }
            Source::File(path) => tokio::fs::read(path).await.map_err(|e| FetchError::Io {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    pub async fn json<T: DeserializeOwned>(&self, source: &Source) -> Result<T, FetchError> {
        let body = self.bytes(source).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Json {
            origin: source.describe(),
            source: e,
        })
    }

    /// Education records from a JSON array, or from CSV with the same column names.
    pub async fn education(&self, source: &Source) -> Result<Vec<EducationRecord>, FetchError> {
        if source.is_csv() {
            let body = self.bytes(source).await?;
            parse_education_csv(&body, &source.describe())
        } else {
            self.json(source).await
        }
    }

    /// Fetches the boundary document and the education records concurrently.
    pub async fn fetch_all(&self, input: &InputConfig) -> Result<RawDatasets, FetchError> {
        let topology_source = Source::parse(&input.topology);
        let education_source = Source::parse(&input.education);
        info!(
            "Fetching {} and {}",
            topology_source.describe(),
            education_source.describe()
        );

        let (topology, education) = tokio::try_join!(
            self.json::<serde_json::Value>(&topology_source),
            self.education(&education_source),
        )?;

        info!("Fetched {} education records", education.len());
        Ok(RawDatasets { topology, education })
    }
}

fn parse_education_csv(body: &[u8], origin: &str) -> Result<Vec<EducationRecord>, FetchError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(body);
    reader
        .deserialize()
        .collect::<Result<Vec<EducationRecord>, _>>()
        .map_err(|e| FetchError::Csv {
            origin: origin.to_string(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CountyId;

    #[test]
    fn sources_are_urls_or_paths() {
        assert_eq!(
            Source::parse("https://example.org/a.json"),
            Source::Url("https://example.org/a.json".into())
        );
        assert_eq!(Source::parse("data/a.json"), Source::File(PathBuf::from("data/a.json")));
    }

    #[test]
    fn csv_detection_ignores_query_strings() {
        assert!(Source::parse("https://example.org/edu.CSV?v=2").is_csv());
        assert!(Source::parse("edu.csv").is_csv());
        assert!(!Source::parse("https://example.org/edu.json").is_csv());
    }

    #[test]
    fn csv_rows_become_records() {
        let body = b"fips,state,area_name,bachelorsOrHigher\n1001,AL,Autauga County,21.9\n1003, AL ,Baldwin County,28.6\n";
        let records = parse_education_csv(body, "inline").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fips, CountyId::Numeric(1001));
        assert_eq!(records[1].state, "AL");
        assert_eq!(records[1].bachelors_or_higher, 28.6);
    }

    #[test]
    fn bad_csv_names_its_origin() {
        let body = b"fips,state,area_name,bachelorsOrHigher\n1001,AL,Autauga County,lots\n";
        let err = parse_education_csv(body, "edu.csv").unwrap_err();
        assert!(err.to_string().contains("edu.csv"));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let fetcher = Fetcher::new(5).unwrap();
        let err = fetcher
            .json::<serde_json::Value>(&Source::parse("/definitely/not/here.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
