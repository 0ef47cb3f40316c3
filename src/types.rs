use geo::{MultiLineString, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::fmt;

/// County identifier exactly as it appeared in the source document.
///
/// The published datasets use bare numbers (`1001`), but other sources carry
/// zero-padded strings (`"01001"`). Both forms are kept so the join can decide
/// whether to treat them as the same county.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountyId {
    Numeric(u64),
    Text(String),
}

impl CountyId {
    /// Numeric value of the id, if it has one. `"01001"` yields `1001`.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            CountyId::Numeric(n) => Some(*n),
            CountyId::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for CountyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountyId::Numeric(n) => write!(f, "{}", n),
            CountyId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for CountyId {
    fn from(value: u64) -> Self {
        CountyId::Numeric(value)
    }
}

impl From<&str> for CountyId {
    fn from(value: &str) -> Self {
        CountyId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    pub fips: CountyId,
    pub area_name: String,
    pub state: String,
    #[serde(rename = "bachelorsOrHigher")]
    pub bachelors_or_higher: f64,
}

/// One county polygon decoded from the boundary source, in source coordinates.
#[derive(Debug, Clone)]
pub struct CountyFeature {
    pub id: Option<CountyId>,
    pub geometry: MultiPolygon<f64>,
}

/// Everything decoded from the boundary document.
#[derive(Debug, Clone, Default)]
pub struct CountyGeometry {
    pub counties: Vec<CountyFeature>,
    /// Interior state borders, when the source carries a states object.
    pub state_borders: Option<MultiLineString<f64>>,
}

/// Red/green/blue triple; every fill on the map is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rgb` or `#rrggbb`.
    pub fn parse_hex(hex: &str) -> Option<Rgb> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let digit = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut channels = hex.chars().map(|c| {
                    let d = c.to_digit(16)? as u8;
                    Some(d * 16 + d)
                });
                Some(Rgb(channels.next()??, channels.next()??, channels.next()??))
            }
            6 => Some(Rgb(digit(&hex[0..2])?, digit(&hex[2..4])?, digit(&hex[4..6])?)),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Sum of channels, used to compare how deep two blues are.
    pub fn brightness(self) -> u16 {
        self.0 as u16 + self.1 as u16 + self.2 as u16
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn county_id_deserializes_numbers_and_strings() {
        let ids: Vec<CountyId> = serde_json::from_str(r#"[1001, "01001"]"#).unwrap();
        assert_eq!(ids[0], CountyId::Numeric(1001));
        assert_eq!(ids[1], CountyId::Text("01001".into()));
        assert_eq!(ids[1].as_number(), Some(1001));
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn education_record_uses_camel_case_percentage() {
        let rec: EducationRecord = serde_json::from_str(
            r#"{"fips":1001,"state":"AL","area_name":"Autauga County","bachelorsOrHigher":21.9}"#,
        )
        .unwrap();
        assert_eq!(rec.bachelors_or_higher, 21.9);
        assert_eq!(rec.fips.to_string(), "1001");
    }

    #[test]
    fn hex_colors_parse_in_both_forms() {
        assert_eq!(Rgb::parse_hex("#ccc"), Some(Rgb(0xcc, 0xcc, 0xcc)));
        assert_eq!(Rgb::parse_hex("08306b"), Some(Rgb(0x08, 0x30, 0x6b)));
        assert_eq!(Rgb::parse_hex("#12"), None);
        assert_eq!(Rgb(0xe6, 0xf3, 0xff).to_hex(), "#e6f3ff");
    }
}
