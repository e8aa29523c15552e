use crate::error::PdfError;
use std::fmt;
use std::str::FromStr;

/// PDF version from the file header or the catalog's `/Version`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PdfVersion {
    V1_0,
    V1_1,
    V1_2,
    V1_3,
    V1_4,
    V1_5,
    V1_6,
    V1_7,
    V2_0,
}

impl PdfVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            PdfVersion::V1_0 => "1.0",
            PdfVersion::V1_1 => "1.1",
            PdfVersion::V1_2 => "1.2",
            PdfVersion::V1_3 => "1.3",
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_5 => "1.5",
            PdfVersion::V1_6 => "1.6",
            PdfVersion::V1_7 => "1.7",
            PdfVersion::V2_0 => "2.0",
        }
    }

    /// Numeric form, e.g. `1.7`.
    pub fn as_f64(self) -> f64 {
        match self {
            PdfVersion::V1_0 => 1.0,
            PdfVersion::V1_1 => 1.1,
            PdfVersion::V1_2 => 1.2,
            PdfVersion::V1_3 => 1.3,
            PdfVersion::V1_4 => 1.4,
            PdfVersion::V1_5 => 1.5,
            PdfVersion::V1_6 => 1.6,
            PdfVersion::V1_7 => 1.7,
            PdfVersion::V2_0 => 2.0,
        }
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PdfVersion {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0" => Ok(PdfVersion::V1_0),
            "1.1" => Ok(PdfVersion::V1_1),
            "1.2" => Ok(PdfVersion::V1_2),
            "1.3" => Ok(PdfVersion::V1_3),
            "1.4" => Ok(PdfVersion::V1_4),
            "1.5" => Ok(PdfVersion::V1_5),
            "1.6" => Ok(PdfVersion::V1_6),
            "1.7" => Ok(PdfVersion::V1_7),
            "2.0" => Ok(PdfVersion::V2_0),
            other => Err(PdfError::InvalidStructure(format!(
                "unsupported PDF version '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let version: PdfVersion = "1.7".parse().unwrap();
        assert_eq!(version, PdfVersion::V1_7);
        assert_eq!(version.to_string(), "1.7");
        assert_eq!(version.as_f64(), 1.7);
        assert!("3.1".parse::<PdfVersion>().is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(PdfVersion::V1_4 < PdfVersion::V2_0);
    }
}
