use serde::{Deserialize, Serialize};

/// Pixel layout of incoming frames: color only, or color plus depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Channels {
    Rgb,
    Rgbd,
}

impl Channels {
    pub fn count(self) -> usize {
        match self {
            Channels::Rgb => 3,
            Channels::Rgbd => 4,
        }
    }
}

impl TryFrom<u8> for Channels {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Channels::Rgb),
            4 => Ok(Channels::Rgbd),
            other => Err(format!("channels must be 3 or 4, got {other}")),
        }
    }
}

impl From<Channels> for u8 {
    fn from(channels: Channels) -> Self {
        channels.count() as u8
    }
}

impl std::fmt::Display for Channels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channels::Rgb => write!(f, "RGB"),
            Channels::Rgbd => write!(f, "RGB-D"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3, Channels::Rgb)]
    #[case(4, Channels::Rgbd)]
    fn test_from_count(#[case] raw: u8, #[case] expected: Channels) {
        assert_eq!(Channels::try_from(raw).unwrap(), expected);
        assert_eq!(u8::from(expected), raw);
    }

    #[test]
    fn test_rejects_other_counts() {
        assert!(Channels::try_from(1).is_err());
        assert!(Channels::try_from(5).is_err());
    }

    #[test]
    fn test_serde_uses_numeric_form() {
        let json = serde_json::to_string(&Channels::Rgbd).unwrap();
        assert_eq!(json, "4");
        let parsed: Channels = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Channels::Rgb);
        assert!(serde_json::from_str::<Channels>("2").is_err());
    }
}
