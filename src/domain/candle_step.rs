use {
    crate::utils::TimeUtils,
    serde::{Deserialize, Serialize},
    std::{convert::TryFrom, fmt},
    strum_macros::EnumIter,
};

/// Candle widths the exchange accepts for OHLC requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CandleStep {
    M1,
    M3,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    H6,
    H12,
    D1,
    D3,
}

impl CandleStep {
    pub const fn secs(self) -> i64 {
        use TimeUtils as T;
        match self {
            Self::M1 => T::SECS_IN_MIN,
            Self::M3 => T::SECS_IN_3_MIN,
            Self::M5 => T::SECS_IN_5_MIN,
            Self::M15 => T::SECS_IN_15_MIN,
            Self::M30 => T::SECS_IN_30_MIN,
            Self::H1 => T::SECS_IN_H,
            Self::H2 => T::SECS_IN_2_H,
            Self::H4 => T::SECS_IN_4_H,
            Self::H6 => T::SECS_IN_6_H,
            Self::H12 => T::SECS_IN_12_H,
            Self::D1 => T::SECS_IN_D,
            Self::D3 => T::SECS_IN_3_D,
        }
    }

    pub fn try_from_secs(secs: i64) -> Result<Self, String> {
        use TimeUtils as T;
        match secs {
            T::SECS_IN_MIN => Ok(Self::M1),
            T::SECS_IN_3_MIN => Ok(Self::M3),
            T::SECS_IN_5_MIN => Ok(Self::M5),
            T::SECS_IN_15_MIN => Ok(Self::M15),
            T::SECS_IN_30_MIN => Ok(Self::M30),
            T::SECS_IN_H => Ok(Self::H1),
            T::SECS_IN_2_H => Ok(Self::H2),
            T::SECS_IN_4_H => Ok(Self::H4),
            T::SECS_IN_6_H => Ok(Self::H6),
            T::SECS_IN_12_H => Ok(Self::H12),
            T::SECS_IN_D => Ok(Self::D1),
            T::SECS_IN_3_D => Ok(Self::D3),
            _ => Err(format!("Unsupported candle step: {}s", secs)),
        }
    }
}

impl TryFrom<i64> for CandleStep {
    type Error = String;

    fn try_from(secs: i64) -> Result<Self, Self::Error> {
        Self::try_from_secs(secs)
    }
}

impl From<CandleStep> for i64 {
    fn from(step: CandleStep) -> Self {
        step.secs()
    }
}

impl fmt::Display for CandleStep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", TimeUtils::step_to_string(self.secs()))
    }
}
