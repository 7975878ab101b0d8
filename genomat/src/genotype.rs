use crate::keys::{ChromosomeKey, MarkerKey, SampleKey};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// A two-allele byte pair, the unit moved in bulk during read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Genotype(pub [u8; 2]);

impl Genotype {
    /// The explicit no-call sentinel
    pub const NO_CALL: Genotype = Genotype([b'0', b'0']);

    pub fn new(father: u8, mother: u8) -> Self {
        Genotype([father, mother])
    }

    pub fn is_no_call(&self) -> bool {
        *self == Self::NO_CALL
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0[0] as char, self.0[1] as char)
    }
}

/// The affection status of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affection {
    Unknown,
    Unaffected,
    Affected,
}

impl Affection {
    pub fn code(self) -> u8 {
        match self {
            Affection::Unknown => 0,
            Affection::Unaffected => 1,
            Affection::Affected => 2,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Affection::Unaffected,
            2 => Affection::Affected,
            _ => Affection::Unknown,
        }
    }

    /// Whether the status carries usable phenotype information
    pub fn is_valid(self) -> bool {
        self != Affection::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Unknown,
    Male,
    Female,
}

impl Sex {
    pub fn code(self) -> u8 {
        match self {
            Sex::Unknown => 0,
            Sex::Male => 1,
            Sex::Female => 2,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Sex::Male,
            2 => Sex::Female,
            _ => Sex::Unknown,
        }
    }
}

/// The per-marker annotation row stored alongside the marker key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRecord {
    pub key: MarkerKey,
    pub rs_id: String,
    pub chromosome: ChromosomeKey,
    pub position: i32,
}

/// The per-sample annotation row stored alongside the sample key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    pub key: SampleKey,
    pub affection: Affection,
    pub sex: Sex,
}
