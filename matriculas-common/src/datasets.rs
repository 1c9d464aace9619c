//! The nine remote datasets and their static configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one of the nine remote datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DatasetKey {
    #[serde(rename = "reconocedores")]
    Reconocedores,
    #[serde(rename = "vurGeneral")]
    VurGeneral,
    #[serde(rename = "vurPropietarios")]
    VurPropietarios,
    #[serde(rename = "vurSalvedades")]
    VurSalvedades,
    #[serde(rename = "vurAnotaciones")]
    VurAnotaciones,
    #[serde(rename = "vurTramites")]
    VurTramites,
    #[serde(rename = "r1")]
    R1,
    #[serde(rename = "r2")]
    R2,
    #[serde(rename = "cica")]
    Cica,
}

impl DatasetKey {
    /// All dataset keys in dashboard order
    pub const ALL: [DatasetKey; 9] = [
        DatasetKey::Reconocedores,
        DatasetKey::VurGeneral,
        DatasetKey::VurPropietarios,
        DatasetKey::VurSalvedades,
        DatasetKey::VurAnotaciones,
        DatasetKey::VurTramites,
        DatasetKey::R1,
        DatasetKey::R2,
        DatasetKey::Cica,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKey::Reconocedores => "reconocedores",
            DatasetKey::VurGeneral => "vurGeneral",
            DatasetKey::VurPropietarios => "vurPropietarios",
            DatasetKey::VurSalvedades => "vurSalvedades",
            DatasetKey::VurAnotaciones => "vurAnotaciones",
            DatasetKey::VurTramites => "vurTramites",
            DatasetKey::R1 => "r1",
            DatasetKey::R2 => "r2",
            DatasetKey::Cica => "cica",
        }
    }

    /// Field holding this dataset's matricula value
    pub fn identifier_column(&self) -> &'static str {
        match self {
            DatasetKey::Reconocedores => "Matricula CICA",
            DatasetKey::R1 | DatasetKey::R2 => "MATRICULA_INMOBILIARIA",
            _ => "Matricula",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DatasetKey::Reconocedores => "Reconocedores",
            DatasetKey::VurGeneral => "VUR General",
            DatasetKey::VurPropietarios => "VUR Propietarios",
            DatasetKey::VurSalvedades => "VUR Salvedades",
            DatasetKey::VurAnotaciones => "VUR Anotaciones",
            DatasetKey::VurTramites => "VUR Trámites",
            DatasetKey::R1 => "Registro 1",
            DatasetKey::R2 => "Registro 2",
            DatasetKey::Cica => "CICA",
        }
    }

    /// Path appended to the configured base URL
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            DatasetKey::Reconocedores => "reconocedores",
            DatasetKey::VurGeneral => "vur-general",
            DatasetKey::VurPropietarios => "vur-propietarios",
            DatasetKey::VurSalvedades => "vur-salvedades",
            DatasetKey::VurAnotaciones => "vur-anotaciones",
            DatasetKey::VurTramites => "vur-tramites",
            DatasetKey::R1 => "r1",
            DatasetKey::R2 => "r2",
            DatasetKey::Cica => "cica",
        }
    }

    /// Cache key under which this dataset is stored in both tiers
    pub fn cache_key(&self) -> String {
        format!("database_{}", self.as_str())
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DatasetKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::NotFound(format!("dataset '{}'", s)))
    }
}
