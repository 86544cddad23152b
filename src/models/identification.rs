use serde::{Deserialize, Serialize};

use super::lenient;

/// One species match as returned by the recognition endpoint.
///
/// The primary match and every alternative share this shape. Alternatives are
/// existing plant templates on the server, so they carry an `id`; the primary
/// match is freshly generated and usually does not.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlantCandidate {
    #[serde(default, deserialize_with = "lenient::optional_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "latinName", default, skip_serializing_if = "Option::is_none")]
    pub latin_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_days")]
    pub water_frequency: Option<u32>,
    #[serde(default)]
    pub sunlight: Option<String>,
    #[serde(rename = "soilType", default)]
    pub soil_type: Option<String>,
    #[serde(default)]
    pub care_instructions: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

/// Which candidate of an [`IdentificationResult`] a selection points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "index")]
pub enum CandidateRef {
    Primary,
    Alternative(usize),
}

impl CandidateRef {
    /// `0` is the AI pick, `n` is the n-th alternative (1-based), the numbering
    /// the review list shows.
    pub fn from_position(position: usize) -> Self {
        match position {
            0 => CandidateRef::Primary,
            n => CandidateRef::Alternative(n - 1),
        }
    }

    pub fn position(&self) -> usize {
        match self {
            CandidateRef::Primary => 0,
            CandidateRef::Alternative(index) => index + 1,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, CandidateRef::Primary)
    }
}

/// The primary match plus ordered alternatives for one captured photo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationResult {
    primary: PlantCandidate,
    alternatives: Vec<PlantCandidate>,
}

impl IdentificationResult {
    pub fn new(primary: PlantCandidate, alternatives: Vec<PlantCandidate>) -> Self {
        Self {
            primary,
            alternatives,
        }
    }

    pub fn primary(&self) -> &PlantCandidate {
        &self.primary
    }

    pub fn alternatives(&self) -> &[PlantCandidate] {
        &self.alternatives
    }

    pub fn candidate(&self, target: CandidateRef) -> Option<&PlantCandidate> {
        match target {
            CandidateRef::Primary => Some(&self.primary),
            CandidateRef::Alternative(index) => self.alternatives.get(index),
        }
    }

    pub fn len(&self) -> usize {
        1 + self.alternatives.len()
    }

    /// Primary first, then alternatives in server order.
    pub fn iter(&self) -> impl Iterator<Item = (CandidateRef, &PlantCandidate)> {
        std::iter::once((CandidateRef::Primary, &self.primary)).chain(
            self.alternatives
                .iter()
                .enumerate()
                .map(|(index, candidate)| (CandidateRef::Alternative(index), candidate)),
        )
    }
}
