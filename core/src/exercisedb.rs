use serde::Deserialize;

use crate::models::{ExerciseRecord, ExerciseSearchMode};

pub const BASE_URL: &str = "https://exercisedb.p.rapidapi.com";
pub const HOST: &str = "exercisedb.p.rapidapi.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseData {
    pub id: Option<String>,
    pub name: Option<String>,
    pub body_part: Option<String>,
    pub target: Option<String>,
    pub equipment: Option<String>,
}

impl ExerciseSearchMode {
    /// Path segment under `/exercises/` for this kind of search.
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::BodyPart => "bodyPart",
            Self::Target => "target",
            Self::Equipment => "equipment",
        }
    }
}

/// Records without a name are dropped; other missing fields become empty.
#[must_use]
pub fn exercise_to_record(data: ExerciseData) -> Option<ExerciseRecord> {
    let name = data.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
    Some(ExerciseRecord {
        source_id: data.id.unwrap_or_default(),
        name,
        body_part: data.body_part.unwrap_or_default(),
        target: data.target.unwrap_or_default(),
        equipment: data.equipment.unwrap_or_default(),
    })
}

#[must_use]
pub fn to_records(data: Vec<ExerciseData>) -> Vec<ExerciseRecord> {
    data.into_iter().filter_map(exercise_to_record).collect()
}
