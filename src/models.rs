use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkedEntityType {
    Event,
    MentoringSession,
    Task,
    ScoutingTeam,
}

impl LinkedEntityType {
    pub const ALL: [LinkedEntityType; 4] = [
        Self::Event,
        Self::MentoringSession,
        Self::Task,
        Self::ScoutingTeam,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::MentoringSession => "mentoring_session",
            Self::Task => "task",
            Self::ScoutingTeam => "scouting_team",
        }
    }

    pub fn display_prefix(self) -> &'static str {
        match self {
            Self::Event => "Event: ",
            Self::MentoringSession => "Session: ",
            Self::Task => "Task: ",
            Self::ScoutingTeam => "Team: ",
        }
    }

    pub fn display_title(self, name: &str) -> String {
        format!("{}{}", self.display_prefix(), name.trim())
    }

    pub fn fallback_title(self) -> &'static str {
        match self {
            Self::Event => "Event notes",
            Self::MentoringSession => "Session notes",
            Self::Task => "Task notes",
            Self::ScoutingTeam => "Scouting notes",
        }
    }
}

impl fmt::Display for LinkedEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkedEntityType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "event" => Ok(Self::Event),
            "mentoring_session" => Ok(Self::MentoringSession),
            "task" => Ok(Self::Task),
            "scouting_team" => Ok(Self::ScoutingTeam),
            other => Err(AppError::InvalidInput(format!("unknown linked entity type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub team_id: String,
    pub season_id: String,
    pub name: String,
    pub parent_folder_id: Option<String>,
    pub color: String,
    pub sort_order: i64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub team_id: String,
    pub season_id: String,
    pub folder_id: Option<String>,
    pub title: String,
    pub linked_entity_type: Option<LinkedEntityType>,
    pub linked_entity_id: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFolder {
    pub team_id: String,
    pub season_id: String,
    pub name: String,
    pub parent_folder_id: Option<String>,
    pub color: String,
    pub sort_order: i64,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPage {
    pub team_id: String,
    pub season_id: String,
    pub folder_id: Option<String>,
    pub title: String,
    pub linked_entity: Option<EntityRef>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub entity_type: LinkedEntityType,
    pub entity_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderQuery {
    pub team_id: String,
    pub season_id: String,
    pub name: Option<String>,
    pub root_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub team_id: String,
    pub season_id: String,
    pub folder_id: Option<String>,
    pub linked_entity: Option<EntityRef>,
}

impl PageQuery {
    pub fn linked(key: &ResolutionKey) -> Self {
        Self {
            team_id: key.team_id.clone(),
            season_id: key.season_id.clone(),
            folder_id: None,
            linked_entity: Some(EntityRef {
                entity_type: key.entity_type,
                entity_id: key.entity_id.clone(),
            }),
        }
    }

    pub fn in_folder(team_id: &str, season_id: &str, folder_id: &str) -> Self {
        Self {
            team_id: team_id.to_string(),
            season_id: season_id.to_string(),
            folder_id: Some(folder_id.to_string()),
            linked_entity: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub team_id: String,
    pub season_id: String,
    pub entity_type: LinkedEntityType,
    pub entity_id: String,
}

impl ResolutionKey {
    pub fn new(
        team_id: &str,
        season_id: &str,
        entity_type: LinkedEntityType,
        entity_id: &str,
    ) -> AppResult<Self> {
        Ok(Self {
            team_id: require_non_empty(team_id, "team_id")?,
            season_id: require_non_empty(season_id, "season_id")?,
            entity_type,
            entity_id: require_non_empty(entity_id, "entity_id")?,
        })
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.team_id, self.season_id, self.entity_type, self.entity_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderKey {
    pub team_id: String,
    pub season_id: String,
    pub name: String,
}

impl FolderKey {
    pub fn new(team_id: &str, season_id: &str, name: &str) -> AppResult<Self> {
        Ok(Self {
            team_id: require_non_empty(team_id, "team_id")?,
            season_id: require_non_empty(season_id, "season_id")?,
            name: require_non_empty(name, "category name")?,
        })
    }

    pub fn root_query(&self) -> FolderQuery {
        FolderQuery {
            team_id: self.team_id.clone(),
            season_id: self.season_id.clone(),
            name: Some(self.name.clone()),
            root_only: true,
        }
    }
}

// Identifiers are opaque and kept byte for byte; only all-blank values are rejected.
fn require_non_empty(value: &str, field: &str) -> AppResult<String> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}
