use crate::models::LinkedEntityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySpec {
    pub entity_type: LinkedEntityType,
    pub name: &'static str,
    pub color: &'static str,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderStyle {
    pub color: &'static str,
    pub sort_order: i64,
}

pub const FALLBACK_STYLE: FolderStyle = FolderStyle {
    color: "#6366f1",
    sort_order: 100,
};

const EVENTS: CategorySpec = CategorySpec {
    entity_type: LinkedEntityType::Event,
    name: "Events",
    color: "#3b82f6",
    sort_order: 0,
};

const MENTORING: CategorySpec = CategorySpec {
    entity_type: LinkedEntityType::MentoringSession,
    name: "Mentoring",
    color: "#8b5cf6",
    sort_order: 1,
};

const TASKS: CategorySpec = CategorySpec {
    entity_type: LinkedEntityType::Task,
    name: "Tasks",
    color: "#10b981",
    sort_order: 2,
};

const SCOUTING: CategorySpec = CategorySpec {
    entity_type: LinkedEntityType::ScoutingTeam,
    name: "Scouting",
    color: "#f97316",
    sort_order: 3,
};

const CATEGORY_TABLE: &[CategorySpec] = &[EVENTS, MENTORING, TASKS, SCOUTING];

pub fn all() -> &'static [CategorySpec] {
    CATEGORY_TABLE
}

pub fn for_entity(entity_type: LinkedEntityType) -> &'static CategorySpec {
    match entity_type {
        LinkedEntityType::Event => &EVENTS,
        LinkedEntityType::MentoringSession => &MENTORING,
        LinkedEntityType::Task => &TASKS,
        LinkedEntityType::ScoutingTeam => &SCOUTING,
    }
}

pub fn category_name(entity_type: LinkedEntityType) -> &'static str {
    for_entity(entity_type).name
}

pub fn style_for_name(name: &str) -> FolderStyle {
    CATEGORY_TABLE
        .iter()
        .find(|spec| spec.name == name)
        .map(|spec| FolderStyle {
            color: spec.color,
            sort_order: spec.sort_order,
        })
        .unwrap_or(FALLBACK_STYLE)
}
