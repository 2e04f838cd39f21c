//! DomainState - the full entity set plus identity plumbing
//!
//! Entities are held behind `Arc` so cloning a state is cheap and a patch to
//! one entity leaves every other entity pointer-identical.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Habit, Project, Task};

/// Kind of entity held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    Task,
    Habit,
    Fact,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Task => write!(f, "task"),
            Self::Habit => write!(f, "habit"),
            Self::Fact => write!(f, "fact"),
        }
    }
}

/// Identity of one mutable unit in the store
///
/// The fact sequence is append-only and is treated as a single identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Project(String),
    Task(String),
    Habit(String),
    Facts,
}

impl EntityKey {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Project(_) => EntityKind::Project,
            Self::Task(_) => EntityKind::Task,
            Self::Habit(_) => EntityKind::Habit,
            Self::Facts => EntityKind::Fact,
        }
    }

    /// Entity ID, `None` for the fact sequence
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Project(id) | Self::Task(id) | Self::Habit(id) => Some(id),
            Self::Facts => None,
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}:{}", self.kind(), id),
            None => write!(f, "facts"),
        }
    }
}

/// An owned value of one identified entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValue {
    Project(Project),
    Task(Task),
    Habit(Habit),
}

impl EntityValue {
    pub fn key(&self) -> EntityKey {
        match self {
            Self::Project(p) => EntityKey::Project(p.id.clone()),
            Self::Task(t) => EntityKey::Task(t.id.clone()),
            Self::Habit(h) => EntityKey::Habit(h.id.clone()),
        }
    }
}

/// Common access for the identified entity collections
pub trait Entity: Clone + PartialEq + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Strings the fuzzy resolver matches a query against
    fn search_keys(&self) -> Vec<&str>;

    fn created_at(&self) -> DateTime<Utc>;

    fn collection(state: &DomainState) -> &Vec<Arc<Self>>;

    fn collection_mut(state: &mut DomainState) -> &mut Vec<Arc<Self>>;

    fn key_for(id: &str) -> EntityKey;

    /// Primary display label (first search key)
    fn label(&self) -> &str {
        self.search_keys().first().copied().unwrap_or_default()
    }
}

impl Entity for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn id(&self) -> &str {
        &self.id
    }

    fn search_keys(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn collection(state: &DomainState) -> &Vec<Arc<Self>> {
        &state.projects
    }

    fn collection_mut(state: &mut DomainState) -> &mut Vec<Arc<Self>> {
        &mut state.projects
    }

    fn key_for(id: &str) -> EntityKey {
        EntityKey::Project(id.to_string())
    }
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> &str {
        &self.id
    }

    fn search_keys(&self) -> Vec<&str> {
        vec![self.text.as_str()]
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn collection(state: &DomainState) -> &Vec<Arc<Self>> {
        &state.tasks
    }

    fn collection_mut(state: &mut DomainState) -> &mut Vec<Arc<Self>> {
        &mut state.tasks
    }

    fn key_for(id: &str) -> EntityKey {
        EntityKey::Task(id.to_string())
    }
}

impl Entity for Habit {
    const KIND: EntityKind = EntityKind::Habit;

    fn id(&self) -> &str {
        &self.id
    }

    // Users talk about habits by name or by what they are for ("content")
    fn search_keys(&self) -> Vec<&str> {
        if self.category.trim().is_empty() {
            vec![self.name.as_str()]
        } else {
            vec![self.name.as_str(), self.category.as_str()]
        }
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn collection(state: &DomainState) -> &Vec<Arc<Self>> {
        &state.habits
    }

    fn collection_mut(state: &mut DomainState) -> &mut Vec<Arc<Self>> {
        &mut state.habits
    }

    fn key_for(id: &str) -> EntityKey {
        EntityKey::Habit(id.to_string())
    }
}

/// Everything the assistant knows about the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DomainState {
    pub projects: Vec<Arc<Project>>,
    pub tasks: Vec<Arc<Task>>,
    pub habits: Vec<Arc<Habit>>,
    pub facts: Arc<Vec<String>>,
}

impl DomainState {
    /// Look up an entity by ID
    pub fn find<T: Entity>(&self, id: &str) -> Option<&Arc<T>> {
        T::collection(self).iter().find(|e| e.id() == id)
    }

    /// Plain-text digest of the state for the intent resolver prompt
    pub fn summary(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "PROJECTS:");
        if self.projects.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for p in &self.projects {
            let _ = write!(out, "  - {} [role: {}, status: {}]", p.name, p.role, p.status);
            if !p.next_step.is_empty() {
                let _ = write!(out, " next step: {}", p.next_step);
            }
            if let Some(update) = p.latest_update() {
                let _ = write!(out, " latest update: {}", update.content);
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "TASKS:");
        if self.tasks.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for t in &self.tasks {
            let mark = if t.completed { "x" } else { " " };
            let _ = write!(out, "  - [{}] {} [role: {}, priority: {}]", mark, t.text, t.role, t.priority);
            if let Some(project) = t.project_id.as_deref().and_then(|id| self.find::<Project>(id)) {
                let _ = write!(out, " project: {}", project.name);
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "HABITS:");
        if self.habits.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for h in &self.habits {
            let _ = writeln!(
                out,
                "  - {} [category: {}, streak: {}, done today: {}]",
                h.name, h.category, h.streak, h.completed_today
            );
        }

        let _ = writeln!(out, "KNOWN FACTS:");
        if self.facts.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for fact in self.facts.iter() {
            let _ = writeln!(out, "  - {}", fact);
        }

        out
    }
}
