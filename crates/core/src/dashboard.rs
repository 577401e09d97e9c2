//! Read-side helpers over the synchronized project list: list filtering
//! and dashboard statistics.

use serde::Serialize;

use crate::project::{Project, ProjectStatus};

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Status filter for the project list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ProjectStatus),
}

impl StatusFilter {
    /// Parse the filter value used by list views (`"all"` or a status).
    pub fn parse(s: &str) -> Option<Self> {
        if s == "all" {
            return Some(Self::All);
        }
        ProjectStatus::from_str_db(s).ok().map(Self::Only)
    }

    fn matches(&self, project: &Project) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => project.status == status.as_str(),
        }
    }
}

/// Search term plus status filter applied to the project list.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub search: String,
    pub status: StatusFilter,
}

impl ProjectFilter {
    /// Case-insensitive substring match on name, owner name, or location,
    /// combined with the status filter. An empty search term matches all.
    pub fn matches(&self, project: &Project) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = project.name.to_lowercase().contains(&needle)
            || project.owner_name.to_lowercase().contains(&needle)
            || project.location.to_lowercase().contains(&needle);
        matches_search && self.status.matches(project)
    }

    /// Apply the filter, preserving the input order.
    pub fn apply<'a>(&self, projects: &'a [Project]) -> Vec<&'a Project> {
        projects.iter().filter(|p| self.matches(p)).collect()
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Aggregate counts for the dashboard cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub active: usize,
    pub pending: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Records whose stored status is not a recognised value.
    pub unknown_status: usize,
}

impl DashboardStats {
    pub fn from_projects(projects: &[Project]) -> Self {
        let mut stats = Self {
            total: projects.len(),
            ..Default::default()
        };
        for project in projects {
            match project.status_kind() {
                Some(ProjectStatus::Active) => stats.active += 1,
                Some(ProjectStatus::Pending) => stats.pending += 1,
                Some(ProjectStatus::Completed) => stats.completed += 1,
                Some(ProjectStatus::Cancelled) => stats.cancelled += 1,
                None => stats.unknown_status += 1,
            }
        }
        stats
    }
}

/// The `limit` most recently updated projects, newest first.
///
/// Canonical timestamps sort correctly as strings, so no parsing is done.
pub fn recent(projects: &[Project], limit: usize) -> Vec<&Project> {
    let mut sorted: Vec<&Project> = projects.iter().collect();
    sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    sorted.truncate(limit);
    sorted
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str, name: &str, owner: &str, status: &str, updated_at: &str) -> Project {
        Project {
            id: id.into(),
            owner_user_id: "u1".into(),
            name: name.into(),
            owner_name: owner.into(),
            location: "Goiás".into(),
            area: "10".into(),
            status: status.into(),
            created_at: "2024-01-01T00:00:00.000Z".into(),
            updated_at: updated_at.into(),
            description: None,
            coordinates: None,
            soil_type: None,
            vegetation: None,
            water_resources: None,
        }
    }

    fn fixtures() -> Vec<Project> {
        vec![
            project("a", "Fazenda São João", "João Silva", "active", "2024-01-03T00:00:00.000Z"),
            project("b", "Sítio Boa Vista", "Maria Souza", "pending", "2024-01-05T00:00:00.000Z"),
            project("c", "Chácara Verde", "Pedro Lima", "completed", "2024-01-04T00:00:00.000Z"),
            project("d", "Fazenda Velha", "Ana Costa", "archived", "2024-01-01T00:00:00.000Z"),
        ]
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let projects = fixtures();
        let filter = ProjectFilter {
            search: "FAZENDA".into(),
            status: StatusFilter::All,
        };
        let ids: Vec<_> = filter.apply(&projects).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);

        let by_owner = ProjectFilter {
            search: "souza".into(),
            ..Default::default()
        };
        assert_eq!(by_owner.apply(&projects).len(), 1);

        let by_location = ProjectFilter {
            search: "goiás".into(),
            ..Default::default()
        };
        assert_eq!(by_location.apply(&projects).len(), 4);
    }

    #[test]
    fn status_filter_excludes_unknown_statuses() {
        let projects = fixtures();
        let filter = ProjectFilter {
            search: String::new(),
            status: StatusFilter::Only(ProjectStatus::Active),
        };
        let ids: Vec<_> = filter.apply(&projects).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn status_filter_parse() {
        assert_eq!(StatusFilter::parse("all"), Some(StatusFilter::All));
        assert_eq!(
            StatusFilter::parse("pending"),
            Some(StatusFilter::Only(ProjectStatus::Pending))
        );
        assert_eq!(StatusFilter::parse("bogus"), None);
    }

    #[test]
    fn stats_count_each_status() {
        let stats = DashboardStats::from_projects(&fixtures());
        assert_eq!(
            stats,
            DashboardStats {
                total: 4,
                active: 1,
                pending: 1,
                completed: 1,
                cancelled: 0,
                unknown_status: 1,
            }
        );
    }

    #[test]
    fn recent_orders_by_updated_at_desc() {
        let projects = fixtures();
        let ids: Vec<_> = recent(&projects, 2).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(recent(&[], 3).is_empty());
    }
}
