use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardPortalCreate {
    pub name: String,
    pub description: Option<String>,
    pub project_id: i64,
    pub avatar: Option<String>,
    #[serde(default)]
    pub publish: bool,
    /// Roles the new portal is hidden from.
    #[serde(default)]
    pub role_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardPortalUpdate {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub publish: bool,
    /// Teams the portal is hidden from; absent or empty clears the list.
    pub team_ids: Option<Vec<i64>>,
}

/// Fields written for a new portal row.
#[derive(Debug, Clone)]
pub struct NewPortal {
    pub name: String,
    pub description: Option<String>,
    pub project_id: i64,
    pub avatar: Option<String>,
    pub publish: bool,
    pub create_by: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalWithProject {
    pub portal: models::dashboard_portal::Model,
    pub project: Option<models::project::Model>,
}

/// Changes needed to bring a portal's team exclusions to the requested list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionPlan {
    pub remove_all: bool,
    pub remove: Vec<i64>,
    pub add: Vec<i64>,
}

impl ExclusionPlan {
    pub fn is_noop(&self) -> bool {
        !self.remove_all && self.remove.is_empty() && self.add.is_empty()
    }
}

/// Diff the existing exclusions against the requested team ids.
///
/// Existing teams missing from a non-empty request are removed (non-positive
/// ids are left alone); an empty request removes everything. Only requested
/// teams not already excluded are added, each once.
pub fn plan_team_exclusions(existing: &[i64], requested: Option<&[i64]>) -> ExclusionPlan {
    let requested = requested.unwrap_or_default();
    let mut plan = ExclusionPlan::default();

    if !existing.is_empty() {
        if requested.is_empty() {
            plan.remove_all = true;
        } else {
            plan.remove = existing
                .iter()
                .copied()
                .filter(|t| *t > 0 && !requested.contains(t))
                .collect();
        }
    }

    for team in requested {
        if !existing.contains(team) && !plan.add.contains(team) {
            plan.add.push(*team);
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_request_clears_existing() {
        let plan = plan_team_exclusions(&[1, 2], None);
        assert!(plan.remove_all);
        assert!(plan.add.is_empty());
        let plan = plan_team_exclusions(&[1, 2], Some(&[]));
        assert!(plan.remove_all);
    }

    #[test]
    fn keeps_overlap_and_adds_only_new() {
        let plan = plan_team_exclusions(&[1, 2, 3], Some(&[2, 3, 4, 4]));
        assert!(!plan.remove_all);
        assert_eq!(plan.remove, vec![1]);
        assert_eq!(plan.add, vec![4]);
    }

    #[test]
    fn non_positive_ids_are_never_removed_selectively() {
        let plan = plan_team_exclusions(&[0, 5], Some(&[6]));
        assert_eq!(plan.remove, vec![5]);
        assert_eq!(plan.add, vec![6]);
    }

    #[test]
    fn nothing_to_do() {
        assert!(plan_team_exclusions(&[], None).is_noop());
        assert!(plan_team_exclusions(&[7], Some(&[7])).is_noop());
    }
}
