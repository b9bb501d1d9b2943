//! Read-only organisation lookups: employees, divisions, departments,
//! shifts and the dashboard counters.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::policy::{self, Scope};
use crate::error::{AppError, AppResult};
use crate::model::{
    department::DepartmentSummary, division::DivisionSummary, employee::EmployeeEntry,
    shift::Shift, user::User,
};
use crate::query::{EmployeeCriteria, Pagination};
use crate::store::Store;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone)]
pub struct EmployeePage {
    pub entries: Vec<EmployeeEntry>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

/// Admins and managers only. A manager's scope is always intersected with
/// the caller's filters.
pub async fn list_employees(
    store: &dyn Store,
    actor: &User,
    mut criteria: EmployeeCriteria,
    page: Pagination,
) -> AppResult<EmployeePage> {
    policy::require_approver(actor)?;
    criteria.scope = Some(policy::resolve_scope(actor)?);

    let (entries, total) = store.list_employees(&criteria, &page).await?;
    Ok(EmployeePage {
        entries,
        total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages(total),
    })
}

pub async fn get_employee(store: &dyn Store, actor: &User, id: u64) -> AppResult<EmployeeEntry> {
    policy::require_approver(actor)?;

    let entry = store
        .find_employee_entry(id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    if !policy::can_view_employee(actor, &entry.employee)? {
        return Err(AppError::forbidden("Access denied"));
    }
    Ok(entry)
}

fn own_division(actor: &User) -> AppResult<Option<u64>> {
    Ok(match policy::resolve_scope(actor)? {
        Scope::Division(id) => Some(id),
        _ => None,
    })
}

/// Managers see only their own division.
pub async fn list_divisions(store: &dyn Store, actor: &User) -> AppResult<Vec<DivisionSummary>> {
    store.list_divisions(own_division(actor)?).await
}

/// An explicit `division_id` wins; otherwise managers default to theirs.
pub async fn list_departments(
    store: &dyn Store,
    actor: &User,
    division_id: Option<u64>,
) -> AppResult<Vec<DepartmentSummary>> {
    let division_id = match division_id {
        Some(id) => Some(id),
        None => own_division(actor)?,
    };
    store.list_departments(division_id).await
}

pub async fn list_shifts(store: &dyn Store) -> AppResult<Vec<Shift>> {
    store.list_shifts().await
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DivisionStat {
    pub name: String,
    pub employees: i64,
    pub departments: i64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_employees: i64,
    pub total_divisions: i64,
    pub total_departments: i64,
    /// Present today over active employees, e.g. `"66.7%"`.
    #[schema(example = "66.7%")]
    pub today_attendance: String,
    pub today_present: i64,
    pub today_absent: i64,
    pub today_late: i64,
    pub pending_requests: i64,
    pub divisions_stats: Vec<DivisionStat>,
}

pub fn attendance_rate_label(present: i64, total: i64) -> String {
    let rate = if total > 0 {
        present as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    format!("{rate:.1}%")
}

pub async fn dashboard(store: &dyn Store, actor: &User, today: NaiveDate) -> AppResult<DashboardStats> {
    policy::require_approver(actor)?;

    let counts = store.dashboard_counts(today).await?;
    let divisions_stats = store
        .list_divisions(None)
        .await?
        .into_iter()
        .map(|d| DivisionStat {
            name: d.name,
            employees: d.employee_count,
            departments: d.department_count,
            color: d.color,
        })
        .collect();

    Ok(DashboardStats {
        total_employees: counts.total_employees,
        total_divisions: counts.total_divisions,
        total_departments: counts.total_departments,
        today_attendance: attendance_rate_label(counts.today_present, counts.total_employees),
        today_present: counts.today_present,
        today_absent: counts.today_absent,
        today_late: counts.today_late,
        pending_requests: counts.pending_requests,
        divisions_stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{self, LedgerRules};
    use crate::testing::{at, day, sample_store, user};

    #[test]
    fn rate_label_has_one_decimal() {
        assert_eq!(attendance_rate_label(2, 3), "66.7%");
        assert_eq!(attendance_rate_label(0, 0), "0.0%");
        assert_eq!(attendance_rate_label(3, 3), "100.0%");
    }

    #[actix_web::test]
    async fn employee_listing_is_for_approvers_and_scoped() {
        let (store, users) = sample_store();
        let page = Pagination::new(None, None, DEFAULT_PAGE_SIZE);

        let err = list_employees(&store, &users.john, EmployeeCriteria::default(), page)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let all = list_employees(&store, &users.admin, EmployeeCriteria::default(), page)
            .await
            .unwrap();
        assert_eq!(all.total, 3);

        // asking for division 2 does not widen a division 1 manager
        let scoped = list_employees(
            &store,
            &users.manager,
            EmployeeCriteria {
                division_id: Some(2),
                ..Default::default()
            },
            page,
        )
        .await
        .unwrap();
        assert_eq!(scoped.total, 0);

        let found = list_employees(
            &store,
            &users.manager,
            EmployeeCriteria {
                search: Some("JOHN".into()),
                ..Default::default()
            },
            page,
        )
        .await
        .unwrap();
        assert_eq!(found.entries.len(), 1);
        assert_eq!(found.entries[0].full_name, "John Doe");
        assert_eq!(found.entries[0].division_name.as_deref(), Some("Production Division"));
    }

    #[actix_web::test]
    async fn single_employee_follows_division() {
        let (store, users) = sample_store();
        let jane = store.employee_of(users.jane.id);
        let john = store.employee_of(users.john.id);

        assert!(matches!(
            get_employee(&store, &users.manager, jane.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(get_employee(&store, &users.manager, john.id).await.unwrap().employee.id, john.id);
        assert_eq!(get_employee(&store, &users.admin, jane.id).await.unwrap().employee.id, jane.id);
        assert!(matches!(
            get_employee(&store, &users.admin, 404).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            get_employee(&store, &users.john, john.id).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[actix_web::test]
    async fn manager_without_division_cannot_open_employee_records() {
        let (store, users) = sample_store();
        let unassigned = user(77, "manager", None);
        store.add_user(unassigned.clone());

        for target in [&users.john, &users.jane] {
            let id = store.employee_of(target.id).id;
            assert!(matches!(
                get_employee(&store, &unassigned, id).await,
                Err(AppError::Forbidden(_))
            ));
        }
    }

    #[actix_web::test]
    async fn divisions_and_departments_default_to_manager_division() {
        let (store, users) = sample_store();

        let mine = list_divisions(&store, &users.manager).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].code, "PROD");
        assert_eq!(mine[0].employee_count, 2);
        assert_eq!(mine[0].department_count, 1);

        assert_eq!(list_divisions(&store, &users.admin).await.unwrap().len(), 2);
        // employees are not narrowed by their own division
        assert_eq!(list_divisions(&store, &users.john).await.unwrap().len(), 2);

        let deps = list_departments(&store, &users.manager, None).await.unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].division_name.as_deref(), Some("Production Division"));

        let explicit = list_departments(&store, &users.manager, Some(2)).await.unwrap();
        assert_eq!(explicit.len(), 1);
        assert_eq!(explicit[0].division_id, 2);

        let unassigned = user(40, "manager", None);
        assert_eq!(list_departments(&store, &unassigned, None).await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn dashboard_counts_today() {
        let (store, users) = sample_store();
        let rules = LedgerRules::default();
        ledger::check_in(&store, &users.john, at(8, 0, 0), &rules).await.unwrap();
        ledger::check_in(&store, &users.jane, at(9, 0, 0), &rules).await.unwrap();

        let stats = dashboard(&store, &users.admin, day()).await.unwrap();
        assert_eq!(stats.total_employees, 3);
        assert_eq!(stats.total_divisions, 2);
        assert_eq!(stats.today_present, 1);
        assert_eq!(stats.today_late, 1);
        assert_eq!(stats.today_attendance, "33.3%");
        assert_eq!(stats.divisions_stats.len(), 2);

        assert!(matches!(
            dashboard(&store, &users.jane, day()).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
