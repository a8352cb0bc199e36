use entity::employees;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::{error, info, instrument, warn};

use crate::{
    error::{HrError, HrResult},
    model::{Employee, EmployeeChanges, EmployeeQuery, EmployeeSort, NewEmployee},
};

/// Data-access entry point for employee records.
///
/// Holds the shared pool handle. Every operation checks out one connection,
/// runs exactly one statement and gives the connection back on every exit
/// path, including errors.
#[derive(Clone, Debug)]
pub struct EmployeeDirectory {
    db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct DepartmentRow {
    department: String,
}

impl EmployeeDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    #[instrument(name = "hr.create_employee", skip_all, fields(employee_id = %employee.employee_id))]
    pub async fn create_employee(&self, employee: NewEmployee) -> HrResult<Employee> {
        let created = self.insert_employee(employee).await.map_err(logged)?;
        info!("employee created");
        Ok(created)
    }

    /// Validate and insert without logging the outcome.
    pub(crate) async fn insert_employee(&self, employee: NewEmployee) -> HrResult<Employee> {
        employee.validate()?;
        employees::Entity::insert(employee.clone().into_active_model())
            .exec_without_returning(&self.db)
            .await
            .map_err(|err| HrError::from_write(err, &employee.employee_id))?;
        Ok(employee.into())
    }

    #[instrument(
        name = "hr.list_employees",
        skip_all,
        fields(department = ?query.department.department(), sort = %query.sort)
    )]
    pub async fn list_employees(&self, query: &EmployeeQuery) -> HrResult<Vec<Employee>> {
        let mut select = employees::Entity::find();
        if let Some(department) = query.department.department() {
            select = select.filter(employees::Column::Department.eq(department));
        }
        select = match query.sort {
            EmployeeSort::None => select,
            EmployeeSort::Salary => select
                .order_by_desc(employees::Column::SalaryCents)
                .order_by_asc(employees::Column::EmployeeId),
            EmployeeSort::HireDate => select
                .order_by_desc(employees::Column::HireDate)
                .order_by_asc(employees::Column::EmployeeId),
        };
        let rows = select
            .all(&self.db)
            .await
            .map_err(|err| logged(err.into()))?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    #[instrument(name = "hr.find_employee", skip(self))]
    pub async fn find_employee(&self, employee_id: &str) -> HrResult<Employee> {
        employees::Entity::find_by_id(employee_id.to_string())
            .one(&self.db)
            .await
            .map_err(|err| logged(err.into()))?
            .map(Employee::from)
            .ok_or_else(|| logged(HrError::NotFound(employee_id.to_string())))
    }

    /// Replace every mutable field of `employee_id`. A missing row is
    /// reported as [`HrError::NotFound`].
    #[instrument(name = "hr.update_employee", skip(self, changes))]
    pub async fn update_employee(
        &self,
        employee_id: &str,
        changes: EmployeeChanges,
    ) -> HrResult<Employee> {
        changes.validate().map_err(logged)?;
        let result = employees::Entity::update_many()
            .set(changes.clone().into_active_model())
            .filter(employees::Column::EmployeeId.eq(employee_id))
            .exec(&self.db)
            .await
            .map_err(|err| logged(err.into()))?;
        if result.rows_affected == 0 {
            return Err(logged(HrError::NotFound(employee_id.to_string())));
        }
        info!("employee updated");
        Ok(changes.into_employee(employee_id))
    }

    /// Remove `employee_id`. A missing row is reported as [`HrError::NotFound`].
    #[instrument(name = "hr.delete_employee", skip(self))]
    pub async fn delete_employee(&self, employee_id: &str) -> HrResult<()> {
        let result = employees::Entity::delete_by_id(employee_id.to_string())
            .exec(&self.db)
            .await
            .map_err(|err| logged(err.into()))?;
        if result.rows_affected == 0 {
            return Err(logged(HrError::NotFound(employee_id.to_string())));
        }
        info!("employee deleted");
        Ok(())
    }

    /// Distinct department names, ascending.
    #[instrument(name = "hr.departments", skip_all)]
    pub async fn departments(&self) -> HrResult<Vec<String>> {
        let rows = employees::Entity::find()
            .select_only()
            .column(employees::Column::Department)
            .distinct()
            .order_by_asc(employees::Column::Department)
            .into_model::<DepartmentRow>()
            .all(&self.db)
            .await
            .map_err(|err| logged(err.into()))?;
        Ok(rows.into_iter().map(|row| row.department).collect())
    }
}

pub(crate) fn logged(err: HrError) -> HrError {
    if err.is_client_error() {
        warn!(code = err.code(), error = %err, "hr request rejected");
    } else {
        error!(code = err.code(), error = %err, "hr storage failure");
    }
    err
}
