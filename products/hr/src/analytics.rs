//! Payroll aggregates. Each figure is computed by the database in a single
//! statement over the whole `employees` table.

use sea_orm::{ConnectionTrait, DbErr, FromQueryResult, Statement};
use serde::Serialize;
use tracing::instrument;

use crate::{
    directory::{EmployeeDirectory, logged},
    error::{HrError, HrResult},
};

// Sums and averages are cast explicitly: Postgres widens SUM/AVG over bigint
// to numeric, SQLite returns integer/real.
const HEADCOUNT_SQL: &str = "SELECT COUNT(*) AS value FROM employees";
const TOTAL_SALARY_SQL: &str =
    "SELECT CAST(COALESCE(SUM(salary_cents), 0) AS BIGINT) AS value FROM employees";
const AVERAGE_SALARY_SQL: &str =
    "SELECT CAST(AVG(salary_cents) AS DOUBLE PRECISION) AS value FROM employees";
const MIN_SALARY_SQL: &str = "SELECT MIN(salary_cents) AS value FROM employees";
const MAX_SALARY_SQL: &str = "SELECT MAX(salary_cents) AS value FROM employees";
const OVERVIEW_SQL: &str = "SELECT COUNT(*) AS headcount, \
     CAST(COALESCE(SUM(salary_cents), 0) AS BIGINT) AS total_salary_cents, \
     CAST(AVG(salary_cents) AS DOUBLE PRECISION) AS average_salary_cents, \
     MIN(salary_cents) AS min_salary_cents, \
     MAX(salary_cents) AS max_salary_cents \
     FROM employees";
const DEPARTMENT_SUMMARY_SQL: &str = "SELECT department, COUNT(*) AS headcount, \
     CAST(AVG(salary_cents) AS DOUBLE PRECISION) AS average_salary_cents, \
     MIN(salary_cents) AS min_salary_cents, \
     MAX(salary_cents) AS max_salary_cents \
     FROM employees GROUP BY department ORDER BY department";

/// Dashboard metric strip. Averages and extremes are `None` on an empty table.
#[derive(Clone, Debug, PartialEq, Serialize, FromQueryResult)]
pub struct PayrollOverview {
    pub headcount: i64,
    pub total_salary_cents: i64,
    pub average_salary_cents: Option<f64>,
    pub min_salary_cents: Option<i64>,
    pub max_salary_cents: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, FromQueryResult)]
pub struct DepartmentSalarySummary {
    pub department: String,
    pub headcount: i64,
    pub average_salary_cents: f64,
    pub min_salary_cents: i64,
    pub max_salary_cents: i64,
}

#[derive(Debug, FromQueryResult)]
struct IntRow {
    value: i64,
}

#[derive(Debug, FromQueryResult)]
struct OptionalIntRow {
    value: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct OptionalFloatRow {
    value: Option<f64>,
}

impl EmployeeDirectory {
    #[instrument(name = "hr.headcount", skip_all)]
    pub async fn headcount(&self) -> HrResult<i64> {
        Ok(self.single_row::<IntRow>(HEADCOUNT_SQL).await?.value)
    }

    /// Total payroll in cents; 0 when there are no employees.
    #[instrument(name = "hr.total_salary", skip_all)]
    pub async fn total_salary_cents(&self) -> HrResult<i64> {
        Ok(self.single_row::<IntRow>(TOTAL_SALARY_SQL).await?.value)
    }

    #[instrument(name = "hr.average_salary", skip_all)]
    pub async fn average_salary_cents(&self) -> HrResult<Option<f64>> {
        Ok(self
            .single_row::<OptionalFloatRow>(AVERAGE_SALARY_SQL)
            .await?
            .value)
    }

    #[instrument(name = "hr.min_salary", skip_all)]
    pub async fn min_salary_cents(&self) -> HrResult<Option<i64>> {
        Ok(self.single_row::<OptionalIntRow>(MIN_SALARY_SQL).await?.value)
    }

    #[instrument(name = "hr.max_salary", skip_all)]
    pub async fn max_salary_cents(&self) -> HrResult<Option<i64>> {
        Ok(self.single_row::<OptionalIntRow>(MAX_SALARY_SQL).await?.value)
    }

    #[instrument(name = "hr.payroll_overview", skip_all)]
    pub async fn payroll_overview(&self) -> HrResult<PayrollOverview> {
        self.single_row::<PayrollOverview>(OVERVIEW_SQL).await
    }

    /// Average, minimum and maximum salary per department, ordered by name.
    #[instrument(name = "hr.department_salary_summary", skip_all)]
    pub async fn department_salary_summary(&self) -> HrResult<Vec<DepartmentSalarySummary>> {
        let db = self.connection();
        let stmt = Statement::from_string(
            db.get_database_backend(),
            DEPARTMENT_SUMMARY_SQL.to_owned(),
        );
        DepartmentSalarySummary::find_by_statement(stmt)
            .all(db)
            .await
            .map_err(|err| logged(err.into()))
    }

    async fn single_row<T>(&self, sql: &str) -> HrResult<T>
    where
        T: FromQueryResult,
    {
        let db = self.connection();
        let stmt = Statement::from_string(db.get_database_backend(), sql.to_owned());
        T::find_by_statement(stmt)
            .one(db)
            .await
            .map_err(|err| logged(err.into()))?
            .ok_or_else(|| {
                logged(HrError::Database(DbErr::RecordNotFound(
                    "aggregate query returned no row".into(),
                )))
            })
    }
}
