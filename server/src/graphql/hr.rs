use anyhow::anyhow;
use async_graphql::{Context, Enum, Error, ErrorExtensions, InputObject, Object, SimpleObject};
use chrono::NaiveDate;
use platform_api::{ApiError, internal_error};
use products_hr::{
    DepartmentFilter, DepartmentSalarySummary, Employee, EmployeeChanges, EmployeeDirectory,
    EmployeeQuery, EmployeeSort, HrError, NewEmployee, PayrollOverview,
};
use tracing::instrument;

#[derive(Default)]
pub struct HrQuery;

#[derive(Default)]
pub struct HrMutation;

#[derive(Enum, Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum EmployeeSortKey {
    #[default]
    #[graphql(name = "NONE")]
    Unsorted,
    Salary,
    HireDate,
}

impl From<EmployeeSortKey> for EmployeeSort {
    fn from(value: EmployeeSortKey) -> Self {
        match value {
            EmployeeSortKey::Unsorted => EmployeeSort::None,
            EmployeeSortKey::Salary => EmployeeSort::Salary,
            EmployeeSortKey::HireDate => EmployeeSort::HireDate,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Employee")]
pub struct EmployeeNode {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub department: String,
    pub hire_date: NaiveDate,
    pub salary_cents: i64,
}

impl From<Employee> for EmployeeNode {
    fn from(employee: Employee) -> Self {
        Self {
            full_name: employee.full_name(),
            employee_id: employee.employee_id,
            first_name: employee.first_name,
            last_name: employee.last_name,
            department: employee.department,
            hire_date: employee.hire_date,
            salary_cents: employee.salary_cents,
        }
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct NewEmployeeInput {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub hire_date: NaiveDate,
    pub salary_cents: i64,
}

impl From<NewEmployeeInput> for NewEmployee {
    fn from(input: NewEmployeeInput) -> Self {
        NewEmployee::new(
            input.employee_id,
            input.first_name,
            input.last_name,
            input.department,
            input.hire_date,
            input.salary_cents,
        )
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct EmployeeChangesInput {
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub hire_date: NaiveDate,
    pub salary_cents: i64,
}

impl From<EmployeeChangesInput> for EmployeeChanges {
    fn from(input: EmployeeChangesInput) -> Self {
        Self {
            first_name: input.first_name,
            last_name: input.last_name,
            department: input.department,
            hire_date: input.hire_date,
            salary_cents: input.salary_cents,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "PayrollOverview")]
pub struct PayrollOverviewNode {
    pub headcount: i64,
    pub total_salary_cents: i64,
    pub average_salary_cents: Option<f64>,
    pub min_salary_cents: Option<i64>,
    pub max_salary_cents: Option<i64>,
}

impl From<PayrollOverview> for PayrollOverviewNode {
    fn from(value: PayrollOverview) -> Self {
        Self {
            headcount: value.headcount,
            total_salary_cents: value.total_salary_cents,
            average_salary_cents: value.average_salary_cents,
            min_salary_cents: value.min_salary_cents,
            max_salary_cents: value.max_salary_cents,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "DepartmentSalarySummary")]
pub struct DepartmentSummaryNode {
    pub department: String,
    pub headcount: i64,
    pub average_salary_cents: f64,
    pub min_salary_cents: i64,
    pub max_salary_cents: i64,
}

impl From<DepartmentSalarySummary> for DepartmentSummaryNode {
    fn from(value: DepartmentSalarySummary) -> Self {
        Self {
            department: value.department,
            headcount: value.headcount,
            average_salary_cents: value.average_salary_cents,
            min_salary_cents: value.min_salary_cents,
            max_salary_cents: value.max_salary_cents,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct DeleteEmployeePayload {
    pub employee_id: String,
}

#[Object]
impl HrQuery {
    /// `department` of `"All"` (or omitted) lists every department.
    async fn employees(
        &self,
        ctx: &Context<'_>,
        department: Option<String>,
        #[graphql(default)] sort_by: EmployeeSortKey,
    ) -> async_graphql::Result<Vec<EmployeeNode>> {
        let query = EmployeeQuery {
            department: DepartmentFilter::parse(department.as_deref()),
            sort: sort_by.into(),
        };
        let rows = directory(ctx)?
            .list_employees(&query)
            .await
            .map_err(hr_error)?;
        Ok(rows.into_iter().map(EmployeeNode::from).collect())
    }

    async fn employee(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<EmployeeNode> {
        directory(ctx)?
            .find_employee(&id)
            .await
            .map(EmployeeNode::from)
            .map_err(hr_error)
    }

    async fn departments(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<String>> {
        directory(ctx)?.departments().await.map_err(hr_error)
    }

    async fn headcount(&self, ctx: &Context<'_>) -> async_graphql::Result<i64> {
        directory(ctx)?.headcount().await.map_err(hr_error)
    }

    async fn total_salary_cents(&self, ctx: &Context<'_>) -> async_graphql::Result<i64> {
        directory(ctx)?.total_salary_cents().await.map_err(hr_error)
    }

    async fn average_salary_cents(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<f64>> {
        directory(ctx)?.average_salary_cents().await.map_err(hr_error)
    }

    async fn min_salary_cents(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<i64>> {
        directory(ctx)?.min_salary_cents().await.map_err(hr_error)
    }

    async fn max_salary_cents(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<i64>> {
        directory(ctx)?.max_salary_cents().await.map_err(hr_error)
    }

    #[instrument(name = "graphql.hr.overview", skip_all)]
    async fn overview(&self, ctx: &Context<'_>) -> async_graphql::Result<PayrollOverviewNode> {
        directory(ctx)?
            .payroll_overview()
            .await
            .map(PayrollOverviewNode::from)
            .map_err(hr_error)
    }

    #[instrument(name = "graphql.hr.department_summary", skip_all)]
    async fn department_summary(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<DepartmentSummaryNode>> {
        let rows = directory(ctx)?
            .department_salary_summary()
            .await
            .map_err(hr_error)?;
        Ok(rows.into_iter().map(DepartmentSummaryNode::from).collect())
    }
}

#[Object]
impl HrMutation {
    #[instrument(name = "graphql.hr.create_employee", skip_all)]
    async fn create_employee(
        &self,
        ctx: &Context<'_>,
        input: NewEmployeeInput,
    ) -> async_graphql::Result<EmployeeNode> {
        directory(ctx)?
            .create_employee(input.into())
            .await
            .map(EmployeeNode::from)
            .map_err(hr_error)
    }

    #[instrument(name = "graphql.hr.update_employee", skip_all)]
    async fn update_employee(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: EmployeeChangesInput,
    ) -> async_graphql::Result<EmployeeNode> {
        directory(ctx)?
            .update_employee(&id, input.into())
            .await
            .map(EmployeeNode::from)
            .map_err(hr_error)
    }

    #[instrument(name = "graphql.hr.delete_employee", skip_all)]
    async fn delete_employee(
        &self,
        ctx: &Context<'_>,
        id: String,
    ) -> async_graphql::Result<DeleteEmployeePayload> {
        directory(ctx)?
            .delete_employee(&id)
            .await
            .map_err(hr_error)?;
        Ok(DeleteEmployeePayload { employee_id: id })
    }
}

fn directory<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a EmployeeDirectory> {
    ctx.data::<EmployeeDirectory>()
        .map_err(|_| internal_error(anyhow!("employee directory not attached to schema")))
}

fn hr_error(err: HrError) -> Error {
    let api = match err {
        HrError::NotFound(id) => ApiError::NotFound(format!("employee {id}")),
        HrError::Conflict(id) => ApiError::Conflict(format!("employee {id} already exists")),
        HrError::InvalidInput(message) => ApiError::InvalidInput(message),
        HrError::Unavailable(_) => ApiError::Unavailable,
        HrError::Database(err) => ApiError::internal(err.into()),
    };
    api.extend()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::{SchemaType, build_schema};
    use async_graphql::{Request, Value, Variables};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use serde_json::{Value as Json, json};

    async fn schema() -> SchemaType {
        let conn = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&conn, None).await.unwrap();
        build_schema(EmployeeDirectory::new(conn))
    }

    async fn run(schema: &SchemaType, query: &str, vars: Json) -> async_graphql::Response {
        schema
            .execute(Request::new(query).variables(Variables::from_json(vars)))
            .await
    }

    fn error_code(resp: &async_graphql::Response) -> Option<String> {
        resp.errors.first().and_then(|err| {
            match err.extensions.as_ref().and_then(|ext| ext.get("code")) {
                Some(Value::String(code)) => Some(code.clone()),
                _ => None,
            }
        })
    }

    const CREATE: &str = r#"
        mutation Create($input: NewEmployeeInput!) {
            hr { createEmployee(input: $input) { employeeId fullName salaryCents hireDate } }
        }
    "#;

    async fn create(schema: &SchemaType, id: &str, dept: &str, date: &str, cents: i64) {
        let resp = run(
            schema,
            CREATE,
            json!({ "input": {
                "employeeId": id,
                "firstName": format!("{id}-first"),
                "lastName": "Doe",
                "department": dept,
                "hireDate": date,
                "salaryCents": cents,
            }}),
        )
        .await;
        assert!(resp.errors.is_empty(), "errors: {:?}", resp.errors);
    }

    async fn seed(schema: &SchemaType) {
        create(schema, "E1", "Eng", "2023-01-10", 500_000).await;
        create(schema, "E2", "Eng", "2022-05-01", 600_000).await;
        create(schema, "E3", "Sales", "2021-09-15", 400_000).await;
    }

    #[tokio::test]
    async fn create_returns_the_stored_employee() {
        let schema = schema().await;
        let resp = run(
            &schema,
            CREATE,
            json!({ "input": {
                "employeeId": "E1",
                "firstName": "Ann",
                "lastName": "Lee",
                "department": "Eng",
                "hireDate": "2023-01-10",
                "salaryCents": 500000,
            }}),
        )
        .await;
        assert!(resp.errors.is_empty(), "errors: {:?}", resp.errors);
        let body = resp.data.into_json().unwrap();
        assert_eq!(
            body["hr"]["createEmployee"],
            json!({
                "employeeId": "E1",
                "fullName": "Ann Lee",
                "salaryCents": 500000,
                "hireDate": "2023-01-10",
            })
        );
    }

    #[tokio::test]
    async fn filtered_salary_listing() {
        let schema = schema().await;
        seed(&schema).await;
        let resp = run(
            &schema,
            r#"query { hr { employees(department: "Eng", sortBy: SALARY) { employeeId } } }"#,
            json!({}),
        )
        .await;
        assert!(resp.errors.is_empty(), "errors: {:?}", resp.errors);
        let body = resp.data.into_json().unwrap();
        assert_eq!(
            body["hr"]["employees"],
            json!([{ "employeeId": "E2" }, { "employeeId": "E1" }])
        );

        let all = run(
            &schema,
            r#"query { hr { employees(department: "All") { employeeId } } }"#,
            json!({}),
        )
        .await;
        let body = all.data.into_json().unwrap();
        assert_eq!(body["hr"]["employees"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn duplicate_create_reports_conflict() {
        let schema = schema().await;
        create(&schema, "E1", "Eng", "2023-01-10", 500_000).await;
        let resp = run(
            &schema,
            CREATE,
            json!({ "input": {
                "employeeId": "E1",
                "firstName": "Other",
                "lastName": "Person",
                "department": "Ops",
                "hireDate": "2020-01-01",
                "salaryCents": 1,
            }}),
        )
        .await;
        assert_eq!(error_code(&resp).as_deref(), Some("CONFLICT"));
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let schema = schema().await;
        let update = run(
            &schema,
            r#"
            mutation {
                hr {
                    updateEmployee(id: "E404", input: {
                        firstName: "No", lastName: "Body", department: "Eng",
                        hireDate: "2020-01-01", salaryCents: 10
                    }) { employeeId }
                }
            }
            "#,
            json!({}),
        )
        .await;
        assert_eq!(error_code(&update).as_deref(), Some("NOT_FOUND"));

        let delete = run(
            &schema,
            r#"mutation { hr { deleteEmployee(id: "E404") { employeeId } } }"#,
            json!({}),
        )
        .await;
        assert_eq!(error_code(&delete).as_deref(), Some("NOT_FOUND"));
    }

    #[tokio::test]
    async fn negative_salary_is_invalid_input() {
        let schema = schema().await;
        let resp = run(
            &schema,
            CREATE,
            json!({ "input": {
                "employeeId": "E1",
                "firstName": "Ann",
                "lastName": "Lee",
                "department": "Eng",
                "hireDate": "2023-01-10",
                "salaryCents": -1,
            }}),
        )
        .await;
        assert_eq!(error_code(&resp).as_deref(), Some("INVALID_INPUT"));
    }

    #[tokio::test]
    async fn update_then_delete_round_trip() {
        let schema = schema().await;
        seed(&schema).await;
        let update = run(
            &schema,
            r#"
            mutation {
                hr {
                    updateEmployee(id: "E3", input: {
                        firstName: "Cy", lastName: "Tan", department: "Eng",
                        hireDate: "2021-09-15", salaryCents: 700000
                    }) { department salaryCents }
                }
            }
            "#,
            json!({}),
        )
        .await;
        assert!(update.errors.is_empty(), "errors: {:?}", update.errors);
        assert_eq!(
            update.data.into_json().unwrap()["hr"]["updateEmployee"],
            json!({ "department": "Eng", "salaryCents": 700000 })
        );

        let delete = run(
            &schema,
            r#"mutation { hr { deleteEmployee(id: "E1") { employeeId } } }"#,
            json!({}),
        )
        .await;
        assert!(delete.errors.is_empty(), "errors: {:?}", delete.errors);

        let after = run(
            &schema,
            r#"query { hr { headcount departments maxSalaryCents } }"#,
            json!({}),
        )
        .await;
        assert_eq!(
            after.data.into_json().unwrap()["hr"],
            json!({ "headcount": 2, "departments": ["Eng"], "maxSalaryCents": 700000 })
        );
    }

    #[tokio::test]
    async fn dashboard_metrics() {
        let schema = schema().await;
        seed(&schema).await;
        let resp = run(
            &schema,
            r#"
            query {
                hr {
                    overview { headcount totalSalaryCents averageSalaryCents minSalaryCents maxSalaryCents }
                    departmentSummary { department headcount averageSalaryCents minSalaryCents maxSalaryCents }
                }
            }
            "#,
            json!({}),
        )
        .await;
        assert!(resp.errors.is_empty(), "errors: {:?}", resp.errors);
        let body = resp.data.into_json().unwrap();
        let overview = &body["hr"]["overview"];
        assert_eq!(overview["headcount"], 3);
        assert_eq!(overview["totalSalaryCents"], 1_500_000);
        assert_eq!(overview["averageSalaryCents"].as_f64(), Some(500_000.0));
        assert_eq!(overview["minSalaryCents"], 400_000);
        assert_eq!(overview["maxSalaryCents"], 600_000);

        let eng = &body["hr"]["departmentSummary"][0];
        assert_eq!(eng["department"], "Eng");
        assert_eq!(eng["averageSalaryCents"].as_f64(), Some(550_000.0));
        assert_eq!(eng["minSalaryCents"], 500_000);
        assert_eq!(eng["maxSalaryCents"], 600_000);
    }

    #[tokio::test]
    async fn empty_store_reports_null_extremes() {
        let schema = schema().await;
        let resp = run(
            &schema,
            r#"query { hr { headcount totalSalaryCents averageSalaryCents minSalaryCents } }"#,
            json!({}),
        )
        .await;
        assert!(resp.errors.is_empty(), "errors: {:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap()["hr"],
            json!({
                "headcount": 0,
                "totalSalaryCents": 0,
                "averageSalaryCents": null,
                "minSalaryCents": null,
            })
        );
    }
}
