use std::fmt;

use chrono::NaiveDate;
use entity::employees;
use sea_orm::ActiveValue::{NotSet, Set};
use serde::{Deserialize, Serialize};

use crate::error::{HrError, HrResult};

/// Department value the dashboard uses to mean "no filter".
pub const ALL_DEPARTMENTS: &str = "All";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub hire_date: NaiveDate,
    pub salary_cents: i64,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<employees::Model> for Employee {
    fn from(model: employees::Model) -> Self {
        Self {
            employee_id: model.employee_id,
            first_name: model.first_name,
            last_name: model.last_name,
            department: model.department,
            hire_date: model.hire_date,
            salary_cents: model.salary_cents,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub hire_date: NaiveDate,
    pub salary_cents: i64,
}

impl NewEmployee {
    pub fn new(
        employee_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        department: impl Into<String>,
        hire_date: NaiveDate,
        salary_cents: i64,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            department: department.into(),
            hire_date,
            salary_cents,
        }
    }

    pub(crate) fn validate(&self) -> HrResult<()> {
        require("employee_id", &self.employee_id)?;
        self.changes().validate()
    }

    pub(crate) fn changes(&self) -> EmployeeChanges {
        EmployeeChanges {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            department: self.department.clone(),
            hire_date: self.hire_date,
            salary_cents: self.salary_cents,
        }
    }

    pub(crate) fn into_active_model(self) -> employees::ActiveModel {
        employees::ActiveModel {
            employee_id: Set(self.employee_id),
            first_name: Set(self.first_name),
            last_name: Set(self.last_name),
            department: Set(self.department),
            hire_date: Set(self.hire_date),
            salary_cents: Set(self.salary_cents),
        }
    }
}

impl From<NewEmployee> for Employee {
    fn from(value: NewEmployee) -> Self {
        Self {
            employee_id: value.employee_id,
            first_name: value.first_name,
            last_name: value.last_name,
            department: value.department,
            hire_date: value.hire_date,
            salary_cents: value.salary_cents,
        }
    }
}

/// Replacement values for every mutable column. `employee_id` is immutable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeChanges {
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub hire_date: NaiveDate,
    pub salary_cents: i64,
}

impl EmployeeChanges {
    pub(crate) fn validate(&self) -> HrResult<()> {
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)?;
        require("department", &self.department)?;
        if self.salary_cents < 0 {
            return Err(HrError::InvalidInput(format!(
                "salary must be non-negative, got {} cents",
                self.salary_cents
            )));
        }
        Ok(())
    }

    pub(crate) fn into_active_model(self) -> employees::ActiveModel {
        employees::ActiveModel {
            employee_id: NotSet,
            first_name: Set(self.first_name),
            last_name: Set(self.last_name),
            department: Set(self.department),
            hire_date: Set(self.hire_date),
            salary_cents: Set(self.salary_cents),
        }
    }

    pub(crate) fn into_employee(self, employee_id: &str) -> Employee {
        Employee {
            employee_id: employee_id.to_string(),
            first_name: self.first_name,
            last_name: self.last_name,
            department: self.department,
            hire_date: self.hire_date,
            salary_cents: self.salary_cents,
        }
    }
}

fn require(field: &str, value: &str) -> HrResult<()> {
    if value.trim().is_empty() {
        Err(HrError::InvalidInput(format!("{field} is required")))
    } else {
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DepartmentFilter {
    #[default]
    All,
    Only(String),
}

impl DepartmentFilter {
    /// Absent, blank and the `"All"` sentinel all mean no filter. Any other
    /// value is matched verbatim, padding included.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => DepartmentFilter::All,
            Some(department) => match department.trim() {
                "" | ALL_DEPARTMENTS => DepartmentFilter::All,
                _ => DepartmentFilter::Only(department.to_string()),
            },
        }
    }

    pub fn department(&self) -> Option<&str> {
        match self {
            DepartmentFilter::All => None,
            DepartmentFilter::Only(department) => Some(department),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeSort {
    /// Storage order, as returned by the engine.
    #[default]
    None,
    /// Highest salary first.
    Salary,
    /// Most recent hire first.
    HireDate,
}

impl EmployeeSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeSort::None => "none",
            EmployeeSort::Salary => "salary",
            EmployeeSort::HireDate => "hire_date",
        }
    }
}

impl fmt::Display for EmployeeSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmployeeQuery {
    pub department: DepartmentFilter,
    pub sort: EmployeeSort,
}

impl EmployeeQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_department(mut self, department: impl Into<String>) -> Self {
        self.department = DepartmentFilter::Only(department.into());
        self
    }

    pub fn sorted_by(mut self, sort: EmployeeSort) -> Self {
        self.sort = sort;
        self
    }
}
