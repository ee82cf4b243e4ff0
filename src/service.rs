use std::sync::Arc;

use crate::error::AppError;
use crate::models::{Employee, EmployeeInput};
use crate::repository::EmployeeRepository;
use crate::validation;

// Business rules between the handlers and storage
#[derive(Clone)]
pub struct EmployeeService {
    repo: Arc<dyn EmployeeRepository>,
}

impl EmployeeService {
    pub fn new(repo: Arc<dyn EmployeeRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Employee>, AppError> {
        Ok(self.repo.find_all().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Employee, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn create(&self, input: &EmployeeInput) -> Result<Employee, AppError> {
        let clean = checked(input)?;
        let employee = self.repo.create(&clean).await?;
        tracing::info!("Created employee {}", employee.id);
        Ok(employee)
    }

    pub async fn update(&self, id: i64, input: &EmployeeInput) -> Result<Employee, AppError> {
        let clean = checked(input)?;
        self.repo.update(id, &clean).await?.ok_or(AppError::NotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if self.repo.delete(id).await? {
            tracing::info!("Deleted employee {}", id);
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}

fn checked(input: &EmployeeInput) -> Result<EmployeeInput, AppError> {
    let clean = validation::sanitize(input);
    validation::validate(&clean).map_err(|(error, message)| AppError::BadRequest { error, message })?;
    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteEmployeeRepository;

    fn service() -> EmployeeService {
        EmployeeService::new(Arc::new(SqliteEmployeeRepository::in_memory().unwrap()))
    }

    fn input() -> EmployeeInput {
        EmployeeInput {
            name: "  Siti <b>Aminah</b> ".into(),
            email: "siti@example.com".into(),
            role: "HR".into(),
            phone: "0811111111".into(),
            alamat: "Jl. Diponegoro 5, Bandung".into(),
        }
    }

    #[tokio::test]
    async fn create_stores_sanitized_values() {
        let svc = service();
        let created = svc.create(&input()).await.unwrap();
        assert_eq!(created.name, "Siti &lt;b&gt;Aminah&lt;/b&gt;");
        assert_eq!(svc.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_storage() {
        let svc = service();
        let mut bad = input();
        bad.email = "not-an-email".into();
        let err = svc.create(&bad).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { error: "Invalid email", .. }));
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_employee_is_not_found() {
        let svc = service();
        assert!(matches!(svc.get(7).await, Err(AppError::NotFound)));
        assert!(matches!(svc.update(7, &input()).await, Err(AppError::NotFound)));
        assert!(matches!(svc.delete(7).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let svc = service();
        let created = svc.create(&input()).await.unwrap();
        svc.delete(created.id).await.unwrap();
        assert!(matches!(svc.get(created.id).await, Err(AppError::NotFound)));
    }
}
