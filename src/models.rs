use serde::{Deserialize, Serialize};

// Stored employee record as returned by the API
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: String,
    pub alamat: String, // street address
    pub created_at: String,
    pub updated_at: String,
}

// Create/update request body
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EmployeeInput {
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: String,
    pub alamat: String,
}

// Body of every error response
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}
