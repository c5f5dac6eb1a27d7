use serde::{Deserialize, Serialize};

use crate::error::{validation, AppResult, FieldError};
use crate::models::{Product, Todo};

// Request bodies. Fields are optional at the serde level so that missing
// values surface as field-level validation errors instead of a decode failure.

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodoRequest {
    pub title: Option<String>,
}

impl CreateTodoRequest {
    pub fn into_todo(self) -> AppResult<Todo> {
        let mut errors = Vec::new();
        let title = validation::required_text(self.title, "title", &mut errors);
        validation::finish(errors)?;
        Ok(Todo::new(title))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl UpdateTodoRequest {
    /// Trims the title, rejecting a present but blank one.
    pub fn validated(self) -> AppResult<Self> {
        let mut errors = Vec::new();
        let title = validation::optional_text(self.title, "title", &mut errors);
        validation::finish(errors)?;
        Ok(Self { title, completed: self.completed })
    }

    /// Applies the present fields to `todo`.
    pub fn apply(self, todo: &mut Todo) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
}

impl ProductRequest {
    /// All three fields are required; blank strings and non-positive prices are rejected.
    pub fn into_product(self) -> AppResult<Product> {
        let mut errors: Vec<FieldError> = Vec::new();
        let name = validation::required_text(self.name, "name", &mut errors);
        let price = validation::required_positive(self.price, "price", &mut errors);
        let description = validation::required_text(self.description, "description", &mut errors);
        validation::finish(errors)?;
        Ok(Product::new(name, price, description))
    }
}

// Query strings

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTodosQuery {
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProductsQuery {
    pub limit: Option<u64>,
    pub search: Option<String>,
}

// Response envelopes

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}
