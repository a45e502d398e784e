use std::sync::Arc;

use crate::chatbot::ChatClient;
use crate::store::{EmployeeRepository, UserRepository};

/// Shared handler state: the store behind its two ports, plus the chat
/// client when one is configured.
#[derive(Clone)]
pub struct AppState {
    pub employees: Arc<dyn EmployeeRepository>,
    pub users: Arc<dyn UserRepository>,
    pub chat: Option<Arc<dyn ChatClient>>,
}

impl AppState {
    pub fn new(employees: Arc<dyn EmployeeRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self {
            employees,
            users,
            chat: None,
        }
    }

    pub fn with_chat(mut self, chat: Arc<dyn ChatClient>) -> Self {
        self.chat = Some(chat);
        self
    }
}
