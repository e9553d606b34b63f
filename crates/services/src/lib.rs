#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod auth_service;
pub mod config;
pub mod error;
pub mod practice;
pub mod question_bank;

pub use prep_core::Clock;

pub use app_services::{AppServices, QuestionSourceKind};
pub use auth_service::AuthService;
pub use config::{ApiConfig, PracticeSettings};
pub use error::{AppServicesError, AuthError, CollaboratorError, PracticeError};
pub use practice::{
    PracticeCommand, PracticeEvent, PracticeLoopService, PracticeRunner, PracticeSession,
};
pub use question_bank::BuiltinQuestionBank;
