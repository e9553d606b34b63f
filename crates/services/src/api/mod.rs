//! HTTP adapters for the remote collaborators.

mod auth;
mod client;
mod feedback;
mod questions;

pub use auth::{AuthClient, AuthGrant, HttpAuthClient};
pub use client::ApiClient;
pub use feedback::{AnswerReviewer, HttpAnswerReviewer};
pub use questions::{HttpQuestionSource, QuestionRequest, QuestionSource, QuestionStyle};
