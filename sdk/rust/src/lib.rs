//! Client SDK for the infrastructure dashboard API.

pub mod client;

pub use client::{ApiErrorBody, CreatePoll, DashboardClient, Poll, PollOption, SdkError};
