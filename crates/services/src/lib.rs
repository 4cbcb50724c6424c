#![forbid(unsafe_code)]

pub mod activity;
pub mod app_services;
pub mod error;
pub mod goal_selection_service;
pub mod step_source;

pub use stride_core::Clock;

pub use activity::{
    ActivityView, RemoteSync, SampleOutcome, SyncStatus, TrackerCommand, TrackerEvent,
    TrackerHandle, TrackerSession, spawn_tracker,
};
pub use app_services::AppServices;
pub use error::{AppServicesError, GoalSelectionError, TrackerServiceError};
pub use goal_selection_service::GoalSelectionService;
pub use step_source::{
    ChannelStepSource, StepFeed, StepSender, StepSource, StepSourceError, UnavailableStepSource,
};
