//! Core module - data source contract, workflow and project plumbing

pub mod config;
pub mod dialog;
pub mod entity;
pub mod mutation;
pub mod notice;
pub mod project;
pub mod sequence;
pub mod source;
pub mod value;
pub mod workflow;

pub use config::Config;
pub use dialog::{Dialog, DialogIntent};
pub use entity::{Exportable, Record, ValidationError};
pub use mutation::{bulk_review, MutationState, OptimisticBatch};
pub use notice::{Notice, NoticeLevel};
pub use project::{Project, ProjectError};
pub use sequence::{RequestId, RequestSequencer};
pub use source::{DataSource, ExportFormat, ImportStats, JsonStore, ReviewSource, SourceError};
pub use workflow::{ReviewAction, ReviewRecord, ReviewRequest, Reviewable, WorkflowError};
