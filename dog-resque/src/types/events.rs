use std::fmt;

use serde_json::Value;

use super::JobId;
use crate::{Job, ResqueError};

/// Lifecycle points listeners can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobEventKind {
    BeforeEnqueue,
    AfterEnqueue,
    BeforePerform,
    AfterPerform,
    OnFailure,
}

impl JobEventKind {
    /// Get event name as string
    pub fn name(self) -> &'static str {
        match self {
            Self::BeforeEnqueue => "beforeEnqueue",
            Self::AfterEnqueue => "afterEnqueue",
            Self::BeforePerform => "beforePerform",
            Self::AfterPerform => "afterPerform",
            Self::OnFailure => "onFailure",
        }
    }
}

impl fmt::Display for JobEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Enqueue parameters handed to enqueue listeners
#[derive(Debug, Clone, Copy)]
pub struct EnqueueParams<'a> {
    pub class: &'a str,
    pub args: Option<&'a Value>,
    pub queue: &'a str,
    pub id: &'a JobId,
}

/// A lifecycle event and its context
#[derive(Debug, Clone, Copy)]
pub enum JobEvent<'a> {
    BeforeEnqueue(EnqueueParams<'a>),
    AfterEnqueue(EnqueueParams<'a>),
    BeforePerform(&'a Job),
    AfterPerform(&'a Job),
    OnFailure {
        job: &'a Job,
        error: &'a ResqueError,
    },
}

impl<'a> JobEvent<'a> {
    pub fn kind(&self) -> JobEventKind {
        match self {
            Self::BeforeEnqueue(_) => JobEventKind::BeforeEnqueue,
            Self::AfterEnqueue(_) => JobEventKind::AfterEnqueue,
            Self::BeforePerform(_) => JobEventKind::BeforePerform,
            Self::AfterPerform(_) => JobEventKind::AfterPerform,
            Self::OnFailure { .. } => JobEventKind::OnFailure,
        }
    }

    /// The reserved job, for perform and failure events
    pub fn job(&self) -> Option<&'a Job> {
        match *self {
            Self::BeforePerform(job) | Self::AfterPerform(job) => Some(job),
            Self::OnFailure { job, .. } => Some(job),
            _ => None,
        }
    }

    /// Enqueue parameters, for enqueue events
    pub fn enqueue_params(&self) -> Option<&EnqueueParams<'a>> {
        match self {
            Self::BeforeEnqueue(params) | Self::AfterEnqueue(params) => Some(params),
            _ => None,
        }
    }
}
