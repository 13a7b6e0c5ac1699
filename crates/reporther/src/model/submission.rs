use crate::model::{DepartmentId, IncidentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

id_type!(SubmissionId, "submission");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionChannel {
    Email,
    Online,
    InPerson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub incident_id: IncidentId,
    pub department_id: DepartmentId,
    pub channel: SubmissionChannel,
}

/// Record of an incident report handed to a police department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionLog {
    pub id: SubmissionId,
    pub incident_id: IncidentId,
    pub department_id: DepartmentId,
    pub channel: SubmissionChannel,
    pub submitted_at: DateTime<Utc>,
}
