//! Dashboard summary over a user's applications.
//!
//! There is no delivery tracking pipeline behind this: the open rate is a
//! fixed placeholder, everything else is derived from application status.

use serde::Serialize;

use crate::models::application::{ApplicationStatus, JobApplicationRow};

/// Reported open rate whenever at least one application went out.
pub const PLACEHOLDER_OPEN_RATE: u32 = 68;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_applications: u32,
    pub response_rate: u32,
    pub interview_count: u32,
    pub delivery_rate: u32,
    pub open_rate: u32,
    pub reply_rate: u32,
}

pub fn summarize(applications: &[JobApplicationRow]) -> AnalyticsSummary {
    let statuses: Vec<ApplicationStatus> = applications.iter().map(|a| a.status()).collect();
    summarize_statuses(&statuses)
}

fn summarize_statuses(statuses: &[ApplicationStatus]) -> AnalyticsSummary {
    let total = statuses.len() as u32;
    let sent = statuses.iter().filter(|s| s.counts_as_sent()).count() as u32;
    let replied = statuses
        .iter()
        .filter(|s| **s == ApplicationStatus::Replied)
        .count() as u32;

    if sent == 0 {
        return AnalyticsSummary {
            total_applications: total,
            ..Default::default()
        };
    }

    let response_rate = percent(replied, sent);
    AnalyticsSummary {
        total_applications: total,
        response_rate,
        interview_count: replied,
        delivery_rate: percent(sent, total),
        open_rate: PLACEHOLDER_OPEN_RATE,
        reply_rate: response_rate,
    }
}

/// Rounded `part / whole * 100`; zero when `whole` is zero.
fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}
