// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::ids::*;

pub const INVALID_DATE_LABEL: &str = "INVALID DATE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSummary {
    pub id: PollId,
    pub title: String,
    pub published_date: i64,
}

impl PollSummary {
    pub fn date_label(&self) -> String {
        format_published_date(self.published_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub id: OptionId,
    pub label: String,
    pub votes: i64,
}

/// Full poll as served by `GET /api/poll/{id}`. `total_votes` is taken as
/// reported; it is never recomputed from the options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDetail {
    pub id: PollId,
    pub title: String,
    pub published_date: i64,
    pub total_votes: i64,
    pub options: Vec<PollOption>,
}

impl PollDetail {
    pub fn date_label(&self) -> String {
        format_published_date(self.published_date)
    }

    pub fn option(&self, option_id: OptionId) -> Option<&PollOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    pub fn summary(&self) -> PollSummary {
        PollSummary {
            id: self.id,
            title: self.title.clone(),
            published_date: self.published_date,
        }
    }
}

/// Renders a unix-seconds timestamp as `MON DD YYYY` in UTC, e.g.
/// `NOV 14 2023`.
pub fn format_published_date(unix_seconds: i64) -> String {
    let Ok(moment) = OffsetDateTime::from_unix_timestamp(unix_seconds) else {
        return INVALID_DATE_LABEL.to_owned();
    };
    moment
        .date()
        .format(format_description!("[month repr:short] [day] [year]"))
        .map(|label| label.to_ascii_uppercase())
        .unwrap_or_else(|_| INVALID_DATE_LABEL.to_owned())
}

#[cfg(test)]
mod tests {
    use super::{INVALID_DATE_LABEL, PollDetail, PollSummary, format_published_date};
    use crate::{OptionId, PollId};
    use anyhow::Result;

    #[test]
    fn published_date_uses_uppercase_month_day_year() {
        assert_eq!(format_published_date(1_700_000_000), "NOV 14 2023");
        assert_eq!(format_published_date(0), "JAN 01 1970");
    }

    #[test]
    fn out_of_range_timestamp_is_labeled_invalid() {
        assert_eq!(format_published_date(i64::MAX), INVALID_DATE_LABEL);
    }

    #[test]
    fn summary_decodes_camel_case_fields() -> Result<()> {
        let polls: Vec<PollSummary> = serde_json::from_str(
            r#"[{"id":1,"title":"T1","publishedDate":1700000000},{"id":7,"title":"T7","publishedDate":1}]"#,
        )?;
        assert_eq!(polls.len(), 2);
        assert_eq!(polls[0].id, PollId::new(1));
        assert_eq!(polls[0].date_label(), "NOV 14 2023");
        assert_eq!(polls[1].title, "T7");
        Ok(())
    }

    #[test]
    fn detail_decodes_options_in_order_and_ignores_extra_fields() -> Result<()> {
        let detail: PollDetail = serde_json::from_str(
            r#"{"id":3,"title":"Lunch","publishedDate":1700000000,"totalVotes":10,
                "createdBy":"admin",
                "options":[{"id":9,"label":"B","votes":4},{"id":2,"label":"A","votes":6}]}"#,
        )?;
        assert_eq!(detail.total_votes, 10);
        let labels: Vec<&str> = detail.options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "A"]);
        assert_eq!(detail.option(OptionId::new(2)).map(|o| o.votes), Some(6));
        assert!(detail.option(OptionId::new(5)).is_none());
        assert_eq!(detail.summary().id, PollId::new(3));
        Ok(())
    }
}
