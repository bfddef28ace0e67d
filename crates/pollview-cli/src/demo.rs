// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use pollview_api::PollBackend;
use pollview_app::{OptionId, PollDetail, PollId, PollOption, PollSummary};
use std::sync::{Arc, Mutex, MutexGuard};

const DEMO_POLLS: [(&str, i64, &[(&str, i64)]); 4] = [
    (
        "Where should the team lunch be this Friday?",
        1_700_000_000,
        &[("Tacos", 12), ("Ramen", 9)],
    ),
    (
        "Tabs or spaces for the new service?",
        1_702_592_000,
        &[("Tabs", 7), ("Spaces", 11)],
    ),
    (
        "Move standup to 10:00?",
        1_705_276_800,
        &[("Yes", 4), ("No", 2), ("Don't care", 5)],
    ),
    ("Ship the beta this week?", 1_707_955_200, &[("Yes", 0), ("No", 0)]),
];

/// In-memory backend for `--demo`. Votes bump both the option and the poll
/// total, like the real service.
#[derive(Debug, Clone)]
pub struct DemoBackend {
    polls: Arc<Mutex<Vec<PollDetail>>>,
}

impl DemoBackend {
    pub fn new(polls: Vec<PollDetail>) -> Self {
        Self {
            polls: Arc::new(Mutex::new(polls)),
        }
    }

    pub fn seeded() -> Self {
        let mut next_option_id = 1;
        let polls = DEMO_POLLS
            .iter()
            .zip(1..)
            .map(|((title, published_date, options), id)| {
                let options: Vec<PollOption> = options
                    .iter()
                    .map(|(label, votes)| {
                        let option = PollOption {
                            id: OptionId::new(next_option_id),
                            label: (*label).to_owned(),
                            votes: *votes,
                        };
                        next_option_id += 1;
                        option
                    })
                    .collect();
                PollDetail {
                    id: PollId::new(id),
                    title: (*title).to_owned(),
                    published_date: *published_date,
                    total_votes: options.iter().map(|option| option.votes).sum(),
                    options,
                }
            })
            .collect();
        Self::new(polls)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<PollDetail>>> {
        self.polls
            .lock()
            .map_err(|_| anyhow!("demo poll store is poisoned"))
    }
}

impl PollBackend for DemoBackend {
    fn list_polls(&self) -> Result<Vec<PollSummary>> {
        Ok(self.lock()?.iter().map(PollDetail::summary).collect())
    }

    fn poll(&self, poll_id: PollId) -> Result<PollDetail> {
        self.lock()?
            .iter()
            .find(|poll| poll.id == poll_id)
            .cloned()
            .ok_or_else(|| anyhow!("server error (404): no poll {poll_id}"))
    }

    fn vote(&self, option_id: OptionId) -> Result<()> {
        let mut polls = self.lock()?;
        for poll in polls.iter_mut() {
            if let Some(option) = poll
                .options
                .iter_mut()
                .find(|option| option.id == option_id)
            {
                option.votes += 1;
                poll.total_votes += 1;
                return Ok(());
            }
        }
        bail!("server error (404): no option {option_id}")
    }
}
