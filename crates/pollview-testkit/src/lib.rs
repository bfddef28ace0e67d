// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use pollview_app::{OptionId, PollDetail, PollId, PollOption, PollSummary};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

const QUESTIONS: [&str; 12] = [
    "Best lunch spot near the office",
    "Tabs or spaces",
    "Next team offsite location",
    "Favorite release codename",
    "Friday demo time slot",
    "Preferred standup length",
    "Coffee or tea",
    "Which framework for the rewrite",
    "Holiday party theme",
    "Default editor for new hires",
    "Ship on Thursday or Monday",
    "Snack drawer restock",
];

const ANSWERS: [&str; 16] = [
    "Yes", "No", "Maybe", "Tacos", "Ramen", "Pizza", "Tabs", "Spaces", "Morning", "Afternoon",
    "Coffee", "Tea", "Beach", "Mountains", "Thursday", "Monday",
];

/// 2023-01-01T00:00:00Z.
const REFERENCE_UNIX: i64 = 1_672_531_200;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of consistent polls: option ids are unique across
/// every poll a single faker produces and `total_votes` always equals the
/// sum of option votes.
#[derive(Debug, Clone)]
pub struct PollFaker {
    rng: DeterministicRng,
    next_poll_id: i64,
    next_option_id: i64,
}

impl PollFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_poll_id: 1,
            next_option_id: 1,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn poll(&mut self) -> PollDetail {
        let id = PollId::new(self.next_poll_id);
        self.next_poll_id += 1;

        let option_count = 2 + self.int_n(3);
        let first_answer = self.int_n(ANSWERS.len());
        let options: Vec<PollOption> = (0..option_count)
            .map(|offset| {
                let option = PollOption {
                    id: OptionId::new(self.next_option_id),
                    label: ANSWERS[(first_answer + offset) % ANSWERS.len()].to_owned(),
                    votes: self.int_n(40) as i64,
                };
                self.next_option_id += 1;
                option
            })
            .collect();

        PollDetail {
            id,
            title: QUESTIONS[self.int_n(QUESTIONS.len())].to_owned(),
            published_date: REFERENCE_UNIX + self.int_n(730) as i64 * SECONDS_PER_DAY,
            total_votes: options.iter().map(|option| option.votes).sum(),
            options,
        }
    }

    pub fn polls(&mut self, count: usize) -> Vec<PollDetail> {
        (0..count).map(|_| self.poll()).collect()
    }
}

pub fn summaries(polls: &[PollDetail]) -> Vec<PollSummary> {
    polls.iter().map(PollDetail::summary).collect()
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok<T: serde::Serialize>(value: &T) -> Result<Self> {
        Ok(Self::json(
            200,
            serde_json::to_string(value).context("encode mock body")?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub content_type: Option<String>,
    pub body: String,
}

/// Scripted backend: answers requests in arrival order with the given
/// responses, then stops. Gives up after a few seconds of silence.
pub struct MockServer {
    base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl MockServer {
    pub fn start(responses: Vec<MockResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for scripted in responses {
                let mut request = match server.recv_timeout(Duration::from_secs(5)) {
                    Ok(Some(request)) => request,
                    Ok(None) | Err(_) => break,
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let content_type = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Content-Type"))
                    .map(|header| header.value.as_str().to_owned());
                recorded.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    content_type,
                    body,
                });

                let mut response =
                    Response::from_string(scripted.body).with_status_code(scripted.status);
                if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
                    response = response.with_header(header);
                }
                if request.respond(response).is_err() {
                    break;
                }
            }
            recorded
        });

        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn finish(self) -> Result<Vec<RecordedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))
    }
}
