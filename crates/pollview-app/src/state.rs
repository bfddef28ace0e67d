// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{OptionId, PollDetail, PollId, PollSummary, RequestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Closed,
    LoadingDetail,
    Open,
    Voting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    ListPolls,
    PollDetail,
    Vote,
}

impl RequestKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListPolls => "list polls",
            Self::PollDetail => "fetch poll",
            Self::Vote => "vote",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRequest {
    ListPolls,
    Poll {
        poll_id: PollId,
    },
    /// `poll_id` is only used to refetch after the vote lands; the vote
    /// itself carries nothing but the option id.
    Vote {
        option_id: OptionId,
        poll_id: PollId,
    },
}

impl ApiRequest {
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::ListPolls => RequestKind::ListPolls,
            Self::Poll { .. } => RequestKind::PollDetail,
            Self::Vote { .. } => RequestKind::Vote,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub id: RequestId,
    pub request: ApiRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Rejected(String),
    Recorded {
        refreshed: Result<PollDetail, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiOutcome {
    Polls(Result<Vec<PollSummary>, String>),
    Poll(Result<PollDetail, String>),
    Vote(VoteOutcome),
}

impl ApiOutcome {
    /// The outcome a request resolves to when it could not run at all.
    pub fn failure(request: ApiRequest, error: impl Into<String>) -> Self {
        let error = error.into();
        match request {
            ApiRequest::ListPolls => Self::Polls(Err(error)),
            ApiRequest::Poll { .. } => Self::Poll(Err(error)),
            ApiRequest::Vote { .. } => Self::Vote(VoteOutcome::Rejected(error)),
        }
    }

    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::Polls(_) => RequestKind::ListPolls,
            Self::Poll(_) => RequestKind::PollDetail,
            Self::Vote(_) => RequestKind::Vote,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollCommand {
    Mount,
    SelectPoll(PollId),
    CloseModal,
    SubmitVote(OptionId),
    Resolve {
        request_id: RequestId,
        outcome: ApiOutcome,
    },
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    RequestIssued(Ticket),
    RequestCanceled(Ticket),
    StaleResponseDropped {
        request_id: RequestId,
        kind: RequestKind,
    },
    RequestFailed {
        kind: RequestKind,
        error: String,
    },
    ListReplaced {
        count: usize,
    },
    SelectionChanged(PollId),
    DetailReplaced {
        poll_id: PollId,
        revision: u64,
    },
    ModalOpened(PollId),
    ModalClosed,
    VoteRecorded {
        option_id: OptionId,
    },
    StatusUpdated(String),
    StatusCleared,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollState {
    pub polls: Vec<PollSummary>,
    pub selected_poll_id: Option<PollId>,
    pub poll: Option<PollDetail>,
    pub show_modal: bool,
    pub status_line: Option<String>,
    /// Bumped whenever `poll` is replaced.
    pub detail_revision: u64,
    mounted: bool,
    list_request: Option<Ticket>,
    detail_request: Option<Ticket>,
    vote_request: Option<Ticket>,
    next_request_id: u64,
}

impl PollState {
    pub fn phase(&self) -> ModalPhase {
        match (self.show_modal, self.vote_request.is_some()) {
            (true, true) => ModalPhase::Voting,
            (true, false) => ModalPhase::Open,
            (false, _) if self.detail_request.is_some() => ModalPhase::LoadingDetail,
            (false, _) => ModalPhase::Closed,
        }
    }

    pub fn holds_invariants(&self) -> bool {
        !self.show_modal || self.poll.is_some()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Ticket> {
        self.list_request
            .iter()
            .chain(self.detail_request.iter())
            .chain(self.vote_request.iter())
    }

    pub fn dispatch(&mut self, command: PollCommand) -> Vec<PollEvent> {
        match command {
            PollCommand::Mount => self.mount(),
            PollCommand::SelectPoll(poll_id) => self.select_poll(poll_id),
            PollCommand::CloseModal => self.close_modal(),
            PollCommand::SubmitVote(option_id) => self.submit_vote(option_id),
            PollCommand::Resolve {
                request_id,
                outcome,
            } => self.resolve(request_id, outcome),
            PollCommand::ClearStatus => {
                self.status_line = None;
                vec![PollEvent::StatusCleared]
            }
        }
    }

    fn mount(&mut self) -> Vec<PollEvent> {
        if self.mounted {
            return Vec::new();
        }
        self.mounted = true;
        let ticket = self.issue(ApiRequest::ListPolls);
        self.list_request = Some(ticket);
        vec![PollEvent::RequestIssued(ticket)]
    }

    fn select_poll(&mut self, poll_id: PollId) -> Vec<PollEvent> {
        if self.show_modal {
            return Vec::new();
        }

        let mut events = Vec::new();
        self.selected_poll_id = Some(poll_id);
        events.push(PollEvent::SelectionChanged(poll_id));

        if let Some(previous) = self.detail_request.take() {
            events.push(PollEvent::RequestCanceled(previous));
        }
        let ticket = self.issue(ApiRequest::Poll { poll_id });
        self.detail_request = Some(ticket);
        events.push(PollEvent::RequestIssued(ticket));
        events.push(self.set_status(format!("loading poll {poll_id}")));
        events
    }

    fn close_modal(&mut self) -> Vec<PollEvent> {
        let mut events = Vec::new();
        if let Some(pending) = self.detail_request.take() {
            events.push(PollEvent::RequestCanceled(pending));
            events.push(self.clear_status());
        }
        if self.show_modal {
            self.show_modal = false;
            events.push(PollEvent::ModalClosed);
        }
        events
    }

    fn submit_vote(&mut self, option_id: OptionId) -> Vec<PollEvent> {
        if !self.show_modal {
            return Vec::new();
        }
        let Some(poll) = &self.poll else {
            return Vec::new();
        };
        if poll.option(option_id).is_none() {
            return Vec::new();
        }
        let poll_id = poll.id;
        if self.vote_request.is_some() {
            return vec![self.set_status("vote already in progress")];
        }

        let ticket = self.issue(ApiRequest::Vote { option_id, poll_id });
        self.vote_request = Some(ticket);
        vec![
            PollEvent::RequestIssued(ticket),
            self.set_status("submitting vote"),
        ]
    }

    fn resolve(&mut self, request_id: RequestId, outcome: ApiOutcome) -> Vec<PollEvent> {
        let kind = outcome.kind();
        let slot = match kind {
            RequestKind::ListPolls => &mut self.list_request,
            RequestKind::PollDetail => &mut self.detail_request,
            RequestKind::Vote => &mut self.vote_request,
        };
        let Some(ticket) = slot.take_if(|ticket| ticket.id == request_id) else {
            return vec![PollEvent::StaleResponseDropped { request_id, kind }];
        };

        match (ticket.request, outcome) {
            (_, ApiOutcome::Polls(Ok(polls))) => {
                let count = polls.len();
                self.polls = polls;
                vec![PollEvent::ListReplaced { count }]
            }
            (_, ApiOutcome::Polls(Err(error))) => vec![PollEvent::RequestFailed { kind, error }],
            (_, ApiOutcome::Poll(Ok(detail))) => {
                let poll_id = detail.id;
                let mut events = vec![self.replace_detail(detail)];
                self.show_modal = true;
                events.push(PollEvent::ModalOpened(poll_id));
                events.push(self.clear_status());
                events
            }
            (_, ApiOutcome::Poll(Err(error))) => {
                vec![
                    PollEvent::RequestFailed { kind, error },
                    self.clear_status(),
                ]
            }
            (ApiRequest::Vote { option_id, .. }, ApiOutcome::Vote(outcome)) => {
                self.finish_vote(request_id, option_id, outcome)
            }
            (_, ApiOutcome::Vote(_)) => {
                vec![PollEvent::StaleResponseDropped { request_id, kind }]
            }
        }
    }

    fn finish_vote(
        &mut self,
        request_id: RequestId,
        option_id: OptionId,
        outcome: VoteOutcome,
    ) -> Vec<PollEvent> {
        match outcome {
            VoteOutcome::Rejected(error) => vec![
                PollEvent::RequestFailed {
                    kind: RequestKind::Vote,
                    error,
                },
                self.clear_status(),
            ],
            VoteOutcome::Recorded {
                refreshed: Err(error),
            } => vec![
                PollEvent::VoteRecorded { option_id },
                PollEvent::RequestFailed {
                    kind: RequestKind::PollDetail,
                    error,
                },
                self.set_status("vote recorded"),
            ],
            VoteOutcome::Recorded {
                refreshed: Ok(detail),
            } => {
                let mut events = vec![PollEvent::VoteRecorded { option_id }];
                let displayed = self.poll.as_ref().map(|poll| poll.id);
                if displayed == Some(detail.id) {
                    events.push(self.replace_detail(detail));
                } else {
                    events.push(PollEvent::StaleResponseDropped {
                        request_id,
                        kind: RequestKind::PollDetail,
                    });
                }
                events.push(self.set_status("vote recorded"));
                events
            }
        }
    }

    fn replace_detail(&mut self, detail: PollDetail) -> PollEvent {
        let poll_id = detail.id;
        self.poll = Some(detail);
        self.detail_revision = self.detail_revision.saturating_add(1);
        PollEvent::DetailReplaced {
            poll_id,
            revision: self.detail_revision,
        }
    }

    fn issue(&mut self, request: ApiRequest) -> Ticket {
        self.next_request_id = self.next_request_id.saturating_add(1);
        if self.next_request_id == 0 {
            self.next_request_id = 1;
        }
        Ticket {
            id: RequestId::new(self.next_request_id),
            request,
        }
    }

    fn set_status(&mut self, message: impl Into<String>) -> PollEvent {
        let message = message.into();
        self.status_line = Some(message.clone());
        PollEvent::StatusUpdated(message)
    }

    fn clear_status(&mut self) -> PollEvent {
        self.status_line = None;
        PollEvent::StatusCleared
    }
}
