// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use pollview_api::{Client, PollBackend};
use pollview_app::{ApiOutcome, ApiRequest, OptionId, PollId, VoteOutcome};
use pollview_testkit::{MockResponse, MockServer, PollFaker, summaries};
use std::time::Duration;

fn client_for(server: &MockServer) -> Result<Client> {
    Client::new(server.base_url(), Some(Duration::from_secs(2)))
}

#[test]
fn unreachable_backend_error_names_base_url() -> Result<()> {
    let client = Client::new("http://127.0.0.1:1", Some(Duration::from_millis(200)))?;
    let error = client
        .list_polls()
        .expect_err("list should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(message.contains("cannot reach http://127.0.0.1:1"));
    assert!(message.contains("poll backend running"));
    Ok(())
}

#[test]
fn list_polls_keeps_server_order() -> Result<()> {
    let server = MockServer::start(vec![MockResponse::json(
        200,
        r#"[{"id":1,"title":"T1","publishedDate":1700000000},
            {"id":3,"title":"T3","publishedDate":1700100000},
            {"id":2,"title":"T2","publishedDate":1700200000}]"#,
    )])?;
    let client = client_for(&server)?;

    let polls = client.list_polls()?;
    let ids: Vec<i64> = polls.iter().map(|poll| poll.id.get()).collect();
    assert_eq!(ids, vec![1, 3, 2]);
    assert_eq!(polls[0].date_label(), "NOV 14 2023");

    let requests = server.finish()?;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, "/api/polls");
    Ok(())
}

#[test]
fn poll_detail_uses_id_in_path() -> Result<()> {
    let poll = PollFaker::new(1).poll();
    let server = MockServer::start(vec![MockResponse::ok(&poll)?])?;
    let client = client_for(&server)?;

    let fetched = client.poll(poll.id)?;
    assert_eq!(fetched, poll);

    let requests = server.finish()?;
    assert_eq!(requests[0].url, format!("/api/poll/{}", poll.id));
    Ok(())
}

#[test]
fn non_success_status_is_an_error_with_server_message() -> Result<()> {
    let server = MockServer::start(vec![MockResponse::json(404, r#"{"error":"no such poll"}"#)])?;
    let client = client_for(&server)?;

    let error = client
        .poll(PollId::new(99))
        .expect_err("404 should fail");
    let message = format!("{error:#}");
    assert!(message.contains("fetch poll 99"), "got {message}");
    assert!(message.contains("server error (404): no such poll"), "got {message}");
    server.finish()?;
    Ok(())
}

#[test]
fn malformed_json_is_a_decode_error() -> Result<()> {
    let server = MockServer::start(vec![MockResponse::json(200, "[{\"id\":")])?;
    let client = client_for(&server)?;

    let error = client.list_polls().expect_err("bad json should fail");
    assert!(error.to_string().contains("decode poll list"));
    server.finish()?;
    Ok(())
}

#[test]
fn vote_posts_option_id_as_json() -> Result<()> {
    let server = MockServer::start(vec![MockResponse::json(201, "{}")])?;
    let client = client_for(&server)?;

    client.vote(OptionId::new(12))?;

    let requests = server.finish()?;
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/api/poll/vote");
    assert_eq!(requests[0].body, r#"{"optionId":12}"#);
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    Ok(())
}

#[test]
fn execute_vote_posts_then_refetches_displayed_poll() -> Result<()> {
    let mut poll = PollFaker::new(2).poll();
    let option_id = poll.options[0].id;
    poll.options[0].votes += 1;
    poll.total_votes += 1;

    let server = MockServer::start(vec![MockResponse::json(200, ""), MockResponse::ok(&poll)?])?;
    let client = client_for(&server)?;

    let outcome = client.execute(ApiRequest::Vote {
        option_id,
        poll_id: poll.id,
    });
    assert_eq!(
        outcome,
        ApiOutcome::Vote(VoteOutcome::Recorded {
            refreshed: Ok(poll.clone()),
        })
    );

    let requests = server.finish()?;
    let urls: Vec<&str> = requests.iter().map(|request| request.url.as_str()).collect();
    assert_eq!(urls, vec!["/api/poll/vote".to_owned(), format!("/api/poll/{}", poll.id)]);
    Ok(())
}

#[test]
fn execute_vote_stops_after_rejected_post() -> Result<()> {
    let server = MockServer::start(vec![MockResponse::json(500, "boom")])?;
    let client = client_for(&server)?;

    let outcome = client.execute(ApiRequest::Vote {
        option_id: OptionId::new(1),
        poll_id: PollId::new(1),
    });
    let ApiOutcome::Vote(VoteOutcome::Rejected(error)) = outcome else {
        panic!("expected rejected vote, got {outcome:?}");
    };
    assert!(error.contains("server error (500): boom"), "got {error}");

    let requests = server.finish()?;
    assert_eq!(requests.len(), 1);
    Ok(())
}

#[test]
fn execute_vote_reports_failed_refresh_after_recorded_vote() -> Result<()> {
    let server = MockServer::start(vec![
        MockResponse::json(204, ""),
        MockResponse::json(503, ""),
    ])?;
    let client = client_for(&server)?;

    let outcome = client.execute(ApiRequest::Vote {
        option_id: OptionId::new(1),
        poll_id: PollId::new(4),
    });
    let ApiOutcome::Vote(VoteOutcome::Recorded { refreshed: Err(error) }) = outcome else {
        panic!("expected recorded vote with failed refresh, got {outcome:?}");
    };
    assert!(error.contains("server returned 503"), "got {error}");
    assert_eq!(server.finish()?.len(), 2);
    Ok(())
}

#[test]
fn execute_list_wraps_result() -> Result<()> {
    let polls = PollFaker::new(9).polls(3);
    let server = MockServer::start(vec![MockResponse::ok(&summaries(&polls))?])?;
    let client = client_for(&server)?;

    assert_eq!(
        client.execute(ApiRequest::ListPolls),
        ApiOutcome::Polls(Ok(summaries(&polls)))
    );
    server.finish()?;
    Ok(())
}
