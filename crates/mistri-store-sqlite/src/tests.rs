//! Integration tests for `SqliteStore` against an in-memory database, plus
//! engine-level tests running `MatchingEngine`/`Messenger` over it.

use std::sync::Arc;

use mistri_core::{
  Error,
  chat::ConversationId,
  engine::{MatchingEngine, Messenger},
  posting::{BudgetType, Compensation, NewPosting, PostingKind, PostingStatus},
  profile::{MemoryProfiles, Profile, Role},
  store::{MarketStore, MessageStore, PostingQuery},
  submission::{Decision, NewSubmission, SubmissionDetails, SubmissionStatus},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn job(owner: Uuid) -> NewPosting {
  NewPosting {
    owner_id:     owner,
    title:        "Fix roof tiles".into(),
    category:     "mason".into(),
    location:     "Patna".into(),
    description:  "Two days of tiling work on a single-storey house".into(),
    compensation: Compensation::DailyWage { wage: "800".into() },
  }
}

fn contract(owner: Uuid) -> NewPosting {
  NewPosting {
    owner_id:     owner,
    title:        "Boundary wall construction".into(),
    category:     "construction".into(),
    location:     "Gaya".into(),
    description:  "60ft boundary wall, materials included".into(),
    compensation: Compensation::Budget {
      amount:      "50000".into(),
      budget_type: BudgetType::Fixed,
    },
  }
}

fn application(posting_id: Uuid, actor_id: Uuid) -> NewSubmission {
  NewSubmission::new(posting_id, actor_id, SubmissionDetails::Application)
}

fn bid(posting_id: Uuid, actor_id: Uuid, amount: &str) -> NewSubmission {
  NewSubmission::new(
    posting_id,
    actor_id,
    SubmissionDetails::Bid {
      amount:   amount.into(),
      proposal: None,
    },
  )
}

// ─── Postings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_posting() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let posting = s.add_posting(job(owner)).await.unwrap();
  assert_eq!(posting.status, PostingStatus::Open);
  assert_eq!(posting.submission_count, 0);
  assert_eq!(posting.kind(), PostingKind::Job);

  let fetched = s.get_posting(posting.posting_id).await.unwrap().unwrap();
  assert_eq!(fetched.posting_id, posting.posting_id);
  assert_eq!(fetched.owner_id, owner);
  assert_eq!(fetched.title, "Fix roof tiles");
  assert_eq!(
    fetched.compensation,
    Compensation::DailyWage { wage: "800".into() }
  );
}

#[tokio::test]
async fn get_posting_missing_returns_none() {
  let s = store().await;
  assert!(s.get_posting(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_open_postings_newest_first() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let first = s.add_posting(job(owner)).await.unwrap();
  let second = s.add_posting(contract(owner)).await.unwrap();

  let all = s.list_open_postings(&PostingQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].posting_id, second.posting_id);
  assert_eq!(all[1].posting_id, first.posting_id);
}

#[tokio::test]
async fn list_open_postings_excludes_closed() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let keep = s.add_posting(job(owner)).await.unwrap();
  let gone = s.add_posting(job(owner)).await.unwrap();
  s.close_posting(gone.posting_id, owner).await.unwrap();

  let open = s.list_open_postings(&PostingQuery::default()).await.unwrap();
  assert_eq!(open.len(), 1);
  assert_eq!(open[0].posting_id, keep.posting_id);
}

#[tokio::test]
async fn list_open_postings_text_and_kind_filters() {
  let s = store().await;
  let owner = Uuid::new_v4();

  s.add_posting(job(owner)).await.unwrap(); // location Patna
  s.add_posting(contract(owner)).await.unwrap(); // location Gaya

  let patna = s
    .list_open_postings(&PostingQuery {
      text: Some("Patna".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(patna.len(), 1);
  assert_eq!(patna[0].location, "Patna");

  let contracts = s
    .list_open_postings(&PostingQuery {
      kind: Some(PostingKind::Contract),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(contracts.len(), 1);
  assert_eq!(contracts[0].kind(), PostingKind::Contract);
}

#[tokio::test]
async fn close_posting_requires_owner() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let posting = s.add_posting(job(owner)).await.unwrap();

  let err = s
    .close_posting(posting.posting_id, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Permission(_)));

  // Untouched.
  let fetched = s.get_posting(posting.posting_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, PostingStatus::Open);
}

#[tokio::test]
async fn close_posting_is_idempotent() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let posting = s.add_posting(job(owner)).await.unwrap();

  let closed = s.close_posting(posting.posting_id, owner).await.unwrap();
  assert_eq!(closed.status, PostingStatus::Closed);

  // Second close: no-op, not an error.
  let again = s.close_posting(posting.posting_id, owner).await.unwrap();
  assert_eq!(again.status, PostingStatus::Closed);
}

#[tokio::test]
async fn close_posting_missing_errors() {
  let s = store().await;
  let err = s
    .close_posting(Uuid::new_v4(), Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PostingNotFound(_)));
}

// ─── Submissions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_increments_count_and_duplicate_is_rejected() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let worker = Uuid::new_v4();
  let posting = s.add_posting(job(owner)).await.unwrap();

  let submission = s
    .submit(application(posting.posting_id, worker))
    .await
    .unwrap();
  assert_eq!(submission.status, SubmissionStatus::Pending);

  let fetched = s.get_posting(posting.posting_id).await.unwrap().unwrap();
  assert_eq!(fetched.submission_count, 1);

  // Same worker again: rejected before it reaches the store, count stays 1.
  let err = s
    .submit(application(posting.posting_id, worker))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateSubmission { .. }));

  let fetched = s.get_posting(posting.posting_id).await.unwrap().unwrap();
  assert_eq!(fetched.submission_count, 1);
}

#[tokio::test]
async fn submit_against_closed_posting_errors() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let w1 = Uuid::new_v4();
  let w2 = Uuid::new_v4();
  let posting = s.add_posting(job(owner)).await.unwrap();

  s.submit(application(posting.posting_id, w1)).await.unwrap();
  s.close_posting(posting.posting_id, owner).await.unwrap();

  let err = s
    .submit(application(posting.posting_id, w2))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ClosedPosting(_)));

  // Count untouched, existing submission still listable and unchanged.
  let fetched = s.get_posting(posting.posting_id).await.unwrap().unwrap();
  assert_eq!(fetched.submission_count, 1);

  let listed = s
    .list_submissions_for_posting(posting.posting_id, owner)
    .await
    .unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].actor_id, w1);
  assert_eq!(listed[0].status, SubmissionStatus::Pending);
}

#[tokio::test]
async fn submit_against_missing_posting_errors() {
  let s = store().await;
  let err = s
    .submit(application(Uuid::new_v4(), Uuid::new_v4()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PostingNotFound(_)));
}

#[tokio::test]
async fn submit_kind_mismatch_errors() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let posting = s.add_posting(job(owner)).await.unwrap();

  // A bid may not attach to a job posting.
  let err = s
    .submit(bid(posting.posting_id, Uuid::new_v4(), "700"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));

  let fetched = s.get_posting(posting.posting_id).await.unwrap().unwrap();
  assert_eq!(fetched.submission_count, 0);
}

#[tokio::test]
async fn count_tracks_distinct_actors() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let posting = s.add_posting(job(owner)).await.unwrap();

  for _ in 0..3 {
    s.submit(application(posting.posting_id, Uuid::new_v4()))
      .await
      .unwrap();
  }

  let fetched = s.get_posting(posting.posting_id).await.unwrap().unwrap();
  assert_eq!(fetched.submission_count, 3);

  let listed = s
    .list_submissions_for_posting(posting.posting_id, owner)
    .await
    .unwrap();
  assert_eq!(listed.len(), 3);
}

#[tokio::test]
async fn concurrent_duplicate_submits_yield_exactly_one_success() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let worker = Uuid::new_v4();
  let posting = s.add_posting(job(owner)).await.unwrap();

  let mut handles = Vec::new();
  for _ in 0..8 {
    let s = s.clone();
    let posting_id = posting.posting_id;
    handles.push(tokio::spawn(async move {
      s.submit(application(posting_id, worker)).await
    }));
  }

  let mut successes = 0;
  let mut duplicates = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => successes += 1,
      Err(Error::DuplicateSubmission { .. }) => duplicates += 1,
      Err(e) => panic!("unexpected error: {e}"),
    }
  }
  assert_eq!(successes, 1);
  assert_eq!(duplicates, 7);

  let fetched = s.get_posting(posting.posting_id).await.unwrap().unwrap();
  assert_eq!(fetched.submission_count, 1);
}

#[tokio::test]
async fn concurrent_distinct_submits_all_count() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let posting = s.add_posting(contract(owner)).await.unwrap();

  let mut handles = Vec::new();
  for i in 0..6 {
    let s = s.clone();
    let posting_id = posting.posting_id;
    handles.push(tokio::spawn(async move {
      s.submit(bid(posting_id, Uuid::new_v4(), &format!("{}", 40000 + i)))
        .await
    }));
  }
  for handle in handles {
    handle.await.unwrap().unwrap();
  }

  let fetched = s.get_posting(posting.posting_id).await.unwrap().unwrap();
  assert_eq!(fetched.submission_count, 6);
}

#[tokio::test]
async fn list_submissions_requires_owner() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let posting = s.add_posting(job(owner)).await.unwrap();
  s.submit(application(posting.posting_id, Uuid::new_v4()))
    .await
    .unwrap();

  let err = s
    .list_submissions_for_posting(posting.posting_id, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Permission(_)));
}

#[tokio::test]
async fn list_submissions_for_actor_joins_posting_fields() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let worker = Uuid::new_v4();
  let posting = s.add_posting(job(owner)).await.unwrap();
  s.submit(application(posting.posting_id, worker)).await.unwrap();

  let mine = s.list_submissions_for_actor(worker).await.unwrap();
  assert_eq!(mine.len(), 1);

  let joined = mine[0].posting.as_ref().unwrap();
  assert_eq!(joined.title, "Fix roof tiles");
  assert_eq!(joined.location, "Patna");
  assert_eq!(joined.status, PostingStatus::Open);

  // The join reads current posting state, not a snapshot.
  s.close_posting(posting.posting_id, owner).await.unwrap();
  let mine = s.list_submissions_for_actor(worker).await.unwrap();
  assert_eq!(
    mine[0].posting.as_ref().unwrap().status,
    PostingStatus::Closed
  );
}

// ─── Decisions ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn accept_one_bid_leaves_competitors_pending() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let x = Uuid::new_v4();
  let y = Uuid::new_v4();
  let posting = s.add_posting(contract(owner)).await.unwrap();

  let bid_x = s.submit(bid(posting.posting_id, x, "45000")).await.unwrap();
  let bid_y = s.submit(bid(posting.posting_id, y, "48000")).await.unwrap();

  let decided = s
    .decide(bid_x.submission_id, Decision::Accept, owner)
    .await
    .unwrap();
  assert_eq!(decided.status, SubmissionStatus::Accepted);

  // Re-deciding a terminal submission fails and changes nothing.
  let err = s
    .decide(bid_x.submission_id, Decision::Accept, owner)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidState { status: SubmissionStatus::Accepted, .. }
  ));

  // No implicit rejection of the competing bid.
  let other = s.get_submission(bid_y.submission_id).await.unwrap().unwrap();
  assert_eq!(other.status, SubmissionStatus::Pending);

  // The posting stays open; acceptance does not close it.
  let fetched = s.get_posting(posting.posting_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, PostingStatus::Open);
}

#[tokio::test]
async fn reject_transitions_to_rejected() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let posting = s.add_posting(job(owner)).await.unwrap();
  let submission = s
    .submit(application(posting.posting_id, Uuid::new_v4()))
    .await
    .unwrap();

  let decided = s
    .decide(submission.submission_id, Decision::Reject, owner)
    .await
    .unwrap();
  assert_eq!(decided.status, SubmissionStatus::Rejected);
}

#[tokio::test]
async fn decide_requires_posting_owner() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let posting = s.add_posting(job(owner)).await.unwrap();
  let submission = s
    .submit(application(posting.posting_id, Uuid::new_v4()))
    .await
    .unwrap();

  let err = s
    .decide(submission.submission_id, Decision::Accept, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Permission(_)));

  let unchanged = s
    .get_submission(submission.submission_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(unchanged.status, SubmissionStatus::Pending);
}

#[tokio::test]
async fn decide_missing_submission_errors() {
  let s = store().await;
  let err = s
    .decide(Uuid::new_v4(), Decision::Accept, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SubmissionNotFound(_)));
}

// ─── Engine layer ────────────────────────────────────────────────────────────

fn engine(s: &SqliteStore, profiles: &MemoryProfiles) -> MatchingEngine<SqliteStore, MemoryProfiles> {
  MatchingEngine::new(Arc::new(s.clone()), Arc::new(profiles.clone()))
}

fn messenger(s: &SqliteStore, profiles: &MemoryProfiles) -> Messenger<SqliteStore, MemoryProfiles> {
  Messenger::new(Arc::new(s.clone()), Arc::new(profiles.clone()))
}

#[tokio::test]
async fn engine_rejects_invalid_posting_input() {
  let s = store().await;
  let profiles = MemoryProfiles::new();
  let engine = engine(&s, &profiles);

  let mut input = job(Uuid::new_v4());
  input.title = "   ".into();

  let err = engine.create_posting(input).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn engine_snapshots_profile_on_submit() {
  let s = store().await;
  let profiles = MemoryProfiles::new();
  let engine = engine(&s, &profiles);

  let owner = Uuid::new_v4();
  let worker = Uuid::new_v4();
  profiles.upsert(Profile {
    user_id:   worker,
    name:      "Ramesh Kumar".into(),
    photo_url: Some("https://cdn.example/ramesh.jpg".into()),
    role:      Role::Worker,
  });

  let posting = engine.create_posting(job(owner)).await.unwrap();
  let submission = engine
    .submit(application(posting.posting_id, worker))
    .await
    .unwrap();

  assert_eq!(submission.actor_name.as_deref(), Some("Ramesh Kumar"));
  assert_eq!(
    submission.actor_photo.as_deref(),
    Some("https://cdn.example/ramesh.jpg")
  );

  // The snapshot is taken at write time; a later rename does not touch it.
  profiles.upsert(Profile {
    user_id:   worker,
    name:      "R. Kumar".into(),
    photo_url: None,
    role:      Role::Worker,
  });
  let listed = engine
    .submissions_for_posting(posting.posting_id, owner)
    .await
    .unwrap();
  assert_eq!(listed[0].actor_name.as_deref(), Some("Ramesh Kumar"));
}

#[tokio::test]
async fn engine_submits_without_profile_record() {
  let s = store().await;
  let profiles = MemoryProfiles::new();
  let engine = engine(&s, &profiles);

  let posting = engine.create_posting(job(Uuid::new_v4())).await.unwrap();
  let submission = engine
    .submit(application(posting.posting_id, Uuid::new_v4()))
    .await
    .unwrap();

  assert!(submission.actor_name.is_none());
  assert!(submission.actor_photo.is_none());
}

// ─── Messaging ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn send_creates_conversation_and_updates_summary() {
  let s = store().await;
  let profiles = MemoryProfiles::new();
  let chat = messenger(&s, &profiles);

  let a = Uuid::new_v4();
  let b = Uuid::new_v4();
  let id = ConversationId::between(a, b).unwrap();

  assert!(chat.conversation(&id).await.unwrap().is_none());

  chat.send(&id, a, "namaste").await.unwrap();
  let summary = chat.conversation(&id).await.unwrap().unwrap();
  assert_eq!(summary.last_message, "namaste");
  assert!(summary.participants.contains(&a));
  assert!(summary.participants.contains(&b));

  chat.send(&id, b, "haan, bataiye").await.unwrap();
  let summary = chat.conversation(&id).await.unwrap().unwrap();
  assert_eq!(summary.last_message, "haan, bataiye");
}

#[tokio::test]
async fn send_rejects_empty_text_and_outsiders() {
  let s = store().await;
  let profiles = MemoryProfiles::new();
  let chat = messenger(&s, &profiles);

  let a = Uuid::new_v4();
  let b = Uuid::new_v4();
  let id = ConversationId::between(a, b).unwrap();

  assert!(matches!(
    chat.send(&id, a, "   ").await.unwrap_err(),
    Error::Validation(_)
  ));
  assert!(matches!(
    chat.send(&id, Uuid::new_v4(), "hello").await.unwrap_err(),
    Error::Permission(_)
  ));
  assert!(chat.history(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_is_ordered_oldest_first() {
  let s = store().await;
  let profiles = MemoryProfiles::new();
  let chat = messenger(&s, &profiles);

  let a = Uuid::new_v4();
  let b = Uuid::new_v4();
  let id = ConversationId::between(a, b).unwrap();

  chat.send(&id, a, "one").await.unwrap();
  chat.send(&id, b, "two").await.unwrap();
  chat.send(&id, a, "three").await.unwrap();

  let history = chat.history(&id).await.unwrap();
  let texts: Vec<_> = history.iter().map(|m| m.text.as_str()).collect();
  assert_eq!(texts, ["one", "two", "three"]);
  assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn mid_conversation_subscriber_gets_replay_then_live() {
  let s = store().await;
  let profiles = MemoryProfiles::new();
  let chat = messenger(&s, &profiles);

  let a = Uuid::new_v4();
  let b = Uuid::new_v4();
  let id = ConversationId::between(a, b).unwrap();

  chat.send(&id, a, "first").await.unwrap();
  chat.send(&id, b, "second").await.unwrap();

  // Join mid-conversation: history replays before live delivery.
  let mut feed = chat.subscribe(&id).await.unwrap();
  chat.send(&id, a, "third").await.unwrap();

  let mut texts = Vec::new();
  for _ in 0..3 {
    texts.push(feed.next().await.unwrap().text);
  }
  assert_eq!(texts, ["first", "second", "third"]);
}

#[tokio::test]
async fn conversations_for_user_annotates_peer_profile() {
  let s = store().await;
  let profiles = MemoryProfiles::new();
  let chat = messenger(&s, &profiles);

  let homeowner = Uuid::new_v4();
  let worker = Uuid::new_v4();
  profiles.upsert(Profile {
    user_id:   worker,
    name:      "Sita Devi".into(),
    photo_url: None,
    role:      Role::Worker,
  });

  let id = ConversationId::between(homeowner, worker).unwrap();
  chat.send(&id, homeowner, "kab aa sakte hain?").await.unwrap();

  let views = chat.conversations_for(homeowner).await.unwrap();
  assert_eq!(views.len(), 1);
  assert_eq!(views[0].peer_id, worker);
  assert_eq!(views[0].peer.as_ref().unwrap().name, "Sita Devi");

  // The other side sees the homeowner, who has no profile record.
  let views = chat.conversations_for(worker).await.unwrap();
  assert_eq!(views[0].peer_id, homeowner);
  assert!(views[0].peer.is_none());
}

#[tokio::test]
async fn conversation_feed_delivers_snapshot_then_updates() {
  let s = store().await;
  let profiles = MemoryProfiles::new();
  let chat = messenger(&s, &profiles);

  let a = Uuid::new_v4();
  let b = Uuid::new_v4();
  let id = ConversationId::between(a, b).unwrap();
  chat.send(&id, a, "hello").await.unwrap();

  let mut feed = chat.subscribe_conversations(a).await.unwrap();

  let snapshot = feed.next().await.unwrap();
  assert_eq!(snapshot.last_message, "hello");

  chat.send(&id, b, "hello back").await.unwrap();
  let update = feed.next().await.unwrap();
  assert_eq!(update.last_message, "hello back");
}
