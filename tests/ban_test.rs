/// Integration tests for offender ranking and bans
/// Bans snapshot the flagged count and never touch comments
mod common;

use chrono::{Duration, Utc};
use common::{database::*, fixtures::*};
use modgate::moderation::{BatchAction, PolicyViolation};
use modgate::notifications::NotificationType;
use modgate::orm::bans;
use modgate::orm::comments::CommentState;
use modgate::ModerationError;
use sea_orm::{entity::*, ActiveValue::Set};

#[actix_rt::test]
async fn test_top_offenders_and_ban_snapshot_scenario() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let engine = test_engine(&db);

    let x = create_test_actor(&db, "X").await.expect("Failed to create actor");
    let y = create_test_actor(&db, "Y").await.expect("Failed to create actor");
    let reporter = create_test_actor(&db, "Reporter").await.expect("Failed to create reporter");
    let m = create_test_moderator(&db, "M").await.expect("Failed to create moderator");

    let mut x_comments = Vec::new();
    for i in 0..3 {
        x_comments.push(create_hidden_comment(&engine, x.id, reporter.id, m.id, &format!("h{}", i)).await);
    }
    for i in 0..4 {
        x_comments.push(create_flagged_comment(&engine, x.id, reporter.id, &format!("f{}", i)).await);
    }
    create_test_comment(&db, x.id, "clean")
        .await
        .expect("Failed to create comment");

    // Y has two flags, one of which is dismissed and no longer counts.
    let y1 = create_flagged_comment(&engine, y.id, reporter.id, "y1").await;
    create_flagged_comment(&engine, y.id, reporter.id, "y2").await;
    engine
        .apply_batch(BatchAction::Dismiss, &[y1.id], m.id)
        .await
        .expect("Dismiss should succeed");

    let offenders = engine
        .top_offenders(10)
        .await
        .expect("Failed to rank offenders");
    assert_eq!(offenders.len(), 2);
    assert_eq!(offenders[0].actor_id, x.id);
    assert_eq!(offenders[0].display_name, "X");
    assert_eq!(offenders[0].flagged_count, 7);
    assert_eq!(offenders[1].actor_id, y.id);
    assert_eq!(offenders[1].flagged_count, 1);

    let ban = engine
        .ban(x.id, m.id, "repeated spam", None)
        .await
        .expect("Ban should succeed");
    assert_eq!(ban.actor_id, x.id);
    assert_eq!(ban.banned_by, m.id);
    assert_eq!(ban.reason, "repeated spam");
    assert_eq!(ban.flagged_count_snapshot, 7);

    for comment in &x_comments {
        assert_eq!(
            &reload_comment(&db, comment.id).await,
            comment,
            "Ban must not change comments"
        );
    }
    let states: Vec<CommentState> = x_comments.iter().map(|c| c.state).collect();
    assert_eq!(states.iter().filter(|s| **s == CommentState::Hidden).count(), 3);
    assert_eq!(states.iter().filter(|s| **s == CommentState::Flagged).count(), 4);
}

#[actix_rt::test]
async fn test_top_offenders_limit() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let engine = test_engine(&db);

    let reporter = create_test_actor(&db, "Reporter").await.expect("Failed to create reporter");
    for n in 1..=3 {
        let author = create_test_actor(&db, &format!("Author {}", n))
            .await
            .expect("Failed to create author");
        for i in 0..n {
            create_flagged_comment(&engine, author.id, reporter.id, &format!("c{}", i)).await;
        }
    }

    let top = engine.top_offenders(2).await.expect("Failed to rank offenders");
    let counts: Vec<u64> = top.iter().map(|o| o.flagged_count).collect();
    assert_eq!(counts, vec![3, 2]);

    assert!(engine.top_offenders(0).await.expect("Failed to rank").is_empty());
}

#[actix_rt::test]
async fn test_top_offenders_ties_go_to_lower_id() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let engine = test_engine(&db);

    let reporter = create_test_actor(&db, "Reporter").await.expect("Failed to create reporter");
    let first = create_test_actor(&db, "First").await.expect("Failed to create author");
    let second = create_test_actor(&db, "Second").await.expect("Failed to create author");
    let clean = create_test_actor(&db, "Clean").await.expect("Failed to create author");

    // Flag the later author first so insertion order cannot decide the tie.
    for author in [&second, &first, &second, &first] {
        create_flagged_comment(&engine, author.id, reporter.id, "dup").await;
    }
    create_test_comment(&db, clean.id, "fine")
        .await
        .expect("Failed to create comment");

    let top = engine.top_offenders(10).await.expect("Failed to rank offenders");
    let ranked: Vec<(i32, &str, u64)> = top
        .iter()
        .map(|o| (o.actor_id, o.display_name.as_str(), o.flagged_count))
        .collect();
    assert_eq!(ranked, vec![(first.id, "First", 2), (second.id, "Second", 2)]);
}

#[actix_rt::test]
async fn test_later_dismissal_does_not_change_snapshot() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let engine = test_engine(&db);

    let x = create_test_actor(&db, "X").await.expect("Failed to create actor");
    let reporter = create_test_actor(&db, "Reporter").await.expect("Failed to create reporter");
    let m = create_test_moderator(&db, "M").await.expect("Failed to create moderator");

    let a = create_flagged_comment(&engine, x.id, reporter.id, "a").await;
    create_flagged_comment(&engine, x.id, reporter.id, "b").await;

    let ban = engine
        .ban(x.id, m.id, "spam", Some(3))
        .await
        .expect("Ban should succeed");

    engine
        .apply_batch(BatchAction::Dismiss, &[a.id], m.id)
        .await
        .expect("Dismiss should succeed");

    let stored = bans::Entity::find_by_id(ban.id)
        .one(&db)
        .await
        .expect("Failed to load ban")
        .expect("Ban missing");
    assert_eq!(stored.flagged_count_snapshot, 2);
}

#[actix_rt::test]
async fn test_ban_requires_capability() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let engine = test_engine(&db);

    let x = create_test_actor(&db, "X").await.expect("Failed to create actor");
    let nobody = create_test_actor(&db, "Nobody").await.expect("Failed to create actor");

    let result = engine.ban(x.id, nobody.id, "spam", None).await;
    assert!(matches!(
        result,
        Err(ModerationError::PolicyViolation(
            PolicyViolation::MissingCapability { .. }
        ))
    ));
    assert!(engine
        .active_ban(x.id)
        .await
        .expect("Failed to look up ban")
        .is_none());
}

#[actix_rt::test]
async fn test_moderator_cannot_ban_themself() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let engine = test_engine(&db);

    let m = create_test_moderator(&db, "M").await.expect("Failed to create moderator");

    let result = engine.ban(m.id, m.id, "oops", None).await;
    assert!(matches!(
        result,
        Err(ModerationError::PolicyViolation(PolicyViolation::SelfBan))
    ));
}

#[actix_rt::test]
async fn test_ban_unknown_actor_and_bad_reason() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let engine = test_engine(&db);

    let x = create_test_actor(&db, "X").await.expect("Failed to create actor");
    let m = create_test_moderator(&db, "M").await.expect("Failed to create moderator");

    let missing = engine.ban(9999, m.id, "spam", None).await;
    assert!(matches!(missing, Err(ModerationError::NotFound(_))));

    let blank = engine.ban(x.id, m.id, "  ", None).await;
    assert!(matches!(blank, Err(ModerationError::InvalidInput(_))));
}

#[actix_rt::test]
async fn test_ban_duration_is_clamped_and_notified() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let (engine, sink) = recording_engine(&db);

    let x = create_test_actor(&db, "X").await.expect("Failed to create actor");
    let m = create_test_moderator(&db, "M").await.expect("Failed to create moderator");

    let ban = engine
        .ban(x.id, m.id, "spam", Some(10_000))
        .await
        .expect("Ban should succeed");

    let length = ban.expires_at - ban.created_at;
    assert_eq!(length, Duration::days(engine.config().max_ban_duration_days));

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].notification_type, NotificationType::ActorBanned);
    assert_eq!(notices[0].recipient_id, x.id);
    assert_eq!(notices[0].target_id, ban.id);
}

#[actix_rt::test]
async fn test_active_ban_ignores_expired_records() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let engine = test_engine(&db);

    let x = create_test_actor(&db, "X").await.expect("Failed to create actor");
    let m = create_test_moderator(&db, "M").await.expect("Failed to create moderator");

    let now = Utc::now().naive_utc();
    bans::ActiveModel {
        actor_id: Set(x.id),
        banned_by: Set(m.id),
        reason: Set("old".to_string()),
        flagged_count_snapshot: Set(1),
        expires_at: Set(now - Duration::days(1)),
        created_at: Set(now - Duration::days(8)),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("Failed to insert expired ban");

    assert!(engine
        .active_ban(x.id)
        .await
        .expect("Failed to look up ban")
        .is_none());

    let ban = engine
        .ban(x.id, m.id, "again", None)
        .await
        .expect("Ban should succeed");
    let active = engine
        .active_ban(x.id)
        .await
        .expect("Failed to look up ban")
        .expect("Ban should be active");
    assert_eq!(active.id, ban.id);
    assert!(active.expires_at > Utc::now().naive_utc());
}
