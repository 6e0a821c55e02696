//! Spending hit dice on healing, end to end over the in-memory store.

use hitdice_core::character::Character;
use hitdice_core::testing::{sample_fighter, Notification, TestHarness};
use hitdice_core::{HealingRange, RestConfig, RestError, ValidationError};

fn cleric(level: u32, con: i32) -> Character {
    let mut character = Character::new("Kyra");
    character.level = level;
    character.class_name = "Cleric".to_string();
    character.con_modifier = Some(con);
    character.hit_points.maximum = 50;
    character.hit_points.current = 20;
    character
}

#[tokio::test]
async fn test_spend_all_remaining_dice() {
    let harness = TestHarness::new(vec![15]);
    let mut character = harness.add(cleric(5, 3)).await;
    let engine = harness.healing();
    engine
        .pool()
        .set_current(harness.store.as_ref(), &mut character, 2)
        .await
        .unwrap();

    let preview = engine.preview(&character, 2);
    assert_eq!(preview.formula, "2d8+6");
    assert_eq!(preview.range, HealingRange { min: 8, max: 22 });
    assert_eq!(preview.dice_available, 2);

    let outcome = engine.roll_and_heal(&mut character, 2).await.unwrap();
    assert_eq!(outcome.formula, "2d8+6");
    assert_eq!(outcome.roll.total, 15);
    assert_eq!(outcome.actual_healing, 15);
    assert_eq!(outcome.dice_remaining, 0);
    assert!(!outcome.was_limited);
    assert_eq!(harness.roller.formulas(), vec!["2d8+6"]);

    let stored = harness.stored(character.id).await;
    assert_eq!(stored.hit_points.current, 35);
    assert_eq!(engine.pool().current(&stored), 0);
    assert_eq!(stored, character);
}

#[tokio::test]
async fn test_healing_is_capped_at_max_hp() {
    let harness = TestHarness::new(vec![15]);
    let mut base = cleric(5, 3);
    base.hit_points.current = 45;
    let mut character = harness.add(base).await;

    let outcome = harness
        .healing()
        .roll_and_heal(&mut character, 1)
        .await
        .unwrap();
    assert_eq!(outcome.healing, 15);
    assert_eq!(outcome.actual_healing, 5);
    assert!(outcome.was_limited);
    assert_eq!(outcome.dice_remaining, 5);
    assert_eq!(character.hit_points.current, 50);

    let messages = harness.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].content.contains("capped at max HP"));
    assert_eq!(messages[0].roll.as_ref().map(|r| r.total), Some(15));
}

#[tokio::test]
async fn test_healing_floor_under_negative_modifier() {
    let harness = TestHarness::new(vec![-4]);
    let mut base = Character::new("Ezren");
    base.level = 3;
    base.class_name = "Wizard".to_string();
    base.con_modifier = Some(-3);
    base.hit_points.maximum = 30;
    base.hit_points.current = 10;
    let mut character = harness.add(base).await;

    let outcome = harness
        .healing()
        .roll_and_heal(&mut character, 2)
        .await
        .unwrap();
    assert_eq!(outcome.formula, "2d6-6");
    assert_eq!(outcome.healing, 2);
    assert_eq!(outcome.actual_healing, 2);
    assert_eq!(character.hit_points.current, 12);
}

#[tokio::test]
async fn test_insufficient_dice_changes_nothing() {
    let harness = TestHarness::new(vec![10]);
    let mut character = harness.add(cleric(5, 3)).await;
    let engine = harness.healing();
    engine
        .pool()
        .set_current(harness.store.as_ref(), &mut character, 1)
        .await
        .unwrap();
    let before = harness.stored(character.id).await;

    let err = engine.roll_and_heal(&mut character, 2).await.unwrap_err();
    assert_eq!(
        err.validation(),
        Some(&ValidationError::InsufficientDice {
            requested: 2,
            available: 1
        })
    );

    assert_eq!(harness.stored(character.id).await, before);
    assert_eq!(character, before);
    assert!(harness.roller.formulas().is_empty());
    assert_eq!(harness.notifier.warnings().len(), 1);
    assert!(harness.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_zero_dice_is_rejected() {
    let harness = TestHarness::new(vec![]);
    let mut character = harness.add(sample_fighter(2)).await;

    let err = harness
        .healing()
        .roll_and_heal(&mut character, 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RestError::Validation(ValidationError::BelowMinimumDiceCount { requested: 0 })
    ));
    assert_eq!(harness.healing().pool().current(&character), 3);
    assert_eq!(harness.notifier.warnings().len(), 1);
}

#[tokio::test]
async fn test_chat_disabled_falls_back_to_info() {
    let config = RestConfig::new().with_chat_announcements(false);
    let harness = TestHarness::with_config(vec![4], config);
    let mut base = sample_fighter(2);
    base.hit_points.current = 10;
    let mut character = harness.add(base).await;

    harness
        .healing()
        .roll_and_heal(&mut character, 1)
        .await
        .unwrap();

    assert!(harness.notifier.messages().is_empty());
    assert!(harness
        .notifier
        .all()
        .iter()
        .any(|n| matches!(n, Notification::Info(text) if text.contains("healed 4 HP"))));
}

#[tokio::test]
async fn test_pool_stays_within_bounds() {
    let harness = TestHarness::new(vec![5, 5, 5, 5]);
    let mut base = sample_fighter(3);
    base.hit_points.current = 1;
    let mut character = harness.add(base).await;
    let engine = harness.healing();
    let max = engine.pool().max(&character);

    for count in [1, 2, 3, 1, 1] {
        let _ = engine.roll_and_heal(&mut character, count).await;
        let current = engine.pool().current(&character);
        assert!(current <= max);
    }
    // 1 + 2 succeeded, then 3 was refused with one left, then 1 succeeded
    assert_eq!(engine.pool().current(&character), 0);
    assert!(engine.roll_and_heal(&mut character, 1).await.is_err());
}
