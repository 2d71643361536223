//! # Regeneration Loop Tests
//!
//! Drives the loop with scripted completion services to cover every exit:
//! acceptance, regeneration with hints, enhancement and failure.

use funny_recipes::db::UserProfile;
use funny_recipes::generation::{GenerationState, RegenerationLoop};
use funny_recipes::llm::{ChatMessage, ChatRole, ScriptedService};
use funny_recipes::prompts::{ENHANCEMENT_SYSTEM_PROMPT, SYSTEM_PROMPT};

const GOOD_RECIPE: &str = "\
# Candy Shrimp Disco (Harbor Fair)

**Ingredients:**
- candy floss
- shrimp
- chili sauce

**Steps:**
1. Dance.

**Result:** Glittering and confusing.

**Plot twist:** The shrimp demanded revenge because nobody laughed at its jokes. 🌊
";

const BLAND_RECIPE: &str = "\
# Meat Plate

**Ingredients:**
- chicken breast
- beef mince
- pork belly

**Steps:**
1. Grill.

**Result:** Dinner.
";

fn conversation() -> Vec<ChatMessage> {
    vec![ChatMessage::user("I have shrimp and candy floss")]
}

#[tokio::test]
async fn test_good_first_draft_is_accepted() {
    let service = ScriptedService::new().reply(GOOD_RECIPE);
    let outcome = RegenerationLoop::new(&service)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Accepted);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.text, GOOD_RECIPE);
    assert!(outcome.verification.is_some_and(|v| v.is_accepted()));

    let calls = service.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].system_prompt, SYSTEM_PROMPT);
    assert_eq!(calls[0].messages, conversation());
}

#[tokio::test]
async fn test_conversational_reply_skips_verification() {
    let service = ScriptedService::new().reply("Ooh, shrimp! Anything sweet in the pantry?");
    let outcome = RegenerationLoop::new(&service)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Accepted);
    assert!(outcome.verification.is_none());
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn test_bland_draft_is_regenerated_with_hints() {
    let service = ScriptedService::new().reply(BLAND_RECIPE).reply(GOOD_RECIPE);
    let outcome = RegenerationLoop::new(&service)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Accepted);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.text, GOOD_RECIPE);

    let calls = service.calls();
    assert_eq!(calls.len(), 2);
    let retry = &calls[1].messages;
    assert_eq!(retry.len(), conversation().len() + 1);
    assert_eq!(retry[0], conversation()[0]);

    let note = retry.last().expect("retry carries a hint note");
    assert_eq!(note.role, ChatRole::System);
    assert!(note.content.contains("unexpected"));
}

#[tokio::test]
async fn test_hints_do_not_accumulate_across_attempts() {
    let service = ScriptedService::new()
        .reply(BLAND_RECIPE)
        .reply(BLAND_RECIPE)
        .reply(GOOD_RECIPE);
    let outcome = RegenerationLoop::new(&service)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Accepted);
    assert_eq!(outcome.attempts, 3);

    let calls = service.calls();
    assert_eq!(calls[2].messages.len(), conversation().len() + 1);
    // Third attempt carries the escalated hints of attempt two
    assert!(calls[2].messages[1].content.len() > calls[1].messages[1].content.len());
}

#[tokio::test]
async fn test_exhausted_attempts_fall_back_to_enhancer() {
    let service = ScriptedService::new()
        .reply(BLAND_RECIPE)
        .reply(BLAND_RECIPE)
        .reply(BLAND_RECIPE)
        .reply("An enhanced, much funnier recipe");
    let outcome = RegenerationLoop::new(&service)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Enhanced);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.text, "An enhanced, much funnier recipe");
    assert!(outcome.verification.is_some_and(|v| !v.is_accepted()));

    let calls = service.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[3].system_prompt, ENHANCEMENT_SYSTEM_PROMPT);
    assert!(calls[3].messages[0].content.contains(BLAND_RECIPE));
}

#[tokio::test]
async fn test_failed_enhancement_keeps_last_draft() {
    let service = ScriptedService::new()
        .reply(BLAND_RECIPE)
        .reply(BLAND_RECIPE)
        .reply(BLAND_RECIPE)
        .fail("upstream down");
    let outcome = RegenerationLoop::new(&service)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Enhanced);
    assert_eq!(outcome.text, BLAND_RECIPE);
}

#[tokio::test]
async fn test_failed_first_call_is_failure() {
    let service = ScriptedService::new().fail("connection refused");
    let outcome = RegenerationLoop::new(&service)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Failed);
    assert!(outcome.is_failed());
    assert!(outcome.text.is_empty());
    assert_eq!(outcome.attempts, 0);
}

#[tokio::test]
async fn test_failed_regeneration_enhances_previous_draft() {
    let service = ScriptedService::new()
        .reply(BLAND_RECIPE)
        .fail("timeout")
        .reply("Rescued recipe");
    let outcome = RegenerationLoop::new(&service)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Enhanced);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.text, "Rescued recipe");
}

#[tokio::test]
async fn test_blank_first_draft_is_failure() {
    let service = ScriptedService::new().reply("  \n ");
    let outcome = RegenerationLoop::new(&service)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Failed);
    assert!(outcome.text.is_empty());
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn test_blank_regeneration_enhances_previous_draft() {
    let service = ScriptedService::new()
        .reply(BLAND_RECIPE)
        .reply("")
        .reply("Rescued recipe");
    let outcome = RegenerationLoop::new(&service)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Enhanced);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.text, "Rescued recipe");
    assert_eq!(service.calls()[2].system_prompt, ENHANCEMENT_SYSTEM_PROMPT);
}

#[tokio::test]
async fn test_single_attempt_budget() {
    let service = ScriptedService::new().reply(BLAND_RECIPE).reply("Enhanced once");
    let outcome = RegenerationLoop::new(&service)
        .with_max_attempts(1)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Enhanced);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(service.call_count(), 2);
}

#[tokio::test]
async fn test_zero_attempt_budget_is_raised_to_one() {
    let service = ScriptedService::new().reply(BLAND_RECIPE).reply("Enhanced once");
    let outcome = RegenerationLoop::new(&service)
        .with_max_attempts(0)
        .run(&conversation(), &UserProfile::new(1))
        .await;

    assert_eq!(outcome.state, GenerationState::Enhanced);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.text, "Enhanced once");
    assert_eq!(service.call_count(), 2);
}
