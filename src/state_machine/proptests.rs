//! Property-based tests for the state machine
//!
//! These tests drive the machine with arbitrary respondent text and verify
//! the session invariants hold after every step.

use super::state::*;
use super::transition::*;
use super::*;
use crate::assessment::AnswerOption;
use crate::catalog::{Catalog, Category};
use crate::state_machine::input::{CANCEL_COMMAND, EXIT_LABEL, RESTART_LABEL, START_COMMAND};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_catalog() -> Catalog {
    Catalog::new(vec![
        Category::new("Respiratory", "Pulmonologist", ["R1", "R2", "R3"]),
        Category::new("Cardiovascular", "Cardiologist", ["C1", "C2"]),
        Category::new("Single", "", ["S1"]),
    ])
    .unwrap()
}

fn test_context() -> SurveyContext {
    SurveyContext::new("respondent-1", Arc::new(test_catalog()))
}

fn step(state: &SurveyState, ctx: &SurveyContext, text: &str) -> TransitionResult {
    let input = Input::resolve(text, state, &ctx.catalog);
    transition(state, ctx, input).expect("reachable states never violate invariants")
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => Just("Yes".to_string()),
        3 => Just("No".to_string()),
        2 => Just("Often".to_string()),
        2 => Just("Sometimes".to_string()),
        2 => Just("Respiratory".to_string()),
        2 => Just("Cardiovascular".to_string()),
        1 => Just("Single".to_string()),
        1 => Just(RESTART_LABEL.to_string()),
        1 => Just(EXIT_LABEL.to_string()),
        1 => Just(START_COMMAND.to_string()),
        1 => Just(CANCEL_COMMAND.to_string()),
        1 => Just(String::new()),
        1 => Just("   ".to_string()),
        3 => "[a-zA-Z ]{1,20}",
    ]
}

fn arb_answer() -> impl Strategy<Value = AnswerOption> {
    prop_oneof![
        Just(AnswerOption::No),
        Just(AnswerOption::Sometimes),
        Just(AnswerOption::Yes),
        Just(AnswerOption::Often),
    ]
}

fn arb_answering_state() -> impl Strategy<Value = SurveyState> {
    (prop_oneof![Just("Respiratory"), Just("Cardiovascular")], 0usize..3).prop_map(
        |(category, index)| {
            let catalog = test_catalog();
            let questions = &catalog.get_category(category).unwrap().questions;
            let index = index.min(questions.len() - 1);
            SurveyState::AnsweringQuestion {
                full_name: "Jane Roe".to_string(),
                category: category.to_string(),
                answers: questions[..index]
                    .iter()
                    .map(|q| (q.clone(), AnswerOption::Sometimes))
                    .collect(),
                index,
            }
        },
    )
}

fn arb_live_state() -> impl Strategy<Value = SurveyState> {
    prop_oneof![
        Just(SurveyState::AwaitingName),
        Just(SurveyState::SelectingCategory {
            full_name: "Jane Roe".to_string()
        }),
        arb_answering_state(),
    ]
}

// ============================================================================
// State Validity Checkers
// ============================================================================

fn is_valid_state(state: &SurveyState, catalog: &Catalog) -> bool {
    match state {
        SurveyState::SelectingCategory { full_name } => !full_name.trim().is_empty(),
        SurveyState::AnsweringQuestion {
            full_name,
            category,
            answers,
            index,
        } => {
            let Ok(category) = catalog.get_category(category) else {
                return false;
            };
            !full_name.trim().is_empty()
                && answers.len() == *index
                && *index < category.question_count()
                && answers
                    .iter()
                    .zip(&category.questions)
                    .all(|((asked, _), expected)| asked == expected)
        }
        SurveyState::AwaitingName | SurveyState::Terminated => true,
    }
}

fn effects_are_valid(old: &SurveyState, effects: &[Effect], new: &SurveyState) -> bool {
    let completes = effects
        .iter()
        .filter(|e| matches!(e, Effect::CompleteRound(_)))
        .count();
    let ends = effects.iter().any(|e| matches!(e, Effect::EndConversation));

    // A round completes only on the answering -> selecting edge, exactly once
    if completes > 1 {
        return false;
    }
    if completes == 1
        && !(matches!(old, SurveyState::AnsweringQuestion { .. })
            && matches!(new, SurveyState::SelectingCategory { .. }))
    {
        return false;
    }

    // EndConversation exactly when terminating
    ends == (matches!(new, SurveyState::Terminated) && !old.is_terminal())
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: valid state after any sequence of respondent text
    #[test]
    fn prop_transitions_preserve_validity(texts in proptest::collection::vec(arb_text(), 0..40)) {
        let ctx = test_context();
        let mut state = SurveyState::AwaitingName;

        for text in texts {
            let input = Input::resolve(&text, &state, &ctx.catalog);
            let result = transition(&state, &ctx, input);
            prop_assert!(result.is_ok(), "Reachable state rejected input {:?}: {:?}", text, result);
            let result = result.unwrap();
            prop_assert!(
                effects_are_valid(&state, &result.effects, &result.new_state),
                "Invalid effects {:?} for {:?} -> {:?}",
                result.effects,
                state,
                result.new_state
            );
            state = result.new_state;
            prop_assert!(is_valid_state(&state, &ctx.catalog), "Invalid state: {:?}", state);
        }
    }

    // Invariant 2: every live state answers every input with exactly one outcome
    #[test]
    fn prop_live_states_are_total(state in arb_live_state(), text in arb_text()) {
        let ctx = test_context();
        let input = Input::resolve(&text, &state, &ctx.catalog);
        let result = transition(&state, &ctx, input);
        prop_assert!(result.is_ok(), "No transition for {:?} from {:?}", text, state);
        prop_assert!(!result.unwrap().effects.is_empty(), "Live state produced no effects");
    }

    // Invariant 3: restart from the menu always yields a clean menu
    #[test]
    fn prop_restart_is_idempotent(prefix in proptest::collection::vec(arb_text(), 0..20)) {
        let ctx = test_context();
        let mut state = step(&SurveyState::AwaitingName, &ctx, "Jane Roe").new_state;
        for text in prefix {
            if text == START_COMMAND || text == CANCEL_COMMAND || text == EXIT_LABEL {
                continue;
            }
            state = step(&state, &ctx, &text).new_state;
        }

        if let SurveyState::SelectingCategory { .. } = state {
            let once = step(&state, &ctx, RESTART_LABEL).new_state;
            let twice = step(&once, &ctx, RESTART_LABEL).new_state;
            let session = Session { respondent_id: "respondent-1".to_string(), state: twice.clone() };
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(session.category(), None);
            prop_assert!(session.answers().is_empty());
            prop_assert_eq!(session.current_index(), 0);
        }
    }

    // Invariant 4: invalid text never mutates the state
    #[test]
    fn prop_unrecognized_text_is_a_reprompt(state in arb_live_state(), text in "[a-z]{3,12}") {
        let ctx = test_context();
        prop_assume!(!matches!(state, SurveyState::AwaitingName));
        let input = Input::resolve(&text, &state, &ctx.catalog);
        prop_assume!(matches!(input, Input::Unrecognized(_)));

        let result = transition(&state, &ctx, input).unwrap();
        prop_assert_eq!(&result.new_state, &state);
        prop_assert!(result.effects.iter().all(|e| matches!(e, Effect::Reply(_))));
    }

    // Invariant 5: answering every question yields exactly one completed round
    #[test]
    fn prop_full_round_completes_once(answers in proptest::collection::vec(arb_answer(), 3)) {
        let ctx = test_context();
        let mut state = step(&SurveyState::AwaitingName, &ctx, "Jane Roe").new_state;
        state = step(&state, &ctx, "Respiratory").new_state;

        let mut rounds = Vec::new();
        for answer in &answers {
            let result = step(&state, &ctx, answer.label());
            rounds.extend(result.effects.into_iter().filter_map(|e| match e {
                Effect::CompleteRound(round) => Some(round),
                _ => None,
            }));
            state = result.new_state;
        }

        prop_assert_eq!(rounds.len(), 1);
        let round = &rounds[0];
        prop_assert_eq!(&round.category, "Respiratory");
        prop_assert_eq!(round.answers.len(), 3);
        let recorded: Vec<AnswerOption> = round.answers.iter().map(|(_, a)| *a).collect();
        prop_assert_eq!(recorded, answers);
        prop_assert_eq!(state, SurveyState::SelectingCategory { full_name: "Jane Roe".to_string() });
    }

    // Invariant 6: the name survives any number of rounds
    #[test]
    fn prop_name_is_stable_across_rounds(rounds in 1usize..4) {
        let ctx = test_context();
        let mut state = step(&SurveyState::AwaitingName, &ctx, "Jane Roe").new_state;
        for _ in 0..rounds {
            state = step(&state, &ctx, "Single").new_state;
            state = step(&state, &ctx, "Often").new_state;
            state = step(&state, &ctx, RESTART_LABEL).new_state;
        }
        prop_assert_eq!(state, SurveyState::SelectingCategory { full_name: "Jane Roe".to_string() });
    }
}

#[test]
fn test_blank_name_leaves_state_untouched() {
    let ctx = test_context();
    for text in ["", "   "] {
        let result = step(&SurveyState::AwaitingName, &ctx, text);
        assert_eq!(result.new_state, SurveyState::AwaitingName);
    }
}
