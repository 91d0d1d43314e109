//! Integration tests for the command dispatcher
//!
//! Drives the clarification state machine against a scripted service:
//! 1. Terminal results, clarification round-trips, loop guard
//! 2. Transport failures and fresh resubmission
//! 3. Single-flight and stale-response handling
//! 4. Completion events

use std::sync::Arc;

use ops_desk::types::{
    ClarificationOption, ClarificationRequest, CommandResult, InterpretResponse, Metric, RecordId,
    ResultData,
};
use ops_desk::{
    render, CommandDispatcher, CommandError, CommandEvent, CommandStatus, Completion,
    DispatchError, DispatchState, ScriptedCommandService,
};
use proptest::prelude::*;
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn setup() -> (Arc<ScriptedCommandService>, CommandDispatcher) {
    let service = Arc::new(ScriptedCommandService::new());
    let dispatcher = CommandDispatcher::new(service.clone());
    (service, dispatcher)
}

fn success(message: &str) -> Result<InterpretResponse, CommandError> {
    Ok(InterpretResponse::Result(CommandResult::ok(message)))
}

fn which_teacher() -> Result<InterpretResponse, CommandError> {
    Ok(InterpretResponse::Clarification(ClarificationRequest {
        field: "staff".into(),
        message: "Which teacher?".into(),
        options: vec![
            ClarificationOption::new(1_i64, "Alice"),
            ClarificationOption::new(2_i64, "Bob"),
        ],
    }))
}

fn which_school() -> Result<InterpretResponse, CommandError> {
    Ok(InterpretResponse::Clarification(ClarificationRequest {
        field: "school".into(),
        message: "Which school?".into(),
        options: vec![
            ClarificationOption::new("north", "North Campus").with_attribute("code", json!("NC")),
            ClarificationOption::new("south", "South Campus").with_attribute("code", json!("SC")),
        ],
    }))
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[tokio::test]
async fn scenario_a_inventory_summary_succeeds() {
    let (service, dispatcher) = setup();
    service.push_interpret(Ok(InterpretResponse::Result(
        CommandResult::ok("Found 42 items").with_data(ResultData {
            count: Some(Metric::from(42_i64)),
            ..ResultData::default()
        }),
    )));

    let state = dispatcher.submit("show inventory summary").await.unwrap();

    let DispatchState::Succeeded { command, result } = &state else {
        panic!("expected success, got {}", state.name());
    };
    assert_eq!(command.status(), CommandStatus::Succeeded);
    assert!(command.resolved_fields().is_empty());

    let model = render(result);
    assert_eq!(model.tiles.len(), 1);
    assert_eq!(model.tiles[0].label, "Total Items");
    assert_eq!(model.tiles[0].value, Metric::from(42_i64));

    let calls = service.interpret_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, command.id());
    assert_eq!(calls[0].1.text, "show inventory summary");
    assert!(calls[0].1.context.is_empty());
}

#[tokio::test]
async fn scenario_b_clarification_round_trip() {
    let (service, dispatcher) = setup();
    service
        .push_interpret(which_teacher())
        .push_interpret(success("Laptop assigned to Alice"));

    let state = dispatcher
        .submit("assign laptop to new teacher")
        .await
        .unwrap();
    let clarification = state.clarification().expect("awaiting clarification").clone();
    assert_eq!(clarification.field, "staff");
    assert_eq!(
        state.command().map(|c| c.status()),
        Some(CommandStatus::AwaitingClarification)
    );

    let alice = ClarificationOption::new(1_i64, "Alice");
    let state = dispatcher.select(&alice).await.unwrap();
    assert!(matches!(state, DispatchState::Succeeded { .. }));

    let calls = service.interpret_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, calls[1].0, "rounds share the correlation id");
    assert_eq!(calls[1].1.text, "assign laptop to new teacher");
    assert_eq!(
        serde_json::to_value(&calls[1].1.context).unwrap(),
        json!({"staff": {"id": 1, "label": "Alice"}})
    );
}

#[tokio::test]
async fn scenario_c_reasked_field_is_a_resolution_loop() {
    let (service, dispatcher) = setup();
    service
        .push_interpret(which_teacher())
        .push_interpret(which_teacher());

    dispatcher
        .submit("assign laptop to new teacher")
        .await
        .unwrap();
    let state = dispatcher
        .select(&ClarificationOption::new(1_i64, "Alice"))
        .await
        .unwrap();

    assert_eq!(
        state.error(),
        Some(&CommandError::ResolutionLoop {
            field: "staff".into()
        })
    );
    assert!(state.clarification().is_none());
}

#[tokio::test]
async fn scenario_d_network_timeout_then_fresh_command() {
    let (service, dispatcher) = setup();
    service
        .push_interpret(which_school())
        .push_interpret(Err(CommandError::timeout("operation timed out")))
        .push_interpret(success("Fee report ready"));

    dispatcher.submit("fee report for it").await.unwrap();
    let state = dispatcher
        .select(&ClarificationOption::new("north", "North Campus"))
        .await
        .unwrap();

    let failed_id = match &state {
        DispatchState::Failed { command, error } => {
            assert!(matches!(error, CommandError::Network { timed_out: true, .. }));
            assert!(error.is_retryable());
            command.id()
        }
        other => panic!("expected failure, got {}", other.name()),
    };

    // No resume: a new submit is refused until reset, then starts from scratch.
    assert_eq!(
        dispatcher.submit("fee report for it").await.unwrap_err(),
        DispatchError::Busy
    );
    dispatcher.reset().await.unwrap();
    let state = dispatcher.submit("fee report for it").await.unwrap();

    let command = state.command().unwrap();
    assert_ne!(command.id(), failed_id);
    assert!(command.resolved_fields().is_empty());
    let calls = service.interpret_calls();
    assert!(calls[2].1.context.is_empty());
}

// ===========================================================================
// Clarification details
// ===========================================================================

#[tokio::test]
async fn selected_option_attributes_reach_the_context() {
    let (service, dispatcher) = setup();
    service
        .push_interpret(which_school())
        .push_interpret(which_teacher())
        .push_interpret(success("done"));

    dispatcher.submit("move teacher to it").await.unwrap();
    dispatcher
        .select(&ClarificationOption::new("south", "ignored label"))
        .await
        .unwrap();
    dispatcher.select_reply("b").await.unwrap();

    let calls = service.interpret_calls();
    assert_eq!(
        serde_json::to_value(&calls[2].1.context).unwrap(),
        json!({
            "school": {"id": "south", "label": "South Campus", "code": "SC"},
            "staff": {"id": 2, "label": "Bob"}
        })
    );
}

#[tokio::test]
async fn unknown_option_is_refused_without_state_change() {
    let (service, dispatcher) = setup();
    service.push_interpret(which_teacher());
    dispatcher.submit("assign laptop").await.unwrap();

    let err = dispatcher
        .select(&ClarificationOption::new(99_i64, "Mallory"))
        .await
        .unwrap_err();
    assert_eq!(err, DispatchError::UnknownOption("99".into()));
    assert!(dispatcher.state().await.clarification().is_some());

    let err = dispatcher.select_reply("Zed").await.unwrap_err();
    assert_eq!(err, DispatchError::UnknownOption("Zed".into()));
}

#[tokio::test]
async fn empty_options_fail_the_command() {
    let (service, dispatcher) = setup();
    service.push_interpret(Ok(InterpretResponse::Clarification(ClarificationRequest {
        field: "class".into(),
        message: "Which class?".into(),
        options: vec![],
    })));

    let state = dispatcher.submit("mark attendance").await.unwrap();
    assert_eq!(
        state.error(),
        Some(&CommandError::EmptyOptions {
            field: "class".into()
        })
    );
}

#[tokio::test]
async fn agent_failure_is_rejected() {
    let (service, dispatcher) = setup();
    service.push_interpret(Ok(InterpretResponse::Result(CommandResult::failed(
        "No item named projector",
    ))));

    let state = dispatcher.submit("remove projector").await.unwrap();
    let Some(CommandError::Rejected(result)) = state.error() else {
        panic!("expected rejection");
    };
    assert_eq!(result.message, "No item named projector");
}

#[tokio::test]
async fn malformed_and_server_errors_fail() {
    let (service, dispatcher) = setup();
    service
        .push_interpret(Err(CommandError::MalformedResponse("bad".into())))
        .push_interpret(Err(CommandError::Server {
            status: 500,
            body: String::new(),
        }));

    let state = dispatcher.submit("x").await.unwrap();
    assert_eq!(state.error().map(|e| e.kind()), Some("malformed_response"));

    dispatcher.reset().await.unwrap();
    let state = dispatcher.submit("x").await.unwrap();
    assert_eq!(state.error().map(|e| e.kind()), Some("server_error"));
}

// ===========================================================================
// Single flight, cancellation, reset
// ===========================================================================

#[tokio::test]
async fn submit_is_refused_while_active() {
    let (service, dispatcher) = setup();
    service.push_interpret(which_teacher());
    dispatcher.submit("assign laptop").await.unwrap();

    assert_eq!(
        dispatcher.submit("another").await.unwrap_err(),
        DispatchError::Busy
    );
    assert_eq!(dispatcher.reset().await.unwrap_err(), DispatchError::NotTerminal);
    assert_eq!(service.interpret_calls().len(), 1);
}

#[tokio::test]
async fn blank_input_is_refused() {
    let (_, dispatcher) = setup();
    assert_eq!(
        dispatcher.submit("   ").await.unwrap_err(),
        DispatchError::EmptyCommand
    );
    assert!(dispatcher.state().await.is_idle());
}

#[tokio::test]
async fn cancel_during_clarification() {
    let (service, dispatcher) = setup();
    service.push_interpret(which_teacher());
    dispatcher.submit("assign laptop").await.unwrap();

    let state = dispatcher.cancel().await.unwrap();
    assert!(matches!(state, DispatchState::Cancelled { .. }));
    assert_eq!(
        state.command().map(|c| c.status()),
        Some(CommandStatus::Cancelled)
    );

    assert_eq!(
        dispatcher
            .select(&ClarificationOption::new(1_i64, "Alice"))
            .await
            .unwrap_err(),
        DispatchError::NotAwaitingClarification
    );
    assert_eq!(dispatcher.cancel().await.unwrap_err(), DispatchError::NoActiveCommand);

    dispatcher.reset().await.unwrap();
    assert!(dispatcher.state().await.is_idle());
}

#[tokio::test]
async fn cancel_word_in_reply_cancels() {
    let (service, dispatcher) = setup();
    let mut events = dispatcher.subscribe();
    service.push_interpret(which_teacher());
    dispatcher.submit("assign laptop").await.unwrap();

    let state = dispatcher.select_reply("CANCEL").await.unwrap();
    assert!(matches!(state, DispatchState::Cancelled { .. }));
    assert!(matches!(
        events.recv().await.unwrap(),
        CommandEvent::Cancelled { .. }
    ));
    assert_eq!(service.interpret_calls().len(), 1);
}

#[tokio::test]
async fn reset_when_idle_is_a_no_op() {
    let (_, dispatcher) = setup();
    dispatcher.reset().await.unwrap();
    assert!(dispatcher.state().await.is_idle());
}

#[tokio::test]
async fn stale_response_after_cancel_is_discarded() {
    let (_, dispatcher) = setup();

    let first = dispatcher.begin_submit("show fees").await.unwrap();
    dispatcher.cancel().await.unwrap();
    dispatcher.reset().await.unwrap();
    let second = dispatcher.begin_submit("show inventory").await.unwrap();
    assert_ne!(first.command_id, second.command_id);

    let late = dispatcher
        .complete(&first, success("fees for the wrong command"))
        .await;
    assert_eq!(late, Completion::Discarded);

    let state = dispatcher.state().await;
    assert!(matches!(state, DispatchState::Submitting { .. }));
    assert_eq!(state.command().unwrap().id(), second.command_id);

    let applied = dispatcher.complete(&second, success("inventory")).await;
    let Completion::Applied(DispatchState::Succeeded { result, .. }) = applied else {
        panic!("expected applied success");
    };
    assert_eq!(result.message, "inventory");
}

#[tokio::test]
async fn response_for_an_earlier_round_is_discarded() {
    let (_, dispatcher) = setup();

    let round_one = dispatcher.begin_submit("assign laptop").await.unwrap();
    dispatcher.complete(&round_one, which_teacher()).await;
    let round_two = dispatcher
        .begin_select(&ClarificationOption::new(2_i64, "Bob"))
        .await
        .unwrap();
    assert_eq!(round_two.command_id, round_one.command_id);
    assert_eq!(round_two.round, round_one.round + 1);

    // A duplicate delivery of round one must not touch round two.
    assert_eq!(
        dispatcher.complete(&round_one, which_teacher()).await,
        Completion::Discarded
    );
    // Nor may a reply be applied twice.
    dispatcher.complete(&round_two, success("ok")).await;
    assert_eq!(
        dispatcher.complete(&round_two, success("again")).await,
        Completion::Discarded
    );
    assert_eq!(
        dispatcher.state().await.result().map(|r| r.message.as_str()),
        Some("ok")
    );
}

// ===========================================================================
// Events
// ===========================================================================

#[tokio::test]
async fn completion_events_are_broadcast() {
    let (service, dispatcher) = setup();
    let mut events = dispatcher.subscribe();
    service
        .push_interpret(success("done"))
        .push_interpret(Err(CommandError::network("offline")))
        .push_interpret(which_teacher());

    let ok = dispatcher.submit("a").await.unwrap();
    dispatcher.reset().await.unwrap();
    let failed = dispatcher.submit("b").await.unwrap();
    dispatcher.reset().await.unwrap();
    dispatcher.submit("c").await.unwrap();
    let cancelled = dispatcher.cancel().await.unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        CommandEvent::Succeeded {
            command_id: ok.command().unwrap().id()
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CommandEvent::Failed {
            command_id: failed.command().unwrap().id(),
            error_kind: "network_error"
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CommandEvent::Cancelled {
            command_id: cancelled.command().unwrap().id()
        }
    );
    assert!(events.try_recv().is_err());
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every round's context contains the previous round's context.
    #[test]
    fn resolved_fields_only_grow(
        fields in proptest::collection::btree_set("[a-z]{3,8}", 1..6),
        picks in proptest::collection::vec(0usize..3, 6),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let (service, dispatcher) = setup();
            let fields: Vec<String> = fields.into_iter().collect();
            for field in &fields {
                service.push_interpret(Ok(InterpretResponse::Clarification(ClarificationRequest {
                    field: field.clone(),
                    message: format!("Which {}?", field),
                    options: (0..3)
                        .map(|i| ClarificationOption::new(i as i64, format!("{} {}", field, i)))
                        .collect(),
                })));
            }
            service.push_interpret(success("done"));

            let mut state = dispatcher.submit("do the thing").await.unwrap();
            let mut previous = state.command().unwrap().resolved_fields().clone();

            for pick in picks.iter().take(fields.len()) {
                let option = state.clarification().unwrap().options[*pick].clone();
                state = dispatcher.select(&option).await.unwrap();
                let current = state.command().unwrap().resolved_fields().clone();
                for (key, value) in &previous {
                    prop_assert_eq!(current.get(key), Some(value));
                }
                prop_assert_eq!(current.len(), previous.len() + 1);
                previous = current;
            }

            prop_assert!(
                matches!(state, DispatchState::Succeeded { .. }),
                "expected Succeeded state"
            );
            prop_assert_eq!(previous.len(), fields.len());
            prop_assert_eq!(
                previous.get(&fields[0]).and_then(|v| v.get("id")).cloned(),
                Some(json!(picks[0] as i64))
            );
            Ok(())
        })?;
    }

    /// A clarification for an already-resolved field never waits for input.
    #[test]
    fn reasked_field_never_awaits(field in "[a-z]{3,8}") {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let (service, dispatcher) = setup();
            let ask = || -> Result<InterpretResponse, CommandError> {
                Ok(InterpretResponse::Clarification(ClarificationRequest {
                    field: field.clone(),
                    message: String::new(),
                    options: vec![ClarificationOption::new(RecordId::Int(1), "one")],
                }))
            };
            service.push_interpret(ask()).push_interpret(ask());

            dispatcher.submit("x").await.unwrap();
            let state = dispatcher.select_reply("A").await.unwrap();
            prop_assert!(state.clarification().is_none());
            prop_assert_eq!(
                state.error(),
                Some(&CommandError::ResolutionLoop { field: field.clone() })
            );
            Ok(())
        })?;
    }
}
