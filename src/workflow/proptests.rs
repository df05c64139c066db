//! Property-based tests for routing and the step guard

use super::testing::{awaiting_confirmation, MockAdapter, MockTools, TestEngineBuilder};
use super::*;
use crate::conversation::{ConversationState, Message, ToolCall};
use proptest::prelude::*;
use serde_json::json;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

fn arb_label() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("tools".to_string()),
        Just("draft_email".to_string()),
        Just("send_email".to_string()),
        Just("revise".to_string()),
        Just("end".to_string()),
        "[a-zA-Z_ \\-\\.\"]{0,20}",
    ]
}

fn arb_intent_set() -> impl Strategy<Value = Vec<Intent>> {
    prop_oneof![Just(AGENT_INTENTS.to_vec()), Just(CONFIRMATION_INTENTS.to_vec())]
}

proptest! {
    /// An agent message that requests tools always routes to the tool node,
    /// whatever its text and whatever the classifier would say.
    #[test]
    fn prop_tool_calls_always_route_to_tools(
        content in "[a-zA-Z ,\\.]{0,40}",
        names in proptest::collection::vec("[a-z_]{1,12}", 1..4),
        label in arb_label(),
    ) {
        let calls: Vec<ToolCall> = names
            .iter()
            .enumerate()
            .map(|(i, name)| ToolCall::new(format!("c{i}"), name.clone(), json!({})))
            .collect();
        let state = ConversationState::new(vec![
            Message::user("find someone"),
            Message::agent(content).with_tool_calls(calls),
        ]);

        let adapter = MockAdapter::new();
        adapter.queue_label(&label);
        let intent = block_on(route_after_agent(&state, &adapter, 3));

        prop_assert_eq!(intent, Intent::Tools);
        prop_assert!(adapter.recorded_classifications().is_empty());
    }

    /// Parsing never yields a label outside the allowed set.
    #[test]
    fn prop_parse_stays_in_allowed_set(raw in arb_label(), allowed in arb_intent_set()) {
        let intent = Intent::parse(&raw, &allowed);
        prop_assert!(allowed.contains(&intent));
    }

    /// A reply carrying any cancel word never dispatches.
    #[test]
    fn prop_cancel_word_never_dispatches(
        prefix in "[a-z ]{0,20}",
        word in prop_oneof![
            Just("cancel"),
            Just("no"),
            Just("stop"),
            Just("don{}t send"),
            Just("Don{}t send it"),
        ],
        apostrophe in prop_oneof![
            Just('\''),
            Just('\u{2018}'),
            Just('\u{2019}'),
            Just('\u{02BC}'),
            Just('`'),
        ],
        suffix in "[a-z ]{0,20}",
    ) {
        let word = word.replace("{}", &apostrophe.to_string());
        let reply = format!("{prefix} {word} {suffix}");
        prop_assert_ne!(classify_reply(&reply).intent(), Intent::SendEmail);
    }

    /// With an agent that requests tools forever, exactly `max_steps` nodes
    /// run before the guard fires on the agent.
    #[test]
    fn prop_step_guard_bounds_oscillation(max_steps in 1usize..9) {
        let adapter = MockAdapter::new();
        adapter.repeat(
            Message::agent("")
                .with_tool_calls(vec![ToolCall::new("t", "lookup", json!({}))]),
        );
        let test = TestEngineBuilder::new()
            .adapter(adapter)
            .tools(MockTools::new().with_tool("lookup", json!({})))
            .max_steps(max_steps)
            .build();

        let err = block_on(test.engine.run(ConversationState::from_user("loop")));
        let expected_node = if max_steps % 2 == 0 { NodeKind::Agent } else { NodeKind::Tools };
        let hit = matches!(
            err,
            Err(EngineError::StepLimitExceeded { max_steps: m, node }) if m == max_steps && node == expected_node
        );
        prop_assert!(hit);
        prop_assert_eq!(test.adapter.recorded_generations().len(), max_steps.div_ceil(2));
        prop_assert_eq!(test.tools.started().len(), max_steps / 2);
    }

    /// Resuming a pending confirmation dispatches only on an affirmative answer.
    #[test]
    fn prop_resume_dispatches_only_when_affirmative(answer in "[a-z ,']{0,30}") {
        let adapter = MockAdapter::new();
        adapter.queue_text("RECIPIENT_EMAIL: jdoe@example.com\nSUBJECT: Hi\nBODY: Hello");
        adapter.repeat(Message::agent("Okay."));
        adapter.queue_label("end");
        let test = TestEngineBuilder::new().adapter(adapter).build();

        let affirmative = classify_reply(&answer) == ConfirmationAnswer::Affirmative;
        let outcome = block_on(test.engine.run(awaiting_confirmation(&answer))).unwrap();

        prop_assert_eq!(test.dispatch.sent().len(), usize::from(affirmative));
        prop_assert_eq!(outcome.visited.last(), Some(&NodeKind::Output));
    }
}
