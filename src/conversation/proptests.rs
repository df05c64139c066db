//! Property-based tests for the append-only reducer

use super::*;
use proptest::prelude::*;
use serde_json::json;

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::User),
        Just(Role::Agent),
        Just(Role::System),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    (arb_role(), "[a-zA-Z ]{0,30}").prop_map(|(role, content)| Message::new(role, content))
}

proptest! {
    /// Applying a delta only ever extends the log; existing entries keep
    /// their position and content.
    #[test]
    fn prop_apply_preserves_prefix(
        initial in proptest::collection::vec(arb_message(), 0..6),
        delta in proptest::collection::vec(arb_message(), 0..6),
    ) {
        let mut state = ConversationState::new(initial.clone());
        let appended = state.apply(StateDelta::messages(delta.clone()));

        prop_assert_eq!(appended, delta.len());
        prop_assert_eq!(&state.messages[..initial.len()], &initial[..]);
        prop_assert_eq!(&state.messages[initial.len()..], &delta[..]);
    }

    /// Replaying the same delta twice appends nothing the second time.
    #[test]
    fn prop_apply_is_idempotent(delta in proptest::collection::vec(arb_message(), 0..6)) {
        let mut state = ConversationState::default();
        state.apply(StateDelta::messages(delta.clone()));
        let before = state.clone();
        prop_assert_eq!(state.apply(StateDelta::messages(delta)), 0);
        prop_assert_eq!(state, before);
    }

    /// A log built by answering every call in request order always validates.
    #[test]
    fn prop_ordered_results_validate(turns in proptest::collection::vec(0usize..4, 1..5)) {
        let mut messages = vec![Message::user("start")];
        for (turn, count) in turns.iter().enumerate() {
            let calls: Vec<ToolCall> = (0..*count)
                .map(|i| ToolCall::new(format!("call-{turn}-{i}"), "lookup", json!({})))
                .collect();
            messages.push(Message::agent("").with_tool_calls(calls.clone()));
            for c in calls {
                messages.push(Message::tool(ToolResult {
                    call_id: c.id,
                    payload: json!(null),
                    is_error: false,
                }));
            }
        }
        messages.push(Message::agent("done"));
        prop_assert_eq!(ConversationState::new(messages).validate(), Ok(()));
    }
}
