//! Dispatcher: local-then-global routing, ordering and eligibility lists.

use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use yak_core::{InboundMessage, OutboundMessage, SerializableFrame, SerializableStack, TopicError};
use yak_engine::{Condition, Engine, Reply, Topic, TopicState};

// ━━━ Fixtures ━━━

/// Matches when the text equals `text`, replying with `reply`.
fn exact(name: &str, text: &'static str, reply: &'static str) -> Condition {
    Condition::new(
        name,
        move |_state, input: InboundMessage| async move { Ok((input.as_text() == Some(text)).then_some(())) },
        move |_state, _: ()| async move { Ok(Reply::from(reply)) },
    )
}

/// Matches every text message, replying with `reply`.
fn any(name: &str, reply: &'static str) -> Condition {
    Condition::new(
        name,
        |_state, input: InboundMessage| async move { Ok(input.as_text().map(str::to_owned)) },
        move |_state, _text: String| async move { Ok(Reply::from(reply)) },
    )
}

fn stack(frames: Vec<SerializableFrame>) -> Option<SerializableStack> {
    Some(SerializableStack {
        items: frames,
        virgin: false,
    })
}

fn frame(topic: &str) -> SerializableFrame {
    SerializableFrame::new(topic)
}

fn texts(output: &[OutboundMessage]) -> Vec<&str> {
    output.iter().filter_map(OutboundMessage::as_text).collect()
}

async fn say(engine: &Engine, text: &str, state: Option<SerializableStack>) -> Vec<String> {
    let response = engine
        .handle(InboundMessage::text(text), state, None)
        .await
        .unwrap();
    texts(&response.output).into_iter().map(str::to_owned).collect()
}

// ━━━ Phase order ━━━

#[tokio::test]
async fn local_condition_shadows_global() {
    let engine = Engine::new([
        Topic::builder("global").condition(exact("g", "hi", "from global")).build(),
        Topic::builder("chat").condition(exact("l", "hi", "from local")).build(),
    ])
    .unwrap();

    assert_eq!(say(&engine, "hi", stack(vec![frame("chat")])).await, ["from local"]);
}

#[tokio::test]
async fn global_runs_when_local_declines() {
    let engine = Engine::new([
        Topic::builder("global").condition(exact("help", "help", "global help")).build(),
        Topic::builder("chat").condition(exact("l", "hi", "from local")).build(),
    ])
    .unwrap();

    assert_eq!(say(&engine, "help", stack(vec![frame("chat")])).await, ["global help"]);
}

#[tokio::test]
async fn only_the_top_frame_is_consulted_locally() {
    let engine = Engine::new([
        Topic::builder("global").build(),
        Topic::builder("bottom").condition(any("b", "bottom")).build(),
        Topic::builder("top").build(),
    ])
    .unwrap();

    let output = say(&engine, "hi", stack(vec![frame("bottom"), frame("top")])).await;
    assert!(output.is_empty());
}

#[tokio::test]
async fn first_declared_match_wins_in_both_phases() {
    let engine = Engine::new([
        Topic::builder("global")
            .condition(any("first", "global first"))
            .condition(any("second", "global second"))
            .build(),
        Topic::builder("chat")
            .condition(exact("one", "x", "local first"))
            .condition(exact("two", "x", "local second"))
            .build(),
    ])
    .unwrap();

    assert_eq!(say(&engine, "x", stack(vec![frame("chat")])).await, ["local first"]);
    assert_eq!(say(&engine, "y", stack(vec![frame("chat")])).await, ["global first"]);
}

#[tokio::test]
async fn exactly_one_handler_runs() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counting = |name: &str, runs: &Arc<AtomicUsize>| {
        let runs = Arc::clone(runs);
        Condition::new(
            name,
            |_state, _input: InboundMessage| async { Ok(Some(())) },
            move |_state, _: ()| {
                runs.fetch_add(1, Ordering::SeqCst);
                async { Ok(Reply::Nothing) }
            },
        )
    };
    let engine = Engine::new([
        Topic::builder("global").condition(counting("g", &runs)).build(),
        Topic::builder("chat")
            .condition(counting("a", &runs))
            .condition(counting("b", &runs))
            .build(),
    ])
    .unwrap();

    say(&engine, "hi", stack(vec![frame("chat")])).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn no_match_is_empty_output_not_an_error() {
    let engine = Engine::new([Topic::builder("global").condition(exact("g", "hi", "hey")).build()]).unwrap();
    let response = engine
        .handle(InboundMessage::text("something else"), None, None)
        .await
        .unwrap();
    assert!(response.output.is_empty());
}

#[tokio::test]
async fn multi_message_reply_passes_through() {
    let engine = Engine::new([Topic::builder("global")
        .condition(Condition::new(
            "menu",
            |_state, _input: InboundMessage| async { Ok(Some(())) },
            |_state, _: ()| async {
                Ok(Reply::from(vec![
                    OutboundMessage::text("pick one"),
                    OutboundMessage::choice(["tea", "coffee"]),
                ]))
            },
        ))
        .build()])
    .unwrap();

    let response = engine.handle(InboundMessage::text("menu"), None, None).await.unwrap();
    assert_eq!(response.output.len(), 2);
    assert_eq!(response.output[1], OutboundMessage::choice(["tea", "coffee"]));
}

// ━━━ Eligibility ━━━

fn filtered_engine() -> Engine {
    Engine::new([
        Topic::builder("global")
            .condition(exact("x", "x", "did x"))
            .condition(exact("y", "y", "did y"))
            .build(),
        Topic::builder("chat").build(),
    ])
    .unwrap()
}

#[tokio::test]
async fn allow_list_blocks_everything_else() {
    let engine = filtered_engine();
    let only_x = || {
        stack(vec![SerializableFrame {
            active_condition_names: vec!["x".into()],
            ..frame("chat")
        }])
    };

    assert!(say(&engine, "y", only_x()).await.is_empty());
    assert_eq!(say(&engine, "x", only_x()).await, ["did x"]);
}

#[tokio::test]
async fn allow_list_overrides_deny_list() {
    let engine = filtered_engine();
    let both = stack(vec![SerializableFrame {
        active_condition_names: vec!["x".into()],
        disabled_condition_names: vec!["x".into()],
        ..frame("chat")
    }]);
    assert_eq!(say(&engine, "x", both).await, ["did x"]);
}

#[tokio::test]
async fn deny_list_blocks_named_conditions() {
    let engine = filtered_engine();
    let no_y = || {
        stack(vec![SerializableFrame {
            disabled_condition_names: vec!["y".into()],
            ..frame("chat")
        }])
    };

    assert!(say(&engine, "y", no_y()).await.is_empty());
    assert_eq!(say(&engine, "x", no_y()).await, ["did x"]);
}

#[tokio::test]
async fn lists_on_lower_frames_are_ignored() {
    let engine = filtered_engine();
    let state = stack(vec![
        SerializableFrame {
            disabled_condition_names: vec!["y".into()],
            ..frame("chat")
        },
        frame("chat"),
    ]);
    assert_eq!(say(&engine, "y", state).await, ["did y"]);
}

#[tokio::test]
async fn disable_except_from_a_handler_filters_the_next_turn() {
    let engine = Engine::new([
        Topic::builder("global")
            .condition(exact("x", "x", "did x"))
            .condition(exact("y", "y", "did y"))
            .build(),
        Topic::builder("main")
            .root()
            .condition(Condition::new(
                "lock",
                |_state, input: InboundMessage| async move { Ok((input.as_text() == Some("lock")).then_some(())) },
                |state: TopicState, _: ()| async move {
                    state.disable_conditions_except(["x"])?;
                    Ok::<_, TopicError>(Reply::from("locked"))
                },
            ))
            .build(),
    ])
    .unwrap();

    let first = engine.handle(InboundMessage::text("lock"), None, None).await.unwrap();
    assert_eq!(texts(&first.output), ["locked"]);
    assert!(say(&engine, "y", Some(first.state.clone())).await.is_empty());
    assert_eq!(say(&engine, "x", Some(first.state)).await, ["did x"]);
}

#[tokio::test]
async fn empty_stack_makes_every_global_condition_eligible() {
    let engine = filtered_engine();
    let empty = stack(vec![]);
    assert_eq!(say(&engine, "y", empty).await, ["did y"]);
}

// ━━━ States handed to conditions ━━━

#[tokio::test]
async fn global_handler_is_bound_to_the_top_frame_but_owned_by_global() {
    let engine = Engine::new([
        Topic::builder("global")
            .condition(Condition::new(
                "inspect",
                |_state, _input: InboundMessage| async { Ok(Some(())) },
                |state: TopicState, _: ()| async move {
                    state.set_data(json!({"touched": true}))?;
                    let active = state.is_active()?;
                    Ok::<_, TopicError>(Reply::from(format!(
                        "owner={} active={active}",
                        state.owner().name()
                    )))
                },
            ))
            .build(),
        Topic::builder("chat").build(),
    ])
    .unwrap();

    let response = engine
        .handle(InboundMessage::text("anything"), stack(vec![frame("chat")]), None)
        .await
        .unwrap();
    assert_eq!(texts(&response.output), ["owner=global active=true"]);
    assert_eq!(response.state.items[0].data, json!({"touched": true}));
}

#[tokio::test]
async fn predicates_see_user_data() {
    let engine = Engine::new([Topic::builder("global")
        .condition(Condition::new(
            "vip",
            |state: TopicState, _input: InboundMessage| async move {
                Ok(state.user_data()["vip"].as_bool().filter(|vip| *vip))
            },
            |_state, _: bool| async { Ok(Reply::from("welcome back")) },
        ))
        .build()])
    .unwrap();

    let vip = engine
        .handle(InboundMessage::text("hi"), None, Some(json!({"vip": true})))
        .await
        .unwrap();
    assert_eq!(texts(&vip.output), ["welcome back"]);

    let regular = engine
        .handle(InboundMessage::text("hi"), None, Some(Value::Null))
        .await
        .unwrap();
    assert!(regular.output.is_empty());
}

// ━━━ Errors ━━━

#[tokio::test]
async fn predicate_errors_reach_the_caller() {
    let engine = Engine::new([Topic::builder("global")
        .condition(Condition::new(
            "broken",
            |_state, _input: InboundMessage| async { Err::<Option<()>, _>(TopicError::other("parser exploded")) },
            |_state, _: ()| async { Ok(Reply::Nothing) },
        ))
        .condition(any("fallback", "never reached"))
        .build()])
    .unwrap();

    let err = engine.handle(InboundMessage::text("hi"), None, None).await.unwrap_err();
    assert_eq!(err.to_string(), "parser exploded");
}

#[tokio::test]
async fn handler_errors_reach_the_caller() {
    let engine = Engine::new([Topic::builder("global")
        .condition(Condition::new(
            "broken",
            |_state, _input: InboundMessage| async { Ok(Some(())) },
            |_state, _: ()| async { Err::<Reply, _>(TopicError::other("handler exploded")) },
        ))
        .build()])
    .unwrap();

    let err = engine.handle(InboundMessage::text("hi"), None, None).await.unwrap_err();
    assert!(matches!(err, TopicError::Other(_)));
}

#[tokio::test]
async fn regex_conditions_expose_captures() {
    let engine = Engine::new([Topic::builder("global")
        .condition(
            Condition::regex(
                "nick",
                &[r"^nick ([A-z]\w*)$", r"^nickname ([A-z]\w*)$"],
                |_state, m| async move {
                    Ok(Reply::from(format!(
                        "pattern {} set {}",
                        m.index,
                        m.group(1).unwrap_or_default()
                    )))
                },
            )
            .unwrap(),
        )
        .build()])
    .unwrap();

    assert_eq!(say(&engine, "nickname yak", None).await, ["pattern 1 set yak"]);
    assert!(say(&engine, "nick", None).await.is_empty());

    let media = InboundMessage::Media {
        attachments: vec![],
        timestamp: None,
    };
    let response = engine.handle(media, None, None).await.unwrap();
    assert!(response.output.is_empty());
}

#[test]
fn invalid_regex_is_reported() {
    let err = Condition::regex("bad", &["(unclosed"], |_state, _m| async { Ok(Reply::Nothing) }).unwrap_err();
    assert!(matches!(err, TopicError::InvalidPattern(_)));
}
