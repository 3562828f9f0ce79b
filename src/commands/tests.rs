use super::*;
use crate::core::app::{Notice, NoticeKind};
use crate::core::engine::TurnOutcome;
use crate::core::error::TransportError;
use crate::core::persistence::load_from_path;
use crate::utils::test_utils::{create_test_app, create_test_app_with, ScriptedResponse};
use tempfile::tempdir;

mod test_helpers {
    use super::*;

    pub(super) fn last_notice(app: &mut App) -> Notice {
        app.take_notices()
            .pop()
            .expect("command should have produced a notice")
    }
}

use test_helpers::last_notice;

#[test]
fn plain_text_is_processed_as_message() {
    let mut app = create_test_app();
    assert_eq!(
        process_input(&mut app, "  why is the sky blue?  "),
        CommandResult::ProcessAsMessage("why is the sky blue?".to_string())
    );
    assert!(app.take_notices().is_empty());
}

#[test]
fn unknown_slash_command_is_reported_not_sent() {
    let mut app = create_test_app();
    assert_eq!(process_input(&mut app, "/bogus"), CommandResult::Continue);
    let notice = last_notice(&mut app);
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.text, "Unknown command: /bogus");
}

#[test]
fn bare_commands_do_not_answer_to_slash_and_vice_versa() {
    let mut app = create_test_app();
    assert_eq!(process_input(&mut app, "list"), CommandResult::ListModels);
    assert_eq!(process_input(&mut app, "/list"), CommandResult::Continue);
    assert_eq!(
        process_input(&mut app, "set think off"),
        CommandResult::ProcessAsMessage("set think off".to_string())
    );
    assert_eq!(process_input(&mut app, "/help"), CommandResult::Continue);
    assert_eq!(process_input(&mut app, "QUIT"), CommandResult::Exit);
    assert_eq!(process_input(&mut app, "/exit"), CommandResult::Exit);
}

#[test]
fn run_requires_a_selector() {
    let mut app = create_test_app();
    assert_eq!(
        process_input(&mut app, "run 2"),
        CommandResult::RunModel("2".to_string())
    );
    assert_eq!(process_input(&mut app, "run"), CommandResult::Continue);
    assert_eq!(last_notice(&mut app).text, "Usage: run <model|number>");
}

#[test]
fn model_command_shows_current_and_defers_switch_to_server_lookup() {
    let mut app = create_test_app();

    process_input(&mut app, "model");
    assert_eq!(last_notice(&mut app).text, "Model: test-model");

    assert_eq!(
        process_input(&mut app, "model qwen3:8b"),
        CommandResult::RunModel("qwen3:8b".to_string())
    );
    assert_eq!(app.engine.context().model(), Some("test-model"));
}

#[test]
fn temp_command_validates_range_and_syntax() {
    let mut app = create_test_app();

    process_input(&mut app, "temp 1.5");
    assert_eq!(app.engine.context().temperature(), 1.5);

    process_input(&mut app, "temp 9");
    assert_eq!(
        last_notice(&mut app).text,
        "Temperature must be between 0.0 and 2.0"
    );
    assert_eq!(app.engine.context().temperature(), 1.5);

    process_input(&mut app, "temp");
    assert_eq!(last_notice(&mut app).text, "Temperature: 1.5");
}

#[test]
fn system_command_sets_and_clears_without_touching_history() {
    let mut app = create_test_app();

    process_input(&mut app, "/system You are terse.");
    assert_eq!(app.engine.context().system_prompt(), Some("You are terse."));
    assert_eq!(app.engine.context().len(), 2);

    process_input(&mut app, "system");
    assert_eq!(last_notice(&mut app).text, "System prompt: You are terse.");
    assert_eq!(app.engine.context().system_prompt(), Some("You are terse."));

    process_input(&mut app, "/system");
    assert_eq!(app.engine.context().system_prompt(), None);
    assert_eq!(last_notice(&mut app).text, "System prompt cleared");

    process_input(&mut app, "system");
    assert_eq!(last_notice(&mut app).text, "No system prompt");
}

#[test]
fn prose_starting_with_a_command_word_is_sent_as_a_message() {
    let mut app = create_test_app();
    let before = app.engine.context().clone();

    for text in [
        "clear up my confusion about lifetimes",
        "model the data as a tree please",
        "system design interview tips?",
        "run the tests for me",
        "help me write a haiku",
        "history of the Roman empire",
        "temp warm",
        "exit strategies for a startup",
    ] {
        assert_eq!(
            process_input(&mut app, text),
            CommandResult::ProcessAsMessage(text.to_string()),
            "{text:?} should go to the model"
        );
    }

    assert_eq!(app.engine.context(), &before);
    assert!(app.take_notices().is_empty());
}

#[test]
fn slash_command_with_misfit_arguments_shows_usage() {
    let mut app = create_test_app();

    assert_eq!(process_input(&mut app, "/help me"), CommandResult::Continue);
    let notice = last_notice(&mut app);
    assert_eq!(notice.kind, NoticeKind::Warning);
    assert_eq!(notice.text, "Usage: help");
    assert_eq!(app.engine.context().len(), 2);
}

#[test]
fn argument_shapes_match_expected_inputs() {
    assert!(ArgShape::Nothing.accepts("", false));
    assert!(!ArgShape::Nothing.accepts("up my confusion", false));
    assert!(ArgShape::OptionalWord.accepts("", false));
    assert!(ArgShape::OptionalWord.accepts("llama3:8b", false));
    assert!(!ArgShape::OptionalWord.accepts("the data as a tree", false));
    assert!(ArgShape::OptionalNumber.accepts("0.7", false));
    assert!(!ArgShape::OptionalNumber.accepts("warm", false));
    assert!(!ArgShape::OptionalNumber.accepts("0.7 please", false));
    assert!(ArgShape::SlashText.accepts("You are terse.", true));
    assert!(!ArgShape::SlashText.accepts("design interview tips?", false));
    assert!(ArgShape::Text.accepts("think off", true));
}

#[test]
fn history_lists_each_message() {
    let mut app = create_test_app();
    process_input(&mut app, "history");
    let notices = app.take_notices();
    assert_eq!(notices.len(), 2);
    assert!(notices[0].text.starts_with("You ["));
    assert!(notices[0].text.ends_with("]: Hello"));
    assert!(notices[1].text.starts_with("test-model ["));
    assert!(notices[1].text.ends_with("Hi there!"));

    process_input(&mut app, "clear");
    assert!(app.engine.context().is_empty());
    assert_eq!(app.engine.context().model(), Some("test-model"));

    process_input(&mut app, "history");
    assert_eq!(last_notice(&mut app).text, "No conversation history");
}

#[test]
fn save_and_load_round_trip_through_session_dir() {
    let dir = tempdir().unwrap();
    let mut app = create_test_app();
    app.session_dir = dir.path().to_path_buf();
    app.theme = Some("dark".to_string());
    process_input(&mut app, "/system Be brief.");

    process_input(&mut app, "save chat.json");
    let notice = last_notice(&mut app);
    assert_eq!(notice.kind, NoticeKind::Info);
    let saved_path = dir.path().join("chat.json");
    let (saved, metadata) = load_from_path(&saved_path).unwrap();
    assert_eq!(&saved, app.engine.context());
    assert_eq!(metadata.theme.as_deref(), Some("dark"));

    process_input(&mut app, "clear");
    process_input(&mut app, "/system");
    process_input(&mut app, "load chat.json");
    assert_eq!(app.engine.context(), &saved);
    assert_eq!(
        last_notice(&mut app).text,
        "Model: test-model, Messages: 2"
    );
}

#[test]
fn save_without_name_uses_timestamped_file() {
    let dir = tempdir().unwrap();
    let mut app = create_test_app();
    app.session_dir = dir.path().to_path_buf();

    process_input(&mut app, "save");
    let files: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("session_") && files[0].ends_with(".json"));
}

#[test]
fn failed_load_leaves_context_untouched() {
    let dir = tempdir().unwrap();
    let mut app = create_test_app();
    app.session_dir = dir.path().to_path_buf();
    std::fs::write(
        dir.path().join("future.json"),
        r#"{"schema_version": 42, "history": []}"#,
    )
    .unwrap();
    let before = app.engine.context().clone();

    process_input(&mut app, "load future.json");
    let notice = last_notice(&mut app);
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(notice.text.contains("schema version 42"));
    assert_eq!(app.engine.context(), &before);

    process_input(&mut app, "load missing.json");
    assert_eq!(last_notice(&mut app).kind, NoticeKind::Error);
    assert_eq!(app.engine.context(), &before);

    process_input(&mut app, "load");
    assert_eq!(last_notice(&mut app).text, "Usage: load <file>");
}

#[test]
fn set_toggles_thinking_and_verbose() {
    let mut app = create_test_app();
    assert!(app.engine.inline_thinking());

    process_input(&mut app, "/set think off");
    assert!(!app.engine.inline_thinking());
    assert_eq!(last_notice(&mut app).text, "Thinking mode off");

    process_input(&mut app, "/set verbose true");
    assert!(app.verbose);

    process_input(&mut app, "/set verbose maybe");
    assert_eq!(last_notice(&mut app).text, "Usage: /set verbose <on|off>");

    process_input(&mut app, "/set colour on");
    assert_eq!(last_notice(&mut app).text, "Unknown option: colour");
}

#[tokio::test]
async fn retry_is_only_offered_after_an_unanswered_turn() {
    let (mut app, _transport) = create_test_app_with(vec![ScriptedResponse::Reject(
        TransportError::Connection("refused".to_string()),
    )]);

    assert_eq!(process_input(&mut app, "retry"), CommandResult::Continue);
    assert_eq!(last_notice(&mut app).kind, NoticeKind::Error);

    let report = app.engine.send("hello", &mut Vec::new()).await.unwrap();
    assert!(matches!(report.outcome, TurnOutcome::Failed(_)));
    assert_eq!(process_input(&mut app, "retry"), CommandResult::Retry);
}

#[test]
fn help_lists_every_command() {
    let mut app = create_test_app();
    process_input(&mut app, "help");
    let text: Vec<String> = app.take_notices().into_iter().map(|n| n.text).collect();
    for command in all_commands() {
        assert!(
            text.iter().any(|line| line.contains(command.usage)),
            "help is missing {}",
            command.name
        );
    }
}
