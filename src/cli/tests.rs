use super::*;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }
}

use test_helpers::parse_args;

#[test]
fn no_subcommand_means_chat() {
    let args = parse_args(&["matollama"]);
    assert!(args.command.is_none());
    assert!(args.model.is_none());
    assert!(!args.no_color);
}

#[test]
fn global_flags_are_accepted_after_the_subcommand() {
    let args = parse_args(&[
        "matollama",
        "list",
        "--host",
        "gpu-box:11434",
        "--timeout",
        "30",
        "-l",
        "/tmp/matollama.log",
    ]);
    assert_eq!(args.command, Some(Commands::List));

    let overrides = args.overrides();
    assert_eq!(overrides.host.as_deref(), Some("gpu-box:11434"));
    assert_eq!(overrides.timeout_secs, Some(30));
    assert_eq!(args.log_file, Some(PathBuf::from("/tmp/matollama.log")));
}

#[test]
fn say_collects_the_whole_prompt() {
    let args = parse_args(&["matollama", "-m", "llama3", "say", "why", "-is", "the sky blue"]);
    assert_eq!(args.model.as_deref(), Some("llama3"));
    assert_eq!(
        args.command,
        Some(Commands::Say {
            prompt: vec![
                "why".to_string(),
                "-is".to_string(),
                "the sky blue".to_string()
            ],
        })
    );
}

#[test]
fn set_accepts_multi_word_values_and_no_key() {
    let args = parse_args(&["matollama", "set", "system-prompt", "You", "are", "terse."]);
    match args.command {
        Some(Commands::Set { key, value }) => {
            assert_eq!(key.as_deref(), Some("system-prompt"));
            assert_eq!(value.join(" "), "You are terse.");
        }
        other => panic!("expected set subcommand, got {other:?}"),
    }

    let args = parse_args(&["matollama", "set"]);
    assert_eq!(
        args.command,
        Some(Commands::Set {
            key: None,
            value: Vec::new(),
        })
    );
}

#[test]
fn unset_requires_a_key() {
    assert!(Args::try_parse_from(["matollama", "unset"]).is_err());
    let args = parse_args(&["matollama", "unset", "default-model"]);
    assert_eq!(
        args.command,
        Some(Commands::Unset {
            key: "default-model".to_string()
        })
    );
}

#[test]
fn flag_overrides_resolve_over_config() {
    let args = parse_args(&["matollama", "--host", "remote:11434", "-m", "qwen3"]);
    let config = Config {
        host: Some("http://localhost:11434".to_string()),
        default_model: Some("llama3".to_string()),
        ..Default::default()
    };
    let settings = config.resolve(&args.overrides()).unwrap();
    assert_eq!(settings.host, "http://remote:11434");
    assert_eq!(settings.model.as_deref(), Some("qwen3"));
}
