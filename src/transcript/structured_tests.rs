use super::session::StructuredSession;
use super::structured::{
    parse_event, Adapted, OutputPart, StructuredAdapter, StructuredEvent, ToolArguments, ToolOutput,
};
use super::test_utils::assert_blocks_match;
use crate::error::TranscriptError;
use crate::types::{BlockKind, ExecutionStatus};

const RECORDS: &str = r#"{"type":"system/init","model":"claude-sonnet","session_id":"s-1","cwd":"/work","tools":["Read","Bash"]}
{"type":"assistant-text","text":"Let me look "}
{"type":"assistant-text","text":"at the config."}
{"type":"assistant-tool-call","id":"call_1","name":"Read","arguments":{"file_path":"config.toml"}}
{"type":"tool-result","tool_call_id":"call_1","output":"[server]\nport = 80","is_error":false}
{"type":"assistant-text","text":"The port is 80."}
{"type":"turn-complete","success":true,"duration_ms":1500,"cost_usd":0.0123}
"#;

#[test]
fn test_parse_events() {
    assert_eq!(
        parse_event(r#"{"type":"assistant-text","text":"hi"}"#).unwrap(),
        StructuredEvent::AssistantText {
            text: "hi".to_string()
        }
    );
    assert_eq!(
        parse_event(r#"{"type":"rate-limit","retry_after":3}"#).unwrap(),
        StructuredEvent::Unrecognized
    );
    assert!(matches!(
        parse_event("{not json"),
        Err(TranscriptError::MalformedEvent(_))
    ));
    assert!(matches!(
        parse_event(r#"{"type":"assistant-text"}"#),
        Err(TranscriptError::MalformedEvent(_))
    ));
}

#[test]
fn test_tool_arguments_variants() {
    let parse = |json: &str| serde_json::from_str::<ToolArguments>(json).unwrap();

    assert!(matches!(
        parse(r#"{"command":"cargo test","description":"Run tests"}"#),
        ToolArguments::Command { .. }
    ));
    assert!(matches!(
        parse(r#"{"file_path":"a.rs","old_string":"x","new_string":"y"}"#),
        ToolArguments::FileEdit {
            replace_all: false,
            ..
        }
    ));
    assert!(matches!(
        parse(r#"{"file_path":"a.rs","content":"fn main() {}"}"#),
        ToolArguments::FileWrite { .. }
    ));
    assert!(matches!(
        parse(r#"{"file_path":"a.rs","limit":20}"#),
        ToolArguments::FileRead {
            limit: Some(20),
            ..
        }
    ));
    assert!(matches!(
        parse(r#"{"pattern":"TODO","path":"src"}"#),
        ToolArguments::Search { .. }
    ));
    assert!(matches!(
        parse(r#"{"url":"https://example.com"}"#),
        ToolArguments::Unrecognized(_)
    ));
}

#[test]
fn test_tool_argument_summaries() {
    let edit = ToolArguments::FileEdit {
        file_path: "src/lib.rs".to_string(),
        old_string: "a".to_string(),
        new_string: "b".to_string(),
        replace_all: false,
    };
    assert_eq!(edit.summary(), "src/lib.rs");
    assert_eq!(edit.file_path(), Some("src/lib.rs"));

    let search = ToolArguments::Search {
        pattern: "fn main".to_string(),
        path: Some("src".to_string()),
    };
    assert_eq!(search.summary(), "fn main in src");
    assert_eq!(search.file_path(), None);
    assert_eq!(ToolArguments::default().summary(), "");
}

#[test]
fn test_tool_output_parts() {
    let output: ToolOutput = serde_json::from_str(
        r#"[{"type":"text","text":"line one"},{"type":"image","media_type":"image/png"},{"type":"audio"}]"#,
    )
    .unwrap();
    assert!(matches!(&output, ToolOutput::Parts(parts) if parts[2] == OutputPart::Unrecognized));
    assert_eq!(output.to_text(), "line one\n[image: image/png]");
}

#[test]
fn test_adapter_appends_consecutive_text() {
    let mut adapter = StructuredAdapter::new();
    let first = adapter
        .adapt_line(r#"{"type":"assistant-text","text":"Hello "}"#)
        .unwrap();
    let Adapted::Block(block) = first else {
        panic!("expected a new block");
    };
    assert_eq!(block.kind, BlockKind::Text);

    let second = adapter
        .adapt_line(r#"{"type":"assistant-text","text":"world"}"#)
        .unwrap();
    let Adapted::Update(update) = second else {
        panic!("expected an update");
    };
    assert_eq!(update.id, block.id);
    assert_eq!(update.text, "world");
}

#[test]
fn test_adapter_drops_malformed_and_unknown_records() {
    let mut adapter = StructuredAdapter::new();
    assert!(adapter.adapt_line("{\"type\": ").is_none());
    assert!(adapter.adapt_line(r#"{"type":"keepalive"}"#).is_none());
    assert!(adapter.adapt_line("   ").is_none());
    assert!(adapter
        .adapt_line(r#"{"type":"assistant-text","text":"still works"}"#)
        .is_some());
}

#[test]
fn test_structured_session() {
    let mut session = StructuredSession::new();
    for line in RECORDS.lines() {
        session.feed_line(line);
    }
    session.finish();

    assert_blocks_match(
        &[
            (
                BlockKind::Status,
                "Session started · model claude-sonnet · /work",
            ),
            (BlockKind::Text, "Let me look at the config."),
            (BlockKind::ToolCall, "Read(config.toml)"),
            (BlockKind::ToolResult, "[server]\nport = 80"),
            (BlockKind::Text, "The port is 80."),
            (BlockKind::Status, "Turn complete · 1.5s · $0.0123"),
        ],
        session.blocks(),
    );

    let call = &session.blocks()[2];
    assert_eq!(call.tool_name.as_deref(), Some("Read"));
    assert_eq!(call.file_path.as_deref(), Some("config.toml"));
    assert_eq!(call.call_id.as_deref(), Some("call_1"));
    assert_eq!(call.execution_status, Some(ExecutionStatus::Success));

    let result = &session.blocks()[3];
    assert_eq!(result.tool_name.as_deref(), Some("Read"));
    assert_eq!(result.execution_status, Some(ExecutionStatus::Success));
    assert!(session.blocks().iter().all(|block| block.is_finalized()));
    assert!(session.open_block().is_none());
}

#[test]
fn test_failed_tool_result_marks_call() {
    let mut session = StructuredSession::new();
    session.feed_line(r#"{"type":"assistant-tool-call","id":"c1","name":"Bash","arguments":{"command":"false"}}"#);
    assert_eq!(
        session.open_block().unwrap().execution_status,
        Some(ExecutionStatus::Running)
    );
    session.feed_line(r#"{"type":"tool-result","tool_call_id":"c1","output":"exit 1","is_error":true}"#);

    assert_eq!(session.blocks().len(), 1);
    assert_eq!(session.blocks()[0].execution_status, Some(ExecutionStatus::Error));
    let result = session.open_block().unwrap();
    assert_eq!(result.kind, BlockKind::ToolResult);
    assert_eq!(result.execution_status, Some(ExecutionStatus::Error));
    assert_eq!(result.tool_name.as_deref(), Some("Bash"));
}

#[test]
fn test_failed_turn_is_error_block() {
    let mut session = StructuredSession::new();
    session.feed_line(r#"{"type":"assistant-text","text":"Working"}"#);
    session.feed_line(r#"{"type":"turn-complete","success":false,"result":"Max turns reached"}"#);
    assert_blocks_match(
        &[
            (BlockKind::Text, "Working"),
            (BlockKind::Error, "Max turns reached"),
        ],
        session.blocks(),
    );
    assert!(session.open_block().is_none());
}

#[test]
fn test_thinking_records() {
    let mut session = StructuredSession::new();
    session.feed_line(r#"{"type":"assistant-thinking","text":"Consider "}"#);
    session.feed_line(r#"{"type":"assistant-thinking","text":"the options."}"#);
    session.feed_line(r#"{"type":"assistant-text","text":"Done."}"#);
    session.finish();
    assert_blocks_match(
        &[
            (BlockKind::Thinking, "Consider the options."),
            (BlockKind::Text, "Done."),
        ],
        session.blocks(),
    );
}

#[test]
fn test_chunked_records() {
    let mut session = StructuredSession::new();
    for chunk in RECORDS.as_bytes().chunks(7) {
        session.feed(chunk);
    }
    session.finish();
    assert_eq!(session.blocks().len(), 6);
    assert_eq!(session.blocks()[1].content, "Let me look at the config.");
}

#[test]
fn test_merge_applies_to_structured_sessions() {
    let mut session = StructuredSession::new();
    session.feed_line(r#"{"type":"assistant-text","text":"one"}"#);
    session.feed_line(r#"{"type":"turn-complete","success":true}"#);
    session.feed_line(r#"{"type":"assistant-text","text":"two"}"#);
    session.finish();
    assert_eq!(session.merged().len(), 3);
}

#[test]
fn test_reset_structured_session() {
    let mut session = StructuredSession::new();
    session.feed_line(r#"{"type":"assistant-text","text":"before"}"#);
    let before = session.open_block().unwrap().id;
    session.feed(br#"{"type":"assistant-text","#);
    session.reset();
    assert!(session.transcript().is_empty());

    session.feed_line(r#"{"type":"assistant-text","text":"after"}"#);
    let after = session.open_block().unwrap();
    assert_eq!(after.content, "after");
    assert!(after.id > before);
}

#[test]
fn test_text_after_finish_opens_new_block() {
    let mut session = StructuredSession::new();
    session.feed_line(r#"{"type":"assistant-text","text":"first"}"#);
    session.finish();
    session.feed_line(r#"{"type":"assistant-text","text":"second"}"#);
    session.finish();

    let contents: Vec<_> = session.blocks().iter().map(|b| b.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second"]);
}
