use std::io::{self, Write};

use serde_json::json;

use yaml_errors::{
    compose, emit, emit_to, load, load_str, Error, FieldError, FieldKind, LoadError, Mark, NodeKind,
    Schema, Stage, TypeError,
};

fn single(err: Error) -> LoadError {
    match err {
        Error::Load(err) => err,
        other => panic!("expected a single load error, got: {other}"),
    }
}

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn loads_document_against_schema() {
    let input = r#"
# service settings
name: api
server:
  host: "0.0.0.0"
  port: 8080
replicas: !!int "3"
tags:
  - blue
  - green
"#;
    let schema = Schema::new()
        .required("name", FieldKind::Str)
        .required("server.port", FieldKind::Int)
        .field("replicas", FieldKind::Int)
        .field("tags", FieldKind::Seq);

    let value = load_str(input, &schema).unwrap();
    assert_eq!(
        value,
        json!({
            "name": "api",
            "server": {"host": "0.0.0.0", "port": 8080},
            "replicas": 3,
            "tags": ["blue", "green"]
        })
    );
}

#[test]
fn field_faults_are_returned_together() {
    let input = "name: 5\nport: eighty\nratio: 0.5\n";
    let schema = Schema::new()
        .field("name", FieldKind::Str)
        .field("port", FieldKind::Int)
        .field("ratio", FieldKind::Float)
        .required("owner", FieldKind::Str);

    let err = load_str(input, &schema).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Constructor));
    assert_eq!(
        err.to_string(),
        "yaml: construct errors:\n  \
         line 1: cannot construct !!int `5` into str\n  \
         line 2: cannot construct !!str `eighty` into int\n  \
         line 1: missing required field \"owner\""
    );

    let legacy = err.view_as::<TypeError>().unwrap();
    assert_eq!(legacy.messages().len(), 3);

    let Error::Construct(errs) = &err else {
        panic!("expected construct errors");
    };
    let causes: Vec<&FieldError> = errs
        .iter()
        .filter_map(|e| e.cause()?.downcast_ref::<FieldError>())
        .collect();
    assert_eq!(causes[2], &FieldError::Missing("owner".to_string()));
    assert!(err.matches(&FieldError::Missing("owner".to_string())));
}

#[test]
fn deep_structural_fault_is_returned_not_unwound() {
    let input = "a:\n  b:\n    c:\n      d: 1\n     e: 2\n";
    let err = single(load_str(input, &Schema::new()).unwrap_err());
    assert_eq!(err.stage(), Stage::Parser);
    assert_eq!(err.mark(), Mark::new(5, 6, 31));
    assert_eq!(
        err.to_string(),
        "yaml load error: did not find expected key\n  in parser \
         (while parsing a block mapping) at line 3, column 5 to line 5, column 6"
    );
}

#[test]
fn each_stage_reports_its_own_faults() {
    let cases: [(&[u8], Stage); 5] = [
        (b"key: \xFF", Stage::Reader),
        (b"key:\n\tvalue: 1", Stage::Scanner),
        (b"a: 1\n  b: 2", Stage::Parser),
        (b"a: 1\na: 2", Stage::Composer),
        (b"a: !!bool maybe", Stage::Resolver),
    ];

    for (input, stage) in cases {
        let err = single(load(input, &Schema::new()).unwrap_err());
        assert_eq!(err.stage(), stage, "{err}");
        assert!(err.mark().is_known(), "{err}");
    }
}

#[test]
fn marks_account_for_byte_order_mark() {
    let err = single(compose(b"\xEF\xBB\xBFa: 1\na: 2\n").unwrap_err());
    assert_eq!(err.stage(), Stage::Composer);
    assert_eq!(err.mark(), Mark::new(2, 1, 8));
}

#[test]
fn compose_returns_tagged_tree() {
    let root = compose(b"items:\n- !!str 1\n- two\n").unwrap();
    let NodeKind::Mapping(entries) = &root.kind else {
        panic!("expected mapping");
    };
    let NodeKind::Sequence(items) = &entries[0].1.kind else {
        panic!("expected sequence");
    };
    assert_eq!(items[0].tag.as_deref(), Some("!!str"));
    assert_eq!(items[0].mark, Mark::new(2, 3, 9));
}

#[test]
fn emitted_yaml_loads_back() {
    let value = json!({
        "name": "api",
        "flags": {"debug": false, "level": "true"},
        "hosts": ["a: b", "plain"],
        "nested": [{"x": 1, "y": null}, []],
        "note": "tab\there"
    });

    let text = emit(&value).unwrap();
    let reloaded = load_str(&text, &Schema::new()).unwrap();
    assert_eq!(reloaded, value);
}

#[test]
fn emitter_depth_fault_is_returned() {
    let mut value = json!(1);
    for _ in 0..70 {
        value = json!({ "k": value });
    }

    let err = emit(&value).unwrap_err();
    assert!(matches!(err, Error::Emitter(_)));
    assert_eq!(err.to_string(), "yaml: exceeded max depth of 64");
    assert_eq!(err.stage(), None);
}

#[test]
fn writer_fault_wraps_io_error() {
    let err = emit_to(&json!({"a": 1}), FailingWriter).unwrap_err();
    let Error::Writer(writer) = &err else {
        panic!("expected writer error");
    };
    assert_eq!(writer.source.kind(), io::ErrorKind::BrokenPipe);
    assert_eq!(err.to_string(), "yaml: pipe closed");

    let mut out = Vec::new();
    emit_to(&json!({"a": 1}), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "a: 1\n");
}

#[test]
fn concurrent_loads_keep_their_own_faults() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let input = if i % 2 == 0 {
                    format!("k{i}: 1\nk{i}: 2\n")
                } else {
                    format!("k{i}: {i}\n")
                };
                load_str(&input, &Schema::new())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        match handle.join().unwrap() {
            Ok(value) => {
                assert_eq!(i % 2, 1);
                assert_eq!(value[format!("k{i}")], json!(i));
            }
            Err(err) => {
                assert_eq!(i % 2, 0);
                assert!(err.to_string().contains(&format!("mapping key \"k{i}\"")));
            }
        }
    }
}

#[test]
fn quoted_keys_ending_in_backslash_load_back() {
    let value = json!({"#\\": 1, "path\\": {"c:\\": "x\\"}});
    let text = emit(&value).unwrap();
    assert!(text.starts_with("\"#\\\\\": 1\n"));
    assert_eq!(load_str(&text, &Schema::new()).unwrap(), value);
}

#[test]
fn control_characters_fail_to_emit() {
    let err = emit(&json!({"a": "bell\u{7}"})).unwrap_err();
    assert!(matches!(err, Error::Emitter(_)));
    assert_eq!(err.to_string(), "yaml: control characters are not allowed");

    let mut out = Vec::new();
    let err = emit_to(&json!(["\u{1b}[0m"]), &mut out).unwrap_err();
    assert!(matches!(err, Error::Emitter(_)));
    assert!(out.is_empty());
}

#[test]
fn non_finite_floats_are_resolver_faults() {
    let err = single(load_str("a: 1.5\nb: .inf\n", &Schema::new()).unwrap_err());
    assert_eq!(err.stage(), Stage::Resolver);
    assert_eq!(err.message(), "cannot represent `.inf` as a JSON number");
    assert_eq!(err.mark(), Mark::new(2, 4, 10));
}
