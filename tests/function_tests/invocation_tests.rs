//! Tests for typed function calls
//!
//! These tests verify:
//! - READ/WRITE command selection for every return type
//! - Argument layout and routing key handling
//! - Decoding per return type and codec slot selection
//! - Error categories (validation, remote, transport)
//! - Concurrent use of one client

#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use atlasfn::function::args::encode_call_args;
use atlasfn::function::selector::{select_command, ManagementOp, OperationKind};
use atlasfn::protocol::RespValue;
use atlasfn::{
    BincodeCodec, Codec, ExecutionMode, FunctionError, FunctionResult, Functions,
    FunctionsConfig, InvocationRequest, ReturnType, StringCodec, Value,
};
use bytes::Bytes;
use common::{
    bulk, functions_for, functions_with_codecs, read_only_library, write_library,
    FailingTransport, FakeStore,
};

const NO_KEYS: &[&str] = &[];

fn store_with(read_only: &[&str], writable: &[&str]) -> Arc<FakeStore> {
    let store = FakeStore::new();
    let functions = functions_for(&store);
    if !read_only.is_empty() {
        functions.load("readers", &read_only_library(read_only)).unwrap();
    }
    if !writable.is_empty() {
        functions.load("writers", &write_library(writable)).unwrap();
    }
    store
}

// =============================================================================
// Command Selection
// =============================================================================

#[test]
fn test_write_mode_always_uses_fcall() {
    let store = store_with(&[], &["update"]);
    let functions = functions_for(&store);

    for return_type in ReturnType::ALL {
        functions
            .call(None, ExecutionMode::Write, "update", return_type, NO_KEYS, &[])
            .unwrap();
        let call = store.last_call();
        assert_eq!(call.label, "FCALL", "{}", return_type);
        assert_eq!(call.wire_name, "FCALL");
    }
}

#[test]
fn test_read_mode_uses_type_specific_command() {
    let store = store_with(&["peek"], &[]);
    let functions = functions_for(&store);

    let mut labels = HashSet::new();
    for return_type in ReturnType::ALL {
        functions
            .call(None, ExecutionMode::Read, "peek", return_type, NO_KEYS, &[])
            .unwrap();
        let call = store.last_call();
        assert_eq!(call.wire_name, "FCALL_RO", "{}", return_type);
        assert_eq!(call.label, return_type.command().label);
        labels.insert(call.label);
    }
    assert_eq!(labels.len(), ReturnType::ALL.len());
}

#[test]
fn test_read_descriptors_are_read_only() {
    for return_type in ReturnType::ALL {
        assert!(return_type.command().read_only, "{}", return_type);
        let write = select_command(ExecutionMode::Write, OperationKind::Call(return_type));
        assert!(!write.read_only);
    }
}

#[test]
fn test_management_selection_ignores_mode() {
    for op in [ManagementOp::Load, ManagementOp::List, ManagementOp::Kill] {
        let read = select_command(ExecutionMode::Read, OperationKind::Management(op));
        let write = select_command(ExecutionMode::Write, OperationKind::Management(op));
        assert_eq!(read, write);
        assert_eq!(read.name, "FUNCTION");
    }
}

#[test]
fn test_read_call_of_writing_function_is_rejected_by_store() {
    let store = store_with(&[], &["update"]);
    let err = functions_for(&store)
        .call(None, ExecutionMode::Read, "update", ReturnType::Long, NO_KEYS, &[])
        .unwrap_err();

    assert!(matches!(err, FunctionError::Remote(_)), "got {:?}", err);
    assert!(err.to_string().contains("write flag"));
}

// =============================================================================
// Argument Layout
// =============================================================================

#[test]
fn test_argument_layout() {
    let store = store_with(&[], &["update"]);
    let functions = functions_for(&store);

    for (keys, values) in [
        (vec![], vec![]),
        (vec!["k1"], vec![]),
        (vec![], vec![Value::from("v1")]),
        (vec!["k1", "k2", "k3"], vec![Value::from(42i64), Value::from("x")]),
    ] {
        functions
            .call(None, ExecutionMode::Write, "update", ReturnType::Long, &keys, &values)
            .unwrap();

        let args = store.last_call().args;
        assert_eq!(args.len(), 2 + keys.len() + values.len());
        assert_eq!(&args[0][..], b"update");
        assert_eq!(args[1], Bytes::from(keys.len().to_string()));
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(&args[2 + i][..], key.as_bytes());
        }
        for (i, value) in values.iter().enumerate() {
            assert_eq!(args[2 + keys.len() + i], StringCodec.encode(value).unwrap());
        }
    }
}

#[test]
fn test_encode_call_args_accessors() {
    let encoded = encode_call_args(
        "fn",
        &["a", "b"],
        &[Value::from(1i64)],
        &StringCodec,
    )
    .unwrap();

    assert_eq!(encoded.function_name(), b"fn");
    assert_eq!(encoded.key_count(), 2);
    assert_eq!(encoded.keys(), &[Bytes::from("a"), Bytes::from("b")]);
    assert_eq!(encoded.values(), &[Bytes::from("1")]);
    assert_eq!(encoded.into_vec().len(), 5);
}

#[test]
fn test_binary_keys_are_sent_raw() {
    let store = store_with(&[], &["update"]);
    let key: &[u8] = b"\x00bin\xffkey";

    functions_for(&store)
        .call(None, ExecutionMode::Write, "update", ReturnType::Long, &[key], &[])
        .unwrap();

    assert_eq!(&store.last_call().args[2][..], key);
}

// =============================================================================
// Routing
// =============================================================================

#[test]
fn test_routing_key_is_not_transmitted() {
    let store = store_with(&["peek"], &[]);
    functions_for(&store)
        .call(
            Some(&b"node-key"[..]),
            ExecutionMode::Read,
            "peek",
            ReturnType::Long,
            &["k1"],
            &[],
        )
        .unwrap();

    let call = store.last_call();
    assert_eq!(call.routing.as_deref(), Some(&b"node-key"[..]));
    assert!(call.args.iter().all(|a| &a[..] != b"node-key"));
    assert_eq!(call.args.len(), 3);
}

#[test]
fn test_routing_falls_back_to_first_key() {
    let store = store_with(&["peek"], &[]);
    functions_for(&store)
        .call(None, ExecutionMode::Read, "peek", ReturnType::Long, &["first", "second"], &[])
        .unwrap();

    assert_eq!(store.last_call().routing.as_deref(), Some(&b"first"[..]));
}

#[test]
fn test_no_routing_without_keys() {
    let store = store_with(&["peek"], &[]);
    functions_for(&store)
        .call_simple(ExecutionMode::Read, "peek", ReturnType::Long)
        .unwrap();

    let call = store.last_call();
    assert_eq!(call.routing, None);
    assert_eq!(call.args, vec![Bytes::from("peek"), Bytes::from("0")]);
}

// =============================================================================
// Decoding
// =============================================================================

#[test]
fn test_boolean_results() {
    let store = store_with(&["yes", "no", "ok"], &[]);
    store.on("yes", |_, _| RespValue::Integer(1));
    store.on("no", |_, _| RespValue::Nil);
    store.on("ok", |_, _| RespValue::Simple("OK".to_string()));
    let functions = functions_for(&store);

    let call = |name| {
        functions
            .call_simple(ExecutionMode::Read, name, ReturnType::Boolean)
            .unwrap()
    };
    assert_eq!(call("yes"), FunctionResult::Boolean(true));
    assert_eq!(call("no"), FunctionResult::Boolean(false));
    assert_eq!(call("ok"), FunctionResult::Boolean(true));
}

#[test]
fn test_long_result_from_keys_and_values() {
    let store = store_with(&[], &["sum"]);
    store.on("sum", |keys, values| {
        let total: i64 = values
            .iter()
            .map(|v| std::str::from_utf8(v).unwrap().parse::<i64>().unwrap())
            .sum();
        RespValue::Integer(total * keys.len() as i64)
    });

    let result = functions_for(&store)
        .call(
            None,
            ExecutionMode::Write,
            "sum",
            ReturnType::Long,
            &["a", "b"],
            &[Value::from(3i64), Value::from(4i64)],
        )
        .unwrap();

    assert_eq!(result.into_long().unwrap(), Some(14));
}

#[test]
fn test_string_result() {
    let store = store_with(&["greet"], &[]);
    store.on("greet", |_, values| {
        let name = String::from_utf8_lossy(&values[0]).into_owned();
        bulk(&format!("hello {}", name))
    });

    let result = functions_for(&store)
        .call(
            None,
            ExecutionMode::Read,
            "greet",
            ReturnType::String,
            NO_KEYS,
            &[Value::from("world")],
        )
        .unwrap();

    assert_eq!(result.into_string().unwrap().as_deref(), Some("hello world"));
}

#[test]
fn test_list_result_mixes_element_kinds() {
    let store = store_with(&["items"], &[]);
    store.on("items", |_, _| {
        RespValue::Array(vec![
            bulk("a"),
            RespValue::Integer(2),
            RespValue::Nil,
            RespValue::Array(vec![bulk("nested")]),
        ])
    });

    let items = functions_for(&store)
        .call_simple(ExecutionMode::Read, "items", ReturnType::List)
        .unwrap()
        .into_list()
        .unwrap();

    assert_eq!(
        items,
        vec![
            Value::from("a"),
            Value::Int(2),
            Value::Nil,
            Value::List(vec![Value::from("nested")]),
        ]
    );
}

#[test]
fn test_value_result_nil() {
    let store = store_with(&["missing"], &[]);
    let result = functions_for(&store)
        .call_simple(ExecutionMode::Read, "missing", ReturnType::Value)
        .unwrap();

    assert_eq!(result, FunctionResult::Value(None));
}

#[test]
fn test_map_value_types_use_map_value_codec() {
    let store = store_with(&["echo_map", "echo_maps"], &[]);
    // Echo the encoded argument back untouched
    store.on("echo_map", |_, values| RespValue::Bulk(values[0].clone()));
    store.on("echo_maps", |_, values| {
        RespValue::Array(values.iter().cloned().map(RespValue::Bulk).collect())
    });

    let functions = functions_with_codecs(&store, Arc::new(StringCodec), Arc::new(BincodeCodec));
    let record = Value::List(vec![Value::from("field"), Value::Int(7)]);

    let single = functions
        .call(
            None,
            ExecutionMode::Read,
            "echo_map",
            ReturnType::MapValue,
            NO_KEYS,
            std::slice::from_ref(&record),
        )
        .unwrap();
    assert_eq!(
        store.last_call().args[2],
        BincodeCodec.encode(&record).unwrap()
    );
    assert_eq!(single, FunctionResult::MapValue(Some(record.clone())));

    let many = functions
        .call(
            None,
            ExecutionMode::Read,
            "echo_maps",
            ReturnType::MapValueList,
            NO_KEYS,
            &[record.clone(), Value::Bool(true)],
        )
        .unwrap();
    assert_eq!(
        many,
        FunctionResult::MapValueList(vec![record, Value::Bool(true)])
    );
}

#[test]
fn test_value_type_uses_value_codec() {
    let store = store_with(&["echo"], &[]);
    store.on("echo", |_, values| RespValue::Bulk(values[0].clone()));

    let functions = functions_with_codecs(&store, Arc::new(BincodeCodec), Arc::new(StringCodec));
    let value = Value::Float(2.5);

    let result = functions
        .call(
            None,
            ExecutionMode::Read,
            "echo",
            ReturnType::Value,
            NO_KEYS,
            std::slice::from_ref(&value),
        )
        .unwrap();

    assert_eq!(result.into_value().unwrap(), Some(value));
}

#[test]
fn test_documented_shapes_decode_for_every_type() {
    let shapes = |return_type: ReturnType| match return_type {
        ReturnType::Boolean => RespValue::Integer(0),
        ReturnType::Long => RespValue::Integer(-5),
        ReturnType::String => bulk("text"),
        ReturnType::Value | ReturnType::MapValue => bulk("payload"),
        ReturnType::List | ReturnType::MapValueList => {
            RespValue::Array(vec![bulk("a"), bulk("b")])
        }
    };

    for return_type in ReturnType::ALL {
        let result = return_type.decode(shapes(return_type), &StringCodec).unwrap();
        assert_eq!(result.return_type(), return_type);
    }
}

#[test]
fn test_string_result_rejects_invalid_utf8() {
    let err = ReturnType::String
        .decode(RespValue::Bulk(Bytes::from_static(b"\xff\xfe")), &StringCodec)
        .unwrap_err();
    assert!(matches!(err, FunctionError::Decoding(_)), "got {:?}", err);
}

#[test]
fn test_long_result_rejects_array() {
    let err = ReturnType::Long
        .decode(RespValue::Array(vec![]), &StringCodec)
        .unwrap_err();
    assert!(matches!(err, FunctionError::UnexpectedResponse(_)), "got {:?}", err);
}

#[test]
fn test_result_accessor_mismatch() {
    let err = FunctionResult::Long(Some(1)).into_string().unwrap_err();
    assert!(matches!(err, FunctionError::UnexpectedResponse(_)));
}

#[test]
fn test_return_type_names_parse() {
    for return_type in ReturnType::ALL {
        let parsed: ReturnType = return_type.to_string().to_lowercase().parse().unwrap();
        assert_eq!(parsed, return_type);
    }
    assert_eq!("map_value_list".parse::<ReturnType>().unwrap(), ReturnType::MapValueList);
    assert!("double".parse::<ReturnType>().unwrap_err().is_validation());
    assert_eq!("WRITE".parse::<ExecutionMode>().unwrap(), ExecutionMode::Write);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_unknown_function() {
    let store = store_with(&[], &["update"]);
    let err = functions_for(&store)
        .call_simple(ExecutionMode::Write, "does_not_exist", ReturnType::Long)
        .unwrap_err();

    assert!(matches!(err, FunctionError::NoSuchFunction(_)), "got {:?}", err);
    assert!(err.is_remote());
}

#[test]
fn test_script_error_is_surfaced_verbatim() {
    let store = store_with(&[], &["explode"]);
    let message = "ERR user_function:1: Script attempted to access nonexistent global variable 'x'";
    store.on("explode", move |_, _| RespValue::Error(message.to_string()));

    let err = functions_for(&store)
        .call_simple(ExecutionMode::Write, "explode", ReturnType::Value)
        .unwrap_err();

    match err {
        FunctionError::Remote(m) => assert_eq!(m, message),
        other => panic!("Expected remote error, got {:?}", other),
    }
}

#[test]
fn test_script_errors_keep_remote_category_whatever_their_text() {
    let store = store_with(&["signup"], &["cleanup"]);
    let messages = [
        "ERR user already exists",
        "ERR Library not found in cache",
        "ERR Function not found: helper",
        "NOTBUSY worker pool",
        "UNKILLABLE job",
    ];

    for message in messages {
        store.on("signup", move |_, _| RespValue::Error(message.to_string()));
        store.on("cleanup", move |_, _| RespValue::Error(message.to_string()));
        let functions = functions_for(&store);

        let read = functions
            .call_simple(ExecutionMode::Read, "signup", ReturnType::Boolean)
            .unwrap_err();
        let write = functions
            .call_simple(ExecutionMode::Write, "cleanup", ReturnType::Long)
            .unwrap_err();

        for err in [read, write] {
            match err {
                FunctionError::Remote(m) => assert_eq!(m, message),
                other => panic!("Expected remote error for {:?}, got {:?}", message, other),
            }
        }
    }
}

#[test]
fn test_error_nested_in_result_is_remote() {
    let store = store_with(&["batch"], &[]);
    store.on("batch", |_, _| {
        RespValue::Array(vec![
            bulk("ok"),
            RespValue::Error("ERR Function not found".to_string()),
        ])
    });

    let err = functions_for(&store)
        .call_simple(ExecutionMode::Read, "batch", ReturnType::List)
        .unwrap_err();
    assert!(matches!(err, FunctionError::Remote(_)), "got {:?}", err);
}

#[test]
fn test_empty_function_name_is_rejected_locally() {
    let store = FakeStore::new();
    let err = functions_for(&store)
        .call_simple(ExecutionMode::Read, "", ReturnType::Long)
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(store.call_count(), 0);
}

#[test]
fn test_unencodable_value_fails_before_sending() {
    let store = store_with(&[], &["update"]);
    let before = store.call_count();

    let err = functions_for(&store)
        .call(
            None,
            ExecutionMode::Write,
            "update",
            ReturnType::Long,
            NO_KEYS,
            &[Value::List(vec![Value::Int(1)])],
        )
        .unwrap_err();

    assert!(matches!(err, FunctionError::Encoding(_)), "got {:?}", err);
    assert_eq!(store.call_count(), before);
}

#[test]
fn test_transport_failure_is_not_retried() {
    let transport = Arc::new(FailingTransport::default());
    let functions = Functions::new(FunctionsConfig::new(
        transport.clone(),
        Arc::new(StringCodec),
        Arc::new(StringCodec),
    ));

    let err = functions
        .call_simple(ExecutionMode::Write, "update", ReturnType::Long)
        .unwrap_err();

    assert!(err.is_transport());
    assert!(!err.is_remote());
    assert_eq!(transport.attempts(), 1);
}

// =============================================================================
// Requests / Concurrency
// =============================================================================

#[test]
fn test_invoke_request() {
    let store = store_with(&["peek"], &[]);
    store.on("peek", |keys, _| RespValue::Integer(keys.len() as i64));

    let request = InvocationRequest::new(ExecutionMode::Read, "peek", ReturnType::Long)
        .routing_key("shard-1")
        .key("a")
        .key("b")
        .value("ignored");
    let result = functions_for(&store).invoke(&request).unwrap();

    assert_eq!(result, FunctionResult::Long(Some(2)));
    let call = store.last_call();
    assert_eq!(call.routing.as_deref(), Some(&b"shard-1"[..]));
    assert_eq!(call.args.len(), 5);
}

#[test]
fn test_concurrent_calls_share_one_client() {
    let store = store_with(&[], &["double"]);
    store.on("double", |_, values| {
        let n: i64 = std::str::from_utf8(&values[0]).unwrap().parse().unwrap();
        RespValue::Integer(n * 2)
    });
    let functions = functions_for(&store);

    let handles: Vec<_> = (0..8i64)
        .map(|t| {
            let functions = functions.clone();
            thread::spawn(move || {
                for i in 0..50i64 {
                    let n = t * 1000 + i;
                    let result = functions
                        .call(
                            None,
                            ExecutionMode::Write,
                            "double",
                            ReturnType::Long,
                            &[format!("key-{}", n)],
                            &[Value::Int(n)],
                        )
                        .unwrap();
                    assert_eq!(result, FunctionResult::Long(Some(n * 2)));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    // one load + 400 calls
    assert_eq!(store.call_count(), 401);
}
