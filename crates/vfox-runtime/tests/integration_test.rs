//! Integration tests for vfox-runtime.
//!
//! These tests cover:
//! - Values crossing the Lua boundary in both directions
//! - Method-style calls with the receiver as `self`
//! - Host settings visible to scripts
//! - Runtime isolation between interpreters

use std::collections::BTreeMap;
use std::time::Duration;
use vfox_luai::{record, Marshal, Table, Unmarshal, Value};
use vfox_runtime::{HostConfig, LuaVm, RuntimeError, ScriptObject};

// ==============================================================================
// Test Fixture Helpers
// ==============================================================================

record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Artifact {
        name: String as "name",
        size: i64 as "size",
    }
}

record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Request {
        runtime_version: String as "runtimeVersion",
        artifacts: Vec<Artifact> as "artifacts",
        labels: BTreeMap<String, String> as "labels",
        dry_run: bool as "dryRun",
    }
}

const ECHO_SCRIPT: &str = r#"
SCRIPT = { name = "echo" }

function SCRIPT:Echo(ctx)
    return ctx
end

function SCRIPT:Describe(ctx)
    local total = 0
    for _, artifact in ipairs(ctx.artifacts) do
        total = total + artifact.size
    end
    return {
        owner = self.name,
        count = #ctx.artifacts,
        total = total,
        first = ctx.artifacts[1].name,
        label = ctx.labels.channel,
        dry = ctx.dryRun,
    }
end
"#;

fn prepared_vm(config: &HostConfig, source: &str) -> (LuaVm, ScriptObject) {
    let mut vm = LuaVm::new();
    vm.prepare(config).unwrap();
    vm.exec(source, "@test.lua").unwrap();
    let object = vm.global_object("SCRIPT").unwrap().unwrap();
    (vm, object)
}

fn sample_request() -> Request {
    Request {
        runtime_version: "0.1.0".to_string(),
        artifacts: vec![
            Artifact {
                name: "jdk".to_string(),
                size: 200,
            },
            Artifact {
                name: "src".to_string(),
                size: 50,
            },
        ],
        labels: BTreeMap::from([("channel".to_string(), "lts".to_string())]),
        dry_run: true,
    }
}

// ==============================================================================
// Boundary Tests
// ==============================================================================

#[test]
fn test_record_survives_round_trip_through_lua() {
    let (mut vm, object) = prepared_vm(&HostConfig::default(), ECHO_SCRIPT);
    let echo = vm.function(&object, "Echo").unwrap().unwrap();

    let request = sample_request();
    vm.call(&echo, &object, &[request.marshal().unwrap()])
        .unwrap();

    let mut decoded = Request::default();
    decoded.unmarshal(&vm.returned_value()).unwrap();
    assert_eq!(decoded, request);
}

#[test]
fn test_script_sees_sequences_and_receiver() {
    let (mut vm, object) = prepared_vm(&HostConfig::default(), ECHO_SCRIPT);
    let describe = vm.function(&object, "Describe").unwrap().unwrap();

    vm.call(&describe, &object, &[sample_request().marshal().unwrap()])
        .unwrap();

    let result = vm.returned_value();
    let table = result.as_table().unwrap();
    assert_eq!(table.string("owner"), Some("echo"));
    assert_eq!(table.get_str("count"), Some(&Value::Integer(2)));
    assert_eq!(table.get_str("total"), Some(&Value::Integer(250)));
    assert_eq!(table.string("first"), Some("jdk"));
    assert_eq!(table.string("label"), Some("lts"));
    assert_eq!(table.get_str("dry"), Some(&Value::Boolean(true)));
}

#[test]
fn test_returned_value_is_taken_once() {
    let (mut vm, object) = prepared_vm(&HostConfig::default(), ECHO_SCRIPT);
    let echo = vm.function(&object, "Echo").unwrap().unwrap();

    vm.call(&echo, &object, &[Value::from("hello")]).unwrap();
    assert_eq!(vm.returned_value(), Value::from("hello"));
    assert!(vm.returned_value().is_nil());
}

#[test]
fn test_empty_table_argument() {
    let (mut vm, object) = prepared_vm(&HostConfig::default(), ECHO_SCRIPT);
    let echo = vm.function(&object, "Echo").unwrap().unwrap();

    vm.call(&echo, &object, &[Value::from(Table::new())])
        .unwrap();
    let result = vm.returned_value();
    assert!(result.as_table().is_some_and(|t| t.entry_count() == 0));
}

// ==============================================================================
// Host Environment Tests
// ==============================================================================

#[test]
fn test_host_module_and_platform_globals() {
    let config = HostConfig::default()
        .with_runtime_version("1.2.3")
        .with_proxy("http://proxy.local:3128");
    let source = r#"
        local host = require("host")
        SCRIPT = {
            version = host.runtime_version,
            proxy = host.proxy_url,
            os = OS_TYPE,
            arch = ARCH_TYPE,
        }
    "#;
    let (vm, object) = prepared_vm(&config, source);

    assert_eq!(vm.get_string(&object, "version"), "1.2.3");
    assert_eq!(vm.get_string(&object, "proxy"), "http://proxy.local:3128");
    assert_eq!(vm.get_string(&object, "os"), config.os_type);
    assert_eq!(vm.get_string(&object, "arch"), config.arch_type);
}

#[test]
fn test_interpreters_are_isolated() {
    let config = HostConfig::default();
    let (_first, _) = prepared_vm(&config, "SCRIPT = {} LEAK = 'first'");
    let (second, object) = prepared_vm(&config, "SCRIPT = { seen = tostring(LEAK) }");

    assert_eq!(second.get_string(&object, "seen"), "nil");
}

#[test]
fn test_error_names_the_function() {
    let source = r#"
        SCRIPT = {}
        function SCRIPT:Fail(ctx)
            error("download failed for " .. ctx.name)
        end
    "#;
    let (mut vm, object) = prepared_vm(&HostConfig::default(), source);
    let fail = vm.function(&object, "Fail").unwrap().unwrap();

    let ctx = Artifact {
        name: "jdk".to_string(),
        size: 0,
    };
    let err = vm.call(&fail, &object, &[ctx.marshal().unwrap()])
        .unwrap_err();
    match &err {
        RuntimeError::Invocation { function, message } => {
            assert_eq!(function, "Fail");
            assert!(message.contains("download failed for jdk"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("[Fail] failed"));
}

#[test]
fn test_timeout_leaves_runtime_usable() {
    let source = r#"
        SCRIPT = {}
        function SCRIPT:Spin()
            while true do end
        end
        function SCRIPT:Ok()
            return "ok"
        end
    "#;
    let config = HostConfig::default().with_hook_timeout(Duration::from_millis(50));
    let (mut vm, object) = prepared_vm(&config, source);

    let spin = vm.function(&object, "Spin").unwrap().unwrap();
    let err = vm.call(&spin, &object, &[]).unwrap_err();
    assert!(matches!(err, RuntimeError::Timeout { .. }));

    let ok = vm.function(&object, "Ok").unwrap().unwrap();
    vm.call(&ok, &object, &[]).unwrap();
    assert_eq!(vm.returned_value(), Value::from("ok"));
    vm.close();
}
