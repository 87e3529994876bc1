// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SAMPLE: &str = r#"
<MediatorConfig>
    <ClientListenHost>127.0.0.1</ClientListenHost>
    <ClientListenPort>8080</ClientListenPort>
    <Modules>
        <Module>
            <ID>modA</ID>
            <Name>Acquisition A</Name>
            <ImplAssembly>drivers.dll</ImplAssembly>
            <ImplClass>opc-ua</ImplClass>
            <Enabled>true</Enabled>
            <ConcurrentInit>false</ConcurrentInit>
            <Config Name="endpoint">opc.tcp://host/ua</Config>
            <Config Name="pollMs">500</Config>
            <VariablesFileName>/var/lib/mediator/modA.vars</VariablesFileName>
        </Module>
        <Module>
            <ID>modB</ID>
            <Name>Calc B</Name>
            <ImplClass>calc-engine</ImplClass>
            <ConcurrentInit>true</ConcurrentInit>
            <VariablesFileName>/var/lib/mediator/modB.vars</VariablesFileName>
        </Module>
    </Modules>
    <UserManagement>
        <User>
            <Name>alice</Name>
            <Password>hunter2</Password>
            <Role>operator</Role>
            <Role>admin</Role>
        </User>
        <ModulePassword>
            <ModuleID>modA</ModuleID>
            <Password>modapass</Password>
        </ModulePassword>
    </UserManagement>
    <Locations>
        <Location>
            <ID>loc1</ID>
            <Name>Plant 1</Name>
        </Location>
    </Locations>
    <TimestampCheckWarningMs>5000</TimestampCheckWarningMs>
    <StartCompleteFile>/var/run/mediator/ready</StartCompleteFile>
</MediatorConfig>
"#;

#[test]
fn parses_the_full_schema() {
    let cfg = MediatorConfig::parse(SAMPLE).unwrap();
    assert_eq!(cfg.client_listen_host, "127.0.0.1");
    assert_eq!(cfg.client_listen_port, 8080);
    assert_eq!(cfg.modules.len(), 2);
    assert_eq!(cfg.timestamp_check_warning_ms, 5000);
    assert_eq!(
        cfg.start_complete_file,
        Some(PathBuf::from("/var/run/mediator/ready"))
    );
}

#[test]
fn module_declarations_preserve_order_and_defaults() {
    let cfg = MediatorConfig::parse(SAMPLE).unwrap();
    assert_eq!(cfg.modules[0].id.as_str(), "modA");
    assert!(!cfg.modules[0].concurrent_init);
    assert_eq!(cfg.modules[1].id.as_str(), "modB");
    assert!(cfg.modules[1].enabled);
    assert!(cfg.modules[1].concurrent_init);
}

#[test]
fn module_config_params_become_a_map() {
    let cfg = MediatorConfig::parse(SAMPLE).unwrap();
    assert_eq!(
        cfg.modules[0].config.get("endpoint").map(String::as_str),
        Some("opc.tcp://host/ua")
    );
    assert_eq!(cfg.modules[0].config.get("pollMs").map(String::as_str), Some("500"));
}

#[test]
fn user_management_is_parsed() {
    let cfg = MediatorConfig::parse(SAMPLE).unwrap();
    let alice = cfg.credentials.users.get("alice").unwrap();
    assert_eq!(alice.password, "hunter2");
    assert_eq!(alice.roles, vec!["operator", "admin"]);
    assert_eq!(
        cfg.credentials.module_passwords.get(&ModuleId::new("modA")),
        Some(&"modapass".to_string())
    );
}

#[test]
fn missing_optional_fields_fall_back_to_defaults() {
    let minimal = r#"
    <MediatorConfig>
        <ClientListenHost>0.0.0.0</ClientListenHost>
        <ClientListenPort>9000</ClientListenPort>
    </MediatorConfig>
    "#;
    let cfg = MediatorConfig::parse(minimal).unwrap();
    assert!(cfg.modules.is_empty());
    assert_eq!(cfg.timestamp_check_warning_ms, DEFAULT_TIMESTAMP_CHECK_WARNING_MS);
    assert_eq!(cfg.session_idle_timeout_ms, DEFAULT_SESSION_IDLE_TIMEOUT_MS);
    assert!(cfg.start_complete_file.is_none());
}

#[test]
fn malformed_xml_is_a_parse_error() {
    let err = MediatorConfig::load("/nonexistent/path/that/does/not/exist.xml").unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
