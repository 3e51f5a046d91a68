//! Shared test helpers for integration tests
//!
//! This module provides a sample project and a command builder isolated
//! from the user's environment.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to get a cliquery command that ignores the caller's config
pub fn cliquery() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("cliquery"));
    cmd.env("CLIQUERY_CONFIG", "/nonexistent/cliquery/config.yaml")
        .env_remove("CLIQUERY_APP")
        .env_remove("CLIQUERY_PROJECT")
        .env_remove("RUST_LOG");
    cmd
}

pub const SETTINGS: &str = "\
installed_apps: [servers]
template_dirs: [templates]
";

pub const MODELS: &str = r#"
models:
  Rack:
    display: "{name}"
    fields:
      name: { type: char }
  Server:
    display: "{name}"
    ordering: [name]
    fields:
      name: { type: char }
      assettag: { type: char, null: true }
      status:
        type: char
        choices: [live, spare, retired]
      rack: { type: foreign_key, to: Rack, null: true }
  Interface:
    display: "{name} ({ip_address})"
    fields:
      server: { type: foreign_key, to: Server }
      name: { type: char }
      ip_address: { type: char }
      mac_address: { type: char }
  Role:
    fields:
      server: { type: foreign_key, to: Server }
      name: { type: char }
"#;

pub const RACKS: &str = "\
- id: 1
  name: r1
- id: 2
  name: r2
";

pub const SERVERS: &str = "\
- id: 1
  name: mc01-a
  assettag: A100
  status: live
  rack: 1
- id: 2
  name: mc01-b
  assettag: A101
  status: spare
  rack: 2
- id: 3
  name: db01
  assettag: null
  status: spare
  rack: null
";

pub const INTERFACES: &str = "\
- id: 1
  server: 1
  name: eth0
  ip_address: 10.0.82.10
  mac_address: 00:17:A4:8D:E6:BC
- id: 2
  server: 1
  name: eth1
  ip_address: 10.0.83.10
  mac_address: 00:17:A4:8D:E6:BD
- id: 3
  server: 2
  name: eth0
  ip_address: 10.0.81.11
  mac_address: 00:17:A4:8D:E6:C0
- id: 4
  server: 3
  name: bond0
  ip_address: 10.0.82.12
  mac_address: 00:17:A4:8D:E6:C1
";

pub const ROLES: &str = "\
- id: 1
  server: 1
  name: web
- id: 2
  server: 1
  name: cache
";

/// Helper to create the sample server inventory in a temp directory
pub fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    fs::write(root.join("settings.yaml"), SETTINGS).unwrap();
    fs::create_dir_all(root.join("servers/data")).unwrap();
    fs::create_dir_all(root.join("templates")).unwrap();
    fs::write(root.join("servers/models.yaml"), MODELS).unwrap();

    write_table(root, "Rack", RACKS);
    write_table(root, "Server", SERVERS);
    write_table(root, "Interface", INTERFACES);
    write_table(root, "Role", ROLES);

    tmp
}

pub fn write_table(root: &Path, model: &str, content: &str) {
    fs::write(root.join(format!("servers/data/{}.yaml", model)), content).unwrap();
}

pub fn read_table(root: &Path, model: &str) -> String {
    fs::read_to_string(root.join(format!("servers/data/{}.yaml", model))).unwrap()
}

/// Helper to run a query against the sample project
pub fn query(tmp: &TempDir, model: &str) -> Command {
    let mut cmd = cliquery();
    cmd.current_dir(tmp.path()).args(["-a", "servers", "-m", model]);
    cmd
}
