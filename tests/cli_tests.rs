//! Querying, rendering and updating through the binary

mod common;

use common::{cliquery, query, read_table, setup_test_project, SERVERS, SETTINGS};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    cliquery()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Examples:"))
        .stdout(predicate::str::contains("--template-file"));
}

#[test]
fn test_version_displays() {
    cliquery()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cliquery"));
}

#[test]
fn test_completions() {
    cliquery()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cliquery"));
}

#[test]
fn test_missing_application() {
    let tmp = TempDir::new().unwrap();
    cliquery()
        .current_dir(tmp.path())
        .args(["-m", "Server", "-f", "name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "You must specify which application to use",
        ));
}

#[test]
fn test_missing_model() {
    let tmp = TempDir::new().unwrap();
    cliquery()
        .current_dir(tmp.path())
        .args(["-a", "servers", "-f", "name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("You must specify which model to use"));
}

#[test]
fn test_missing_output() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "You must specify a list of fields, a template or a set of updates",
        ));
}

#[test]
fn test_fields_and_template_conflict() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-f", "name", "-t", "{{ objects }}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_outside_project_fails() {
    let tmp = TempDir::new().unwrap();
    cliquery()
        .current_dir(tmp.path())
        .args(["-a", "servers", "-m", "Server", "-f", "name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a cliquery project"));
}

#[test]
fn test_project_flag_and_app_env() {
    let tmp = setup_test_project();
    let elsewhere = TempDir::new().unwrap();
    cliquery()
        .current_dir(elsewhere.path())
        .env("CLIQUERY_APP", "servers")
        .arg("--project")
        .arg(tmp.path())
        .args(["-m", "Rack", "-f", "name"])
        .assert()
        .success()
        .stdout("r1\nr2\n");
}

#[test]
fn test_discovers_project_from_subdirectory() {
    let tmp = setup_test_project();
    cliquery()
        .current_dir(tmp.path().join("servers/data"))
        .args(["-a", "servers", "-m", "Rack", "-f", "name"])
        .assert()
        .success()
        .stdout("r1\nr2\n");
}

// ============================================================================
// Filter Tests
// ============================================================================

#[test]
fn test_startswith_filter() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["name__startswith=mc01", "-f", "name,assettag"])
        .assert()
        .success()
        .stdout("mc01-a,A100\nmc01-b,A101\n");
}

#[test]
fn test_negated_filter() {
    let tmp = setup_test_project();
    query(&tmp, "Interface")
        .args([
            "!ip_address__contains=.82.",
            "-f",
            "server.name,ip_address,mac_address",
        ])
        .assert()
        .success()
        .stdout("mc01-a,10.0.83.10,00:17:A4:8D:E6:BD\nmc01-b,10.0.81.11,00:17:A4:8D:E6:C0\n");
}

#[test]
fn test_tilde_negation() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["~status=spare", "-f", "name"])
        .assert()
        .success()
        .stdout("mc01-a\n");
}

#[test]
fn test_in_filter() {
    let tmp = setup_test_project();
    query(&tmp, "Interface")
        .args(["name__in=eth0,eth1", "-f", "ip_address"])
        .assert()
        .success()
        .stdout("10.0.82.10\n10.0.83.10\n10.0.81.11\n");
}

#[test]
fn test_unquoted_number_in_char_field() {
    let tmp = setup_test_project();
    common::write_table(
        tmp.path(),
        "Server",
        "- id: 1\n  name: mc01\n  assettag: 100\n  status: live\n",
    );

    query(&tmp, "Server")
        .args(["-f", "name,assettag", "assettag=100"])
        .assert()
        .success()
        .stdout("mc01,100\n");

    query(&tmp, "Server")
        .args(["-f", "name", "assettag__in=100,200"])
        .assert()
        .success()
        .stdout("mc01\n");
}

#[test]
fn test_filter_through_foreign_key() {
    let tmp = setup_test_project();
    query(&tmp, "Interface")
        .args(["server__rack__name=r2", "-f", "server.name,name"])
        .assert()
        .success()
        .stdout("mc01-b,eth0\n");
}

#[test]
fn test_isnull_filter() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["assettag__isnull=true", "-f", "name"])
        .assert()
        .success()
        .stdout("db01\n");
}

#[test]
fn test_malformed_filter() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["name", "-f", "name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed filter"));
}

#[test]
fn test_unknown_filter_field() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["colour=red", "-f", "name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("colour"));
}

#[test]
fn test_unknown_application() {
    let tmp = setup_test_project();
    cliquery()
        .current_dir(tmp.path())
        .args(["-a", "network", "-m", "Server", "-f", "name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown application 'network'"));
}

#[test]
fn test_unknown_model() {
    let tmp = setup_test_project();
    query(&tmp, "Switch")
        .args(["-f", "name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no model 'Switch'"));
}

// ============================================================================
// Output Tests
// ============================================================================

#[test]
fn test_descending_order() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-o", "-name", "-f", "name"])
        .assert()
        .success()
        .stdout("mc01-b\nmc01-a\ndb01\n");
}

#[test]
fn test_tab_separator() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-s", "\\t", "-f", "name,status", "status=live"])
        .assert()
        .success()
        .stdout("mc01-a\tlive\n");
}

#[test]
fn test_related_and_null_fields() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-f", "name,rack,rack.name,assettag"])
        .assert()
        .success()
        .stdout("db01,,,\nmc01-a,r1,r1,A100\nmc01-b,r2,r2,A101\n");
}

#[test]
fn test_project_null_text() {
    let tmp = setup_test_project();
    fs::write(
        tmp.path().join("settings.yaml"),
        format!("{}config:\n  null_text: \"-\"\n", SETTINGS),
    )
    .unwrap();
    query(&tmp, "Server")
        .args(["name=db01", "-f", "name,assettag"])
        .assert()
        .success()
        .stdout("db01,-\n");
}

#[test]
fn test_unknown_output_field() {
    let tmp = setup_test_project();
    query(&tmp, "Interface")
        .args(["-f", "server.colour"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("colour"));
}

#[test]
fn test_inline_template_with_reverse_set() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args([
            "interface__mac_address=00:17:A4:8D:E6:BC",
            "-t",
            "{{ objects.0.role_set | map(attribute=\"name\") | join(sep=\",\") }}",
        ])
        .assert()
        .success()
        .stdout("web,cache\n");
}

#[test]
fn test_template_file_from_template_dir() {
    let tmp = setup_test_project();
    fs::write(
        tmp.path().join("templates/names.txt"),
        "{% for o in objects %}{{ o.name }} {% endfor %}",
    )
    .unwrap();
    query(&tmp, "Server")
        .args(["-T", "names.txt"])
        .assert()
        .success()
        .stdout("db01 mc01-a mc01-b \n");
}

#[test]
fn test_template_file_by_path() {
    let tmp = setup_test_project();
    let other = TempDir::new().unwrap();
    let path = other.path().join("racks.tera");
    fs::write(&path, "{% for o in objects %}[{{ o.display }}]{% endfor %}").unwrap();
    query(&tmp, "Rack")
        .arg("-T")
        .arg(&path)
        .assert()
        .success()
        .stdout("[r1][r2]\n");
}

#[test]
fn test_template_from_stdin() {
    let tmp = setup_test_project();
    query(&tmp, "Interface")
        .args(["-T", "-", "server__name=mc01-a"])
        .write_stdin("{{ objects | length }} interfaces")
        .assert()
        .success()
        .stdout("2 interfaces\n");
}

#[test]
fn test_builtin_templates() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-T", "builtin/count"])
        .assert()
        .success()
        .stdout("3\n");

    query(&tmp, "Server")
        .args(["-T", "builtin/list", "status=spare"])
        .assert()
        .success()
        .stdout("db01\nmc01-b\n");
}

#[test]
fn test_broken_partial_does_not_block_rendering() {
    let tmp = setup_test_project();
    fs::write(
        tmp.path().join("templates/broken.tera"),
        "{% extends \"missing.tera\" %}",
    )
    .unwrap();
    fs::write(tmp.path().join("templates/names.tera"), "{{ objects | length }} servers").unwrap();

    query(&tmp, "Server")
        .args(["-T", "names.tera"])
        .assert()
        .success()
        .stdout("3 servers\n");
}

#[test]
fn test_missing_template() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-T", "nope.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("template not found"));
}

#[test]
fn test_list_fields() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .arg("-l")
        .assert()
        .success()
        .stdout(predicate::str::contains("HELP"))
        .stdout(predicate::str::contains("assettag"))
        .stdout(predicate::str::contains("interface_set"))
        .stdout(predicate::str::contains("role_set"));
}

// ============================================================================
// Update Tests
// ============================================================================

#[test]
fn test_update_invalid_choice() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-u", "status=broken"])
        .write_stdin("y\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid choice for status: broken. Valid choices: live, spare, retired",
        ));
    assert_eq!(read_table(tmp.path(), "Server"), SERVERS);
}

#[test]
fn test_update_declined() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-u", "status=retired", "name=db01"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "db01\n  status   spare   => retired\n",
        ))
        .stdout(predicate::str::contains("Aborted"))
        .stderr(predicate::str::contains("Apply changes? [y/N]"));
    assert_eq!(read_table(tmp.path(), "Server"), SERVERS);
}

#[test]
fn test_update_preview_shows_related_records() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-u", "rack=2", "name=mc01-a"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("mc01-a\n  rack   r1   => r2\n"));
    assert_eq!(read_table(tmp.path(), "Server"), SERVERS);
}

#[test]
fn test_update_with_bad_template_writes_nothing() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-y", "-u", "status=retired", "-t", "{% for %}"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Applied!").not())
        .stderr(predicate::str::contains("template syntax error"));
    assert_eq!(read_table(tmp.path(), "Server"), SERVERS);
}

#[test]
fn test_update_without_answer_aborts() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-u", "status=retired"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted"));
    assert_eq!(read_table(tmp.path(), "Server"), SERVERS);
}

#[test]
fn test_update_confirmed() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-u", "status=retired", "name=db01"])
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied! 1 record updated"));

    query(&tmp, "Server")
        .args(["-f", "name,status"])
        .assert()
        .success()
        .stdout("db01,retired\nmc01-a,live\nmc01-b,spare\n");
}

#[test]
fn test_update_with_yes_then_renders() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-y", "-u", "rack=1", "-u", "assettag=A102", "name=db01"])
        .args(["-f", "name,rack.name,assettag"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("db01,r1,A102\n"));
}

#[test]
fn test_update_clears_nullable_field() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-y", "-u", "assettag=None", "name=mc01-a", "-f", "name,assettag"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("mc01-a,\n"));
}

#[test]
fn test_update_missing_related_record() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-y", "-u", "rack=9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no record with id 9"));
    assert_eq!(read_table(tmp.path(), "Server"), SERVERS);
}

#[test]
fn test_update_unknown_field() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-y", "-u", "colour=red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no field 'colour'"));
}

#[test]
fn test_update_stdin_template_needs_yes() {
    let tmp = setup_test_project();
    query(&tmp, "Server")
        .args(["-T", "-", "-u", "status=live"])
        .write_stdin("{{ objects | length }}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}
