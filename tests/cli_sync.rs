mod cli_harness;

use cli_harness::{CliHarness, TestResult, combined_output};
use serde_json::json;

const TWO_HEARTBEATS: &str = r#"defaults:
  timezone: America/New_York

heartbeats:
  - name: Morning Briefing
    schedule: "0 8 * * *"
    prompt: Run the morning briefing
    delivery: telegram
  - name: Nightly Cache Warm
    schedule: "30 2 * * *"
    message: Warm the cache
"#;

fn adds(calls: &[String]) -> Vec<&String> {
    calls.iter().filter(|c| c.starts_with("cron add")).collect()
}

fn removes(calls: &[String]) -> Vec<&String> {
    calls
        .iter()
        .filter(|c| c.starts_with("cron remove"))
        .collect()
}

#[test]
fn sync_creates_every_heartbeat() -> TestResult<()> {
    let harness = CliHarness::new()?;
    harness.write_config(TWO_HEARTBEATS)?;

    let output = harness.run(&["sync", "-c", &harness.config_arg()])?;
    let text = combined_output(&output);

    assert!(output.status.success(), "sync failed:\n{text}");
    assert!(text.contains("Found 2 heartbeat(s)"));
    assert!(text.contains("Created: Morning Briefing"));
    assert!(text.contains("Created: Nightly Cache Warm"));
    assert!(text.contains("2 job(s) created"));

    let calls = harness.scheduler_calls()?;
    let adds = adds(&calls);
    assert_eq!(adds.len(), 2, "unexpected scheduler calls: {calls:?}");
    assert!(adds[0].contains("--name Morning Briefing"));
    assert!(adds[0].contains("--cron 0 8 * * *"));
    assert!(adds[0].contains("--tz America/New_York"));
    assert!(adds[0].contains("--message Run the morning briefing"));
    assert!(adds[0].contains("--session isolated"));
    assert!(adds[0].contains("--announce --channel telegram"));
    assert!(adds[1].contains("--name Nightly Cache Warm"));
    assert!(adds[1].contains("--system-event Warm the cache"));
    assert!(adds[1].contains("--session main"));
    Ok(())
}

#[test]
fn dry_run_previews_without_touching_the_scheduler() -> TestResult<()> {
    let harness = CliHarness::new()?;
    harness.write_config(TWO_HEARTBEATS)?;

    let output = harness.run(&["sync", "-c", &harness.config_arg(), "--dry-run"])?;
    let text = combined_output(&output);

    assert!(output.status.success(), "dry run failed:\n{text}");
    assert!(text.contains("[DRY RUN]"));
    assert!(text.contains("Summary (dry run):"));
    assert!(text.contains("2 job(s) would be created"));

    let calls = harness.scheduler_calls()?;
    assert!(adds(&calls).is_empty(), "dry run created jobs: {calls:?}");
    assert!(removes(&calls).is_empty(), "dry run removed jobs: {calls:?}");
    Ok(())
}

#[test]
fn existing_jobs_are_skipped_without_force() -> TestResult<()> {
    let harness = CliHarness::new()?;
    harness.write_config(TWO_HEARTBEATS)?;
    harness.set_listing(&[json!({
        "id": "job-1",
        "name": "Morning Briefing",
        "enabled": true,
        "schedule": {"kind": "cron", "expr": "0 8 * * *", "tz": "America/New_York"},
        "payload": {"kind": "agentTurn", "message": "Run the morning briefing"}
    })])?;

    let output = harness.run(&["sync", "-c", &harness.config_arg()])?;
    let text = combined_output(&output);

    assert!(output.status.success(), "sync failed:\n{text}");
    assert!(text.contains("Exists: Morning Briefing"));
    assert!(text.contains("1 job(s) skipped (already exist)"));
    assert!(text.contains("1 job(s) created"));

    let calls = harness.scheduler_calls()?;
    assert_eq!(adds(&calls).len(), 1);
    assert!(removes(&calls).is_empty());
    Ok(())
}

#[test]
fn force_replaces_the_scheduler_copy() -> TestResult<()> {
    let harness = CliHarness::new()?;
    harness.write_config(TWO_HEARTBEATS)?;
    harness.set_listing(&[json!({
        "id": "job-1",
        "name": "Morning Briefing",
        "enabled": true,
        "schedule": {"kind": "cron", "expr": "0 9 * * *", "tz": "America/New_York"},
        "payload": {"kind": "agentTurn", "message": "stale prompt"}
    })])?;

    let output = harness.run(&["sync", "-c", &harness.config_arg(), "--force"])?;
    let text = combined_output(&output);

    assert!(output.status.success(), "sync failed:\n{text}");
    assert!(text.contains("Replacing: Morning Briefing"));
    assert!(text.contains("1 job(s) replaced"));

    let calls = harness.scheduler_calls()?;
    assert!(calls.iter().any(|c| c == "cron remove job-1"));
    assert_eq!(adds(&calls).len(), 2);
    Ok(())
}

#[test]
fn scheduler_rejection_exits_nonzero() -> TestResult<()> {
    let harness = CliHarness::new()?;
    harness.write_config(TWO_HEARTBEATS)?;
    harness.fail_verb("add")?;

    let output = harness.run(&["sync", "-c", &harness.config_arg()])?;
    let text = combined_output(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(text.contains("Failed: Morning Briefing"));
    assert!(text.contains("add rejected by scheduler"));
    assert!(text.contains("2 error(s)"));
    Ok(())
}

#[test]
fn remove_deletes_scheduler_copies_and_the_yaml_entry() -> TestResult<()> {
    let harness = CliHarness::new()?;
    harness.write_config(
        r#"heartbeats:
  - name: Standup
    schedule: "0 9 * * 1-5"
    prompt: Post the standup thread
  - name: Digest
    schedule: "0 18 * * *"
    prompt: Send the digest
"#,
    )?;
    harness.set_listing(&[
        json!({"id": "job-1", "name": "Standup", "enabled": true}),
        json!({"id": "job-2", "name": "Standup", "enabled": true}),
    ])?;

    let output = harness.run(&["remove", "Standup", "-c", &harness.config_arg()])?;
    let text = combined_output(&output);

    assert!(output.status.success(), "remove failed:\n{text}");
    assert!(text.contains("Removed from OpenClaw: job-1"));
    assert!(text.contains("Removed from OpenClaw: job-2"));
    assert!(text.contains("Removed from YAML"));

    let calls = harness.scheduler_calls()?;
    assert!(calls.iter().any(|c| c == "cron remove job-1"));
    assert!(calls.iter().any(|c| c == "cron remove job-2"));

    let yaml = harness.read_config()?;
    assert!(yaml.contains("Digest"));
    assert!(!yaml.contains("Standup"));
    Ok(())
}

#[test]
fn remove_exits_nonzero_when_the_scheduler_refuses() -> TestResult<()> {
    let harness = CliHarness::new()?;
    harness.set_listing(&[json!({"id": "job-1", "name": "Standup", "enabled": true})])?;
    harness.fail_verb("remove")?;

    let output = harness.run(&["remove", "Standup", "-c", &harness.config_arg()])?;
    let text = combined_output(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(text.contains("Failed to remove from OpenClaw: job-1"));
    Ok(())
}

#[test]
fn import_round_trips_scheduler_jobs_into_yaml() -> TestResult<()> {
    let harness = CliHarness::new()?;
    harness.set_listing(&[json!({
        "id": "job-1",
        "name": "Inbox Sweep",
        "enabled": true,
        "schedule": {"kind": "cron", "expr": "15 7 * * *", "tz": "Europe/Berlin"},
        "payload": {"kind": "agentTurn", "message": "Sweep the inbox"}
    })])?;

    let output = harness.run(&["import", "-c", &harness.config_arg()])?;
    let text = combined_output(&output);

    assert!(output.status.success(), "import failed:\n{text}");
    assert!(text.contains("Imported 1 heartbeat(s)"));

    let yaml = harness.read_config()?;
    assert!(yaml.contains("Inbox Sweep"));
    assert!(yaml.contains("15 7 * * *"));
    assert!(yaml.contains("Sweep the inbox"));
    Ok(())
}

#[test]
fn import_skips_heartbeats_already_declared() -> TestResult<()> {
    let harness = CliHarness::new()?;
    harness.write_config(
        r#"heartbeats:
  - name: Inbox Sweep
    schedule: "15 7 * * *"
    prompt: Sweep the inbox
"#,
    )?;
    harness.set_listing(&[json!({
        "id": "job-1",
        "name": "Inbox Sweep",
        "enabled": true,
        "schedule": {"kind": "cron", "expr": "15 7 * * *"},
        "payload": {"kind": "agentTurn", "message": "Sweep the inbox"}
    })])?;

    let output = harness.run(&["import", "-c", &harness.config_arg()])?;
    let text = combined_output(&output);

    assert!(output.status.success(), "import failed:\n{text}");
    assert!(text.contains("1 skipped (already in YAML)"));
    assert!(text.contains("Nothing to import - YAML is already up to date."));
    Ok(())
}

#[test]
fn dedupe_keeps_the_newest_copy() -> TestResult<()> {
    let harness = CliHarness::new()?;
    harness.set_listing(&[
        json!({
            "id": "job-old",
            "name": "Standup",
            "enabled": true,
            "createdAtMs": 1_000
        }),
        json!({
            "id": "job-new",
            "name": "Standup",
            "enabled": true,
            "createdAtMs": 2_000
        }),
    ])?;

    let output = harness.run(&["dedupe"])?;
    let text = combined_output(&output);

    assert!(output.status.success(), "dedupe failed:\n{text}");
    assert!(text.contains("Keeping: job-new (newest)"));
    assert!(text.contains("Removed: job-old"));

    let calls = harness.scheduler_calls()?;
    assert!(calls.iter().any(|c| c == "cron remove job-old"));
    assert!(!calls.iter().any(|c| c == "cron remove job-new"));
    Ok(())
}
