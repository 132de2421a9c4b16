use archtidy::gate::RebootStatus;
use archtidy::report::{render, render_quiet};
use archtidy::runner::{NoopObserver, RunReport, Step, StepCategory, StepRunner};

fn finished_run() -> RunReport {
    let steps: Vec<Step<()>> = vec![
        Step::warn("Clean package cache", StepCategory::Cleanup, |_| Ok(Some(1536))),
        Step::warn("Vacuum journal logs", StepCategory::Cleanup, |_| {
            anyhow::bail!("journalctl exited with 1")
        }),
        Step::warn("Trim SSD", StepCategory::Cleanup, |_| Ok(None)),
    ];
    StepRunner::new(&mut NoopObserver).run(steps, &mut ()).unwrap()
}

#[test]
fn test_render_lists_steps_in_order() {
    let text = render(&finished_run());
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "[ ok ] Clean package cache: freed 1.5 KiB");
    assert_eq!(lines[1], "[warn] Vacuum journal logs: journalctl exited with 1");
    assert_eq!(lines[2], "[ ok ] Trim SSD");
    assert_eq!(lines[3], "Total space freed: 1.5 KiB");
    assert_eq!(lines[4], "Reboot: not required");
    assert_eq!(lines[5], "Warnings (1):");
    assert_eq!(lines[6], "  - Vacuum journal logs: journalctl exited with 1");
}

#[test]
fn test_render_without_warnings_has_no_warning_block() {
    let steps: Vec<Step<()>> = vec![Step::warn("Trim SSD", StepCategory::Cleanup, |_| Ok(None))];
    let report = StepRunner::new(&mut NoopObserver).run(steps, &mut ()).unwrap();

    let text = render(&report);
    assert!(text.contains("Total space freed: 0.0 B"));
    assert!(!text.contains("Warnings"));
}

#[test]
fn test_render_reboot_outcome() {
    let mut report = finished_run();
    report.reboot_required = true;
    report.reboot = RebootStatus::Declined;

    assert!(render(&report).contains("Reboot: required, declined"));
}

#[test]
fn test_render_aborted_run() {
    let steps: Vec<Step<()>> = vec![
        Step::fatal("Upgrade official packages", StepCategory::Upgrade, |_| {
            anyhow::bail!("failed to commit transaction")
        }),
        Step::fatal("Snapshot kernels (after)", StepCategory::Query, |_| Ok(None)),
    ];
    let aborted = StepRunner::new(&mut NoopObserver).run(steps, &mut ()).unwrap_err();

    let text = render(&aborted.report);
    assert!(text.contains("[FAIL] Upgrade official packages: failed to commit transaction"));
    assert!(text.contains("[skip] Snapshot kernels (after): not run"));
}

#[test]
fn test_render_quiet_summary() {
    let mut report = finished_run();
    assert_eq!(render_quiet(&report), "1.5 KiB  2 ok  1 warn  reboot=no");

    report.reboot_required = true;
    assert!(render_quiet(&report).ends_with("reboot=yes"));
}
