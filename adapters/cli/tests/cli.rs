use std::process::Command;

fn mapgrid() -> Command {
    Command::new(env!("CARGO_BIN_EXE_mapgrid"))
}

#[test]
fn help_lists_every_command() {
    let output = mapgrid()
        .arg("--help")
        .output()
        .expect("failed to invoke mapgrid");
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for command in [
        "snap", "range", "name", "locate", "zone", "overlay", "render", "export", "import",
        "share", "unshare", "adc2",
    ] {
        assert!(help.contains(command), "missing `{command}` in:\n{help}");
    }
}

#[test]
fn missing_boards_fail_with_their_path() {
    let output = mapgrid()
        .args(["snap", "does-not-exist.toml", "10,10"])
        .output()
        .expect("failed to invoke mapgrid");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does-not-exist.toml"), "{stderr}");
}

#[test]
fn malformed_points_are_rejected_by_the_parser() {
    let output = mapgrid()
        .args(["snap", "board.toml", "ten,10"])
        .output()
        .expect("failed to invoke mapgrid");
    assert_eq!(output.status.code(), Some(2));
}
