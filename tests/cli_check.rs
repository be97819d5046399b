use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn command_check_sorted() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("bestbam")?;
    let output = cmd
        .arg("check")
        .arg("tests/sam/human.sam")
        .arg("tests/sam/mouse.sam")
        .arg("--sam")
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "tests/sam/human.sam\t4\t4\tok",
            "tests/sam/mouse.sam\t5\t4\tok",
        ]
    );

    Ok(())
}

#[test]
fn command_check_unsorted() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("bestbam")?;
    cmd.arg("check")
        .arg("tests/sam/unsorted.sam")
        .arg("--sam")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Structural error in tests/sam/unsorted.sam at line 3",
        ))
        .stderr(predicate::str::contains("read9 after read10"));

    Ok(())
}

#[test]
fn command_check_malformed() -> anyhow::Result<()> {
    let input = "r1\t0\tchr1\t1\t255\t76M\t*\t0\t0\tACGT\tIIII\tAS:i:70\nr2\t0\tchr1\tx\t255\t76M\t*\t0\t0\tACGT\tIIII\n";
    let mut cmd = Command::cargo_bin("bestbam")?;
    cmd.arg("check")
        .arg("stdin")
        .arg("--sam")
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Format error in stdin at line 2"));

    Ok(())
}
