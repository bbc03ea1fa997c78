use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::tempdir;

fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (rng >> 56) as u8
        })
        .collect()
}

#[test]
fn test_cli_compress_inspect_decompress_cycle() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("source.bin");
    let archive = dir.path().join("source.pbgz");
    let restored = dir.path().join("out").join("restored.bin");
    let data = pseudo_random_bytes(3 * 4096 + 17, 7);
    fs::write(&source, &data)?;

    Command::cargo_bin("pbgz")?
        .arg("compress")
        .arg(&source)
        .arg(&archive)
        .args(["--block-size", "4096", "--workers", "3"])
        .assert()
        .success()
        .stderr(predicate::str::contains("finish compressing"));

    Command::cargo_bin("pbgz")?
        .arg("inspect")
        .arg(&archive)
        .arg("--blocks")
        .assert()
        .success()
        .stdout(predicate::str::contains("block count    : 4"));

    Command::cargo_bin("pbgz")?
        .arg("decompress")
        .arg(&archive)
        .arg(&restored)
        .assert()
        .success();

    assert_eq!(fs::read(&restored)?, data);
    Ok(())
}

#[test]
fn test_cli_existing_destination_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("a.bin");
    let archive = dir.path().join("a.pbgz");
    fs::write(&source, b"payload")?;
    fs::write(&archive, b"already here")?;

    Command::cargo_bin("pbgz")?
        .arg("compress")
        .arg(&source)
        .arg(&archive)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("exists"));

    assert_eq!(fs::read(&archive)?, b"already here");
    Ok(())
}

#[test]
fn test_cli_bad_command_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("pbgz")?.arg("explode").assert().code(1);
    Command::cargo_bin("pbgz")?.assert().code(1);
    Command::cargo_bin("pbgz")?.arg("compress").arg("only-one-arg").assert().code(1);
    Ok(())
}

#[test]
fn test_cli_garbage_archive_fails_cleanly() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let archive = dir.path().join("tiny.pbgz");
    let output = dir.path().join("tiny.out");
    fs::write(&archive, [0x42u8])?;

    Command::cargo_bin("pbgz")?
        .arg("decompress")
        .arg(&archive)
        .arg(&output)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed"));

    assert!(!output.exists());
    Ok(())
}
