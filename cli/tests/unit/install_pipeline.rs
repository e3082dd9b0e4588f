//! Install pipeline: idempotence, stage ordering, and unit regeneration.

#![allow(clippy::expect_used)]

use std::path::PathBuf;

use botctl_cli::domain::{LifecycleError, ServiceDescriptor};
use botctl_cli::lifecycle::LifecycleController;
use tempfile::TempDir;

use crate::mocks::{self, ScriptedPrompter, ScriptedRunner};

#[tokio::test]
async fn install_converges_and_registers_the_unit() {
    let root = TempDir::new().expect("tempdir");
    let desc = mocks::temp_descriptor(root.path());
    let runner = mocks::healthy_host(&desc);
    let out = mocks::quiet_output();
    let controller = LifecycleController::new(&desc, &runner, &out);

    let mut prompter = ScriptedPrompter::new(&["tok-123", "-42"]);
    controller.install(&mut prompter).await.expect("install");

    assert!(desc.entry_path().exists(), "entry point synced");
    assert!(desc.venv_python().exists(), "runtime provisioned");
    assert!(desc.env_file().exists(), "config written");
    assert!(desc.unit_path().exists(), "unit registered");
    assert!(
        runner.calls().iter().any(|c| c == "systemctl daemon-reload"),
        "supervisor metadata reloaded"
    );
}

#[tokio::test]
async fn second_install_leaves_tree_venv_and_unit_byte_identical() {
    let root = TempDir::new().expect("tempdir");
    let desc = mocks::temp_descriptor(root.path());
    let runner = mocks::healthy_host(&desc);
    let out = mocks::quiet_output();
    let controller = LifecycleController::new(&desc, &runner, &out);

    let mut prompter = ScriptedPrompter::new(&["tok-123", "-42"]);
    controller.install(&mut prompter).await.expect("first install");

    let entry = std::fs::read(desc.entry_path()).expect("entry");
    let manifest = std::fs::read(desc.manifest_path()).expect("manifest");
    let unit = std::fs::read(desc.unit_path()).expect("unit");
    let python = std::fs::read(desc.venv_python()).expect("python");

    // Config is intentionally re-prompted and overwritten on reinstall.
    let mut prompter = ScriptedPrompter::new(&["tok-456", "7"]);
    controller.install(&mut prompter).await.expect("second install");

    assert_eq!(std::fs::read(desc.entry_path()).expect("entry"), entry);
    assert_eq!(std::fs::read(desc.manifest_path()).expect("manifest"), manifest);
    assert_eq!(std::fs::read(desc.unit_path()).expect("unit"), unit);
    assert_eq!(std::fs::read(desc.venv_python()).expect("python"), python);

    let env = std::fs::read_to_string(desc.env_file()).expect("env");
    assert_eq!(env, "TOKEN=tok-456\nADMIN_ID=7\n");
}

#[tokio::test]
async fn provisioning_failure_writes_no_unit() {
    let root = TempDir::new().expect("tempdir");
    let desc = mocks::temp_descriptor(root.path());
    let mut base = mocks::healthy_handler(desc.clone());
    let runner = ScriptedRunner::new(move |program, args| {
        if program.ends_with("pip") && args.contains(&"-r") {
            return Ok(mocks::err_output(b"No matching distribution found"));
        }
        base(program, args)
    });
    let out = mocks::quiet_output();
    let controller = LifecycleController::new(&desc, &runner, &out);

    // No answers queued: the pipeline must abort before prompting.
    let mut prompter = ScriptedPrompter::new(&[]);
    let err = controller
        .install(&mut prompter)
        .await
        .expect_err("install must fail");
    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::ProvisioningFailed(_))
    ));

    assert!(!desc.unit_path().exists(), "no unit may be written");
    assert!(!desc.env_file().exists(), "no config may be written");
}

#[tokio::test]
async fn provisioning_failure_leaves_existing_unit_untouched() {
    let root = TempDir::new().expect("tempdir");
    let desc = mocks::temp_descriptor(root.path());

    std::fs::create_dir_all(&desc.unit_dir).expect("unit dir");
    std::fs::write(desc.unit_path(), b"[Unit]\nDescription=previous\n").expect("seed unit");

    let mut base = mocks::healthy_handler(desc.clone());
    let runner = ScriptedRunner::new(move |program, args| {
        if program.ends_with("pip") && args.contains(&"-r") {
            return Ok(mocks::err_output(b"network unreachable"));
        }
        base(program, args)
    });
    let out = mocks::quiet_output();
    let controller = LifecycleController::new(&desc, &runner, &out);

    let mut prompter = ScriptedPrompter::new(&[]);
    controller
        .install(&mut prompter)
        .await
        .expect_err("install must fail");

    let unit = std::fs::read(desc.unit_path()).expect("unit");
    assert_eq!(unit, b"[Unit]\nDescription=previous\n");
}

#[tokio::test]
async fn reinstall_with_new_identity_regenerates_unit_without_residue() {
    let root = TempDir::new().expect("tempdir");
    let unit_dir = root.path().join("etc").join("systemd").join("system");

    let old = ServiceDescriptor {
        name: "panelbot".to_string(),
        repo_url: "https://example.invalid/panelbot.git".to_string(),
        install_dir: root.path().join("opt").join("alpha"),
        unit_dir: unit_dir.clone(),
        entry_point: "bot.py".to_string(),
        manifest: "requirements.txt".to_string(),
    };
    let out = mocks::quiet_output();

    let runner = mocks::healthy_host(&old);
    let controller = LifecycleController::new(&old, &runner, &out);
    let mut prompter = ScriptedPrompter::new(&["tok", "1"]);
    controller.install(&mut prompter).await.expect("install old");

    let new = ServiceDescriptor {
        install_dir: root.path().join("opt").join("beta"),
        entry_point: "main.py".to_string(),
        ..old.clone()
    };
    let runner = mocks::healthy_host(&new);
    let controller = LifecycleController::new(&new, &runner, &out);
    let mut prompter = ScriptedPrompter::new(&["tok", "1"]);
    controller.install(&mut prompter).await.expect("install new");

    let unit = std::fs::read_to_string(new.unit_path()).expect("unit");
    assert!(unit.contains("main.py"));
    assert!(unit.contains(&new.install_dir.display().to_string()));
    let old_dir = old.install_dir.display().to_string();
    assert!(
        !unit.contains(&old_dir),
        "unit must not reference the old path: {unit}"
    );
    assert!(!unit.contains("bot.py"));
}

#[tokio::test]
async fn clone_failure_surfaces_as_source_unavailable() {
    let root = TempDir::new().expect("tempdir");
    let desc = mocks::temp_descriptor(root.path());
    let runner = ScriptedRunner::new(|program, args| {
        if program == "git" && args.first() == Some(&"clone") {
            return Ok(mocks::err_output(b"could not resolve host"));
        }
        anyhow::bail!("unexpected command: {program}")
    });
    let out = mocks::quiet_output();
    let controller = LifecycleController::new(&desc, &runner, &out);

    let mut prompter = ScriptedPrompter::new(&[]);
    let err = controller
        .install(&mut prompter)
        .await
        .expect_err("install must fail");
    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::SourceUnavailable(_))
    ));
}

#[tokio::test]
async fn sync_without_required_files_is_malformed_source() {
    let root = TempDir::new().expect("tempdir");
    let desc = mocks::temp_descriptor(root.path());
    let entry = desc.entry_point.clone();
    let runner = ScriptedRunner::new(move |program, args| {
        if program == "git" && args.first() == Some(&"clone") {
            // Clone "succeeds" but delivers a tree missing the manifest.
            let dir = PathBuf::from(args[2]);
            std::fs::create_dir_all(dir.join(".git")).expect("create .git");
            std::fs::write(dir.join(&entry), b"print('bot')\n").expect("entry");
            return Ok(mocks::ok_output(b""));
        }
        anyhow::bail!("provisioning must not run on a malformed tree")
    });
    let out = mocks::quiet_output();
    let controller = LifecycleController::new(&desc, &runner, &out);

    let mut prompter = ScriptedPrompter::new(&[]);
    let err = controller
        .install(&mut prompter)
        .await
        .expect_err("install must fail");
    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::MalformedSource(_))
    ));
}
